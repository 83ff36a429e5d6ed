//! Shared ledger contract.
//!
//! The ledger is the single owner of balances, allowances and total supplies
//! for every facade. Facades call it with themselves as the calling identity,
//! which is how the ledger knows which partition an operation touches. Each
//! mutating operation notifies the facade through its privileged callbacks as
//! part of the same atomic unit.

use crate::{CallContext, TokenError};
use thiserror::Error;
use token_types::{Address, ConfigSchema, ImplementationRegistry, U256};

/// Re-export implementations
pub mod implementations {
	pub mod memory;
}

/// Failures produced by the ledger itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
	#[error("Insufficient balance: {sender} has {balance}, needs {needed}")]
	InsufficientBalance {
		sender: Address,
		balance: U256,
		needed: U256,
	},
	#[error("Insufficient allowance: {spender} has {allowance}, needs {needed}")]
	InsufficientAllowance {
		spender: Address,
		allowance: U256,
		needed: U256,
	},
	#[error("Invalid sender {0}")]
	InvalidSender(Address),
	#[error("Invalid receiver {0}")]
	InvalidReceiver(Address),
	#[error("Invalid approver {0}")]
	InvalidApprover(Address),
	#[error("Invalid spender {0}")]
	InvalidSpender(Address),
	/// The calling identity is not a facade registered with the ledger.
	#[error("Token {0} is not registered with the ledger")]
	UnregisteredToken(Address),
	/// A ledger-internal operation was requested by an outside caller.
	#[error("Caller {0} is not the ledger")]
	NotLedger(Address),
	#[error("Total supply overflow")]
	SupplyOverflow,
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Operations the ledger offers to facades.
///
/// Reads take the facade address explicitly. Writes take it from
/// `ctx.caller()`: a facade forwards a call by entering a frame as itself,
/// passing along the identity of its own caller as `owner` or `spender`.
pub trait LedgerInterface: Send + Sync {
	/// The ledger's identity; the only caller facades accept callbacks from.
	fn address(&self) -> Address;

	/// Schema of this implementation's TOML table.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	fn total_supply(&self, ctx: &CallContext<'_>, token: Address) -> U256;

	fn balance_of(&self, ctx: &CallContext<'_>, token: Address, account: Address) -> U256;

	fn allowance(
		&self,
		ctx: &CallContext<'_>,
		token: Address,
		owner: Address,
		spender: Address,
	) -> U256;

	/// Moves `amount` from `owner` to `to`.
	fn transfer(
		&self,
		ctx: &mut CallContext<'_>,
		owner: Address,
		to: Address,
		amount: U256,
	) -> Result<bool, TokenError>;

	/// Sets the allowance `owner` grants `spender`.
	fn approve(
		&self,
		ctx: &mut CallContext<'_>,
		owner: Address,
		spender: Address,
		amount: U256,
	) -> Result<bool, TokenError>;

	/// Spends `spender`'s allowance from `from`, then moves `amount` to `to`.
	fn transfer_from(
		&self,
		ctx: &mut CallContext<'_>,
		spender: Address,
		from: Address,
		to: Address,
		amount: U256,
	) -> Result<bool, TokenError>;

	/// Sets an allowance on the owner's behalf after a verified permit.
	fn set_allowance(
		&self,
		ctx: &mut CallContext<'_>,
		owner: Address,
		spender: Address,
		amount: U256,
	) -> Result<(), TokenError>;

	/// Creates `amount` of `token` for `to`. Ledger-internal.
	fn mint(
		&self,
		ctx: &mut CallContext<'_>,
		token: Address,
		to: Address,
		amount: U256,
	) -> Result<(), TokenError>;

	/// Destroys `amount` of `token` held by `from`. Ledger-internal.
	fn burn(
		&self,
		ctx: &mut CallContext<'_>,
		token: Address,
		from: Address,
		amount: U256,
	) -> Result<(), TokenError>;
}

/// Type alias for ledger factory functions.
pub type LedgerFactory = fn(&toml::Value) -> Result<Box<dyn LedgerInterface>, LedgerError>;

/// Registry trait for ledger implementations.
pub trait LedgerRegistry: ImplementationRegistry<Factory = LedgerFactory> {}

/// All registered ledger implementations as `(name, factory)` pairs.
pub fn get_all_implementations() -> Vec<(&'static str, LedgerFactory)> {
	use implementations::memory;

	vec![(memory::Registry::NAME, memory::Registry::factory())]
}
