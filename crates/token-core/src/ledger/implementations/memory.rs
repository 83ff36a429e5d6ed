//! In-memory ledger implementation.
//!
//! Keeps every facade's accounts in the runtime's world state and follows the
//! usual multi-token ERC-20 accounting rules: zero addresses cannot send,
//! receive, approve or be approved, an allowance of `U256::MAX` never
//! decreases, and spending an allowance emits no `Approval`.

use crate::ledger::{LedgerError, LedgerInterface};
use crate::{CallContext, TokenError, TokenView};
use std::sync::Arc;
use token_types::{
	Address, ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, TokenEvent,
	ValidationError, U256,
};

/// Ledger whose state lives in the runtime's journal.
#[derive(Debug, Clone)]
pub struct MemoryLedger {
	address: Address,
}

impl MemoryLedger {
	pub fn new(address: Address) -> Self {
		Self { address }
	}

	fn registered(&self, ctx: &CallContext<'_>, token: Address) -> Result<Arc<TokenView>, TokenError> {
		ctx.token(token)
			.ok_or_else(|| LedgerError::UnregisteredToken(token).into())
	}

	/// Ledger-internal operations may only be invoked by the ledger itself.
	fn ensure_internal(&self, ctx: &CallContext<'_>) -> Result<(), TokenError> {
		if ctx.caller() != self.address {
			return Err(LedgerError::NotLedger(ctx.caller()).into());
		}
		Ok(())
	}

	/// Emits `event` from the facade by calling its privileged callback.
	fn notify(
		&self,
		ctx: &mut CallContext<'_>,
		token: &TokenView,
		event: TokenEvent,
	) -> Result<(), TokenError> {
		match event {
			TokenEvent::Transfer { from, to, value } => token.emit_transfer(ctx, from, to, value),
			TokenEvent::Approval {
				owner,
				spender,
				value,
			} => token.emit_approval(ctx, owner, spender, value),
		}
	}

	fn move_balance(
		&self,
		ctx: &mut CallContext<'_>,
		token: &TokenView,
		from: Address,
		to: Address,
		amount: U256,
	) -> Result<(), TokenError> {
		if from == Address::ZERO {
			return Err(LedgerError::InvalidSender(from).into());
		}
		if to == Address::ZERO {
			return Err(LedgerError::InvalidReceiver(to).into());
		}

		let id = token.address();
		let balance = ctx.journal().balance(id, from);
		if balance < amount {
			return Err(LedgerError::InsufficientBalance {
				sender: from,
				balance,
				needed: amount,
			}
			.into());
		}

		let journal = ctx.ledger_journal_mut()?;
		journal.set_balance(id, from, balance - amount);
		// Read after the debit so a self-transfer nets to zero
		let credited = journal.balance(id, to) + amount;
		journal.set_balance(id, to, credited);

		tracing::debug!(token = %id, from = %from, to = %to, amount = %amount, "Moved balance");
		self.notify(
			ctx,
			token,
			TokenEvent::Transfer {
				from,
				to,
				value: amount,
			},
		)
	}

	fn write_allowance(
		&self,
		ctx: &mut CallContext<'_>,
		token: &TokenView,
		owner: Address,
		spender: Address,
		amount: U256,
	) -> Result<(), TokenError> {
		if owner == Address::ZERO {
			return Err(LedgerError::InvalidApprover(owner).into());
		}
		if spender == Address::ZERO {
			return Err(LedgerError::InvalidSpender(spender).into());
		}

		ctx.ledger_journal_mut()?
			.set_allowance(token.address(), owner, spender, amount);
		tracing::debug!(
			token = %token.address(),
			owner = %owner,
			spender = %spender,
			amount = %amount,
			"Set allowance"
		);
		self.notify(
			ctx,
			token,
			TokenEvent::Approval {
				owner,
				spender,
				value: amount,
			},
		)
	}

	fn spend_allowance(
		&self,
		ctx: &mut CallContext<'_>,
		token: Address,
		owner: Address,
		spender: Address,
		amount: U256,
	) -> Result<(), TokenError> {
		let current = ctx.journal().allowance(token, owner, spender);
		if current == U256::MAX {
			return Ok(());
		}
		if current < amount {
			return Err(LedgerError::InsufficientAllowance {
				spender,
				allowance: current,
				needed: amount,
			}
			.into());
		}
		ctx.ledger_journal_mut()?
			.set_allowance(token, owner, spender, current - amount);
		Ok(())
	}
}

impl LedgerInterface for MemoryLedger {
	fn address(&self) -> Address {
		self.address
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryLedgerSchema)
	}

	fn total_supply(&self, ctx: &CallContext<'_>, token: Address) -> U256 {
		ctx.journal().total_supply(token)
	}

	fn balance_of(&self, ctx: &CallContext<'_>, token: Address, account: Address) -> U256 {
		ctx.journal().balance(token, account)
	}

	fn allowance(
		&self,
		ctx: &CallContext<'_>,
		token: Address,
		owner: Address,
		spender: Address,
	) -> U256 {
		ctx.journal().allowance(token, owner, spender)
	}

	fn transfer(
		&self,
		ctx: &mut CallContext<'_>,
		owner: Address,
		to: Address,
		amount: U256,
	) -> Result<bool, TokenError> {
		let token = self.registered(ctx, ctx.caller())?;
		self.move_balance(ctx, &token, owner, to, amount)?;
		Ok(true)
	}

	fn approve(
		&self,
		ctx: &mut CallContext<'_>,
		owner: Address,
		spender: Address,
		amount: U256,
	) -> Result<bool, TokenError> {
		let token = self.registered(ctx, ctx.caller())?;
		self.write_allowance(ctx, &token, owner, spender, amount)?;
		Ok(true)
	}

	fn transfer_from(
		&self,
		ctx: &mut CallContext<'_>,
		spender: Address,
		from: Address,
		to: Address,
		amount: U256,
	) -> Result<bool, TokenError> {
		let token = self.registered(ctx, ctx.caller())?;
		self.spend_allowance(ctx, token.address(), from, spender, amount)?;
		self.move_balance(ctx, &token, from, to, amount)?;
		Ok(true)
	}

	fn set_allowance(
		&self,
		ctx: &mut CallContext<'_>,
		owner: Address,
		spender: Address,
		amount: U256,
	) -> Result<(), TokenError> {
		let token = self.registered(ctx, ctx.caller())?;
		self.write_allowance(ctx, &token, owner, spender, amount)
	}

	fn mint(
		&self,
		ctx: &mut CallContext<'_>,
		token: Address,
		to: Address,
		amount: U256,
	) -> Result<(), TokenError> {
		self.ensure_internal(ctx)?;
		let facade = self.registered(ctx, token)?;
		if to == Address::ZERO {
			return Err(LedgerError::InvalidReceiver(to).into());
		}

		let journal = ctx.ledger_journal_mut()?;
		let supply = journal
			.total_supply(token)
			.checked_add(amount)
			.ok_or(LedgerError::SupplyOverflow)?;
		journal.set_total_supply(token, supply);
		// Bounded by the total supply checked above
		let balance = journal.balance(token, to) + amount;
		journal.set_balance(token, to, balance);

		tracing::debug!(token = %token, to = %to, amount = %amount, "Minted");
		self.notify(
			ctx,
			&facade,
			TokenEvent::Transfer {
				from: Address::ZERO,
				to,
				value: amount,
			},
		)
	}

	fn burn(
		&self,
		ctx: &mut CallContext<'_>,
		token: Address,
		from: Address,
		amount: U256,
	) -> Result<(), TokenError> {
		self.ensure_internal(ctx)?;
		let facade = self.registered(ctx, token)?;
		if from == Address::ZERO {
			return Err(LedgerError::InvalidSender(from).into());
		}

		let balance = ctx.journal().balance(token, from);
		if balance < amount {
			return Err(LedgerError::InsufficientBalance {
				sender: from,
				balance,
				needed: amount,
			}
			.into());
		}
		let journal = ctx.ledger_journal_mut()?;
		journal.set_balance(token, from, balance - amount);
		let supply = journal.total_supply(token) - amount;
		journal.set_total_supply(token, supply);

		tracing::debug!(token = %token, from = %from, amount = %amount, "Burned");
		self.notify(
			ctx,
			&facade,
			TokenEvent::Transfer {
				from,
				to: Address::ZERO,
				value: amount,
			},
		)
	}
}

/// Configuration schema for `MemoryLedger`.
pub struct MemoryLedgerSchema;

impl ConfigSchema for MemoryLedgerSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(vec![Field::new("address", FieldType::Address)], vec![]);
		schema.validate(config)
	}
}

/// Factory function to create a memory ledger from configuration.
///
/// Configuration parameters:
/// - `address`: the ledger's identity, accepted by facades as callback caller
pub fn create_ledger(config: &toml::Value) -> Result<Box<dyn LedgerInterface>, LedgerError> {
	MemoryLedgerSchema
		.validate(config)
		.map_err(|e| LedgerError::Configuration(e.to_string()))?;

	let address = config
		.get("address")
		.and_then(|v| v.as_str())
		.and_then(|s| s.parse::<Address>().ok())
		.ok_or_else(|| LedgerError::Configuration("address is required".to_string()))?;
	if address == Address::ZERO {
		return Err(LedgerError::Configuration(
			"Ledger address cannot be zero".to_string(),
		));
	}

	Ok(Box::new(MemoryLedger::new(address)))
}

/// Registry for the memory ledger implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = crate::ledger::LedgerFactory;

	fn factory() -> Self::Factory {
		create_ledger
	}
}

impl crate::ledger::LedgerRegistry for Registry {}
