//! Core of the delegated token facade system.
//!
//! Token facades present the standard balance/allowance surface while a single
//! shared ledger owns every balance, allowance and supply, partitioned by the
//! facade's address. The ledger performs each mutation and calls back into the
//! facade so that observers see `Transfer`/`Approval` notifications attributed
//! to the facade. Facades additionally accept EIP-2612 permits: allowances
//! granted by an owner's offline signature and relayed by anyone.
//!
//! Every external invocation runs inside the [`Runtime`] as one atomic unit:
//! either all of its effects (nonces, ledger state, notifications) are
//! committed, or none are.

use thiserror::Error;
use token_types::{Address, U256};

pub mod builder;
pub mod ledger;
pub mod runtime;
pub mod token;

pub use builder::{BuilderError, RuntimeBuilder};
pub use ledger::{LedgerError, LedgerFactory, LedgerInterface};
pub use runtime::{CallContext, Receipt, Runtime, StateJournal, WorldState};
pub use token::{
	DomainSeparator, Eip712Domain, LedgerGuard, PermitAuthorizer, PermitMessage,
	PermitSignature, TokenView,
};

/// Errors surfaced to callers of a token facade.
///
/// Any of these aborts the whole invocation; nothing it did is committed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
	/// The permit was submitted after its deadline.
	#[error("Authorization expired at deadline {deadline}")]
	ExpiredAuthorization { deadline: U256 },
	/// The signature recovers to someone other than the claimed owner. Also
	/// the outcome of replaying a consumed permit, since the digest then
	/// embeds a newer nonce.
	#[error("Invalid signer {recovered}, expected {expected}")]
	InvalidSigner { recovered: Address, expected: Address },
	/// The signature is malformed or does not recover to any address.
	#[error("Invalid signature: {0}")]
	InvalidSignature(String),
	/// A privileged callback was invoked by someone other than the ledger.
	#[error("Unauthorized caller {caller}")]
	Unauthorized { caller: Address },
	/// Failure reported by the ledger, passed through untranslated.
	#[error(transparent)]
	Ledger(#[from] LedgerError),
	#[error("Unknown token {0}")]
	UnknownToken(Address),
	#[error("Address {0} is already in use")]
	AddressInUse(Address),
	#[error("Call depth exceeded maximum of {0}")]
	CallDepthExceeded(usize),
	/// The ledger and deployed facades cannot originate an invocation.
	#[error("Address {0} cannot originate an invocation")]
	ReservedSender(Address),
}
