//! Caller check for the facade's privileged notification entry points.

use crate::TokenError;
use token_types::Address;

/// Admits exactly one caller: the ledger the facade was deployed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerGuard {
	ledger: Address,
}

impl LedgerGuard {
	pub fn new(ledger: Address) -> Self {
		Self { ledger }
	}

	pub fn ledger(&self) -> Address {
		self.ledger
	}

	/// Fails with `Unauthorized` unless `caller` is the ledger.
	pub fn ensure(&self, caller: Address) -> Result<(), TokenError> {
		if caller != self.ledger {
			return Err(TokenError::Unauthorized { caller });
		}
		Ok(())
	}
}
