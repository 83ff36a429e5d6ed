//! Notification types observed from token facades.
//!
//! The ledger performs every mutation, but observers must see the standard
//! `Transfer` and `Approval` notifications as if the facade itself had emitted
//! them. Each notification is therefore recorded together with the address of
//! the facade it is attributed to.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Standard token notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenEvent {
	/// Value moved between two accounts. Mints come from and burns go to the
	/// zero address.
	Transfer {
		from: Address,
		to: Address,
		value: U256,
	},
	/// An allowance was set for a spender.
	Approval {
		owner: Address,
		spender: Address,
		value: U256,
	},
}

impl TokenEvent {
	/// Returns the notification name as it appears in a token ABI.
	pub fn name(&self) -> &'static str {
		match self {
			TokenEvent::Transfer { .. } => "Transfer",
			TokenEvent::Approval { .. } => "Approval",
		}
	}
}

/// A notification together with the facade address it is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmittedEvent {
	/// Address of the facade the notification originates from.
	pub emitter: Address,
	pub event: TokenEvent,
}

impl EmittedEvent {
	pub fn new(emitter: Address, event: TokenEvent) -> Self {
		Self { emitter, event }
	}
}

impl fmt::Display for EmittedEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.event {
			TokenEvent::Transfer { from, to, value } => {
				write!(f, "{} Transfer({}, {}, {})", self.emitter, from, to, value)
			},
			TokenEvent::Approval {
				owner,
				spender,
				value,
			} => write!(
				f,
				"{} Approval({}, {}, {})",
				self.emitter, owner, spender, value
			),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;

	#[test]
	fn test_event_names() {
		let transfer = TokenEvent::Transfer {
			from: Address::ZERO,
			to: address!("1111111111111111111111111111111111111111"),
			value: U256::from(5),
		};
		let approval = TokenEvent::Approval {
			owner: Address::ZERO,
			spender: Address::ZERO,
			value: U256::ZERO,
		};
		assert_eq!(transfer.name(), "Transfer");
		assert_eq!(approval.name(), "Approval");
	}

	#[test]
	fn test_emitted_event_serde() {
		let event = EmittedEvent::new(
			address!("2222222222222222222222222222222222222222"),
			TokenEvent::Approval {
				owner: address!("1111111111111111111111111111111111111111"),
				spender: address!("3333333333333333333333333333333333333333"),
				value: U256::from(1000),
			},
		);
		let json = serde_json::to_string(&event).unwrap();
		let decoded: EmittedEvent = serde_json::from_str(&json).unwrap();
		assert_eq!(decoded, event);
	}
}
