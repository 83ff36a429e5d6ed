//! Committed world state and the per-invocation write journal.
//!
//! Writes made during an invocation land in a [`StateJournal`] overlay on top
//! of the committed [`WorldState`]. The runtime applies the overlay when the
//! invocation succeeds and drops it otherwise. Nested frames take checkpoints
//! of the overlay so a failed inner call can be undone on its own.

use std::collections::HashMap;
use token_types::{Address, EmittedEvent, U256};

/// Every piece of mutable state in the environment.
///
/// Ledger entries are keyed by the facade address first, so facades sharing
/// the ledger never see each other's accounts.
#[derive(Debug, Clone, Default)]
pub struct WorldState {
	balances: HashMap<(Address, Address), U256>,
	allowances: HashMap<(Address, Address, Address), U256>,
	supplies: HashMap<Address, U256>,
	nonces: HashMap<(Address, Address), U256>,
	events: Vec<EmittedEvent>,
}

impl WorldState {
	pub fn new() -> Self {
		Self::default()
	}

	/// Notifications committed so far, oldest first.
	pub fn events(&self) -> &[EmittedEvent] {
		&self.events
	}

	pub(crate) fn apply(&mut self, changes: Changes) {
		self.balances.extend(changes.balances);
		self.allowances.extend(changes.allowances);
		self.supplies.extend(changes.supplies);
		self.nonces.extend(changes.nonces);
		self.events.extend(changes.events);
	}
}

/// Pending writes of one invocation.
#[derive(Debug, Clone, Default)]
pub(crate) struct Changes {
	balances: HashMap<(Address, Address), U256>,
	allowances: HashMap<(Address, Address, Address), U256>,
	supplies: HashMap<Address, U256>,
	nonces: HashMap<(Address, Address), U256>,
	events: Vec<EmittedEvent>,
}

impl Changes {
	pub(crate) fn events(&self) -> &[EmittedEvent] {
		&self.events
	}
}

/// Snapshot of a journal's pending writes.
#[derive(Debug, Clone)]
pub(crate) struct Checkpoint(Changes);

/// Read-through overlay over the committed state.
///
/// Reads see this invocation's own writes first, then the committed state;
/// absent entries read as zero.
#[derive(Debug)]
pub struct StateJournal<'a> {
	base: &'a WorldState,
	changes: Changes,
}

impl<'a> StateJournal<'a> {
	pub fn new(base: &'a WorldState) -> Self {
		Self {
			base,
			changes: Changes::default(),
		}
	}

	pub fn balance(&self, token: Address, account: Address) -> U256 {
		let key = (token, account);
		read(&self.changes.balances, &self.base.balances, &key)
	}

	pub fn set_balance(&mut self, token: Address, account: Address, value: U256) {
		self.changes.balances.insert((token, account), value);
	}

	pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
		let key = (token, owner, spender);
		read(&self.changes.allowances, &self.base.allowances, &key)
	}

	pub fn set_allowance(&mut self, token: Address, owner: Address, spender: Address, value: U256) {
		self.changes.allowances.insert((token, owner, spender), value);
	}

	pub fn total_supply(&self, token: Address) -> U256 {
		read(&self.changes.supplies, &self.base.supplies, &token)
	}

	pub fn set_total_supply(&mut self, token: Address, value: U256) {
		self.changes.supplies.insert(token, value);
	}

	pub fn nonce(&self, token: Address, owner: Address) -> U256 {
		let key = (token, owner);
		read(&self.changes.nonces, &self.base.nonces, &key)
	}

	pub(crate) fn set_nonce(&mut self, token: Address, owner: Address, value: U256) {
		self.changes.nonces.insert((token, owner), value);
	}

	/// Records a notification for this invocation.
	pub(crate) fn emit(&mut self, event: EmittedEvent) {
		self.changes.events.push(event);
	}

	/// Notifications recorded by this invocation so far.
	pub fn events(&self) -> &[EmittedEvent] {
		&self.changes.events
	}

	pub(crate) fn checkpoint(&self) -> Checkpoint {
		Checkpoint(self.changes.clone())
	}

	/// Discards every write made after `checkpoint` was taken.
	pub(crate) fn revert_to(&mut self, checkpoint: Checkpoint) {
		self.changes = checkpoint.0;
	}

	pub(crate) fn into_changes(self) -> Changes {
		self.changes
	}
}

fn read<K: std::hash::Hash + Eq>(
	pending: &HashMap<K, U256>,
	committed: &HashMap<K, U256>,
	key: &K,
) -> U256 {
	pending
		.get(key)
		.or_else(|| committed.get(key))
		.copied()
		.unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;
	use token_types::TokenEvent;

	const TOKEN: Address = Address::repeat_byte(0x10);
	const OTHER_TOKEN: Address = Address::repeat_byte(0x20);
	const ALICE: Address = Address::repeat_byte(0xa1);
	const BOB: Address = Address::repeat_byte(0xb0);

	#[test]
	fn test_reads_default_to_zero() {
		let state = WorldState::new();
		let journal = StateJournal::new(&state);
		assert_eq!(journal.balance(TOKEN, ALICE), U256::ZERO);
		assert_eq!(journal.allowance(TOKEN, ALICE, BOB), U256::ZERO);
		assert_eq!(journal.total_supply(TOKEN), U256::ZERO);
		assert_eq!(journal.nonce(TOKEN, ALICE), U256::ZERO);
	}

	#[test]
	fn test_writes_are_partitioned_by_token() {
		let state = WorldState::new();
		let mut journal = StateJournal::new(&state);
		journal.set_balance(TOKEN, ALICE, U256::from(10));
		assert_eq!(journal.balance(TOKEN, ALICE), U256::from(10));
		assert_eq!(journal.balance(OTHER_TOKEN, ALICE), U256::ZERO);
	}

	#[test]
	fn test_apply_commits_changes() {
		let mut state = WorldState::new();
		let changes = {
			let mut journal = StateJournal::new(&state);
			journal.set_balance(TOKEN, ALICE, U256::from(7));
			journal.set_nonce(TOKEN, ALICE, U256::from(1));
			journal.emit(EmittedEvent::new(
				TOKEN,
				TokenEvent::Transfer {
					from: Address::ZERO,
					to: ALICE,
					value: U256::from(7),
				},
			));
			journal.into_changes()
		};
		state.apply(changes);

		let journal = StateJournal::new(&state);
		assert_eq!(journal.balance(TOKEN, ALICE), U256::from(7));
		assert_eq!(journal.nonce(TOKEN, ALICE), U256::from(1));
		assert!(journal.events().is_empty());
		assert_eq!(state.events().len(), 1);
	}

	#[test]
	fn test_revert_to_checkpoint() {
		let state = WorldState::new();
		let mut journal = StateJournal::new(&state);
		journal.set_balance(TOKEN, ALICE, U256::from(1));
		let checkpoint = journal.checkpoint();

		journal.set_balance(TOKEN, ALICE, U256::from(2));
		journal.set_allowance(TOKEN, ALICE, BOB, U256::from(3));
		journal.emit(EmittedEvent::new(
			TOKEN,
			TokenEvent::Approval {
				owner: ALICE,
				spender: BOB,
				value: U256::from(3),
			},
		));
		journal.revert_to(checkpoint);

		assert_eq!(journal.balance(TOKEN, ALICE), U256::from(1));
		assert_eq!(journal.allowance(TOKEN, ALICE, BOB), U256::ZERO);
		assert!(journal.events().is_empty());
	}
}
