//! Call context threaded through every facade and ledger operation.
//!
//! A `CallContext` carries the identity of the component executing the
//! current frame, the identity of whoever called into it, the execution
//! environment and the invocation's journal. Only facade and ledger code
//! enters new frames: the callee's caller is always the identity executing
//! when the call was made, so no frame can claim a caller it was not called by.
//! A failed frame undoes its own writes.

use super::journal::StateJournal;
use super::{Deployments, Environment};
use crate::ledger::{LedgerError, LedgerInterface};
use crate::token::TokenView;
use crate::TokenError;
use std::sync::Arc;
use token_types::Address;

/// Maximum nesting of frames within one invocation.
pub const MAX_CALL_DEPTH: usize = 1024;

pub struct CallContext<'a> {
	env: &'a Environment,
	deployments: &'a Deployments,
	journal: StateJournal<'a>,
	caller: Address,
	this: Address,
	depth: usize,
}

impl<'a> CallContext<'a> {
	pub(crate) fn new(
		env: &'a Environment,
		deployments: &'a Deployments,
		journal: StateJournal<'a>,
		caller: Address,
	) -> Self {
		Self {
			env,
			deployments,
			journal,
			caller,
			this: caller,
			depth: 0,
		}
	}

	/// Identity of whoever invoked the current frame.
	pub fn caller(&self) -> Address {
		self.caller
	}

	/// Identity executing the current frame. At the top of an invocation this
	/// is the external sender.
	pub fn this(&self) -> Address {
		self.this
	}

	pub fn chain_id(&self) -> u64 {
		self.env.chain_id
	}

	/// Block timestamp in seconds.
	pub fn timestamp(&self) -> u64 {
		self.env.timestamp
	}

	pub fn depth(&self) -> usize {
		self.depth
	}

	pub fn journal(&self) -> &StateJournal<'a> {
		&self.journal
	}

	pub(crate) fn journal_mut(&mut self) -> &mut StateJournal<'a> {
		&mut self.journal
	}

	/// Write access to balances, allowances and supplies.
	///
	/// Granted only while the ledger is executing the current frame.
	pub fn ledger_journal_mut(&mut self) -> Result<&mut StateJournal<'a>, TokenError> {
		if self.this != self.deployments.ledger.address() {
			return Err(LedgerError::NotLedger(self.this).into());
		}
		Ok(&mut self.journal)
	}

	/// The shared ledger.
	pub fn ledger(&self) -> Arc<dyn LedgerInterface> {
		Arc::clone(&self.deployments.ledger)
	}

	/// The facade deployed at `address`, if any.
	pub fn token(&self, address: Address) -> Option<Arc<TokenView>> {
		self.deployments.tokens.get(&address).cloned()
	}

	/// Runs `f` as a nested frame executed by `target` and called by the
	/// current identity.
	///
	/// The previous identities are restored afterwards. If `f` fails, every
	/// write the frame made is undone before the error is returned.
	pub(crate) fn enter<T, F>(&mut self, target: Address, f: F) -> Result<T, TokenError>
	where
		F: FnOnce(&mut Self) -> Result<T, TokenError>,
	{
		if self.depth >= MAX_CALL_DEPTH {
			return Err(TokenError::CallDepthExceeded(MAX_CALL_DEPTH));
		}

		let checkpoint = self.journal.checkpoint();
		let caller = std::mem::replace(&mut self.caller, self.this);
		let this = std::mem::replace(&mut self.this, target);
		self.depth += 1;

		let result = f(self);

		self.depth -= 1;
		self.this = this;
		self.caller = caller;
		if result.is_err() {
			self.journal.revert_to(checkpoint);
		}
		result
	}

	pub(crate) fn into_journal(self) -> StateJournal<'a> {
		self.journal
	}
}
