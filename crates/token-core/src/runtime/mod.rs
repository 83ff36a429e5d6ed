//! Serialized execution environment.
//!
//! The runtime owns the committed state, the shared ledger and every deployed
//! facade. External invocations run one at a time through [`Runtime::execute`]
//! and either commit all of their effects or none of them. The ledger and the
//! facades never originate an invocation; they only act when called.

mod context;
mod journal;

pub use context::{CallContext, MAX_CALL_DEPTH};
pub use journal::{StateJournal, WorldState};

use crate::ledger::LedgerInterface;
use crate::token::TokenView;
use crate::TokenError;
use std::collections::BTreeMap;
use std::sync::Arc;
use token_types::{Address, EmittedEvent, U256};

/// Identity and clock of the execution environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Environment {
	pub chain_id: u64,
	pub timestamp: u64,
}

/// The ledger and the facades registered against it.
pub(crate) struct Deployments {
	pub(crate) ledger: Arc<dyn LedgerInterface>,
	pub(crate) tokens: BTreeMap<Address, Arc<TokenView>>,
}

/// Result of a committed invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt<T> {
	pub output: T,
	/// Notifications emitted by the invocation, in order.
	pub events: Vec<EmittedEvent>,
}

pub struct Runtime {
	env: Environment,
	deployments: Deployments,
	state: WorldState,
}

impl Runtime {
	pub fn new(chain_id: u64, timestamp: u64, ledger: Arc<dyn LedgerInterface>) -> Self {
		Self {
			env: Environment {
				chain_id,
				timestamp,
			},
			deployments: Deployments {
				ledger,
				tokens: BTreeMap::new(),
			},
			state: WorldState::new(),
		}
	}

	pub fn chain_id(&self) -> u64 {
		self.env.chain_id
	}

	pub fn timestamp(&self) -> u64 {
		self.env.timestamp
	}

	pub fn set_timestamp(&mut self, timestamp: u64) {
		self.env.timestamp = timestamp;
	}

	pub fn advance_time(&mut self, seconds: u64) {
		self.env.timestamp = self.env.timestamp.saturating_add(seconds);
	}

	pub fn ledger(&self) -> Arc<dyn LedgerInterface> {
		Arc::clone(&self.deployments.ledger)
	}

	/// Deploys a facade at `address` bound to this runtime's ledger and chain.
	pub fn deploy_token(
		&mut self,
		name: &str,
		symbol: &str,
		address: Address,
	) -> Result<Arc<TokenView>, TokenError> {
		let ledger = self.deployments.ledger.address();
		if address == Address::ZERO
			|| address == ledger
			|| self.deployments.tokens.contains_key(&address)
		{
			return Err(TokenError::AddressInUse(address));
		}

		let token = Arc::new(TokenView::new(
			name,
			symbol,
			address,
			ledger,
			self.env.chain_id,
		));
		self.deployments.tokens.insert(address, Arc::clone(&token));
		tracing::info!(
			token = %address,
			symbol = %symbol,
			domain_separator = %token.domain_separator(),
			"Deployed token facade"
		);
		Ok(token)
	}

	pub fn token(&self, address: Address) -> Result<Arc<TokenView>, TokenError> {
		self.deployments
			.tokens
			.get(&address)
			.cloned()
			.ok_or(TokenError::UnknownToken(address))
	}

	/// Deployed facades ordered by address.
	pub fn tokens(&self) -> impl Iterator<Item = &Arc<TokenView>> {
		self.deployments.tokens.values()
	}

	/// Committed notifications, oldest first.
	pub fn events(&self) -> &[EmittedEvent] {
		self.state.events()
	}

	/// Runs one external invocation from `sender` as an atomic unit.
	///
	/// On success the invocation's writes and notifications are committed and
	/// returned in the receipt. On failure the committed state is untouched.
	pub fn execute<T, F>(&mut self, sender: Address, f: F) -> Result<Receipt<T>, TokenError>
	where
		F: FnOnce(&mut CallContext<'_>) -> Result<T, TokenError>,
	{
		self.ensure_external(sender)?;
		self.commit(sender, f)
	}

	/// Runs `f` against the current state and discards every write.
	pub fn call<T, F>(&self, sender: Address, f: F) -> Result<T, TokenError>
	where
		F: FnOnce(&mut CallContext<'_>) -> Result<T, TokenError>,
	{
		self.ensure_external(sender)?;
		let mut ctx = CallContext::new(
			&self.env,
			&self.deployments,
			StateJournal::new(&self.state),
			sender,
		);
		f(&mut ctx)
	}

	/// Mints `amount` of `token` to `to` as a ledger-internal operation.
	pub fn mint(
		&mut self,
		token: Address,
		to: Address,
		amount: U256,
	) -> Result<Receipt<()>, TokenError> {
		let ledger = self.ledger();
		self.commit(ledger.address(), |ctx| ledger.mint(ctx, token, to, amount))
	}

	/// Burns `amount` of `token` from `from` as a ledger-internal operation.
	pub fn burn(
		&mut self,
		token: Address,
		from: Address,
		amount: U256,
	) -> Result<Receipt<()>, TokenError> {
		let ledger = self.ledger();
		self.commit(ledger.address(), |ctx| ledger.burn(ctx, token, from, amount))
	}

	fn ensure_external(&self, sender: Address) -> Result<(), TokenError> {
		if sender == self.deployments.ledger.address()
			|| self.deployments.tokens.contains_key(&sender)
		{
			tracing::warn!(sender = %sender, "Rejected invocation from a deployed component");
			return Err(TokenError::ReservedSender(sender));
		}
		Ok(())
	}

	fn commit<T, F>(&mut self, sender: Address, f: F) -> Result<Receipt<T>, TokenError>
	where
		F: FnOnce(&mut CallContext<'_>) -> Result<T, TokenError>,
	{
		let (output, changes) = {
			let mut ctx = CallContext::new(
				&self.env,
				&self.deployments,
				StateJournal::new(&self.state),
				sender,
			);
			match f(&mut ctx) {
				Ok(output) => (output, ctx.into_journal().into_changes()),
				Err(e) => {
					tracing::debug!(sender = %sender, error = %e, "Invocation reverted");
					return Err(e);
				},
			}
		};

		let events = changes.events().to_vec();
		self.state.apply(changes);
		Ok(Receipt { output, events })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ledger::implementations::memory::MemoryLedger;
	use crate::LedgerError;

	const LEDGER: Address = Address::repeat_byte(0xba);
	const TOKEN: Address = Address::repeat_byte(0x11);
	const ALICE: Address = Address::repeat_byte(0xa1);

	fn runtime() -> Runtime {
		let mut runtime = Runtime::new(1, 1_000, Arc::new(MemoryLedger::new(LEDGER)));
		runtime.deploy_token("Pool", "BPT", TOKEN).unwrap();
		runtime
	}

	#[test]
	fn test_frames_track_caller_and_this() {
		let runtime = runtime();
		let seen = runtime
			.call(ALICE, |ctx| {
				let top = (ctx.caller(), ctx.this());
				let inner = ctx.enter(TOKEN, |ctx| {
					let facade = (ctx.caller(), ctx.this());
					let ledger = ctx.enter(LEDGER, |ctx| Ok((ctx.caller(), ctx.this(), ctx.depth())))?;
					Ok((facade, ledger))
				})?;
				Ok((top, inner, (ctx.caller(), ctx.this(), ctx.depth())))
			})
			.unwrap();

		assert_eq!(seen.0, (ALICE, ALICE));
		assert_eq!(seen.1 .0, (ALICE, TOKEN));
		assert_eq!(seen.1 .1, (TOKEN, LEDGER, 2));
		assert_eq!(seen.2, (ALICE, ALICE, 0));
	}

	#[test]
	fn test_failed_frame_undoes_its_writes() {
		let runtime = runtime();
		let nonce = runtime
			.call(ALICE, |ctx| {
				ctx.journal_mut().set_nonce(TOKEN, ALICE, U256::from(1));
				let result: Result<(), TokenError> = ctx.enter(TOKEN, |ctx| {
					ctx.journal_mut().set_nonce(TOKEN, ALICE, U256::from(2));
					Err(TokenError::UnknownToken(TOKEN))
				});
				assert!(result.is_err());
				Ok(ctx.journal().nonce(TOKEN, ALICE))
			})
			.unwrap();
		assert_eq!(nonce, U256::from(1));
	}

	#[test]
	fn test_ledger_journal_requires_ledger_frame() {
		let runtime = runtime();
		runtime
			.call(ALICE, |ctx| {
				assert_eq!(
					ctx.ledger_journal_mut().err(),
					Some(TokenError::Ledger(LedgerError::NotLedger(ALICE)))
				);
				ctx.enter(TOKEN, |ctx| {
					assert!(ctx.ledger_journal_mut().is_err());
					ctx.enter(LEDGER, |ctx| {
						ctx.ledger_journal_mut()?.set_balance(TOKEN, ALICE, U256::from(5));
						Ok(())
					})
				})
			})
			.unwrap();
	}

	#[test]
	fn test_components_cannot_originate_invocations() {
		let mut runtime = runtime();
		for sender in [LEDGER, TOKEN] {
			let err = runtime.execute(sender, |_| Ok(())).unwrap_err();
			assert_eq!(err, TokenError::ReservedSender(sender));
			let err = runtime.call(sender, |_| Ok(())).unwrap_err();
			assert_eq!(err, TokenError::ReservedSender(sender));
		}
		assert!(runtime.execute(ALICE, |_| Ok(())).is_ok());
	}
}
