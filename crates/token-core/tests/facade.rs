mod common;

use common::*;
use std::sync::Arc;
use token_core::ledger::implementations::memory::MemoryLedger;
use token_core::{CallContext, LedgerError, LedgerInterface, Runtime, TokenError};
use token_types::{Address, ConfigSchema, EmittedEvent, TokenEvent, U256};

const BOB: Address = Address::repeat_byte(0xb0);
const CAROL: Address = Address::repeat_byte(0xca);
const CAROL_FRIEND: Address = Address::repeat_byte(0xcf);

#[test]
fn test_metadata() {
	let runtime = setup();
	for token in runtime.tokens() {
		assert_eq!(token.name(), "Pool Token");
		assert_eq!(token.symbol(), "BPT");
		assert_eq!(token.decimals(), 18);
		assert_eq!(token.ledger(), LEDGER);
	}
	assert_eq!(runtime.tokens().count(), 2);
}

#[test]
fn test_transfer_notifies_from_facade() {
	let mut runtime = setup();
	let token = runtime.token(TOKEN_A).unwrap();
	let owner = owner().address();

	let receipt = runtime
		.execute(owner, |ctx| token.transfer(ctx, BOB, U256::from(100)))
		.unwrap();
	assert!(receipt.output);
	assert_eq!(
		receipt.events,
		vec![EmittedEvent::new(
			TOKEN_A,
			TokenEvent::Transfer {
				from: owner,
				to: BOB,
				value: U256::from(100)
			}
		)]
	);
	assert_eq!(balance(&runtime, TOKEN_A, owner), U256::from(GENESIS - 100));
	assert_eq!(balance(&runtime, TOKEN_A, BOB), U256::from(100));
}

#[test]
fn test_insufficient_balance_leaves_state_untouched() {
	let mut runtime = setup();
	runtime.mint(TOKEN_A, CAROL, U256::from(10)).unwrap();
	let token = runtime.token(TOKEN_A).unwrap();
	let committed = runtime.events().len();

	let err = runtime
		.execute(CAROL, |ctx| token.transfer(ctx, BOB, U256::from(50)))
		.unwrap_err();
	assert_eq!(
		err,
		TokenError::Ledger(LedgerError::InsufficientBalance {
			sender: CAROL,
			balance: U256::from(10),
			needed: U256::from(50),
		})
	);
	assert_eq!(balance(&runtime, TOKEN_A, CAROL), U256::from(10));
	assert_eq!(balance(&runtime, TOKEN_A, BOB), U256::ZERO);
	assert_eq!(runtime.events().len(), committed);
}

#[test]
fn test_emission_restricted_to_ledger() {
	let mut runtime = setup();
	let token = runtime.token(TOKEN_A).unwrap();
	let committed = runtime.events().len();

	for caller in [BOB, Address::ZERO] {
		let err = runtime
			.execute(caller, |ctx| {
				token.emit_transfer(ctx, BOB, CAROL, U256::from(1))
			})
			.unwrap_err();
		assert_eq!(err, TokenError::Unauthorized { caller });

		let err = runtime
			.execute(caller, |ctx| {
				token.emit_approval(ctx, BOB, CAROL, U256::MAX)
			})
			.unwrap_err();
		assert_eq!(err, TokenError::Unauthorized { caller });
	}

	for sender in [LEDGER, TOKEN_A, TOKEN_B] {
		let err = runtime
			.execute(sender, |ctx| {
				token.emit_transfer(ctx, BOB, CAROL, U256::from(1))
			})
			.unwrap_err();
		assert_eq!(err, TokenError::ReservedSender(sender));
	}
	assert_eq!(runtime.events().len(), committed);
}

#[test]
fn test_facades_are_partitioned() {
	let mut runtime = setup();
	let owner = owner().address();
	let token_b = runtime.token(TOKEN_B).unwrap();
	assert_eq!(balance(&runtime, TOKEN_B, owner), U256::ZERO);

	let err = runtime
		.execute(owner, |ctx| token_b.transfer(ctx, BOB, U256::from(1)))
		.unwrap_err();
	assert!(matches!(
		err,
		TokenError::Ledger(LedgerError::InsufficientBalance { .. })
	));

	runtime.mint(TOKEN_B, BOB, U256::from(5)).unwrap();
	let supply_a = runtime
		.call(BOB, |ctx| {
			Ok(runtime.token(TOKEN_A)?.total_supply(ctx))
		})
		.unwrap();
	assert_eq!(supply_a, U256::from(GENESIS));
	assert_eq!(balance(&runtime, TOKEN_A, BOB), U256::ZERO);
	assert_eq!(balance(&runtime, TOKEN_B, BOB), U256::from(5));
}

#[test]
fn test_approve_and_transfer_from() {
	let mut runtime = setup();
	let token = runtime.token(TOKEN_A).unwrap();
	let owner = owner().address();

	let receipt = runtime
		.execute(owner, |ctx| token.approve(ctx, BOB, U256::from(300)))
		.unwrap();
	assert_eq!(
		receipt.events,
		vec![EmittedEvent::new(
			TOKEN_A,
			TokenEvent::Approval {
				owner,
				spender: BOB,
				value: U256::from(300)
			}
		)]
	);

	let receipt = runtime
		.execute(BOB, |ctx| token.transfer_from(ctx, owner, CAROL, U256::from(200)))
		.unwrap();
	// Spending an allowance reports only the transfer
	assert_eq!(receipt.events.len(), 1);
	assert_eq!(receipt.events[0].event.name(), "Transfer");
	assert_eq!(allowance(&runtime, TOKEN_A, owner, BOB), U256::from(100));
	assert_eq!(balance(&runtime, TOKEN_A, CAROL), U256::from(200));

	let err = runtime
		.execute(BOB, |ctx| token.transfer_from(ctx, owner, CAROL, U256::from(101)))
		.unwrap_err();
	assert_eq!(
		err,
		TokenError::Ledger(LedgerError::InsufficientAllowance {
			spender: BOB,
			allowance: U256::from(100),
			needed: U256::from(101),
		})
	);
}

#[test]
fn test_infinite_allowance_not_decremented() {
	let mut runtime = setup();
	let token = runtime.token(TOKEN_A).unwrap();
	let owner = owner().address();

	runtime
		.execute(owner, |ctx| token.approve(ctx, BOB, U256::MAX))
		.unwrap();
	runtime
		.execute(BOB, |ctx| token.transfer_from(ctx, owner, BOB, U256::from(250)))
		.unwrap();
	assert_eq!(allowance(&runtime, TOKEN_A, owner, BOB), U256::MAX);
}

#[test]
fn test_call_discards_writes() {
	let mut runtime = setup();
	let token = runtime.token(TOKEN_A).unwrap();
	let owner = owner().address();

	let moved = runtime
		.call(owner, |ctx| {
			token.transfer(ctx, BOB, U256::from(10))?;
			Ok(token.balance_of(ctx, BOB))
		})
		.unwrap();
	assert_eq!(moved, U256::from(10));
	assert_eq!(balance(&runtime, TOKEN_A, BOB), U256::ZERO);

	runtime.set_timestamp(START + 60);
	assert_eq!(runtime.timestamp(), START + 60);
}

type TransferHook = fn(&MemoryLedger, &mut CallContext<'_>, Address, Address, U256) -> Result<bool, TokenError>;

/// Memory ledger whose `transfer` is replaced by a hook.
struct HookedLedger {
	inner: MemoryLedger,
	transfer: TransferHook,
}

impl HookedLedger {
	fn runtime(transfer: TransferHook) -> Runtime {
		let ledger = Arc::new(HookedLedger {
			inner: MemoryLedger::new(LEDGER),
			transfer,
		});
		let mut runtime = Runtime::new(1, START, ledger);
		runtime.deploy_token("Pool Token", "BPT", TOKEN_A).unwrap();
		runtime.mint(TOKEN_A, BOB, U256::from(20)).unwrap();
		runtime
	}
}

impl LedgerInterface for HookedLedger {
	fn address(&self) -> Address {
		self.inner.address()
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		self.inner.config_schema()
	}

	fn total_supply(&self, ctx: &CallContext<'_>, token: Address) -> U256 {
		self.inner.total_supply(ctx, token)
	}

	fn balance_of(&self, ctx: &CallContext<'_>, token: Address, account: Address) -> U256 {
		self.inner.balance_of(ctx, token, account)
	}

	fn allowance(&self, ctx: &CallContext<'_>, token: Address, owner: Address, spender: Address) -> U256 {
		self.inner.allowance(ctx, token, owner, spender)
	}

	fn transfer(
		&self,
		ctx: &mut CallContext<'_>,
		owner: Address,
		to: Address,
		amount: U256,
	) -> Result<bool, TokenError> {
		(self.transfer)(&self.inner, ctx, owner, to, amount)
	}

	fn approve(&self, ctx: &mut CallContext<'_>, owner: Address, spender: Address, amount: U256) -> Result<bool, TokenError> {
		self.inner.approve(ctx, owner, spender, amount)
	}

	fn transfer_from(
		&self,
		ctx: &mut CallContext<'_>,
		spender: Address,
		from: Address,
		to: Address,
		amount: U256,
	) -> Result<bool, TokenError> {
		self.inner.transfer_from(ctx, spender, from, to, amount)
	}

	fn set_allowance(&self, ctx: &mut CallContext<'_>, owner: Address, spender: Address, amount: U256) -> Result<(), TokenError> {
		self.inner.set_allowance(ctx, owner, spender, amount)
	}

	fn mint(&self, ctx: &mut CallContext<'_>, token: Address, to: Address, amount: U256) -> Result<(), TokenError> {
		self.inner.mint(ctx, token, to, amount)
	}

	fn burn(&self, ctx: &mut CallContext<'_>, token: Address, from: Address, amount: U256) -> Result<(), TokenError> {
		self.inner.burn(ctx, token, from, amount)
	}
}

#[test]
fn test_reentrant_ledger_is_capped() {
	// Calls back into the facade's transfer on every forwarded transfer
	fn reenter(
		_: &MemoryLedger,
		ctx: &mut CallContext<'_>,
		_: Address,
		to: Address,
		amount: U256,
	) -> Result<bool, TokenError> {
		let facade = ctx.token(ctx.caller()).ok_or(TokenError::UnknownToken(ctx.caller()))?;
		facade.transfer(ctx, to, amount)
	}

	// Every frame lives on the native stack
	let err = std::thread::Builder::new()
		.stack_size(64 * 1024 * 1024)
		.spawn(|| {
			let mut runtime = HookedLedger::runtime(reenter);
			let token = runtime.token(TOKEN_A).unwrap();
			let committed = runtime.events().len();
			let err = runtime
				.execute(BOB, |ctx| token.transfer(ctx, CAROL, U256::from(1)))
				.unwrap_err();
			assert_eq!(runtime.events().len(), committed);
			err
		})
		.unwrap()
		.join()
		.unwrap();
	assert_eq!(err, TokenError::CallDepthExceeded(token_core::runtime::MAX_CALL_DEPTH));
}

#[test]
fn test_ledger_failure_after_notification_rolls_back() {
	// Completes the transfer, notification included, then refuses CAROL
	fn refuse_carol(
		inner: &MemoryLedger,
		ctx: &mut CallContext<'_>,
		owner: Address,
		to: Address,
		amount: U256,
	) -> Result<bool, TokenError> {
		inner.transfer(ctx, owner, to, amount)?;
		assert_eq!(ctx.journal().events().last().map(|e| e.emitter), Some(TOKEN_A));
		if to == CAROL {
			return Err(LedgerError::InvalidReceiver(to).into());
		}
		Ok(true)
	}

	let mut runtime = HookedLedger::runtime(refuse_carol);
	let token = runtime.token(TOKEN_A).unwrap();
	let committed = runtime.events().len();

	// The caller cannot keep the partial effects by swallowing the error
	let receipt = runtime
		.execute(BOB, |ctx| {
			let result = token.transfer(ctx, CAROL, U256::from(5));
			assert_eq!(
				result,
				Err(TokenError::Ledger(LedgerError::InvalidReceiver(CAROL)))
			);
			Ok(token.balance_of(ctx, BOB))
		})
		.unwrap();
	assert_eq!(receipt.output, U256::from(20));
	assert!(receipt.events.is_empty());
	assert_eq!(balance(&runtime, TOKEN_A, BOB), U256::from(20));
	assert_eq!(balance(&runtime, TOKEN_A, CAROL), U256::ZERO);
	assert_eq!(runtime.events().len(), committed);

	runtime
		.execute(BOB, |ctx| token.transfer(ctx, CAROL_FRIEND, U256::from(5)))
		.unwrap();
	assert_eq!(balance(&runtime, TOKEN_A, CAROL_FRIEND), U256::from(5));
}
