#![allow(dead_code)]

use std::collections::HashMap;
use token_account::implementations::local::LocalAccount;
use token_config::builders::config::ConfigBuilder;
use token_core::ledger::{implementations::memory, LedgerFactory};
use token_core::{DomainSeparator, PermitMessage, PermitSignature, Runtime, RuntimeBuilder, TokenView};
use token_types::{Address, ImplementationRegistry, SecretString, U256};

pub const OWNER_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const SPENDER_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

pub const LEDGER: Address = Address::repeat_byte(0xba);
pub const TOKEN_A: Address = Address::repeat_byte(0x11);
pub const TOKEN_B: Address = Address::repeat_byte(0x22);
pub const RELAYER: Address = Address::repeat_byte(0xee);
pub const START: u64 = 1_700_000_000;
pub const GENESIS: u64 = 1_000;

pub fn account(key: &str) -> LocalAccount {
	LocalAccount::from_private_key(&SecretString::from(key)).unwrap()
}

pub fn owner() -> LocalAccount {
	account(OWNER_KEY)
}

pub fn spender() -> LocalAccount {
	account(SPENDER_KEY)
}

/// Two facades with identical metadata on one ledger. The owner holds
/// `GENESIS` units of token A only.
pub fn setup() -> Runtime {
	let holder = owner().address();
	let config = ConfigBuilder::new()
		.chain_id(31337)
		.timestamp(Some(START))
		.ledger_address(LEDGER)
		.token("Pool Token", "BPT", TOKEN_A, &[(holder, U256::from(GENESIS))])
		.token("Pool Token", "BPT", TOKEN_B, &[])
		.build();

	let factories: HashMap<String, LedgerFactory> = HashMap::from([(
		memory::Registry::NAME.to_string(),
		memory::Registry::factory(),
	)]);
	RuntimeBuilder::new(config).build(&factories).unwrap()
}

/// Signs a permit for `token` the way an off-system wallet would, from
/// public data only.
pub fn sign_permit(
	runtime: &Runtime,
	token: &TokenView,
	signer: &LocalAccount,
	spender: Address,
	value: U256,
	nonce: u64,
	deadline: U256,
) -> PermitSignature {
	let domain = DomainSeparator::new(token.name(), runtime.chain_id(), token.address());
	let digest = PermitMessage {
		owner: signer.address(),
		spender,
		value,
		nonce: U256::from(nonce),
		deadline,
	}
	.digest(&domain);
	PermitSignature::from_bytes(&signer.sign_digest(&digest).unwrap())
}

pub fn balance(runtime: &Runtime, token: Address, account: Address) -> U256 {
	let view = runtime.token(token).unwrap();
	runtime
		.call(Address::ZERO, |ctx| Ok(view.balance_of(ctx, account)))
		.unwrap()
}

pub fn allowance(runtime: &Runtime, token: Address, owner: Address, spender: Address) -> U256 {
	let view = runtime.token(token).unwrap();
	runtime
		.call(Address::ZERO, |ctx| Ok(view.allowance(ctx, owner, spender)))
		.unwrap()
}

pub fn nonce(runtime: &Runtime, token: Address, owner: Address) -> U256 {
	let view = runtime.token(token).unwrap();
	runtime
		.call(Address::ZERO, |ctx| Ok(view.nonces(ctx, owner)))
		.unwrap()
}
