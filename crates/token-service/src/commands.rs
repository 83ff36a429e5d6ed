//! Subcommands of the `token` binary.
//!
//! Both commands work against a runtime built from the configuration file,
//! so they see exactly the facades, domains and genesis state a deployment
//! with that configuration would have.

use serde::Serialize;
use token_account::AccountService;
use token_config::Config;
use token_core::{DomainSeparator, Eip712Domain, PermitMessage, PermitSignature, Runtime};
use token_types::{format_token_amount, Address, B256, U256};

/// Validity window applied when no deadline is given.
pub const DEFAULT_PERMIT_VALIDITY: u64 = 3_600;

#[derive(Debug, Serialize)]
pub struct HolderReport {
	pub account: Address,
	pub balance: U256,
	pub formatted: String,
}

/// Public description of a deployed facade.
#[derive(Debug, Serialize)]
pub struct TokenReport {
	pub address: Address,
	pub name: String,
	pub symbol: String,
	pub decimals: u8,
	pub domain_separator: B256,
	pub eip712_domain: Eip712Domain,
	pub total_supply: U256,
	pub holders: Vec<HolderReport>,
}

/// Describes every facade with the balances of its configured holders.
pub fn inspect(config: &Config, runtime: &Runtime) -> Result<Vec<TokenReport>, Box<dyn std::error::Error>> {
	let mut reports = Vec::new();
	for token in runtime.tokens() {
		let holders: Vec<Address> = config
			.token(&token.address())
			.map(|t| t.balances.iter().map(|b| b.account).collect())
			.unwrap_or_default();

		let (total_supply, balances) = runtime.call(Address::ZERO, |ctx| {
			let ctx = &*ctx;
			let balances: Vec<U256> = holders.iter().map(|h| token.balance_of(ctx, *h)).collect();
			Ok((token.total_supply(ctx), balances))
		})?;

		reports.push(TokenReport {
			address: token.address(),
			name: token.name().to_string(),
			symbol: token.symbol().to_string(),
			decimals: token.decimals(),
			domain_separator: token.domain_separator(),
			eip712_domain: token.eip712_domain(),
			total_supply,
			holders: holders
				.into_iter()
				.zip(balances)
				.map(|(account, balance)| HolderReport {
					account,
					balance,
					formatted: format_token_amount(balance, token.decimals()),
				})
				.collect(),
		});
	}
	Ok(reports)
}

/// Parameters of a permit to sign.
#[derive(Debug, Clone)]
pub struct PermitRequest {
	pub token: Address,
	pub spender: Address,
	pub value: U256,
	/// Defaults to the runtime clock plus [`DEFAULT_PERMIT_VALIDITY`].
	pub deadline: Option<U256>,
	/// Defaults to the owner's current nonce.
	pub nonce: Option<U256>,
}

#[derive(Debug, Serialize)]
pub struct SignedPermit {
	pub token: Address,
	pub message: PermitMessage,
	pub digest: B256,
	pub signature: PermitSignature,
	/// `r || s || v` as hex.
	pub encoded: String,
	/// Whether relaying the permit against the current state succeeded in a
	/// dry-run.
	pub verified: bool,
}

/// Signs a permit with the configured account, off-system.
pub async fn sign_permit(
	runtime: &Runtime,
	account: &AccountService,
	request: PermitRequest,
) -> Result<SignedPermit, Box<dyn std::error::Error>> {
	let token = runtime.token(request.token)?;
	let owner = account.get_address().await?;
	let current = runtime.call(Address::ZERO, |ctx| Ok(token.nonces(ctx, owner)))?;

	let message = PermitMessage {
		owner,
		spender: request.spender,
		value: request.value,
		nonce: request.nonce.unwrap_or(current),
		deadline: request
			.deadline
			.unwrap_or_else(|| U256::from(runtime.timestamp().saturating_add(DEFAULT_PERMIT_VALIDITY))),
	};
	let domain = DomainSeparator::new(token.name(), runtime.chain_id(), token.address());
	let digest = message.digest(&domain);
	let signature = PermitSignature::from_bytes(&account.sign_digest(&digest).await?);

	// Only a permit for the current nonce can be relayed right now
	let verified = if message.nonce != current {
		tracing::warn!(
			nonce = %message.nonce,
			current = %current,
			"Permit signed for a future nonce, skipping dry-run"
		);
		false
	} else {
		let relayed = runtime.call(request.spender, |ctx| {
			token.permit(
				ctx,
				message.owner,
				message.spender,
				message.value,
				message.deadline,
				&signature,
			)
		});
		match relayed {
			Ok(()) => true,
			Err(e) => {
				tracing::warn!(error = %e, "Permit dry-run failed");
				false
			},
		}
	};

	Ok(SignedPermit {
		token: token.address(),
		message,
		digest,
		encoded: format!("0x{}", hex::encode(signature.to_bytes())),
		signature,
		verified,
	})
}
