//! EIP-712 signing domain of a facade.

use serde::Serialize;
use std::fmt;
use token_types::{compute_domain_hash, Address, B256, U256};

/// ERC-5267 bitmap: name, version, chainId and verifyingContract are set.
const DOMAIN_FIELDS: u8 = 0x0f;

/// Domain hash binding signatures to one facade on one chain.
///
/// Computed once at construction and never recomputed, so it changes only if
/// the facade is redeployed at another address or chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DomainSeparator {
	hash: B256,
	chain_id: u64,
	verifying_contract: Address,
}

impl DomainSeparator {
	/// Signing domain version shared by every facade.
	pub const VERSION: &'static str = "1";

	pub fn new(name: &str, chain_id: u64, verifying_contract: Address) -> Self {
		Self {
			hash: compute_domain_hash(name, Self::VERSION, chain_id, &verifying_contract),
			chain_id,
			verifying_contract,
		}
	}

	pub fn hash(&self) -> B256 {
		self.hash
	}

	pub fn chain_id(&self) -> u64 {
		self.chain_id
	}

	pub fn verifying_contract(&self) -> Address {
		self.verifying_contract
	}
}

impl fmt::Display for DomainSeparator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.hash)
	}
}

/// ERC-5267 description of a signing domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip712Domain {
	pub fields: u8,
	pub name: String,
	pub version: String,
	pub chain_id: U256,
	pub verifying_contract: Address,
	pub salt: B256,
	pub extensions: Vec<U256>,
}

impl Eip712Domain {
	pub(crate) fn new(name: &str, separator: &DomainSeparator) -> Self {
		Self {
			fields: DOMAIN_FIELDS,
			name: name.to_string(),
			version: DomainSeparator::VERSION.to_string(),
			chain_id: U256::from(separator.chain_id()),
			verifying_contract: separator.verifying_contract(),
			salt: B256::ZERO,
			extensions: Vec::new(),
		}
	}

	/// Recomputes the domain hash from the described fields.
	pub fn hash(&self) -> B256 {
		compute_domain_hash(
			&self.name,
			&self.version,
			self.chain_id.saturating_to::<u64>(),
			&self.verifying_contract,
		)
	}
}
