//! Generic EIP-712 utilities shared by the facades and the signing tools.
//!
//! These helpers provide:
//! - Domain hash computation for `(name, version, chainId, verifyingContract)`
//! - Final digest computation (0x1901 || domainHash || structHash)
//! - A minimal ABI encoder for the static field types used in struct hashing
//!
//! Everything here is deterministic so that signers can reproduce a facade's
//! digest off-system from public data only.

use alloy_primitives::{keccak256, Address, B256, U256};

/// Type string of the signing domain used by every token facade.
pub const DOMAIN_TYPE: &str =
	"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";
/// Type string of the EIP-2612 permit message.
pub const PERMIT_TYPE: &str =
	"Permit(address owner,address spender,uint256 value,uint256 nonce,uint256 deadline)";

/// Compute the EIP-712 domain hash:
/// keccak256(abi.encode(typeHash, keccak(name), keccak(version), chainId, verifyingContract)).
pub fn compute_domain_hash(
	name: &str,
	version: &str,
	chain_id: u64,
	verifying_contract: &Address,
) -> B256 {
	let mut enc = Eip712AbiEncoder::new();
	enc.push_b256(&keccak256(DOMAIN_TYPE.as_bytes()));
	enc.push_b256(&keccak256(name.as_bytes()));
	enc.push_b256(&keccak256(version.as_bytes()));
	enc.push_u256(U256::from(chain_id));
	enc.push_address(verifying_contract);
	keccak256(enc.finish())
}

/// Compute the final EIP-712 digest: keccak256(0x1901 || domainHash || structHash).
pub fn compute_final_digest(domain_hash: &B256, struct_hash: &B256) -> B256 {
	let mut out = Vec::with_capacity(2 + 32 + 32);
	out.push(0x19);
	out.push(0x01);
	out.extend_from_slice(domain_hash.as_slice());
	out.extend_from_slice(struct_hash.as_slice());
	keccak256(out)
}

/// Minimal ABI encoder for static types used in EIP-712 struct hashing.
/// Every pushed value occupies exactly one 32-byte word.
#[derive(Debug, Default)]
pub struct Eip712AbiEncoder {
	buf: Vec<u8>,
}

impl Eip712AbiEncoder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push_b256(&mut self, v: &B256) {
		self.buf.extend_from_slice(v.as_slice());
	}

	/// Left-pads a 20-byte address to a full word.
	pub fn push_address(&mut self, addr: &Address) {
		let mut word = [0u8; 32];
		word[12..].copy_from_slice(addr.as_slice());
		self.buf.extend_from_slice(&word);
	}

	pub fn push_u256(&mut self, v: U256) {
		self.buf.extend_from_slice(&v.to_be_bytes::<32>());
	}

	pub fn finish(self) -> Vec<u8> {
		self.buf
	}
}
