//! Signature-based allowance approval (EIP-2612).
//!
//! An owner signs a [`PermitMessage`] off-system; anyone may then submit it to
//! the facade. The [`PermitAuthorizer`] checks the deadline, rebuilds the
//! digest with the owner's current nonce, consumes that nonce and asks the
//! ledger to set the allowance. A permit is single-use: once its nonce is
//! consumed the same signature hashes to a different digest and recovers to
//! some other address.

use super::domain::DomainSeparator;
use crate::{CallContext, TokenError};
use alloy_primitives::{keccak256, PrimitiveSignature};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use token_types::{
	compute_final_digest, Address, Eip712AbiEncoder, B256, PERMIT_TYPE, U256,
};

/// Half the secp256k1 group order. Signatures with a larger `s` are
/// malleable duplicates and are rejected.
const SECP256K1N_HALF: U256 = U256::from_limbs([
	0xdfe9_2f46_681b_20a0,
	0x5d57_6e73_57a4_501d,
	0xffff_ffff_ffff_ffff,
	0x7fff_ffff_ffff_ffff,
]);

static PERMIT_TYPEHASH: Lazy<B256> = Lazy::new(|| keccak256(PERMIT_TYPE.as_bytes()));

/// The typed-data message an owner signs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitMessage {
	pub owner: Address,
	pub spender: Address,
	pub value: U256,
	pub nonce: U256,
	pub deadline: U256,
}

impl PermitMessage {
	/// keccak256(abi.encode(PERMIT_TYPEHASH, owner, spender, value, nonce, deadline))
	pub fn struct_hash(&self) -> B256 {
		let mut enc = Eip712AbiEncoder::new();
		enc.push_b256(&PERMIT_TYPEHASH);
		enc.push_address(&self.owner);
		enc.push_address(&self.spender);
		enc.push_u256(self.value);
		enc.push_u256(self.nonce);
		enc.push_u256(self.deadline);
		keccak256(enc.finish())
	}

	/// The digest the owner signs for the facade described by `domain`.
	pub fn digest(&self, domain: &DomainSeparator) -> B256 {
		compute_final_digest(&domain.hash(), &self.struct_hash())
	}
}

/// An `(v, r, s)` secp256k1 signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitSignature {
	pub v: u8,
	pub r: B256,
	pub s: B256,
}

impl PermitSignature {
	pub fn new(v: u8, r: B256, s: B256) -> Self {
		Self { v, r, s }
	}

	/// Splits a 65-byte `r || s || v` signature. A recovery id of 0 or 1 is
	/// shifted to 27 or 28.
	pub fn from_bytes(bytes: &[u8; 65]) -> Self {
		let v = match bytes[64] {
			v @ (0 | 1) => v + 27,
			v => v,
		};
		Self {
			v,
			r: B256::from_slice(&bytes[..32]),
			s: B256::from_slice(&bytes[32..64]),
		}
	}

	pub fn to_bytes(&self) -> [u8; 65] {
		let mut out = [0u8; 65];
		out[..32].copy_from_slice(self.r.as_slice());
		out[32..64].copy_from_slice(self.s.as_slice());
		out[64] = self.v;
		out
	}

	/// Recovers the address that signed `digest`.
	pub fn recover(&self, digest: &B256) -> Result<Address, TokenError> {
		let parity = match self.v {
			27 => false,
			28 => true,
			v => {
				return Err(TokenError::InvalidSignature(format!(
					"Invalid recovery id {v}"
				)))
			},
		};
		let r = U256::from_be_bytes(self.r.0);
		let s = U256::from_be_bytes(self.s.0);
		if r.is_zero() || s.is_zero() {
			return Err(TokenError::InvalidSignature(
				"Zero signature component".to_string(),
			));
		}
		if s > SECP256K1N_HALF {
			return Err(TokenError::InvalidSignature(
				"Signature s value in upper half order".to_string(),
			));
		}

		let recovered = PrimitiveSignature::new(r, s, parity)
			.recover_address_from_prehash(digest)
			.map_err(|e| TokenError::InvalidSignature(e.to_string()))?;
		if recovered == Address::ZERO {
			return Err(TokenError::InvalidSignature(
				"Signature recovers to the zero address".to_string(),
			));
		}
		Ok(recovered)
	}
}

/// Validates permits for one facade and keeps its owners' nonces.
#[derive(Debug, Clone)]
pub struct PermitAuthorizer {
	token: Address,
	domain: DomainSeparator,
}

impl PermitAuthorizer {
	pub fn new(token: Address, domain: DomainSeparator) -> Self {
		Self { token, domain }
	}

	pub fn domain(&self) -> &DomainSeparator {
		&self.domain
	}

	/// Current nonce of `owner`; the one the next permit must be signed with.
	pub fn nonces(&self, ctx: &CallContext<'_>, owner: Address) -> U256 {
		ctx.journal().nonce(self.token, owner)
	}

	/// Returns the owner's current nonce and advances it by one.
	fn use_nonce(&self, ctx: &mut CallContext<'_>, owner: Address) -> U256 {
		let nonce = self.nonces(ctx, owner);
		ctx.journal_mut()
			.set_nonce(self.token, owner, nonce.saturating_add(U256::from(1)));
		nonce
	}

	/// Consumes the caller's current nonce, voiding any permit signed with it.
	/// Runs in the facade's frame.
	pub(crate) fn increment_nonce(&self, ctx: &mut CallContext<'_>) -> U256 {
		let owner = ctx.caller();
		let nonce = self.use_nonce(ctx, owner);
		tracing::debug!(token = %self.token, owner = %owner, nonce = %nonce, "Nonce invalidated");
		nonce
	}

	/// Verifies a signed permit and sets the allowance on the owner's behalf.
	///
	/// Runs in the facade's frame, so on failure nothing the permit wrote
	/// survives, the nonce included.
	pub(crate) fn permit(
		&self,
		ctx: &mut CallContext<'_>,
		owner: Address,
		spender: Address,
		value: U256,
		deadline: U256,
		signature: &PermitSignature,
	) -> Result<(), TokenError> {
		match self.authorize(ctx, owner, spender, value, deadline, signature) {
			Ok(nonce) => {
				tracing::info!(
					token = %self.token,
					owner = %owner,
					spender = %spender,
					value = %value,
					nonce = %nonce,
					relayer = %ctx.caller(),
					"Permit accepted"
				);
				Ok(())
			},
			Err(e) => {
				tracing::warn!(
					token = %self.token,
					owner = %owner,
					spender = %spender,
					error = %e,
					"Permit rejected"
				);
				Err(e)
			},
		}
	}

	fn authorize(
		&self,
		ctx: &mut CallContext<'_>,
		owner: Address,
		spender: Address,
		value: U256,
		deadline: U256,
		signature: &PermitSignature,
	) -> Result<U256, TokenError> {
		if U256::from(ctx.timestamp()) > deadline {
			return Err(TokenError::ExpiredAuthorization { deadline });
		}

		let nonce = self.use_nonce(ctx, owner);
		let digest = PermitMessage {
			owner,
			spender,
			value,
			nonce,
			deadline,
		}
		.digest(&self.domain);

		let recovered = signature.recover(&digest)?;
		if recovered != owner {
			return Err(TokenError::InvalidSigner {
				recovered,
				expected: owner,
			});
		}

		let ledger = ctx.ledger();
		ctx.enter(ledger.address(), |ctx| {
			ledger.set_allowance(ctx, owner, spender, value)
		})?;
		Ok(nonce)
	}
}
