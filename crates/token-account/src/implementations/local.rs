//! Local private-key account.
//!
//! Holds a secp256k1 key in memory and signs digests with it. The key is
//! taken from the `private_key` field of `[account.implementations.local]`,
//! usually via `${ENV_VAR}` substitution.

use crate::{AccountError, AccountInterface, RawSignature};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use token_types::{
	Address, ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, SecretString,
	ValidationError, B256,
};

/// Account backed by a private key held in memory.
pub struct LocalAccount {
	signer: PrivateKeySigner,
}

impl LocalAccount {
	/// Parses a hex private key, with or without `0x`.
	pub fn from_private_key(private_key: &SecretString) -> Result<Self, AccountError> {
		let signer = private_key.with_exposed(|key| {
			key.parse::<PrivateKeySigner>()
				.map_err(|_| AccountError::InvalidKey("Invalid private key format".to_string()))
		})?;
		Ok(Self { signer })
	}

	pub fn address(&self) -> Address {
		self.signer.address()
	}

	/// Signs a prehashed digest synchronously.
	pub fn sign_digest(&self, hash: &B256) -> Result<RawSignature, AccountError> {
		let signature = self
			.signer
			.sign_hash_sync(hash)
			.map_err(|e| AccountError::SigningFailed(e.to_string()))?;
		let mut bytes = signature.as_bytes();
		if bytes[64] < 27 {
			bytes[64] += 27;
		}
		Ok(bytes)
	}
}

#[async_trait]
impl AccountInterface for LocalAccount {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(LocalAccountSchema)
	}

	async fn address(&self) -> Result<Address, AccountError> {
		Ok(self.signer.address())
	}

	async fn sign_hash(&self, hash: &B256) -> Result<RawSignature, AccountError> {
		self.sign_digest(hash)
	}
}

/// Configuration schema for `LocalAccount`.
pub struct LocalAccountSchema;

impl ConfigSchema for LocalAccountSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("private_key", FieldType::String).with_validator(|value| {
				let key = value.as_str().unwrap_or_default();
				let hex = key.strip_prefix("0x").unwrap_or(key);
				if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
					return Err("Private key must be 32 bytes of hex".to_string());
				}
				Ok(())
			})],
			vec![],
		);
		schema.validate(config)
	}
}

/// Factory function to create a local account from configuration.
///
/// Configuration parameters:
/// - `private_key`: hex-encoded secp256k1 key
pub fn create_account(config: &toml::Value) -> Result<Box<dyn AccountInterface>, AccountError> {
	LocalAccountSchema
		.validate(config)
		.map_err(|e| AccountError::InvalidKey(e.to_string()))?;

	let private_key = config
		.get("private_key")
		.and_then(|v| v.as_str())
		.map(SecretString::from)
		.ok_or_else(|| AccountError::InvalidKey("private_key is required".to_string()))?;

	Ok(Box::new(LocalAccount::from_private_key(&private_key)?))
}

/// Registry for the local account implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "local";
	type Factory = crate::AccountFactory;

	fn factory() -> Self::Factory {
		create_account
	}
}

impl crate::AccountRegistry for Registry {}
