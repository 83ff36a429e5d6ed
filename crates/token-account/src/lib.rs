//! Account management for off-system permit signing.
//!
//! A permit is authorized by a signature the balance owner produces without
//! touching the ledger. This crate provides the signing side: an interface for
//! accounts that can sign a 32-byte typed-data digest, and a service wrapper
//! used by the tooling and the tests.

use async_trait::async_trait;
use thiserror::Error;
use token_types::{Address, ConfigSchema, ImplementationRegistry, B256};

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

/// A 65-byte `r || s || v` signature with `v` in {27, 28}.
pub type RawSignature = [u8; 65];

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	#[error("Implementation error: {0}")]
	Implementation(String),
}

/// Interface implemented by every signing account.
#[async_trait]
pub trait AccountInterface: Send + Sync {
	/// Schema the implementation's TOML table must satisfy.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Address whose signatures this account produces.
	async fn address(&self) -> Result<Address, AccountError>;

	/// Signs a prehashed digest without any message prefix, as typed-data
	/// signing requires.
	async fn sign_hash(&self, hash: &B256) -> Result<RawSignature, AccountError>;
}

/// Type alias for account factory functions.
pub type AccountFactory = fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError>;

/// Registry trait for account implementations.
pub trait AccountRegistry: ImplementationRegistry<Factory = AccountFactory> {}

/// All registered account implementations as `(name, factory)` pairs.
pub fn get_all_implementations() -> Vec<(&'static str, AccountFactory)> {
	use implementations::local;

	vec![(local::Registry::NAME, local::Registry::factory())]
}

/// Service wrapping the configured account implementation.
pub struct AccountService {
	implementation: Box<dyn AccountInterface>,
}

impl AccountService {
	pub fn new(implementation: Box<dyn AccountInterface>) -> Self {
		Self { implementation }
	}

	pub async fn get_address(&self) -> Result<Address, AccountError> {
		self.implementation.address().await
	}

	/// Signs an EIP-712 digest.
	pub async fn sign_digest(&self, digest: &B256) -> Result<RawSignature, AccountError> {
		let signature = self.implementation.sign_hash(digest).await?;
		tracing::debug!(digest = %digest, "Signed typed-data digest");
		Ok(signature)
	}
}
