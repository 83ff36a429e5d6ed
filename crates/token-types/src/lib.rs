//! Common types module for the delegated token facade system.
//!
//! This module defines the data types shared by the ledger, the token facades,
//! the signing accounts and the configuration layer, so that every component
//! agrees on addresses, amounts, notifications and typed-data hashing.

/// Notifications emitted by token facades.
pub mod events;
/// Registry trait for configuration-selected implementations.
pub mod registry;
/// Redacting wrapper for private keys and other secrets.
pub mod secret_string;
/// EIP-712 hashing, formatting and time helpers.
pub mod utils;
/// Configuration validation types for implementation-specific TOML tables.
pub mod validation;

pub use alloy_primitives::{Address, B256, U256};
pub use events::*;
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use utils::{
	compute_domain_hash, compute_final_digest, current_timestamp, format_token_amount,
	Eip712AbiEncoder, DOMAIN_TYPE, PERMIT_TYPE,
};
pub use validation::*;
