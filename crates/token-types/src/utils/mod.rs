//! Utility functions shared by the token facade crates.
//!
//! This module groups typed-data hashing, display formatting of token
//! amounts and the wall-clock helper used to seed block timestamps.

pub mod eip712;
pub mod formatting;
pub mod helpers;

pub use eip712::{
	compute_domain_hash, compute_final_digest, Eip712AbiEncoder, DOMAIN_TYPE, PERMIT_TYPE,
};
pub use formatting::format_token_amount;
pub use helpers::current_timestamp;
