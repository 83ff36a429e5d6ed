//! Configuration module for the delegated token facade system.
//!
//! A configuration file describes one execution environment: the chain it
//! runs on, the shared ledger backend, the token facades deployed against that
//! ledger (with their genesis balances) and, optionally, the account used to
//! sign permits off-system.
//!
//! Values of the form `${VAR}` or `${VAR:-default}` are replaced with
//! environment variables before parsing.

#[cfg(feature = "testing")]
pub mod builders {
	pub mod config;
}

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use thiserror::Error;
use token_types::{Address, U256};

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Configuration error: {0}")]
	Parse(String),
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the echoed input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Execution environment identity and clock.
	pub chain: ChainConfig,
	/// Shared ledger backend.
	pub ledger: LedgerConfig,
	/// Token facades deployed against the ledger.
	#[serde(default)]
	pub tokens: Vec<TokenConfig>,
	/// Signing account for off-system permit generation.
	pub account: Option<AccountConfig>,
}

/// Execution environment settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainConfig {
	/// Chain id bound into every facade's signing domain.
	pub chain_id: u64,
	/// Initial block timestamp in seconds. Defaults to the wall clock.
	pub timestamp: Option<u64>,
}

/// Configuration for the shared ledger.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
	/// Which implementation to use.
	pub primary: String,
	/// Map of ledger implementation names to their raw configuration tables.
	pub implementations: HashMap<String, toml::Value>,
}

/// A token facade to deploy at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenConfig {
	pub name: String,
	pub symbol: String,
	/// Facade address; also the partition key inside the ledger.
	pub address: Address,
	/// Balances minted when the environment is built.
	#[serde(default)]
	pub balances: Vec<GenesisBalance>,
}

/// A balance minted to an account at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenesisBalance {
	pub account: Address,
	/// Raw amount (18 decimals), as a decimal string or a TOML integer.
	#[serde(deserialize_with = "deserialize_amount")]
	pub amount: U256,
}

/// Accepts `amount = 1000`, `amount = "1000"` and `amount = "0x3e8"`.
fn deserialize_amount<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
	D: serde::Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum RawAmount {
		Integer(u64),
		Text(String),
	}

	match RawAmount::deserialize(deserializer)? {
		RawAmount::Integer(v) => Ok(U256::from(v)),
		RawAmount::Text(s) => U256::from_str(&s)
			.map_err(|e| serde::de::Error::custom(format!("invalid amount '{}': {}", s, e))),
	}
}

/// Configuration for the signing account.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	pub primary: String,
	pub implementations: HashMap<String, toml::Value>,
}

/// Resolves environment variables in a string.
///
/// Replaces `${VAR_NAME}` with the value of `VAR_NAME`, or with the default in
/// `${VAR_NAME:-default}` when the variable is unset.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	// Bounded input keeps the regex scan cheap
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last = 0;
	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};
		result.push_str(&input[last..full_match.start()]);
		result.push_str(&value);
		last = full_match.end();
	}
	result.push_str(&input[last..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let content = tokio::fs::read_to_string(path).await?;
		content.parse()
	}

	/// Checks cross-field constraints serde cannot express.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.chain.chain_id == 0 {
			return Err(ConfigError::Validation(
				"chain_id must be greater than 0".into(),
			));
		}

		if self.ledger.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Ledger primary implementation cannot be empty".into(),
			));
		}
		if !self.ledger.implementations.contains_key(&self.ledger.primary) {
			return Err(ConfigError::Validation(format!(
				"Primary ledger '{}' not found in implementations",
				self.ledger.primary
			)));
		}

		let mut seen = HashSet::new();
		for token in &self.tokens {
			if token.name.is_empty() || token.symbol.is_empty() {
				return Err(ConfigError::Validation(format!(
					"Token at {} must have a name and a symbol",
					token.address
				)));
			}
			if token.address == Address::ZERO {
				return Err(ConfigError::Validation(format!(
					"Token '{}' cannot use the zero address",
					token.symbol
				)));
			}
			if !seen.insert(token.address) {
				return Err(ConfigError::Validation(format!(
					"Duplicate token address {}",
					token.address
				)));
			}
			if let Some(balance) = token.balances.iter().find(|b| b.account == Address::ZERO) {
				return Err(ConfigError::Validation(format!(
					"Token '{}' has a genesis balance of {} for the zero address",
					token.symbol, balance.amount
				)));
			}
		}

		if let Some(account) = &self.account {
			if !account.implementations.contains_key(&account.primary) {
				return Err(ConfigError::Validation(format!(
					"Primary account '{}' not found in implementations",
					account.primary
				)));
			}
		}

		Ok(())
	}

	/// Looks up a configured token by address.
	pub fn token(&self, address: &Address) -> Option<&TokenConfig> {
		self.tokens.iter().find(|t| &t.address == address)
	}
}

/// Parses TOML after resolving environment variables, then validates.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
