//! Configuration builder for tests and local development.
//!
//! Produces a `Config` backed by the in-memory ledger without going through
//! TOML text.

use crate::{ChainConfig, Config, GenesisBalance, LedgerConfig, TokenConfig};
use std::collections::HashMap;
use token_types::{Address, U256};

/// Builder for creating `Config` instances with a fluent API.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	chain_id: u64,
	timestamp: Option<u64>,
	ledger_address: Address,
	tokens: Vec<TokenConfig>,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	/// Chain 31337, a fixed timestamp and the memory ledger at `0xba12…`.
	pub fn new() -> Self {
		Self {
			chain_id: 31337,
			timestamp: Some(1_700_000_000),
			ledger_address: Address::repeat_byte(0xba),
			tokens: Vec::new(),
		}
	}

	pub fn chain_id(mut self, chain_id: u64) -> Self {
		self.chain_id = chain_id;
		self
	}

	pub fn timestamp(mut self, timestamp: Option<u64>) -> Self {
		self.timestamp = timestamp;
		self
	}

	pub fn ledger_address(mut self, address: Address) -> Self {
		self.ledger_address = address;
		self
	}

	/// Adds a token facade with the given genesis balances.
	pub fn token(
		mut self,
		name: &str,
		symbol: &str,
		address: Address,
		balances: &[(Address, U256)],
	) -> Self {
		self.tokens.push(TokenConfig {
			name: name.to_string(),
			symbol: symbol.to_string(),
			address,
			balances: balances
				.iter()
				.map(|(account, amount)| GenesisBalance {
					account: *account,
					amount: *amount,
				})
				.collect(),
		});
		self
	}

	pub fn build(self) -> Config {
		let mut memory = toml::map::Map::new();
		memory.insert(
			"address".to_string(),
			toml::Value::String(self.ledger_address.to_string()),
		);

		Config {
			chain: ChainConfig {
				chain_id: self.chain_id,
				timestamp: self.timestamp,
			},
			ledger: LedgerConfig {
				primary: "memory".to_string(),
				implementations: HashMap::from([(
					"memory".to_string(),
					toml::Value::Table(memory),
				)]),
			},
			tokens: self.tokens,
			account: None,
		}
	}
}
