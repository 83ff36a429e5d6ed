//! Builder for constructing a runtime from configuration.
//!
//! Creates the configured ledger implementation through its factory, then
//! deploys every configured facade against it and mints the genesis balances.

use crate::ledger::{LedgerError, LedgerInterface};
use crate::{Runtime, TokenError};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use token_config::Config;
use token_types::current_timestamp;

/// Errors that can occur while building a runtime.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
	#[error("Genesis failed: {0}")]
	Genesis(#[from] TokenError),
}

/// Builder for a [`Runtime`] with a pluggable ledger implementation.
pub struct RuntimeBuilder {
	config: Config,
}

impl RuntimeBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the runtime using `ledger_factories`, keyed by implementation name.
	pub fn build<LF>(self, ledger_factories: &HashMap<String, LF>) -> Result<Runtime, BuilderError>
	where
		LF: Fn(&toml::Value) -> Result<Box<dyn LedgerInterface>, LedgerError>,
	{
		let primary = &self.config.ledger.primary;
		let ledger_config = self
			.config
			.ledger
			.implementations
			.get(primary)
			.ok_or_else(|| {
				BuilderError::Config(format!(
					"Primary ledger '{}' has no configuration",
					primary
				))
			})?;
		let factory = ledger_factories.get(primary).ok_or_else(|| {
			BuilderError::MissingComponent(format!("ledger implementation '{}'", primary))
		})?;

		let ledger: Arc<dyn LedgerInterface> = match factory(ledger_config) {
			Ok(ledger) => Arc::from(ledger),
			Err(e) => {
				tracing::error!(
					component = "ledger",
					implementation = %primary,
					error = %e,
					"Failed to create ledger implementation"
				);
				return Err(BuilderError::Config(format!(
					"Failed to create ledger implementation '{}': {}",
					primary, e
				)));
			},
		};
		tracing::info!(component = "ledger", implementation = %primary, address = %ledger.address(), "Loaded");

		let timestamp = self.config.chain.timestamp.unwrap_or_else(current_timestamp);
		let mut runtime = Runtime::new(self.config.chain.chain_id, timestamp, ledger);

		for token in &self.config.tokens {
			runtime.deploy_token(&token.name, &token.symbol, token.address)?;
			for balance in &token.balances {
				runtime.mint(token.address, balance.account, balance.amount)?;
			}
			tracing::info!(
				component = "genesis",
				token = %token.address,
				holders = token.balances.len(),
				"Seeded balances"
			);
		}

		Ok(runtime)
	}
}
