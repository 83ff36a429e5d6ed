//! Registry of ledger and account implementations.
//!
//! Every implementation crate lists its factories; this module collects them
//! once and resolves the names used in a configuration file against them.

use std::collections::HashMap;
use std::sync::OnceLock;
use token_account::{AccountFactory, AccountService};
use token_config::Config;
use token_core::{LedgerFactory, Runtime, RuntimeBuilder};

/// Global registry for all implementation factories
pub struct FactoryRegistry {
	pub ledger: HashMap<String, LedgerFactory>,
	pub account: HashMap<String, AccountFactory>,
}

impl FactoryRegistry {
	pub fn new() -> Self {
		Self {
			ledger: HashMap::new(),
			account: HashMap::new(),
		}
	}

	pub fn register_ledger(&mut self, name: impl Into<String>, factory: LedgerFactory) {
		self.ledger.insert(name.into(), factory);
	}

	pub fn register_account(&mut self, name: impl Into<String>, factory: AccountFactory) {
		self.account.insert(name.into(), factory);
	}
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Get the global factory registry, populating it on first use
pub fn get_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();

		for (name, factory) in token_core::ledger::get_all_implementations() {
			tracing::debug!("Registering ledger implementation: {}", name);
			registry.register_ledger(name, factory);
		}

		for (name, factory) in token_account::get_all_implementations() {
			tracing::debug!("Registering account implementation: {}", name);
			registry.register_account(name, factory);
		}

		registry
	})
}

/// Picks the registered factories for every implementation a config names.
macro_rules! build_factories {
	($registry:expr, $config_impls:expr, $registry_field:ident, $type_name:literal) => {{
		let mut factories = HashMap::new();
		for name in $config_impls.keys() {
			if let Some(factory) = $registry.$registry_field.get(name) {
				factories.insert(name.clone(), *factory);
			} else {
				let mut available: Vec<_> = $registry.$registry_field.keys().cloned().collect();
				available.sort();
				return Err(format!(
					"Unknown {} implementation '{}'. Available: [{}]",
					$type_name,
					name,
					available.join(", ")
				)
				.into());
			}
		}
		factories
	}};
}

/// Builds the runtime, its ledger and genesis state from config.
pub fn build_runtime_from_config(config: &Config) -> Result<Runtime, Box<dyn std::error::Error>> {
	let registry = get_registry();
	let ledger_factories = build_factories!(registry, config.ledger.implementations, ledger, "ledger");

	Ok(RuntimeBuilder::new(config.clone()).build(&ledger_factories)?)
}

/// Builds the configured signing account.
pub fn build_account_from_config(
	config: &Config,
) -> Result<AccountService, Box<dyn std::error::Error>> {
	let account = config
		.account
		.as_ref()
		.ok_or("Configuration has no [account] section")?;
	let registry = get_registry();
	let factories: HashMap<String, AccountFactory> =
		build_factories!(registry, account.implementations, account, "account");

	let (factory, account_config) = factories
		.get(&account.primary)
		.zip(account.implementations.get(&account.primary))
		.ok_or_else(|| format!("Primary account '{}' is not configured", account.primary))?;
	let implementation = factory(account_config)?;
	tracing::info!(component = "account", implementation = %account.primary, "Loaded");

	Ok(AccountService::new(implementation))
}
