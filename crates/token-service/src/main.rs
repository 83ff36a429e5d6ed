//! Main entry point for the token facade tooling.
//!
//! Builds the runtime described by a configuration file (ledger, facades and
//! genesis balances) and either reports on it or signs permits off-system
//! with the configured account.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use token_config::Config;
use token_types::{Address, U256};

mod commands;
mod factory_registry;

use commands::PermitRequest;
use factory_registry::{build_account_from_config, build_runtime_from_config};

/// Command-line arguments for the token tooling.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Print facade metadata, signing domains and genesis balances as JSON
	Inspect,
	/// Sign an EIP-2612 permit with the configured account
	SignPermit {
		/// Facade the permit is for
		#[arg(long)]
		token: Address,
		/// Address being granted the allowance
		#[arg(long)]
		spender: Address,
		/// Allowance in raw units
		#[arg(long)]
		value: U256,
		/// Unix timestamp after which the permit is void
		#[arg(long)]
		deadline: Option<U256>,
		/// Nonce to sign for; defaults to the owner's current nonce
		#[arg(long)]
		nonce: Option<U256>,
	},
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
	fmt()
		.with_env_filter(env_filter)
		.with_target(true)
		.with_writer(std::io::stderr)
		.init();

	let path = args
		.config
		.to_str()
		.ok_or("Configuration path is not valid UTF-8")?;
	let config = Config::from_file(path).await?;
	tracing::info!(
		chain_id = config.chain.chain_id,
		tokens = config.tokens.len(),
		"Loaded configuration"
	);

	let runtime = build_runtime_from_config(&config)?;

	match args.command {
		Command::Inspect => {
			let reports = commands::inspect(&config, &runtime)?;
			println!("{}", serde_json::to_string_pretty(&reports)?);
		},
		Command::SignPermit {
			token,
			spender,
			value,
			deadline,
			nonce,
		} => {
			let account = build_account_from_config(&config)?;
			let signed = commands::sign_permit(
				&runtime,
				&account,
				PermitRequest {
					token,
					spender,
					value,
					deadline,
					nonce,
				},
			)
			.await?;
			println!("{}", serde_json::to_string_pretty(&signed)?);
		},
	}

	Ok(())
}
