//! Registry trait for self-registering implementations.
//!
//! Ledger backends and signing accounts are selected by name from the
//! configuration file. Each implementation module exposes a `Registry` struct
//! implementing this trait so the name and the factory live next to the code.

/// Base trait for implementation registries.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation,
	/// e.g. `"memory"` for `[ledger.implementations.memory]` or `"local"` for
	/// `[account.implementations.local]`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
