//! Token facades.
//!
//! A [`TokenView`] owns no balances. Reads are answered by the shared ledger
//! from the facade's own partition, and writes are forwarded to it with the
//! facade as the calling identity. The ledger reports every mutation back
//! through [`TokenView::emit_transfer`] and [`TokenView::emit_approval`], so
//! the notifications are attributed to the facade.
//!
//! Every mutating entry point runs in a frame executed by the facade, so its
//! caller is whoever invoked the facade and its writes are undone together if
//! it fails.

mod domain;
mod guard;
mod permit;

pub use domain::{DomainSeparator, Eip712Domain};
pub use guard::LedgerGuard;
pub use permit::{PermitAuthorizer, PermitMessage, PermitSignature};

use crate::{CallContext, TokenError};
use token_types::{Address, EmittedEvent, TokenEvent, B256, U256};

/// ERC-165 interface ids answered by every facade.
pub mod interfaces {
	pub const ERC165: [u8; 4] = [0x01, 0xff, 0xc9, 0xa7];
	pub const ERC20: [u8; 4] = [0x36, 0x37, 0x2b, 0x07];
	pub const ERC20_METADATA: [u8; 4] = [0xa2, 0x19, 0xa0, 0x25];
	pub const ERC2612: [u8; 4] = [0x9d, 0x8f, 0xf7, 0xda];
	pub const ERC5267: [u8; 4] = [0x84, 0xb0, 0x19, 0x6e];
}

#[derive(Debug, Clone)]
pub struct TokenView {
	name: String,
	symbol: String,
	address: Address,
	guard: LedgerGuard,
	authorizer: PermitAuthorizer,
}

impl TokenView {
	pub const DECIMALS: u8 = 18;

	/// Creates a facade at `address` that accepts callbacks only from `ledger`.
	pub fn new(name: &str, symbol: &str, address: Address, ledger: Address, chain_id: u64) -> Self {
		let domain = DomainSeparator::new(name, chain_id, address);
		Self {
			name: name.to_string(),
			symbol: symbol.to_string(),
			address,
			guard: LedgerGuard::new(ledger),
			authorizer: PermitAuthorizer::new(address, domain),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn symbol(&self) -> &str {
		&self.symbol
	}

	pub fn decimals(&self) -> u8 {
		Self::DECIMALS
	}

	pub fn address(&self) -> Address {
		self.address
	}

	/// The only address allowed to call the notification entry points.
	pub fn ledger(&self) -> Address {
		self.guard.ledger()
	}

	pub fn domain_separator(&self) -> B256 {
		self.authorizer.domain().hash()
	}

	pub fn eip712_domain(&self) -> Eip712Domain {
		Eip712Domain::new(&self.name, self.authorizer.domain())
	}

	pub fn supports_interface(&self, interface_id: [u8; 4]) -> bool {
		[
			interfaces::ERC165,
			interfaces::ERC20,
			interfaces::ERC20_METADATA,
			interfaces::ERC2612,
			interfaces::ERC5267,
		]
		.contains(&interface_id)
	}

	pub fn total_supply(&self, ctx: &CallContext<'_>) -> U256 {
		ctx.ledger().total_supply(ctx, self.address)
	}

	pub fn balance_of(&self, ctx: &CallContext<'_>, account: Address) -> U256 {
		ctx.ledger().balance_of(ctx, self.address, account)
	}

	pub fn allowance(&self, ctx: &CallContext<'_>, owner: Address, spender: Address) -> U256 {
		ctx.ledger().allowance(ctx, self.address, owner, spender)
	}

	/// Moves `amount` from the caller to `to`.
	pub fn transfer(
		&self,
		ctx: &mut CallContext<'_>,
		to: Address,
		amount: U256,
	) -> Result<bool, TokenError> {
		ctx.enter(self.address, |ctx| {
			let owner = ctx.caller();
			let ledger = ctx.ledger();
			tracing::debug!(token = %self.address, from = %owner, to = %to, amount = %amount, "Forwarding transfer");
			ctx.enter(ledger.address(), |ctx| ledger.transfer(ctx, owner, to, amount))
		})
	}

	/// Sets the allowance the caller grants `spender`.
	pub fn approve(
		&self,
		ctx: &mut CallContext<'_>,
		spender: Address,
		amount: U256,
	) -> Result<bool, TokenError> {
		ctx.enter(self.address, |ctx| {
			let owner = ctx.caller();
			let ledger = ctx.ledger();
			tracing::debug!(token = %self.address, owner = %owner, spender = %spender, amount = %amount, "Forwarding approve");
			ctx.enter(ledger.address(), |ctx| ledger.approve(ctx, owner, spender, amount))
		})
	}

	/// Moves `amount` from `from` to `to`, spending the allowance `from`
	/// granted the caller.
	pub fn transfer_from(
		&self,
		ctx: &mut CallContext<'_>,
		from: Address,
		to: Address,
		amount: U256,
	) -> Result<bool, TokenError> {
		ctx.enter(self.address, |ctx| {
			let spender = ctx.caller();
			let ledger = ctx.ledger();
			tracing::debug!(
				token = %self.address,
				spender = %spender,
				from = %from,
				to = %to,
				amount = %amount,
				"Forwarding transferFrom"
			);
			ctx.enter(ledger.address(), |ctx| {
				ledger.transfer_from(ctx, spender, from, to, amount)
			})
		})
	}

	/// Sets `owner`'s allowance for `spender` from an off-system signature.
	/// Anyone may submit it.
	pub fn permit(
		&self,
		ctx: &mut CallContext<'_>,
		owner: Address,
		spender: Address,
		value: U256,
		deadline: U256,
		signature: &PermitSignature,
	) -> Result<(), TokenError> {
		ctx.enter(self.address, |ctx| {
			self.authorizer
				.permit(ctx, owner, spender, value, deadline, signature)
		})
	}

	pub fn nonces(&self, ctx: &CallContext<'_>, owner: Address) -> U256 {
		self.authorizer.nonces(ctx, owner)
	}

	/// Consumes the caller's current nonce and returns it.
	pub fn increment_nonce(&self, ctx: &mut CallContext<'_>) -> Result<U256, TokenError> {
		ctx.enter(self.address, |ctx| Ok(self.authorizer.increment_nonce(ctx)))
	}

	/// Records a `Transfer` attributed to this facade. Ledger only.
	pub fn emit_transfer(
		&self,
		ctx: &mut CallContext<'_>,
		from: Address,
		to: Address,
		amount: U256,
	) -> Result<(), TokenError> {
		ctx.enter(self.address, |ctx| {
			self.authorize_callback(ctx, "emitTransfer")?;
			ctx.journal_mut().emit(EmittedEvent::new(
				self.address,
				TokenEvent::Transfer {
					from,
					to,
					value: amount,
				},
			));
			Ok(())
		})
	}

	/// Records an `Approval` attributed to this facade. Ledger only.
	pub fn emit_approval(
		&self,
		ctx: &mut CallContext<'_>,
		owner: Address,
		spender: Address,
		amount: U256,
	) -> Result<(), TokenError> {
		ctx.enter(self.address, |ctx| {
			self.authorize_callback(ctx, "emitApproval")?;
			ctx.journal_mut().emit(EmittedEvent::new(
				self.address,
				TokenEvent::Approval {
					owner,
					spender,
					value: amount,
				},
			));
			Ok(())
		})
	}

	fn authorize_callback(&self, ctx: &CallContext<'_>, entry: &str) -> Result<(), TokenError> {
		self.guard.ensure(ctx.caller()).inspect_err(|_| {
			tracing::warn!(
				token = %self.address,
				caller = %ctx.caller(),
				entry = entry,
				"Rejected notification from non-ledger caller"
			);
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn view() -> TokenView {
		TokenView::new(
			"Pool Token",
			"BPT",
			Address::repeat_byte(0x11),
			Address::repeat_byte(0xba),
			1,
		)
	}

	#[test]
	fn test_metadata() {
		let token = view();
		assert_eq!(token.name(), "Pool Token");
		assert_eq!(token.symbol(), "BPT");
		assert_eq!(token.decimals(), 18);
		assert_eq!(token.ledger(), Address::repeat_byte(0xba));
		assert_eq!(
			token.domain_separator(),
			DomainSeparator::new("Pool Token", 1, Address::repeat_byte(0x11)).hash()
		);
	}

	#[test]
	fn test_supports_interface() {
		let token = view();
		assert!(token.supports_interface(interfaces::ERC20));
		assert!(token.supports_interface(interfaces::ERC2612));
		assert!(token.supports_interface(interfaces::ERC165));
		assert!(!token.supports_interface([0xff, 0xff, 0xff, 0xff]));
	}

	#[test]
	fn test_eip712_domain_matches_separator() {
		let token = view();
		let domain = token.eip712_domain();
		assert_eq!(domain.name, "Pool Token");
		assert_eq!(domain.chain_id, U256::from(1));
		assert_eq!(domain.verifying_contract, token.address());
		assert_eq!(domain.hash(), token.domain_separator());
	}
}
