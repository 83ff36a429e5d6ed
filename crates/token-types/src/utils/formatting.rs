//! Display formatting for raw token amounts.

use alloy_primitives::U256;

/// Formats a raw token amount with decimal places for display.
///
/// `format_token_amount(U256::from(1_500_000u64), 6)` yields `"1.5"`;
/// trailing zeros of the fractional part are dropped.
pub fn format_token_amount(amount: U256, decimals: u8) -> String {
	let digits = amount.to_string();
	if decimals == 0 {
		return digits;
	}

	let places = decimals as usize;
	let (integer_part, fraction_part) = if digits.len() <= places {
		("0".to_string(), format!("{:0>width$}", digits, width = places))
	} else {
		let split = digits.len() - places;
		(digits[..split].to_string(), digits[split..].to_string())
	};

	let fraction = fraction_part.trim_end_matches('0');
	if fraction.is_empty() {
		integer_part
	} else {
		format!("{}.{}", integer_part, fraction)
	}
}
