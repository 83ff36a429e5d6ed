//! Configuration validation for implementation-specific TOML tables.
//!
//! Ledger backends and signing accounts receive their own raw TOML table from
//! the configuration file. Each implementation describes the table it expects
//! with a [`Schema`] so that mistakes are reported before anything is built.

use alloy_primitives::{Address, U256};
use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
	#[error("Missing required field: {0}")]
	MissingField(String),
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
}

/// The type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	String,
	/// An integer with optional inclusive bounds.
	Integer {
		min: Option<i64>,
		max: Option<i64>,
	},
	/// A `0x`-prefixed 20-byte hex address.
	Address,
	/// A token amount: a non-negative integer or a decimal string that fits
	/// in 256 bits.
	Amount,
	Table(Schema),
}

/// Custom check run after the type check succeeded.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn check(&self, prefix: &str, value: &toml::Value) -> Result<(), ValidationError> {
		let path = qualify(prefix, &self.name);
		validate_field_type(&path, value, &self.field_type)?;
		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| ValidationError::InvalidValue {
				field: path,
				message,
			})?;
		}
		Ok(())
	}
}

/// Validation schema for a TOML table: fields that must be present and
/// fields that are checked only when present.
#[derive(Debug, Default)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML value against this schema. Nested tables report
	/// failures with dotted field paths such as `genesis.amount`.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		self.validate_at("", config)
	}

	fn validate_at(&self, prefix: &str, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: if prefix.is_empty() {
					"root".to_string()
				} else {
					prefix.to_string()
				},
				expected: "table".to_string(),
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(qualify(prefix, &field.name)))?;
			field.check(prefix, value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				field.check(prefix, value)?;
			}
		}

		Ok(())
	}
}

fn qualify(prefix: &str, name: &str) -> String {
	if prefix.is_empty() {
		name.to_string()
	} else {
		format!("{}.{}", prefix, name)
	}
}

fn mismatch(field: &str, expected: &str, value: &toml::Value) -> ValidationError {
	ValidationError::TypeMismatch {
		field: field.to_string(),
		expected: expected.to_string(),
		actual: value.type_str().to_string(),
	}
}

fn validate_field_type(
	field: &str,
	value: &toml::Value,
	expected: &FieldType,
) -> Result<(), ValidationError> {
	match expected {
		FieldType::String => {
			if !value.is_str() {
				return Err(mismatch(field, "string", value));
			}
		},
		FieldType::Integer { min, max } => {
			let int_val = value
				.as_integer()
				.ok_or_else(|| mismatch(field, "integer", value))?;
			if let Some(min_val) = min {
				if int_val < *min_val {
					return Err(ValidationError::InvalidValue {
						field: field.to_string(),
						message: format!("Value {} is less than minimum {}", int_val, min_val),
					});
				}
			}
			if let Some(max_val) = max {
				if int_val > *max_val {
					return Err(ValidationError::InvalidValue {
						field: field.to_string(),
						message: format!("Value {} is greater than maximum {}", int_val, max_val),
					});
				}
			}
		},
		FieldType::Address => {
			let s = value
				.as_str()
				.ok_or_else(|| mismatch(field, "address string", value))?;
			if !s.starts_with("0x") || s.parse::<Address>().is_err() {
				return Err(ValidationError::InvalidValue {
					field: field.to_string(),
					message: format!("'{}' is not a 0x-prefixed 20-byte address", s),
				});
			}
		},
		FieldType::Amount => match value {
			toml::Value::Integer(i) if *i >= 0 => {},
			toml::Value::Integer(i) => {
				return Err(ValidationError::InvalidValue {
					field: field.to_string(),
					message: format!("Amount {} is negative", i),
				});
			},
			toml::Value::String(s) => {
				s.parse::<U256>()
					.map_err(|e| ValidationError::InvalidValue {
						field: field.to_string(),
						message: format!("'{}' is not a valid amount: {}", s, e),
					})?;
			},
			other => return Err(mismatch(field, "amount", other)),
		},
		FieldType::Table(schema) => schema.validate_at(field, value)?,
	}

	Ok(())
}

/// A configuration schema that can validate a raw TOML table.
///
/// Implemented by every configurable ledger backend and signing account.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}
