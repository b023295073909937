//! Definition Schema Validator
//!
//! Validates a parsed definition against the embedded JSON Schema before
//! serde deserialization, so every structural problem is reported at once.

use std::sync::OnceLock;

use jsonschema::Validator;
use serde_json::Value;

use crate::error::FlowError;

/// Embedded schema JSON (compiled at build time)
const SCHEMA_JSON: &str = include_str!("../../schemas/httpflow-definition.schema.json");

/// Global schema validator instance (lazy initialization)
static VALIDATOR: OnceLock<Result<Validator, String>> = OnceLock::new();

pub struct DefinitionSchemaValidator {
    validator: &'static Validator,
}

impl DefinitionSchemaValidator {
    /// Uses a cached global validator
    pub fn new() -> Result<Self, FlowError> {
        let validator_result = VALIDATOR.get_or_init(|| {
            let schema: Value = serde_json::from_str(SCHEMA_JSON)
                .map_err(|e| format!("Failed to parse schema JSON: {}", e))?;
            jsonschema::validator_for(&schema)
                .map_err(|e| format!("Failed to compile schema: {}", e))
        });

        match validator_result {
            Ok(validator) => Ok(Self { validator }),
            Err(e) => Err(FlowError::Config { reason: e.clone() }),
        }
    }

    /// Returns one `"<pointer>: <message>"` line per violation
    pub fn violations(&self, value: &Value) -> Vec<String> {
        self.validator
            .iter_errors(value)
            .map(|e| {
                let pointer = e.instance_path.to_string();
                if pointer.is_empty() {
                    e.to_string()
                } else {
                    format!("{}: {}", pointer, e)
                }
            })
            .collect()
    }
}
