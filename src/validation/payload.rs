//! Request-payload checks for catalog endpoints.

use indexmap::IndexMap;
use serde_json::Value;

use super::rules::{RuleSet, ValueShape};
use crate::config::{FieldSchema, FieldType};

/// An endpoint's request schema with its nested rule blocks compiled.
#[derive(Debug, Clone, Default)]
pub struct PayloadValidator {
    fields: Vec<PayloadField>,
}

#[derive(Debug, Clone)]
struct PayloadField {
    name: String,
    required: bool,
    field_type: Option<FieldType>,
    /// A block that failed to compile keeps its error and reports it per call
    rules: Option<Result<RuleSet, String>>,
}

impl PayloadValidator {
    pub fn compile(schema: &IndexMap<String, FieldSchema>) -> Self {
        let fields = schema
            .iter()
            .map(|(name, spec)| PayloadField {
                name: name.clone(),
                required: spec.required,
                field_type: spec.field_type,
                rules: spec.validation.as_ref().map(|block| {
                    RuleSet::compile(ValueShape::Text, false, Some(block)).map_err(|e| e.to_string())
                }),
            })
            .collect();
        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns every problem found, in schema order. `null` counts as absent.
    pub fn validate(&self, payload: &Value) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();

        for field in &self.fields {
            let Some(value) = payload.get(&field.name).filter(|v| !v.is_null()) else {
                if field.required {
                    problems.push(format!("{} is required", field.name));
                }
                continue;
            };

            if let Some(expected) = field.field_type {
                if !expected.matches(value) {
                    problems.push(format!("{} must be of type {}", field.name, expected));
                    continue;
                }
            }

            match &field.rules {
                Some(Ok(rules)) => {
                    if let Err(issue) = rules.check(value) {
                        problems.push(format!("{}: {}", field.name, issue.message));
                    }
                }
                Some(Err(e)) => problems.push(format!("{}: {}", field.name, e)),
                None => {}
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

/// Compile a request schema and check one payload against it.
pub fn validate_payload(schema: &IndexMap<String, FieldSchema>, payload: &Value) -> Result<(), Vec<String>> {
    PayloadValidator::compile(schema).validate(payload)
}
