//! Object-schema view: validates a whole value set and reports issues with
//! full paths.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::rules::{RuleError, RuleSet};
use crate::config::FormConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaIssue {
    /// Control name followed by any nested segment (`["range", "to"]`)
    pub path: Vec<String>,
    pub message: String,
}

impl SchemaIssue {
    /// The control the issue belongs to.
    pub fn field(&self) -> &str {
        self.path.first().map(String::as_str).unwrap_or("")
    }

    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }
}

/// Composable object validator built from per-field rule sets
#[derive(Debug, Clone, Default)]
pub struct FormSchema {
    fields: IndexMap<String, Arc<RuleSet>>,
}

impl FormSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field registration.
    pub fn field(mut self, name: impl Into<String>, rules: Arc<RuleSet>) -> Self {
        self.insert(name, rules);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, rules: Arc<RuleSet>) {
        self.fields.insert(name.into(), rules);
    }

    /// Schema for every valued control of a form.
    pub fn from_config(config: &FormConfig) -> Result<Self, RuleError> {
        let mut schema = Self::new();
        for control in config.controls() {
            if let Some(rules) = RuleSet::for_control(control)? {
                schema.insert(control.name.clone(), Arc::new(rules));
            }
        }
        Ok(schema)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate a value set. Missing entries are validated as the empty value
    /// of their shape. At most one issue is reported per field.
    pub fn validate(&self, values: &IndexMap<String, Value>) -> Result<(), Vec<SchemaIssue>> {
        let issues: Vec<SchemaIssue> = self
            .fields
            .iter()
            .filter_map(|(name, rules)| {
                let empty;
                let value = match values.get(name) {
                    Some(v) => v,
                    None => {
                        empty = rules.shape().empty_value();
                        &empty
                    }
                };
                rules.check(value).err().map(|issue| {
                    let mut path = vec![name.clone()];
                    path.extend(issue.path);
                    SchemaIssue {
                        path,
                        message: issue.message,
                    }
                })
            })
            .collect();

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }

    /// Validate a JSON object; anything else is treated as an empty object.
    pub fn validate_json(&self, values: &Value) -> Result<(), Vec<SchemaIssue>> {
        let values: IndexMap<String, Value> = values
            .as_object()
            .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        self.validate(&values)
    }

    /// JSON description of the object schema.
    pub fn describe(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, rules)| {
                let rule_keys: Vec<&str> = rules.rules().iter().map(|r| r.rule.key()).collect();
                (
                    name.clone(),
                    json!({ "type": rules.shape().schema_type(), "rules": rule_keys }),
                )
            })
            .collect();
        let required: Vec<&String> = self
            .fields
            .iter()
            .filter(|(_, rules)| rules.is_required())
            .map(|(name, _)| name)
            .collect();

        json!({ "type": "object", "properties": properties, "required": required })
    }
}
