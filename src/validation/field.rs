//! Field-level view: a per-control rule descriptor for the form-state layer.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::rules::{Rule, RuleSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleValue<T> {
    pub value: T,
    pub message: String,
}

/// Rule descriptor in the `{rule: {value, message}}` layout form libraries
/// register fields with. Evaluation goes through the shared [`RuleSet`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRules {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<RuleValue<bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<RuleValue<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<RuleValue<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<RuleValue<bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<RuleValue<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<RuleValue<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<RuleValue<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_date: Option<RuleValue<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_date: Option<RuleValue<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_formats: Option<RuleValue<Vec<String>>>,
    /// Names of custom validators with no declarative equivalent
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validate: Vec<&'static str>,
    #[serde(skip)]
    rules: Arc<RuleSet>,
}

impl FieldRules {
    pub fn from_rules(rules: Arc<RuleSet>) -> Self {
        let mut field = FieldRules {
            required: None,
            min_length: None,
            max_length: None,
            email: None,
            pattern: None,
            min: None,
            max: None,
            min_date: None,
            max_date: None,
            allowed_formats: None,
            validate: Vec::new(),
            rules: rules.clone(),
        };

        for compiled in rules.rules() {
            let message = compiled.message.clone();
            match &compiled.rule {
                Rule::Required => field.required = Some(RuleValue { value: true, message }),
                Rule::MinLength(n) => field.min_length = Some(RuleValue { value: *n, message }),
                Rule::MaxLength(n) => field.max_length = Some(RuleValue { value: *n, message }),
                Rule::Email => field.email = Some(RuleValue { value: true, message }),
                Rule::Pattern(regex) => {
                    field.pattern = Some(RuleValue {
                        value: regex.as_str().to_string(),
                        message,
                    })
                }
                Rule::Min(n) => field.min = Some(RuleValue { value: *n, message }),
                Rule::Max(n) => field.max = Some(RuleValue { value: *n, message }),
                Rule::MinDate(d) => field.min_date = Some(RuleValue { value: d.clone(), message }),
                Rule::MaxDate(d) => field.max_date = Some(RuleValue { value: d.clone(), message }),
                Rule::AllowedFormats(formats) => {
                    field.allowed_formats = Some(RuleValue {
                        value: formats.clone(),
                        message,
                    })
                }
                Rule::RangeOrder => field.validate.push(compiled.rule.key()),
            }
        }

        field
    }

    /// Validate one value; the error is the first failing rule's message.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        self.rules.check(value).map_err(|issue| issue.message)
    }

    pub fn rule_set(&self) -> &Arc<RuleSet> {
        &self.rules
    }
}
