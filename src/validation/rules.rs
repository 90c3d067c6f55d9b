//! The single internal rule representation.
//!
//! A control's validation block is compiled once into a [`RuleSet`]. Both the
//! per-field descriptor ([`super::FieldRules`]) and the object schema
//! ([`super::FormSchema`]) evaluate through the same `RuleSet`.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

use crate::config::{Control, ControlKind, ValidationBlock};

pub const DEFAULT_REQUIRED_MESSAGE: &str = "This field is required.";

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// The shape of the value a widget produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// Text input, radio set, date, single select
    Text,
    /// Checkbox set or multi-select: array of option keys
    List,
    /// Single checkbox without options
    Boolean,
    /// `{from, to}` pair of ISO dates
    DateRange,
    /// Array of `{name, type, size}` file metadata
    Files,
}

impl ValueShape {
    /// Shape of a control's value; `None` for buttons and unknown widgets.
    pub fn for_control(control: &Control) -> Option<Self> {
        match control.kind {
            ControlKind::Input | ControlKind::Radio | ControlKind::Date => Some(ValueShape::Text),
            ControlKind::Select if control.multiple => Some(ValueShape::List),
            ControlKind::Select => Some(ValueShape::Text),
            ControlKind::Checkbox if control.options.is_empty() => Some(ValueShape::Boolean),
            ControlKind::Checkbox => Some(ValueShape::List),
            ControlKind::DateRange => Some(ValueShape::DateRange),
            ControlKind::File => Some(ValueShape::Files),
            ControlKind::Button | ControlKind::Unknown => None,
        }
    }

    /// The value an untouched control holds.
    pub fn empty_value(&self) -> Value {
        match self {
            ValueShape::Text => Value::String(String::new()),
            ValueShape::List | ValueShape::Files => Value::Array(Vec::new()),
            ValueShape::Boolean => Value::Bool(false),
            ValueShape::DateRange => serde_json::json!({ "from": "", "to": "" }),
        }
    }

    /// Coerce a raw value into this shape. List shapes wrap a lone scalar
    /// into a one-element array; other shapes pass values through.
    pub fn normalize(&self, value: Value) -> Value {
        match (self, value) {
            (ValueShape::List, Value::Null) => Value::Array(Vec::new()),
            (ValueShape::List, Value::String(s)) if s.is_empty() => Value::Array(Vec::new()),
            (ValueShape::List, Value::Array(items)) => Value::Array(items),
            (ValueShape::List, scalar) => Value::Array(vec![scalar]),
            (_, value) => value,
        }
    }

    pub fn schema_type(&self) -> &'static str {
        match self {
            ValueShape::Text => "string",
            ValueShape::List | ValueShape::Files => "array",
            ValueShape::Boolean => "boolean",
            ValueShape::DateRange => "object",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Rule {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Email,
    Pattern(Regex),
    Min(f64),
    Max(f64),
    MinDate(String),
    MaxDate(String),
    /// `to` must not precede `from`
    RangeOrder,
    AllowedFormats(Vec<String>),
}

impl Rule {
    /// Key used for message overrides in `errorMessages`.
    pub fn key(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::MinLength(_) => "minLength",
            Rule::MaxLength(_) => "maxLength",
            Rule::Email => "email",
            Rule::Pattern(_) => "pattern",
            Rule::Min(_) => "min",
            Rule::Max(_) => "max",
            Rule::MinDate(_) => "minDate",
            Rule::MaxDate(_) => "maxDate",
            Rule::RangeOrder => "dateRange",
            Rule::AllowedFormats(_) => "allowedFormats",
        }
    }

    fn default_message(&self) -> String {
        match self {
            Rule::Required => DEFAULT_REQUIRED_MESSAGE.to_string(),
            Rule::MinLength(n) => format!("Must be at least {} characters.", n),
            Rule::MaxLength(n) => format!("Must be at most {} characters.", n),
            Rule::Email => "Please enter a valid email address.".to_string(),
            Rule::Pattern(_) => "Invalid format.".to_string(),
            Rule::Min(n) => format!("Must be at least {}.", n),
            Rule::Max(n) => format!("Must be at most {}.", n),
            Rule::MinDate(d) => format!("Date must be on or after {}.", d),
            Rule::MaxDate(d) => format!("Date must be on or before {}.", d),
            Rule::RangeOrder => "End date must be on or after start date.".to_string(),
            Rule::AllowedFormats(_) => "Unsupported file type.".to_string(),
        }
    }

    fn applies_to(&self, shape: ValueShape) -> bool {
        match shape {
            ValueShape::Text => !matches!(self, Rule::RangeOrder | Rule::AllowedFormats(_)),
            ValueShape::List | ValueShape::Boolean => matches!(self, Rule::Required),
            ValueShape::DateRange => matches!(
                self,
                Rule::Required | Rule::MinDate(_) | Rule::MaxDate(_) | Rule::RangeOrder
            ),
            ValueShape::Files => matches!(self, Rule::Required | Rule::AllowedFormats(_)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub rule: Rule,
    pub message: String,
}

/// A failed rule; `path` is relative to the field (`["to"]`, `["1"]`, or empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub path: Vec<String>,
    pub message: String,
}

impl Issue {
    fn root(message: &str) -> Self {
        Self {
            path: Vec::new(),
            message: message.to_string(),
        }
    }

    fn at(segment: impl Into<String>, message: &str) -> Self {
        Self {
            path: vec![segment.into()],
            message: message.to_string(),
        }
    }
}

/// Ordered, message-resolved rules for one value shape
#[derive(Debug, Clone)]
pub struct RuleSet {
    shape: ValueShape,
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Compile a validation block. Rules come out in precedence order:
    /// required, minLength, maxLength, email, pattern, min, max, minDate,
    /// maxDate, then the shape-specific range/format rules.
    pub fn compile(
        shape: ValueShape,
        required: bool,
        block: Option<&ValidationBlock>,
    ) -> Result<Self, RuleError> {
        let default_block = ValidationBlock::default();
        let block = block.unwrap_or(&default_block);

        let mut candidates = Vec::new();
        if required || block.required.unwrap_or(false) {
            candidates.push(Rule::Required);
        }
        if let Some(n) = block.min_length {
            candidates.push(Rule::MinLength(n));
        }
        if let Some(n) = block.max_length {
            candidates.push(Rule::MaxLength(n));
        }
        if block.email.unwrap_or(false) {
            candidates.push(Rule::Email);
        }
        if let Some(pattern) = &block.pattern {
            let regex = Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            candidates.push(Rule::Pattern(regex));
        }
        if let Some(n) = block.min {
            candidates.push(Rule::Min(n));
        }
        if let Some(n) = block.max {
            candidates.push(Rule::Max(n));
        }
        if let Some(d) = &block.min_date {
            candidates.push(Rule::MinDate(d.clone()));
        }
        if let Some(d) = &block.max_date {
            candidates.push(Rule::MaxDate(d.clone()));
        }
        if shape == ValueShape::DateRange {
            candidates.push(Rule::RangeOrder);
        }
        if let Some(formats) = &block.allowed_formats {
            candidates.push(Rule::AllowedFormats(formats.clone()));
        }

        let rules = candidates
            .into_iter()
            .filter(|rule| rule.applies_to(shape))
            .map(|rule| {
                let message = block
                    .error_messages
                    .get(rule.key())
                    .cloned()
                    .unwrap_or_else(|| rule.default_message());
                CompiledRule { rule, message }
            })
            .collect();

        Ok(Self { shape, rules })
    }

    /// Compile the rules for a control; `None` for widgets without a value.
    pub fn for_control(control: &Control) -> Result<Option<Self>, RuleError> {
        match ValueShape::for_control(control) {
            Some(shape) => Self::compile(shape, control.is_required(), control.validation.as_ref()).map(Some),
            None => Ok(None),
        }
    }

    pub fn shape(&self) -> ValueShape {
        self.shape
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn rule(&self, key: &str) -> Option<&CompiledRule> {
        self.rules.iter().find(|r| r.rule.key() == key)
    }

    pub fn is_required(&self) -> bool {
        self.rule("required").is_some()
    }

    /// Evaluate the rules against a value, stopping at the first failure.
    pub fn check(&self, value: &Value) -> Result<(), Issue> {
        match self.shape {
            ValueShape::Text => self.check_text(value),
            ValueShape::List => self.check_required(match value {
                Value::Array(items) => !items.is_empty(),
                Value::Null => false,
                Value::String(s) => !s.is_empty(),
                _ => true,
            }),
            ValueShape::Boolean => self.check_required(value.as_bool().unwrap_or(false)),
            ValueShape::DateRange => self.check_range(value),
            ValueShape::Files => self.check_files(value),
        }
    }

    fn check_required(&self, present: bool) -> Result<(), Issue> {
        match self.rule("required") {
            Some(required) if !present => Err(Issue::root(&required.message)),
            _ => Ok(()),
        }
    }

    fn check_text(&self, value: &Value) -> Result<(), Issue> {
        let text = value_as_text(value);
        if text.trim().is_empty() {
            // Emptiness only fails the required rule
            return self.check_required(false);
        }

        for compiled in &self.rules {
            let passed = match &compiled.rule {
                Rule::Required => true,
                Rule::MinLength(n) => text.chars().count() >= *n,
                Rule::MaxLength(n) => text.chars().count() <= *n,
                Rule::Email => email_regex().is_match(text.trim()),
                Rule::Pattern(regex) => regex.is_match(&text),
                Rule::Min(min) => as_number(value, &text).map_or(false, |n| n >= *min),
                Rule::Max(max) => as_number(value, &text).map_or(false, |n| n <= *max),
                Rule::MinDate(min) => text.as_str() >= min.as_str(),
                Rule::MaxDate(max) => text.as_str() <= max.as_str(),
                Rule::RangeOrder | Rule::AllowedFormats(_) => true,
            };
            if !passed {
                return Err(Issue::root(&compiled.message));
            }
        }
        Ok(())
    }

    fn check_range(&self, value: &Value) -> Result<(), Issue> {
        let from = member_text(value, "from");
        let to = member_text(value, "to");
        let has_from = !from.trim().is_empty();
        let has_to = !to.trim().is_empty();

        for compiled in &self.rules {
            match &compiled.rule {
                Rule::Required if !has_from => return Err(Issue::at("from", &compiled.message)),
                Rule::Required if !has_to => return Err(Issue::at("to", &compiled.message)),
                Rule::MinDate(min) if has_from && from.as_str() < min.as_str() => {
                    return Err(Issue::at("from", &compiled.message))
                }
                Rule::MaxDate(max) if has_to && to.as_str() > max.as_str() => {
                    return Err(Issue::at("to", &compiled.message))
                }
                Rule::RangeOrder if has_from && has_to && to < from => {
                    return Err(Issue::at("to", &compiled.message))
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn check_files(&self, value: &Value) -> Result<(), Issue> {
        let files = value.as_array().map(Vec::as_slice).unwrap_or(&[]);

        for compiled in &self.rules {
            match &compiled.rule {
                Rule::Required if files.is_empty() => return Err(Issue::root(&compiled.message)),
                Rule::AllowedFormats(formats) => {
                    for (idx, file) in files.iter().enumerate() {
                        let mime = file.get("type").and_then(Value::as_str).unwrap_or("");
                        if !formats.iter().any(|f| format_matches(f, mime)) {
                            return Err(Issue::at(idx.to_string(), &compiled.message));
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email pattern"))
}

/// Text form of a widget value as the browser would submit it.
pub fn value_as_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn member_text(value: &Value, key: &str) -> String {
    value.get(key).map(value_as_text).unwrap_or_default()
}

fn as_number(value: &Value, text: &str) -> Option<f64> {
    value.as_f64().or_else(|| text.trim().parse::<f64>().ok())
}

fn format_matches(allowed: &str, mime: &str) -> bool {
    match allowed.strip_suffix("/*") {
        Some(prefix) => mime
            .split_once('/')
            .map_or(false, |(major, _)| major.eq_ignore_ascii_case(prefix)),
        None => allowed.eq_ignore_ascii_case(mime),
    }
}
