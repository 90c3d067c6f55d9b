//! Validation rule compiler.
//!
//! A control's declarative validation block is compiled once into a
//! [`RuleSet`] and exposed through two views:
//!
//! - [`FieldRules`]: a per-field `{rule: {value, message}}` descriptor used by
//!   the form-state layer
//! - [`FormSchema`]: an object validator reporting issues with full paths
//!
//! Both views evaluate through the same `RuleSet`, so they always agree.
//! Request payloads for API endpoints are checked by a [`PayloadValidator`],
//! compiled once per endpoint.

pub mod field;
pub mod payload;
pub mod rules;
pub mod schema;

pub use field::{FieldRules, RuleValue};
pub use payload::{validate_payload, PayloadValidator};
pub use rules::{CompiledRule, Issue, Rule, RuleError, RuleSet, ValueShape, DEFAULT_REQUIRED_MESSAGE};
pub use schema::{FormSchema, SchemaIssue};
