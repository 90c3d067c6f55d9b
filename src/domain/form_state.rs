//! Validation-aware form state.
//!
//! Each control moves through `Pristine → Edited → Valid | Invalid`. Until the
//! first submit attempt, controls are validated only on request
//! ([`FormState::validate_field`]); afterwards every edit re-validates the
//! control immediately.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use super::upload::{FileHandle, FilePreview, FileUploadHandler};
use super::widget::Widget;
use crate::config::{Control, ControlKind, FormConfig};
use crate::validation::{FieldRules, FormSchema, RuleError, RuleSet, ValueShape};

/// Current values keyed by control name, in declaration order
pub type FormValues = IndexMap<String, Value>;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("Unknown control: {0}")]
    UnknownControl(String),

    #[error("Control '{0}' does not accept files")]
    NotAFileControl(String),

    #[error(transparent)]
    Rules(#[from] RuleError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "camelCase")]
pub enum ControlStatus {
    Pristine,
    Edited,
    Valid,
    Invalid(String),
}

impl ControlStatus {
    pub fn error(&self) -> Option<&str> {
        match self {
            ControlStatus::Invalid(message) => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControlState {
    pub value: Value,
    pub status: ControlStatus,
    /// Password visibility toggle; unrelated to validation
    pub password_visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// All validators passed; the callback received these values
    Submitted(FormValues),
    /// Submission blocked; first error per control
    Rejected(IndexMap<String, String>),
}

impl SubmitOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted(_))
    }
}

#[derive(Debug, Clone)]
struct ControlEntry {
    control: Control,
    state: ControlState,
    rules: Option<FieldRules>,
    uploads: Option<FileUploadHandler>,
}

#[derive(Debug, Clone)]
pub struct FormState {
    entries: IndexMap<String, ControlEntry>,
    schema: FormSchema,
    submit_count: u32,
}

impl FormState {
    /// Bind every control of a form and compile its validators.
    pub fn new(config: &FormConfig) -> Result<Self, FormError> {
        let mut entries = IndexMap::new();
        let mut schema = FormSchema::new();

        for control in config.controls() {
            let shape = ValueShape::for_control(control);
            let rules = match RuleSet::for_control(control)? {
                Some(rules) => {
                    let rules = Arc::new(rules);
                    if !control.disabled {
                        schema.insert(control.name.clone(), rules.clone());
                    }
                    Some(FieldRules::from_rules(rules))
                }
                None => None,
            };

            let value = initial_value(control, shape);
            let uploads = (control.kind == ControlKind::File).then(|| FileUploadHandler::new(control.multiple));

            entries.insert(
                control.name.clone(),
                ControlEntry {
                    control: control.clone(),
                    state: ControlState {
                        value,
                        status: ControlStatus::Pristine,
                        password_visible: false,
                    },
                    rules,
                    uploads,
                },
            );
        }

        Ok(Self {
            entries,
            schema,
            submit_count: 0,
        })
    }

    pub fn control(&self, name: &str) -> Option<&Control> {
        self.entries.get(name).map(|e| &e.control)
    }

    pub fn state(&self, name: &str) -> Option<&ControlState> {
        self.entries.get(name).map(|e| &e.state)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.state(name).map(|s| &s.value)
    }

    pub fn status(&self, name: &str) -> Option<&ControlStatus> {
        self.state(name).map(|s| &s.status)
    }

    /// Field-level rule descriptor for a control, if it has a value.
    pub fn field_rules(&self, name: &str) -> Option<&FieldRules> {
        self.entries.get(name).and_then(|e| e.rules.as_ref())
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn submit_count(&self) -> u32 {
        self.submit_count
    }

    /// Record a user edit.
    pub fn set_value(&mut self, name: &str, value: Value) -> Result<&ControlStatus, FormError> {
        let revalidate = self.submit_count > 0;
        let entry = self.entry_mut(name)?;
        entry.state.value = match ValueShape::for_control(&entry.control) {
            Some(shape) => shape.normalize(value),
            None => value,
        };
        entry.state.status = ControlStatus::Edited;
        if revalidate {
            validate_entry(entry);
        }
        Ok(&entry.state.status)
    }

    /// Validate one control through its field-level rules.
    pub fn validate_field(&mut self, name: &str) -> Result<&ControlStatus, FormError> {
        let entry = self.entry_mut(name)?;
        validate_entry(entry);
        Ok(&entry.state.status)
    }

    /// Flip a password input between masked and visible; returns the new visibility.
    pub fn toggle_password_visibility(&mut self, name: &str) -> Result<bool, FormError> {
        let entry = self.entry_mut(name)?;
        entry.state.password_visible = !entry.state.password_visible;
        Ok(entry.state.password_visible)
    }

    /// Replace a file control's selection and update its value.
    pub fn select_files(&mut self, name: &str, files: &[FileHandle]) -> Result<&[FilePreview], FormError> {
        let metadata = {
            let entry = self.entry_mut(name)?;
            let uploads = entry
                .uploads
                .as_mut()
                .ok_or_else(|| FormError::NotAFileControl(name.to_string()))?;
            uploads.select(files);
            uploads.metadata()
        };
        self.set_value(name, metadata)?;
        Ok(self.previews(name))
    }

    pub fn remove_file(&mut self, name: &str, id: Uuid) -> Result<Option<FilePreview>, FormError> {
        let (removed, metadata) = {
            let entry = self.entry_mut(name)?;
            let uploads = entry
                .uploads
                .as_mut()
                .ok_or_else(|| FormError::NotAFileControl(name.to_string()))?;
            let removed = uploads.remove(id);
            (removed, uploads.metadata())
        };
        if removed.is_some() {
            self.set_value(name, metadata)?;
        }
        Ok(removed)
    }

    pub fn previews(&self, name: &str) -> &[FilePreview] {
        self.entries
            .get(name)
            .and_then(|e| e.uploads.as_ref())
            .map(FileUploadHandler::previews)
            .unwrap_or(&[])
    }

    /// Current value of every valued control (buttons excluded).
    pub fn values(&self) -> FormValues {
        self.entries
            .iter()
            .filter(|(_, e)| e.rules.is_some())
            .map(|(name, e)| (name.clone(), e.state.value.clone()))
            .collect()
    }

    /// Inline error text per invalid control.
    pub fn errors(&self) -> IndexMap<String, String> {
        self.entries
            .iter()
            .filter_map(|(name, e)| e.state.status.error().map(|m| (name.clone(), m.to_string())))
            .collect()
    }

    /// Validate everything; on success hand the values to `on_submit`.
    pub fn submit<F>(&mut self, on_submit: F) -> SubmitOutcome
    where
        F: FnOnce(&FormValues),
    {
        self.submit_count += 1;
        let values = self.values();
        let result = self.schema.validate(&values);

        for entry in self.entries.values_mut() {
            if entry.rules.is_some() && !entry.control.disabled {
                entry.state.status = ControlStatus::Valid;
            }
        }

        match result {
            Ok(()) => {
                tracing::debug!(fields = values.len(), "Form submitted");
                on_submit(&values);
                SubmitOutcome::Submitted(values)
            }
            Err(issues) => {
                let mut errors = IndexMap::new();
                for issue in issues {
                    let field = issue.field().to_string();
                    if let Some(entry) = self.entries.get_mut(&field) {
                        entry.state.status = ControlStatus::Invalid(issue.message.clone());
                    }
                    errors.entry(field).or_insert(issue.message);
                }
                tracing::warn!(invalid = errors.len(), "Form submission blocked by validation");
                SubmitOutcome::Rejected(errors)
            }
        }
    }

    /// Widgets in declaration order; unknown kinds are skipped.
    pub fn widgets(&self) -> Vec<Widget> {
        self.entries
            .values()
            .filter_map(|e| {
                let previews = e.uploads.as_ref().map(FileUploadHandler::previews).unwrap_or(&[]);
                Widget::build(&e.control, &e.state, previews)
            })
            .collect()
    }

    fn entry_mut(&mut self, name: &str) -> Result<&mut ControlEntry, FormError> {
        self.entries
            .get_mut(name)
            .ok_or_else(|| FormError::UnknownControl(name.to_string()))
    }
}

fn validate_entry(entry: &mut ControlEntry) {
    if entry.control.disabled {
        entry.state.status = ControlStatus::Valid;
        return;
    }
    if let Some(rules) = &entry.rules {
        entry.state.status = match rules.validate(&entry.state.value) {
            Ok(()) => ControlStatus::Valid,
            Err(message) => ControlStatus::Invalid(message),
        };
    }
}

fn initial_value(control: &Control, shape: Option<ValueShape>) -> Value {
    let Some(shape) = shape else {
        return control.value.clone().unwrap_or(Value::Null);
    };
    match (&control.value, shape) {
        (None, _) | (Some(Value::Null), _) => shape.empty_value(),
        (Some(value), shape) => shape.normalize(value.clone()),
    }
}
