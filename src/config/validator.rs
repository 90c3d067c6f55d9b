use std::collections::HashMap;
use thiserror::Error;

use crate::config::{ApiCatalog, Control, ControlKind, FormConfig, ValidationBlock};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

/// Load-time checks for form schemas and endpoint catalogs.
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate_form(form: &FormConfig) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut seen_names = HashMap::new();

        for (idx, control) in form.controls().iter().enumerate() {
            let path = format!("formGroup.formControls[{}]", idx);

            if control.name.is_empty() {
                errors.push(ValidationError::MissingField(format!("{}.name", path)));
            } else if let Some(prev_idx) = seen_names.insert(control.name.as_str(), idx) {
                errors.push(ValidationError::Duplicate(format!(
                    "Control name '{}' appears at indices {} and {}",
                    control.name, prev_idx, idx
                )));
            }

            Self::validate_control(control, &path, &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_control(control: &Control, path: &str, errors: &mut Vec<ValidationError>) {
        if matches!(control.kind, ControlKind::Select | ControlKind::Radio) && control.options.is_empty() {
            errors.push(ValidationError::InvalidValue {
                field: format!("{}.options", path),
                reason: "Choice controls need at least one option".to_string(),
            });
        }

        if let Some(block) = &control.validation {
            Self::validate_block(block, &format!("{}.validation", path), errors);
        }
    }

    fn validate_block(block: &ValidationBlock, path: &str, errors: &mut Vec<ValidationError>) {
        if let Some(pattern) = &block.pattern {
            if let Err(e) = regex::Regex::new(pattern) {
                errors.push(ValidationError::InvalidValue {
                    field: format!("{}.pattern", path),
                    reason: e.to_string(),
                });
            }
        }

        if let (Some(min), Some(max)) = (block.min_length, block.max_length) {
            if min > max {
                errors.push(ValidationError::InvalidValue {
                    field: format!("{}.minLength", path),
                    reason: format!("minLength {} exceeds maxLength {}", min, max),
                });
            }
        }

        if let (Some(min), Some(max)) = (block.min, block.max) {
            if min > max {
                errors.push(ValidationError::InvalidValue {
                    field: format!("{}.min", path),
                    reason: format!("min {} exceeds max {}", min, max),
                });
            }
        }

        if let (Some(min), Some(max)) = (&block.min_date, &block.max_date) {
            if min > max {
                errors.push(ValidationError::InvalidValue {
                    field: format!("{}.minDate", path),
                    reason: format!("minDate {} is after maxDate {}", min, max),
                });
            }
        }
    }

    pub fn validate_catalog(catalog: &ApiCatalog) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut seen_names = HashMap::new();

        for (idx, endpoint) in catalog.endpoints.iter().enumerate() {
            if endpoint.name.is_empty() {
                errors.push(ValidationError::MissingField(format!("endpoints[{}].name", idx)));
            } else if let Some(prev_idx) = seen_names.insert(endpoint.name.as_str(), idx) {
                errors.push(ValidationError::Duplicate(format!(
                    "Endpoint name '{}' appears at indices {} and {}",
                    endpoint.name, prev_idx, idx
                )));
            }

            if endpoint.url.is_empty() {
                errors.push(ValidationError::MissingField(format!("endpoints[{}].url", idx)));
            }

            for (field, schema) in &endpoint.request_schema {
                if let Some(block) = &schema.validation {
                    let path = format!("endpoints[{}].requestSchema.{}.validation", idx, field);
                    Self::validate_block(block, &path, &mut errors);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EndpointConfig, FormGroup, HttpMethod};

    fn control(name: &str, kind: ControlKind) -> Control {
        Control {
            name: name.to_string(),
            label: name.to_string(),
            kind,
            input_type: None,
            disabled: false,
            required: false,
            placeholder: None,
            options: Default::default(),
            value: None,
            validation: None,
            multiple: false,
            button_type: Default::default(),
        }
    }

    fn form(controls: Vec<Control>) -> FormConfig {
        FormConfig {
            form_title: "Test".to_string(),
            form_description: None,
            form_group: FormGroup {
                group_title: None,
                form_controls: controls,
            },
        }
    }

    #[test]
    fn test_valid_form() {
        let config = form(vec![
            control("first", ControlKind::Input),
            control("second", ControlKind::Date),
        ]);
        assert!(ConfigValidator::validate_form(&config).is_ok());
    }

    #[test]
    fn test_duplicate_control_names() {
        let config = form(vec![
            control("email", ControlKind::Input),
            control("email", ControlKind::Input),
        ]);
        let errors = ConfigValidator::validate_form(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ValidationError::Duplicate(_)));
    }

    #[test]
    fn test_select_without_options() {
        let config = form(vec![control("country", ControlKind::Select)]);
        let errors = ConfigValidator::validate_form(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidValue { .. })));
    }

    #[test]
    fn test_bad_pattern_and_inverted_bounds() {
        let mut c = control("code", ControlKind::Input);
        c.validation = Some(ValidationBlock {
            pattern: Some("([a-z".to_string()),
            min_length: Some(5),
            max_length: Some(2),
            ..Default::default()
        });
        let errors = ConfigValidator::validate_form(&form(vec![c])).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_duplicate_endpoint_names() {
        let catalog = ApiCatalog {
            service_name: "svc".to_string(),
            endpoints: vec![
                EndpointConfig::new("getUser", "/users", HttpMethod::Get),
                EndpointConfig::new("getUser", "/users/2", HttpMethod::Get),
                EndpointConfig::new("broken", "", HttpMethod::Post),
            ],
            ..Default::default()
        };
        let errors = ConfigValidator::validate_catalog(&catalog).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::Duplicate(_))));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::MissingField(_))));
    }
}
