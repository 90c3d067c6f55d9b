//! Form schema configuration.
//!
//! ## Example
//!
//! ```yaml
//! formTitle: Sign up
//! formDescription: Create an account
//! formGroup:
//!   formControls:
//!     - name: email
//!       label: Email
//!       type: input
//!       inputType: email
//!       validation:
//!         required: true
//!         email: true
//!         errorMessages:
//!           required: Email is required
//!     - name: plan
//!       label: Plan
//!       type: radio
//!       options:
//!         free: Free
//!         pro: Pro
//! ```

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use serde_yaml::Value as YamlValue;
use std::collections::HashMap;
use std::path::Path;

use super::{load_yaml, read_document, validator::ConfigValidator, LoadError};

/// A parsed and validated form schema
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormConfig {
    #[serde(default)]
    pub form_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_description: Option<String>,
    /// Either a single group or a list of groups; only the first is kept
    #[serde(deserialize_with = "first_group")]
    pub form_group: FormGroup,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_title: Option<String>,
    #[serde(default)]
    pub form_controls: Vec<Control>,
}

fn first_group<'de, D>(deserializer: D) -> Result<FormGroup, D::Error>
where
    D: Deserializer<'de>,
{
    let group = match YamlValue::deserialize(deserializer)? {
        YamlValue::Sequence(groups) => groups
            .into_iter()
            .next()
            .ok_or_else(|| D::Error::custom("formGroup list is empty"))?,
        group @ YamlValue::Mapping(_) => group,
        _ => return Err(D::Error::custom("formGroup must be an object or a list of objects")),
    };
    FormGroup::deserialize(group).map_err(|e| D::Error::custom(format!("formGroup: {}", e)))
}

impl FormConfig {
    /// Parse a form schema from YAML text and validate it.
    pub fn from_yaml(text: &str) -> Result<Self, LoadError> {
        let config: FormConfig = load_yaml(text)?;
        ConfigValidator::validate_form(&config).map_err(LoadError::Invalid)?;
        Ok(config)
    }

    /// Read and parse a form schema file.
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        Self::from_yaml(&read_document(path)?)
    }

    pub fn controls(&self) -> &[Control] {
        &self.form_group.form_controls
    }

    /// Look up a control by its exact name.
    pub fn control(&self, name: &str) -> Option<&Control> {
        self.controls().iter().find(|c| c.name == name)
    }
}

/// One declarative form field or button
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Control {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: ControlKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<InputType>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "ControlOptions::is_empty")]
    pub options: ControlOptions,
    /// Initial value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationBlock>,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub button_type: ButtonType,
}

impl Control {
    /// Required either through the control flag or its validation block.
    pub fn is_required(&self) -> bool {
        self.required
            || self
                .validation
                .as_ref()
                .and_then(|v| v.required)
                .unwrap_or(false)
    }

    pub fn input_type(&self) -> InputType {
        self.input_type.unwrap_or_default()
    }
}

/// Widget kinds a control can declare
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ControlKind {
    #[serde(alias = "text")]
    Input,
    Select,
    Radio,
    Checkbox,
    Date,
    DateRange,
    File,
    Button,
    /// Anything else; renders nothing
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Email,
    Password,
    Number,
    Tel,
    Url,
    Search,
    /// Also covers any type the renderer does not know
    #[default]
    #[serde(other)]
    Text,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Text => "text",
            InputType::Email => "email",
            InputType::Password => "password",
            InputType::Number => "number",
            InputType::Tel => "tel",
            InputType::Url => "url",
            InputType::Search => "search",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonType {
    #[default]
    Submit,
    Reset,
    Button,
}

impl ButtonType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ButtonType::Submit => "submit",
            ButtonType::Reset => "reset",
            ButtonType::Button => "button",
        }
    }
}

/// One choice of a select, radio set or checkbox set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionItem {
    pub key: String,
    pub label: String,
}

/// Ordered key→label pairs, in the order the YAML declares them.
///
/// Accepts a list of `{key, label}` objects, a list of plain scalars
/// (key and label are the same), or a mapping. Numeric and boolean
/// scalars are kept as their string form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(into = "Vec<OptionItem>")]
pub struct ControlOptions(Vec<OptionItem>);

impl<'de> Deserialize<'de> for ControlOptions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let items = match YamlValue::deserialize(deserializer)? {
            YamlValue::Null => Vec::new(),
            YamlValue::Sequence(entries) => entries
                .iter()
                .map(option_entry)
                .collect::<Result<_, _>>()
                .map_err(D::Error::custom)?,
            YamlValue::Mapping(map) => map
                .iter()
                .map(|(key, label)| {
                    Ok(OptionItem {
                        key: scalar_text(key)?,
                        label: scalar_text(label)?,
                    })
                })
                .collect::<Result<_, String>>()
                .map_err(D::Error::custom)?,
            _ => return Err(D::Error::custom("options must be a list or a mapping")),
        };
        Ok(ControlOptions(items))
    }
}

fn option_entry(entry: &YamlValue) -> Result<OptionItem, String> {
    match entry {
        YamlValue::Mapping(map) => {
            let key = map
                .get("key")
                .ok_or_else(|| "option object is missing `key`".to_string())
                .and_then(scalar_text)?;
            let label = match map.get("label") {
                Some(label) => scalar_text(label)?,
                None => key.clone(),
            };
            Ok(OptionItem { key, label })
        }
        scalar => {
            let key = scalar_text(scalar)?;
            Ok(OptionItem {
                label: key.clone(),
                key,
            })
        }
    }
}

fn scalar_text(value: &YamlValue) -> Result<String, String> {
    match value {
        YamlValue::String(s) => Ok(s.clone()),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Bool(b) => Ok(b.to_string()),
        other => Err(format!("option keys and labels must be scalars, got {:?}", other)),
    }
}

impl From<ControlOptions> for Vec<OptionItem> {
    fn from(options: ControlOptions) -> Self {
        options.0
    }
}

impl From<Vec<OptionItem>> for ControlOptions {
    fn from(items: Vec<OptionItem>) -> Self {
        ControlOptions(items)
    }
}

impl ControlOptions {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OptionItem> {
        self.0.iter()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|o| o.key == key)
    }
}

/// Declarative validation rules; an absent rule is not enforced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_date: Option<String>,
    /// Accepted MIME types for file controls; `image/*` style wildcards allowed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_formats: Option<Vec<String>>,
    /// Per-rule message overrides keyed by rule name (`required`, `minLength`, ...)
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub error_messages: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGNUP: &str = r#"
formTitle: Sign up
formDescription: Create an account
formGroup:
  - formControls:
      - name: email
        label: Email
        type: input
        inputType: email
        placeholder: you@example.com
        validation:
          required: true
          email: true
          errorMessages:
            required: Email is required
      - name: country
        label: Country
        type: select
        options:
          - key: se
            label: Sweden
          - key: ar
            label: Argentina
      - name: plan
        type: radio
        options:
          zeta: Zeta plan
          alpha: Alpha plan
      - name: tags
        type: checkbox
        options: [red, green]
      - name: widget
        type: carousel
  - formControls:
      - name: ignored
        type: input
"#;

    #[test]
    fn test_first_group_of_array_is_used() {
        let config = FormConfig::from_yaml(SIGNUP).unwrap();
        assert_eq!(config.form_title, "Sign up");
        assert_eq!(config.form_description.as_deref(), Some("Create an account"));
        assert_eq!(config.controls().len(), 5);
        assert!(config.control("ignored").is_none());
    }

    #[test]
    fn test_single_group_object() {
        let yaml = r#"
formTitle: One
formGroup:
  groupTitle: Main
  formControls:
    - name: a
      type: text
"#;
        let config = FormConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.form_group.group_title.as_deref(), Some("Main"));
        assert_eq!(config.controls()[0].kind, ControlKind::Input);
    }

    #[test]
    fn test_empty_group_list_is_rejected() {
        let yaml = "formTitle: x\nformGroup: []\n";
        assert!(FormConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_option_order_is_preserved_for_every_shape() {
        let config = FormConfig::from_yaml(SIGNUP).unwrap();

        let country: Vec<_> = config.control("country").unwrap().options.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(country, vec!["se", "ar"]);

        let plan: Vec<_> = config.control("plan").unwrap().options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(plan, vec!["Zeta plan", "Alpha plan"]);

        let tags = &config.control("tags").unwrap().options;
        assert_eq!(tags.len(), 2);
        assert!(tags.contains_key("green"));
    }

    #[test]
    fn test_unknown_kind_and_flags() {
        let config = FormConfig::from_yaml(SIGNUP).unwrap();
        assert_eq!(config.control("widget").unwrap().kind, ControlKind::Unknown);

        let email = config.control("email").unwrap();
        assert!(email.is_required());
        assert_eq!(email.input_type(), InputType::Email);
        assert_eq!(
            email.validation.as_ref().unwrap().error_messages.get("required").map(String::as_str),
            Some("Email is required")
        );
    }

    #[test]
    fn test_unknown_input_type_falls_back_to_text() {
        let yaml = r#"
formGroup:
  formControls:
    - name: colour
      type: input
      inputType: color
"#;
        let config = FormConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.controls()[0].input_type(), InputType::Text);
    }

    #[test]
    fn test_missing_input_type_is_text() {
        let yaml = r#"
formGroup:
  formControls:
    - name: nickname
      type: input
    - name: secret
      type: input
      inputType: password
"#;
        let config = FormConfig::from_yaml(yaml).unwrap();
        assert!(config.controls()[0].input_type.is_none());
        assert_eq!(config.controls()[0].input_type(), InputType::Text);
        assert_eq!(config.controls()[1].input_type(), InputType::Password);
    }

    #[test]
    fn test_numeric_options_become_strings() {
        let yaml = r#"
formGroup:
  formControls:
    - name: rating
      type: radio
      options: [1, 2, 3]
    - name: size
      type: select
      options:
        1: One
        2: Two
    - name: consent
      type: checkbox
      options:
        - key: true
          label: Yes
"#;
        let config = FormConfig::from_yaml(yaml).unwrap();
        let rating: Vec<_> = config.control("rating").unwrap().options.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(rating, vec!["1", "2", "3"]);

        let size: Vec<_> = config
            .control("size")
            .unwrap()
            .options
            .iter()
            .map(|o| (o.key.as_str(), o.label.as_str()))
            .collect();
        assert_eq!(size, vec![("1", "One"), ("2", "Two")]);

        let consent = config.control("consent").unwrap().options.iter().next().unwrap();
        assert_eq!(consent.key, "true");
        assert_eq!(consent.label, "Yes");
    }

    #[test]
    fn test_group_errors_name_the_missing_field() {
        let yaml = r#"
formGroup:
  formControls:
    - label: No name
      type: input
"#;
        let err = FormConfig::from_yaml(yaml).unwrap_err().to_string();
        assert!(err.contains("missing field `name`"), "{}", err);

        let listed = "formGroup:\n  - formControls:\n      - type: input\n";
        let err = FormConfig::from_yaml(listed).unwrap_err().to_string();
        assert!(err.contains("missing field `name`"), "{}", err);
    }
}
