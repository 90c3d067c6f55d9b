//! Widget tree handed to the rendering host.
//!
//! Dispatch is purely on [`ControlKind`]; unknown kinds produce no widget.

use serde::Serialize;
use serde_json::Value;

use super::form_state::ControlState;
use super::upload::FilePreview;
use crate::config::{Control, ControlKind, InputType};
use crate::validation::rules::value_as_text;

/// Label, identity and inline error shared by every field widget
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldFrame {
    pub name: String,
    pub id: String,
    pub label: String,
    pub required: bool,
    pub disabled: bool,
    pub error: Option<String>,
}

impl FieldFrame {
    fn new(control: &Control, state: &ControlState) -> Self {
        Self {
            name: control.name.clone(),
            id: control.name.clone(),
            label: control.label.clone(),
            required: control.is_required(),
            disabled: control.disabled,
            error: state.status.error().map(String::from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextInput {
    #[serde(flatten)]
    pub frame: FieldFrame,
    pub input_type: &'static str,
    pub value: String,
    pub placeholder: Option<String>,
    pub password: bool,
    pub revealed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceOption {
    pub key: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectInput {
    #[serde(flatten)]
    pub frame: FieldFrame,
    pub options: Vec<ChoiceOption>,
    pub multiple: bool,
    pub placeholder: Option<String>,
}

/// Radio set or checkbox set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceGroup {
    #[serde(flatten)]
    pub frame: FieldFrame,
    pub options: Vec<ChoiceOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toggle {
    #[serde(flatten)]
    pub frame: FieldFrame,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateInput {
    #[serde(flatten)]
    pub frame: FieldFrame,
    pub value: String,
    pub min: Option<String>,
    pub max: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRangeInput {
    #[serde(flatten)]
    pub frame: FieldFrame,
    pub from: String,
    pub to: String,
    pub min: Option<String>,
    pub max: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileInput {
    #[serde(flatten)]
    pub frame: FieldFrame,
    pub multiple: bool,
    /// `accept` attribute built from `allowedFormats`
    pub accept: Option<String>,
    pub previews: Vec<FilePreview>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ButtonView {
    pub name: String,
    pub id: String,
    pub label: String,
    pub button_type: &'static str,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum Widget {
    Text(TextInput),
    Select(SelectInput),
    Radio(ChoiceGroup),
    CheckboxGroup(ChoiceGroup),
    Checkbox(Toggle),
    Date(DateInput),
    DateRange(DateRangeInput),
    File(FileInput),
    Button(ButtonView),
}

impl Widget {
    /// Build the widget for a control, or `None` for unknown kinds.
    pub fn build(control: &Control, state: &ControlState, previews: &[FilePreview]) -> Option<Self> {
        let frame = || FieldFrame::new(control, state);
        let block = control.validation.as_ref();

        let widget = match control.kind {
            ControlKind::Input => {
                let input_type = control.input_type();
                let password = input_type == InputType::Password;
                let shown = if password && state.password_visible {
                    InputType::Text
                } else {
                    input_type
                };
                Widget::Text(TextInput {
                    frame: frame(),
                    input_type: shown.as_str(),
                    value: value_as_text(&state.value),
                    placeholder: control.placeholder.clone(),
                    password,
                    revealed: password && state.password_visible,
                })
            }
            ControlKind::Select => Widget::Select(SelectInput {
                frame: frame(),
                options: choices(control, &state.value),
                multiple: control.multiple,
                placeholder: control.placeholder.clone(),
            }),
            ControlKind::Radio => Widget::Radio(ChoiceGroup {
                frame: frame(),
                options: choices(control, &state.value),
            }),
            ControlKind::Checkbox if control.options.is_empty() => Widget::Checkbox(Toggle {
                frame: frame(),
                checked: state.value.as_bool().unwrap_or(false),
            }),
            ControlKind::Checkbox => Widget::CheckboxGroup(ChoiceGroup {
                frame: frame(),
                options: choices(control, &state.value),
            }),
            ControlKind::Date => Widget::Date(DateInput {
                frame: frame(),
                value: value_as_text(&state.value),
                min: block.and_then(|b| b.min_date.clone()),
                max: block.and_then(|b| b.max_date.clone()),
            }),
            ControlKind::DateRange => Widget::DateRange(DateRangeInput {
                frame: frame(),
                from: state.value.get("from").map(value_as_text).unwrap_or_default(),
                to: state.value.get("to").map(value_as_text).unwrap_or_default(),
                min: block.and_then(|b| b.min_date.clone()),
                max: block.and_then(|b| b.max_date.clone()),
            }),
            ControlKind::File => Widget::File(FileInput {
                frame: frame(),
                multiple: control.multiple,
                accept: block
                    .and_then(|b| b.allowed_formats.as_ref())
                    .filter(|f| !f.is_empty())
                    .map(|f| f.join(",")),
                previews: previews.to_vec(),
            }),
            ControlKind::Button => Widget::Button(ButtonView {
                name: control.name.clone(),
                id: control.name.clone(),
                label: control.label.clone(),
                button_type: control.button_type.as_str(),
                disabled: control.disabled,
            }),
            ControlKind::Unknown => {
                tracing::debug!(control = %control.name, "Skipping control with unknown type");
                return None;
            }
        };

        Some(widget)
    }

    /// Template used by the HTML renderer.
    pub fn template(&self) -> &'static str {
        match self {
            Widget::Text(_) => "text.html",
            Widget::Select(_) => "select.html",
            Widget::Radio(_) => "radio.html",
            Widget::CheckboxGroup(_) => "checkbox_group.html",
            Widget::Checkbox(_) => "checkbox.html",
            Widget::Date(_) => "date.html",
            Widget::DateRange(_) => "date_range.html",
            Widget::File(_) => "file.html",
            Widget::Button(_) => "button.html",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Widget::Text(w) => &w.frame.name,
            Widget::Select(w) => &w.frame.name,
            Widget::Radio(w) | Widget::CheckboxGroup(w) => &w.frame.name,
            Widget::Checkbox(w) => &w.frame.name,
            Widget::Date(w) => &w.frame.name,
            Widget::DateRange(w) => &w.frame.name,
            Widget::File(w) => &w.frame.name,
            Widget::Button(w) => &w.name,
        }
    }
}

/// Options in declaration order, flagged against the current value.
fn choices(control: &Control, value: &Value) -> Vec<ChoiceOption> {
    let selected = |key: &str| match value {
        Value::Array(items) => items.iter().any(|v| value_as_text(v) == key),
        other => value_as_text(other) == key,
    };
    control
        .options
        .iter()
        .map(|o| ChoiceOption {
            key: o.key.clone(),
            label: o.label.clone(),
            selected: selected(&o.key),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormConfig;
    use crate::domain::FormState;
    use serde_json::json;

    const FORM: &str = r#"
formTitle: Widgets
formGroup:
  formControls:
    - name: pw
      label: Password
      type: input
      inputType: password
    - name: colour
      label: Colour
      type: select
      value: green
      options:
        - { key: red, label: Red }
        - { key: green, label: Green }
        - { key: blue, label: Blue }
    - name: newsletter
      label: Newsletter
      type: checkbox
    - name: mystery
      label: Mystery
      type: carousel
    - name: docs
      label: Documents
      type: file
      multiple: true
      validation:
        allowedFormats: [application/pdf, image/*]
    - name: go
      label: Go
      type: button
      buttonType: reset
"#;

    fn form() -> FormState {
        FormState::new(&FormConfig::from_yaml(FORM).unwrap()).unwrap()
    }

    #[test]
    fn test_unknown_kind_renders_nothing() {
        let names: Vec<_> = form().widgets().iter().map(|w| w.name().to_string()).collect();
        assert_eq!(names, vec!["pw", "colour", "newsletter", "docs", "go"]);
    }

    #[test]
    fn test_option_order_and_selection() {
        let widgets = form().widgets();
        let Widget::Select(select) = &widgets[1] else {
            panic!("expected select");
        };
        let keys: Vec<_> = select.options.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["red", "green", "blue"]);
        assert!(select.options[1].selected);
        assert!(!select.options[0].selected);
    }

    #[test]
    fn test_password_visibility_toggle() {
        let mut form = form();
        let Widget::Text(text) = &form.widgets()[0] else {
            panic!("expected text input");
        };
        assert_eq!(text.input_type, "password");
        assert!(text.password);

        form.toggle_password_visibility("pw").unwrap();
        let Widget::Text(text) = &form.widgets()[0] else {
            panic!("expected text input");
        };
        assert_eq!(text.input_type, "text");
        assert!(text.revealed);
    }

    #[test]
    fn test_single_checkbox_file_and_button() {
        let mut form = form();
        form.set_value("newsletter", json!(true)).unwrap();
        let widgets = form.widgets();

        assert!(matches!(&widgets[2], Widget::Checkbox(t) if t.checked));
        match &widgets[3] {
            Widget::File(file) => {
                assert!(file.multiple);
                assert_eq!(file.accept.as_deref(), Some("application/pdf,image/*"));
            }
            other => panic!("expected file input, got {:?}", other),
        }
        assert!(matches!(&widgets[4], Widget::Button(b) if b.button_type == "reset"));
        assert_eq!(widgets[4].template(), "button.html");
    }

    #[test]
    fn test_inline_error_in_frame() {
        let mut form = form();
        form.set_value("pw", json!("x")).unwrap();
        let control = form.control("pw").unwrap().clone();
        let mut state = form.state("pw").unwrap().clone();
        state.status = crate::domain::ControlStatus::Invalid("Too weak".to_string());

        let Some(Widget::Text(text)) = Widget::build(&control, &state, &[]) else {
            panic!("expected text input");
        };
        assert_eq!(text.frame.error.as_deref(), Some("Too weak"));
        assert_eq!(text.value, "x");
    }
}
