use tera::{Context, Tera};
use thiserror::Error;

use crate::config::FormConfig;
use crate::domain::{FormState, Widget};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
}

const TEMPLATES: [(&str, &str); 11] = [
    ("form.html", include_str!("../../templates/form.html")),
    ("error.html", include_str!("../../templates/error.html")),
    ("text.html", include_str!("../../templates/text.html")),
    ("select.html", include_str!("../../templates/select.html")),
    ("radio.html", include_str!("../../templates/radio.html")),
    ("checkbox_group.html", include_str!("../../templates/checkbox_group.html")),
    ("checkbox.html", include_str!("../../templates/checkbox.html")),
    ("date.html", include_str!("../../templates/date.html")),
    ("date_range.html", include_str!("../../templates/date_range.html")),
    ("file.html", include_str!("../../templates/file.html")),
    ("button.html", include_str!("../../templates/button.html")),
];

/// Renders widget trees to HTML for a DOM host.
pub struct HtmlRenderer {
    tera: Tera,
}

impl HtmlRenderer {
    pub fn new() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.to_vec())?;
        Ok(Self { tera })
    }

    pub fn render_widget(&self, widget: &Widget) -> Result<String, RenderError> {
        let context = Context::from_serialize(widget)?;
        Ok(self.tera.render(widget.template(), &context)?)
    }

    pub fn render_form(&self, config: &FormConfig, state: &FormState) -> Result<String, RenderError> {
        let fields = state
            .widgets()
            .iter()
            .map(|w| self.render_widget(w))
            .collect::<Result<Vec<_>, _>>()?;

        let mut context = Context::new();
        context.insert("title", &config.form_title);
        context.insert("description", &config.form_description);
        context.insert("group_title", &config.form_group.group_title);
        context.insert("fields", &fields);
        Ok(self.tera.render("form.html", &context)?)
    }

    pub fn render_error(&self, message: &str) -> Result<String, RenderError> {
        let mut context = Context::new();
        context.insert("message", message);
        Ok(self.tera.render("error.html", &context)?)
    }

    /// Render a form straight from YAML. Load failures become an inline
    /// error block rather than an `Err`.
    pub fn render_document(&self, yaml: &str) -> Result<String, RenderError> {
        let config = match FormConfig::from_yaml(yaml) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load form schema");
                return self.render_error(&e.to_string());
            }
        };
        match FormState::new(&config) {
            Ok(state) => self.render_form(&config, &state),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to compile form validators");
                self.render_error(&e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FileHandle;
    use serde_json::json;

    const FORM: &str = r#"
formTitle: Contact <us>
formDescription: We reply fast
formGroup:
  - groupTitle: Details
    formControls:
      - name: email
        label: Email
        type: input
        inputType: email
        required: true
        placeholder: you@example.com
      - name: topic
        label: Topic
        type: radio
        options:
          sales: Sales
          support: Support
      - name: when
        label: When
        type: dateRange
      - name: send
        label: Send
        type: button
"#;

    #[test]
    fn test_render_document() {
        let renderer = HtmlRenderer::new().unwrap();
        let html = renderer.render_document(FORM).unwrap();

        assert!(html.contains("Contact &lt;us&gt;"));
        assert!(html.contains("<legend>Details</legend>"));
        assert!(html.contains(r#"<input type="email" id="email" name="email""#));
        assert!(html.contains(" required"));
        assert!(html.contains(r#"id="when-from""#));
        assert!(html.contains(r#"<button type="submit" id="send""#));

        let sales = html.find("Sales").unwrap();
        let support = html.find("Support").unwrap();
        assert!(sales < support);
    }

    #[test]
    fn test_inline_errors_after_submit() {
        let renderer = HtmlRenderer::new().unwrap();
        let config = FormConfig::from_yaml(FORM).unwrap();
        let mut state = FormState::new(&config).unwrap();
        state.set_value("when", json!({ "from": "2024-03-02", "to": "2024-03-01" })).unwrap();
        state.submit(|_| {});

        let html = renderer.render_form(&config, &state).unwrap();
        assert!(html.contains(r#"<p class="field-error" id="email-error">This field is required.</p>"#));
        assert!(html.contains("End date must be on or after start date."));
    }

    #[test]
    fn test_load_failure_renders_error_block() {
        let renderer = HtmlRenderer::new().unwrap();
        let html = renderer.render_document("formTitle: [unclosed").unwrap();
        assert!(html.contains(r#"class="form-error""#));

        let html = renderer.render_document("").unwrap();
        assert!(html.contains("Unable to load form"));
    }

    #[test]
    fn test_values_are_escaped() {
        let renderer = HtmlRenderer::new().unwrap();
        let config = FormConfig::from_yaml(FORM).unwrap();
        let mut state = FormState::new(&config).unwrap();
        state.set_value("email", json!("\"><script>")).unwrap();

        let html = renderer.render_form(&config, &state).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_file_preview_url_is_escaped() {
        let renderer = HtmlRenderer::new().unwrap();
        let config = FormConfig::from_yaml(
            "formGroup:\n  formControls:\n    - { name: photo, label: Photo, type: file }\n",
        )
        .unwrap();
        let mut state = FormState::new(&config).unwrap();
        let hostile = FileHandle::new("x.png", Some("image/png\" onerror=\"alert(1)"), 0).with_contents(vec![1]);
        state.select_files("photo", &[hostile]).unwrap();

        let html = renderer.render_form(&config, &state).unwrap();
        assert!(html.contains("<img src=\"data:image"));
        assert!(!html.contains("\" onerror=\""));
        assert!(html.contains("&quot; onerror=&quot;"));
    }
}
