//! Renderable forms built from content type definitions.
//!
//! Generates the add form markup from a merged content type and the
//! validation errors of a prior submission.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::merge::MergedType;
use super::time::{SUNRISE_DATE, SUNRISE_TIME, SUNSET_DATE, SUNSET_TIME};
use super::types::{Attribute, Input, InputKind, field_name};
use super::validate::ValidationErrors;
use crate::routes::helpers::html_escape;

/// Errors building a form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("content type '{0}' not found")]
    UnknownType(String),

    #[error("error reported for unknown field '{0}'")]
    UnknownField(String),
}

/// A form ready to be dropped into a template.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedForm {
    /// Field markup, without the surrounding `<form>` element.
    pub html: String,

    /// Whether any input is a file upload.
    pub multipart: bool,

    /// Errors shown on the form.
    pub errors: ValidationErrors,
}

/// Builder for content type forms.
pub struct FormBuilder<'a> {
    merged: &'a MergedType,
    errors: &'a ValidationErrors,
}

impl<'a> FormBuilder<'a> {
    /// Create a form builder for a merged content type.
    pub fn new(merged: &'a MergedType, errors: &'a ValidationErrors) -> Self {
        Self { merged, errors }
    }

    /// Render every attribute followed by the publishing window.
    ///
    /// Errors must refer to a field the form actually renders.
    pub fn build(&self) -> Result<RenderedForm, FormError> {
        let content_type = &self.merged.content_type;

        let known_fields: Vec<String> = content_type
            .fields()
            .map(|(name, _, _)| name)
            .chain(
                [SUNRISE_DATE, SUNRISE_TIME, SUNSET_DATE, SUNSET_TIME]
                    .iter()
                    .map(|s| s.to_string()),
            )
            .collect();
        if let Some(unknown) = self.errors.keys().find(|k| !known_fields.contains(k)) {
            return Err(FormError::UnknownField(unknown.clone()));
        }

        let mut html = String::new();
        for attr in &content_type.attributes {
            html.push_str(&self.render_attribute(attr));
        }
        html.push_str(&self.render_window());

        Ok(RenderedForm {
            html,
            multipart: content_type.has_files(),
            errors: self.errors.clone(),
        })
    }

    fn render_attribute(&self, attr: &Attribute) -> String {
        let id = html_escape(&attr.id);
        let name = html_escape(&attr.name);
        let description = attr
            .description
            .as_deref()
            .map(|d| format!(r#"<p class="form-help">{}</p>"#, html_escape(d)))
            .unwrap_or_default();
        let required_star = if attr.required { " *" } else { "" };

        let inputs: String = attr
            .inputs
            .iter()
            .map(|input| self.render_input(attr, input))
            .collect();

        format!(
            r#"
            <fieldset class="form-attribute form-attribute--{id}">
                <legend>{name}{required_star}</legend>
                {description}
                {inputs}
            </fieldset>
            "#
        )
    }

    /// Render a single input based on its kind.
    fn render_input(&self, attr: &Attribute, input: &Input) -> String {
        let field = field_name(&attr.id, &input.id);
        let error = self.errors.get(&field);
        let field = html_escape(&field);
        let label = html_escape(&input.label);
        let required = if attr.required { "required" } else { "" };
        let placeholder = input
            .placeholder
            .as_deref()
            .map(|p| format!(r#"placeholder="{}""#, html_escape(p)))
            .unwrap_or_default();
        let max = input
            .max_length
            .map(|m| format!(r#"maxlength="{m}""#))
            .unwrap_or_default();
        let val = html_escape(&text_value(input.value.as_ref()));
        let invalid = if error.is_some() { " form-group--error" } else { "" };
        let error_html = error
            .map(|e| format!(r#"<p class="form-error">{}</p>"#, html_escape(e)))
            .unwrap_or_default();

        let control = match input.kind {
            InputKind::Textarea => format!(
                r#"<textarea id="{field}" name="{field}" rows="6" {required} {placeholder} {max} class="form-control">{val}</textarea>"#
            ),
            InputKind::Select => {
                let current = text_value(input.value.as_ref());
                let options: String = input
                    .options
                    .iter()
                    .map(|o| {
                        let sel = if o.value == current { "selected" } else { "" };
                        format!(
                            r#"<option value="{}" {sel}>{}</option>"#,
                            html_escape(&o.value),
                            html_escape(&o.label)
                        )
                    })
                    .collect();
                format!(
                    r#"<select id="{field}" name="{field}" {required} class="form-control"><option value=""></option>{options}</select>"#
                )
            }
            InputKind::Checkbox => {
                let checked = if is_checked(input.value.as_ref()) {
                    "checked"
                } else {
                    ""
                };
                format!(
                    r#"<input type="checkbox" id="{field}" name="{field}" value="on" {checked}>"#
                )
            }
            // Browsers cannot pre-fill file inputs; show the prior upload instead
            InputKind::File => {
                let prior = input
                    .value
                    .as_ref()
                    .and_then(|v| v.get("filename"))
                    .and_then(Value::as_str)
                    .map(|f| format!(r#"<p class="form-help">Uploaded: {}</p>"#, html_escape(f)))
                    .unwrap_or_default();
                format!(
                    r#"<input type="file" id="{field}" name="{field}" class="form-control">{prior}"#
                )
            }
            kind => format!(
                r#"<input type="{ty}" id="{field}" name="{field}" value="{val}" {required} {placeholder} {max} class="form-control">"#,
                ty = kind.html_type()
            ),
        };

        format!(
            r#"
                <div class="form-group{invalid}">
                    <label for="{field}">{label}</label>
                    {control}
                    {error_html}
                </div>
            "#
        )
    }

    fn render_window(&self) -> String {
        let window = &self.merged.window;
        let pairs = [
            (SUNRISE_DATE, "date", "Sunrise date", &window.sunrise_date),
            (SUNRISE_TIME, "time", "Sunrise time", &window.sunrise_time),
            (SUNSET_DATE, "date", "Sunset date", &window.sunset_date),
            (SUNSET_TIME, "time", "Sunset time", &window.sunset_time),
        ];

        let mut html = String::from(
            r#"
            <fieldset class="form-attribute form-attribute--publishing">
                <legend>Publishing</legend>
            "#,
        );
        for (name, ty, label, value) in pairs {
            let val = html_escape(value.as_deref().unwrap_or_default());
            let error_html = self
                .errors
                .get(name)
                .map(|e| format!(r#"<p class="form-error">{}</p>"#, html_escape(e)))
                .unwrap_or_default();
            html.push_str(&format!(
                r#"
                <div class="form-group">
                    <label for="{name}">{label}</label>
                    <input type="{ty}" id="{name}" name="{name}" value="{val}" class="form-control">
                    {error_html}
                </div>
                "#
            ));
        }
        html.push_str("</fieldset>");
        html
    }
}

/// Build a renderable form from a merged type and prior errors.
pub fn build(merged: &MergedType, errors: &ValidationErrors) -> Result<RenderedForm, FormError> {
    FormBuilder::new(merged, errors).build()
}

/// Extract a displayable string from a stored value.
fn text_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| text_value(Some(v)))
            .collect::<Vec<_>>()
            .join(", "),
        _ => String::new(),
    }
}

fn is_checked(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty() && s != "off" && s != "false",
        _ => false,
    }
}
