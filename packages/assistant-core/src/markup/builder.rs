//! Markup builders for messages sent on behalf of the user.
//!
//! The website sends a hidden assistant instruction after the contact form is
//! submitted: the submitted fields as `[form-data]`, a `form-submitted`
//! component for the confirmation bubble, and free-form instructions.

use super::component::ComponentPayload;
use super::section::{close_marker, open_marker, COMPONENT_TAG, FORM_DATA_TAG};
use serde_json::{Map, Value};

/// Wrap a component payload in `[component]` markers.
pub fn build_component_markup(component: &ComponentPayload) -> String {
    wrap(COMPONENT_TAG, &Value::Object(component.to_map()).to_string())
}

/// Wrap form fields in `[form-data]` markers.
pub fn build_form_data_markup(form_data: &Map<String, Value>) -> String {
    wrap(FORM_DATA_TAG, &Value::Object(form_data.clone()).to_string())
}

fn wrap(tag: &str, body: &str) -> String {
    format!("{}{}{}", open_marker(tag), body, close_marker(tag))
}

/// Builder for an assistant message.
///
/// Blocks are joined by blank lines in a fixed order: form data, component,
/// then instructions.
#[derive(Debug, Clone, Default)]
pub struct AssistantMessageBuilder {
    form_data: Option<Map<String, Value>>,
    component: Option<ComponentPayload>,
    instructions: Vec<String>,
}

impl AssistantMessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form_data(mut self, form_data: Map<String, Value>) -> Self {
        self.form_data = Some(form_data);
        self
    }

    pub fn component(mut self, component: ComponentPayload) -> Self {
        self.component = Some(component);
        self
    }

    /// Append one instruction paragraph.
    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instructions.push(instruction.into());
        self
    }

    pub fn instructions<I, S>(mut self, instructions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instructions
            .extend(instructions.into_iter().map(Into::into));
        self
    }

    pub fn build(&self) -> String {
        let mut parts = Vec::new();

        if let Some(form_data) = &self.form_data {
            parts.push(build_form_data_markup(form_data));
        }
        if let Some(component) = &self.component {
            parts.push(build_component_markup(component));
        }
        if !self.instructions.is_empty() {
            parts.push(self.instructions.join("\n\n"));
        }

        parts.join("\n\n")
    }
}
