//! Per-message render decisions.
//!
//! Turns message snapshots into the bubbles the widget shows. Nothing here
//! draws; the renderer consumes [`PartPlan`]s.

use crate::markup::{clean_display_text, extract_component, CleanOptions, ComponentPayload, Notification};
use crate::types::{Message, MessageRole};
use serde::Serialize;

/// Whether a plain-text bubble accompanies a message part.
///
/// Empty text never renders. Without a component the text always renders.
/// With a component, assistant commentary still renders next to it, while a
/// user message is fully represented by its component.
pub fn should_render_text_bubble(
    component: Option<&ComponentPayload>,
    text: &str,
    role: MessageRole,
) -> bool {
    if text.is_empty() {
        return false;
    }
    match component {
        None => true,
        Some(_) => role != MessageRole::User,
    }
}

/// Parsed contents of one text part.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentPayload>,
    pub text: String,
}

/// Extract the component and clean the remaining text.
pub fn parse_part(text: &str, options: CleanOptions) -> ParsedPart {
    let extracted = extract_component(text);
    ParsedPart {
        text: clean_display_text(&extracted.text, options),
        component: extracted.component,
    }
}

/// What to draw for one text part, in display order: component first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartPlan {
    /// Stable key: message id and text part index
    pub key: String,
    pub role: MessageRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl PartPlan {
    pub fn is_empty(&self) -> bool {
        self.notification.is_none() && self.text.is_none()
    }
}

/// Plan the bubbles for every non-empty text part of a message.
///
/// Parts that produce neither a component nor text are omitted.
pub fn plan_message(message: &Message, options: CleanOptions) -> Vec<PartPlan> {
    message
        .text_parts()
        .enumerate()
        .map(|(index, text)| {
            let parsed = parse_part(text, options);
            let show_text =
                should_render_text_bubble(parsed.component.as_ref(), &parsed.text, message.role);

            PartPlan {
                key: format!("{}-{}", message.id, index),
                role: message.role,
                notification: parsed.component.as_ref().map(ComponentPayload::notification),
                text: show_text.then_some(parsed.text),
            }
        })
        .filter(|plan| !plan.is_empty())
        .collect()
}
