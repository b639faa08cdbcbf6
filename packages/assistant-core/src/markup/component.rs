//! Component payloads embedded in `[component]` sections.

use super::section::{match_section, COMPONENT_TAG};
use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

/// Discriminator of the form confirmation component.
pub const FORM_SUBMITTED: &str = "form-submitted";

/// Title used when a component carries none.
pub const DEFAULT_NOTIFICATION_TITLE: &str = "Notification";
/// Description used when a component carries none.
pub const DEFAULT_NOTIFICATION_DESCRIPTION: &str =
    "Thanks! We'll be in touch with the next steps shortly.";

/// A decoded component directive.
///
/// On the wire this is a flat JSON object with a string `component`
/// discriminator. Discriminators this crate does not model are kept as
/// [`ComponentPayload::Other`]; fields are never dropped by either variant.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentPayload {
    /// Confirmation shown after a form was submitted
    FormSubmitted {
        title: String,
        description: String,
        /// Fields other than `title` and `description`
        extra: Map<String, Value>,
    },
    /// Any other discriminator, with its remaining fields
    Other {
        component: String,
        fields: Map<String, Value>,
    },
}

/// Why a component body was rejected.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("invalid component JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("component body is not a JSON object")]
    NotAnObject,

    #[error("component object has no string `component` field")]
    MissingDiscriminator,
}

/// Title and description the renderer shows for a component.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
}

/// Output of [`extract_component`].
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentExtraction {
    /// The first well-formed component, if any
    pub component: Option<ComponentPayload>,
    /// Input text with the first component section removed
    pub text: String,
}

impl ComponentPayload {
    /// Create a form confirmation payload.
    pub fn form_submitted(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::FormSubmitted {
            title: title.into(),
            description: description.into(),
            extra: Map::new(),
        }
    }

    /// Decode a payload from a JSON value.
    pub fn from_value(value: Value) -> Result<Self, PayloadError> {
        let Value::Object(mut fields) = value else {
            return Err(PayloadError::NotAnObject);
        };

        let component = match fields.remove("component") {
            Some(Value::String(name)) => name,
            _ => return Err(PayloadError::MissingDiscriminator),
        };

        if component == FORM_SUBMITTED {
            if let (Some(Value::String(title)), Some(Value::String(description))) =
                (fields.get("title"), fields.get("description"))
            {
                let (title, description) = (title.clone(), description.clone());
                fields.remove("title");
                fields.remove("description");
                return Ok(Self::FormSubmitted {
                    title,
                    description,
                    extra: fields,
                });
            }
        }

        Ok(Self::Other { component, fields })
    }

    /// Decode a payload from a raw section body.
    pub fn from_json(body: &str) -> Result<Self, PayloadError> {
        Self::from_value(serde_json::from_str(body)?)
    }

    /// The discriminator value.
    pub fn name(&self) -> &str {
        match self {
            Self::FormSubmitted { .. } => FORM_SUBMITTED,
            Self::Other { component, .. } => component,
        }
    }

    /// Flatten back into the wire object.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("component".to_string(), Value::String(self.name().to_string()));
        match self {
            Self::FormSubmitted {
                title,
                description,
                extra,
            } => {
                map.extend(extra.clone());
                map.insert("title".to_string(), Value::String(title.clone()));
                map.insert("description".to_string(), Value::String(description.clone()));
            }
            Self::Other { fields, .. } => map.extend(fields.clone()),
        }
        map
    }

    /// Notification content for this component.
    ///
    /// Unknown discriminators use their string `title`/`description` fields
    /// when present and fall back to fixed defaults otherwise.
    pub fn notification(&self) -> Notification {
        match self {
            Self::FormSubmitted {
                title,
                description,
                ..
            } => Notification {
                title: title.clone(),
                description: description.clone(),
            },
            Self::Other { fields, .. } => {
                let field = |key: &str, default: &str| {
                    fields
                        .get(key)
                        .and_then(Value::as_str)
                        .unwrap_or(default)
                        .to_string()
                };
                Notification {
                    title: field("title", DEFAULT_NOTIFICATION_TITLE),
                    description: field("description", DEFAULT_NOTIFICATION_DESCRIPTION),
                }
            }
        }
    }
}

impl Serialize for ComponentPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let map = self.to_map();
        let mut out = serializer.serialize_map(Some(map.len()))?;
        for (key, value) in &map {
            out.serialize_entry(key, value)?;
        }
        out.end()
    }
}

impl<'de> Deserialize<'de> for ComponentPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(de::Error::custom)
    }
}

/// Pull the first component directive out of a message part.
///
/// Never fails: a body that does not decode yields no payload, but its
/// markers are still removed so raw markup never reaches the user.
pub fn extract_component(text: &str) -> ComponentExtraction {
    let Some(found) = match_section(text, COMPONENT_TAG) else {
        return ComponentExtraction {
            component: None,
            text: text.to_string(),
        };
    };

    let component = match ComponentPayload::from_json(&found.section.raw_body) {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::warn!("Failed to parse assistant component payload: {}", e);
            None
        }
    };

    ComponentExtraction {
        component,
        text: found.remaining,
    }
}
