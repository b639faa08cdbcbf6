//! Assistant Core - message markup and widget state for the Square AI assistant.
//!
//! This crate provides the client-side core of the floating chat assistant:
//!
//! - **Markup**: `[component]`, `[form-data]` and `[quick-reply]` sections
//!   embedded in chat text, parsed into typed payloads and clean display text
//! - **Rendering decisions**: which bubbles a message part produces
//! - **Widget state**: open/closed, mute, drag positions, chat history with
//!   expiry, read status, suggestions and audio cue decisions
//! - **Persistence**: a [`store::StateStore`] port with JSON file and
//!   in-memory adapters
//!
//! # Example
//!
//! ```rust
//! use assistant_core::markup::{clean_display_text, extract_component, CleanOptions};
//! use assistant_core::render::should_render_text_bubble;
//! use assistant_core::MessageRole;
//!
//! let text = r#"Done! [component]{"component":"form-submitted","title":"Sent","description":"We'll reply soon"}[/component]"#;
//!
//! let extracted = extract_component(text);
//! let cleaned = clean_display_text(&extracted.text, CleanOptions::message_list());
//!
//! assert_eq!(cleaned, "Done!");
//! assert_eq!(extracted.component.as_ref().unwrap().notification().title, "Sent");
//! assert!(should_render_text_bubble(extracted.component.as_ref(), &cleaned, MessageRole::Assistant));
//! ```

pub mod config;
pub mod markup;
pub mod render;
pub mod state;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::AssistantConfig;
pub use types::{ApiResponse, ChatStatus, Message, MessagePart, MessageRole};

// Re-export main functionality
pub use markup::{
    build_component_markup, clean_display_text, extract_component, extract_quick_replies,
    match_section, strip_sections, AssistantMessageBuilder, CleanOptions, ComponentPayload,
    Notification,
};
pub use render::{parse_part, plan_message, should_render_text_bubble, ParsedPart, PartPlan};
pub use state::{AssistantEvent, AssistantState, Cue, DragConstraints, Position};
pub use store::{JsonFileStore, MemoryStore, StateStore};

/// Error types for assistant-core operations.
///
/// Parsing never fails; these cover configuration and persistence.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type for assistant-core operations.
pub type Result<T> = std::result::Result<T, Error>;
