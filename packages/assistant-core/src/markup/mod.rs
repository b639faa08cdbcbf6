//! Inline component markup carried inside chat text.
//!
//! Assistant replies mix prose with machine-readable sections:
//!
//! ```text
//! section := "[" tag "]" body "[/" tag "]"
//! tag     := "component" | "form-data" | "quick-reply"
//! ```
//!
//! - **component**: a JSON object with a string `component` discriminator
//! - **form-data**: opaque JSON sidecar, never displayed
//! - **quick-reply**: one suggested reply per line, optionally bulleted
//!
//! Every function here is pure and reparses its input from scratch, so it is
//! safe to call on each snapshot of a streaming message.

pub mod builder;
pub mod clean;
pub mod component;
pub mod quick_reply;
pub mod section;

pub use builder::{build_component_markup, build_form_data_markup, AssistantMessageBuilder};
pub use clean::{
    clean_display_text, clean_message_text, preview_text, remove_interruption_sentinel,
    CleanOptions, INTERRUPTED_SENTINEL,
};
pub use component::{
    extract_component, ComponentExtraction, ComponentPayload, Notification, PayloadError,
    DEFAULT_NOTIFICATION_DESCRIPTION, DEFAULT_NOTIFICATION_TITLE, FORM_SUBMITTED,
};
pub use quick_reply::{extract_quick_replies, parse_quick_reply_body, quick_replies_for_message};
pub use section::{
    find_sections, match_section, strip_sections, SectionMatch, TaggedSection, COMPONENT_TAG,
    FORM_DATA_TAG, QUICK_REPLY_TAG,
};
