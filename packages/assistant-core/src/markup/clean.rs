//! Display text cleanup.

use super::component::extract_component;
use super::section::{strip_sections, COMPONENT_TAG, FORM_DATA_TAG, QUICK_REPLY_TAG};
use once_cell::sync::Lazy;
use regex::Regex;

/// Sentinel the chat backend appends when the user stops a response.
pub const INTERRUPTED_SENTINEL: &str = "[Request interrupted by user]";

static INTERRUPTED_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("(?i){}", regex::escape(INTERRUPTED_SENTINEL)))
        .expect("Invalid interruption sentinel regex")
});

/// Which sections a call site removes from display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanOptions {
    /// Remove `[quick-reply]` sections as well
    pub strip_quick_replies: bool,
}

impl CleanOptions {
    /// Message list flavour: quick-reply sections stay visible.
    pub fn message_list() -> Self {
        Self {
            strip_quick_replies: false,
        }
    }

    /// Remove every known section.
    pub fn full() -> Self {
        Self {
            strip_quick_replies: true,
        }
    }
}

/// Remove every occurrence of the interruption sentinel, ignoring case.
pub fn remove_interruption_sentinel(text: &str) -> String {
    INTERRUPTED_PATTERN.replace_all(text, "").into_owned()
}

/// Final display text for a message part.
///
/// `remaining` is the text left by [`extract_component`], so the first
/// component section is already gone.
pub fn clean_display_text(remaining: &str, options: CleanOptions) -> String {
    let mut text = strip_sections(remaining, FORM_DATA_TAG);
    text = strip_sections(&text, COMPONENT_TAG);
    if options.strip_quick_replies {
        text = strip_sections(&text, QUICK_REPLY_TAG);
    }
    remove_interruption_sentinel(&text).trim().to_string()
}

/// Extract and clean in one step, discarding the payload.
pub fn clean_message_text(text: &str, options: CleanOptions) -> String {
    clean_display_text(&extract_component(text).text, options)
}

/// Short preview of a message part for the collapsed trigger.
///
/// Counts characters, not bytes, and appends `...` when truncated.
pub fn preview_text(text: &str, max_chars: usize) -> String {
    let cleaned = clean_message_text(text, CleanOptions::full());
    match cleaned.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &cleaned[..cut]),
        None => cleaned,
    }
}
