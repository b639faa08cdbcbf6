//! Quick-reply suggestions carried in `[quick-reply]` sections.

use super::section::{find_sections, match_section, QUICK_REPLY_TAG};
use crate::types::Message;

/// Split a quick-reply body into suggestions.
///
/// One suggestion per line. A single leading bullet (`-`, `•` or `*`) and the
/// surrounding whitespace are removed; lines left empty are dropped.
pub fn parse_quick_reply_body(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .map(|line| {
            line.strip_prefix(|c: char| matches!(c, '-' | '•' | '*'))
                .unwrap_or(line)
                .trim()
        })
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Suggestions from the first quick-reply section of a message part.
///
/// Later sections in the same part are not consulted.
pub fn extract_quick_replies(text: &str) -> Vec<String> {
    let Some(found) = match_section(text, QUICK_REPLY_TAG) else {
        return Vec::new();
    };

    let ignored = find_sections(&found.remaining, QUICK_REPLY_TAG).len();
    if ignored > 0 {
        tracing::debug!("Ignoring {} additional quick-reply section(s)", ignored);
    }

    parse_quick_reply_body(&found.section.raw_body)
}

/// Suggestions for a whole message, in part order.
pub fn quick_replies_for_message(message: &Message) -> Vec<String> {
    message
        .text_parts()
        .flat_map(extract_quick_replies)
        .collect()
}
