//! Tagged section location and removal.
//!
//! A tagged section is a `[tag]...[/tag]` span embedded in chat text. Tag
//! names are matched ASCII-case-insensitively by every routine here, so
//! `[Component]...[/component]` is the same section as the lowercase wire form.
//! Non-ASCII case folds (`K` vs. KELVIN SIGN) never match.
//!
//! Tags must be non-empty and contain no `[` or `]`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::ops::Range;

/// Tag carrying a JSON component directive.
pub const COMPONENT_TAG: &str = "component";
/// Tag carrying sidecar form data that is never displayed.
pub const FORM_DATA_TAG: &str = "form-data";
/// Tag carrying a newline separated list of suggested replies.
pub const QUICK_REPLY_TAG: &str = "quick-reply";

static COMPONENT_PATTERN: Lazy<Regex> = Lazy::new(|| known_pattern(COMPONENT_TAG));
static FORM_DATA_PATTERN: Lazy<Regex> = Lazy::new(|| known_pattern(FORM_DATA_TAG));
static QUICK_REPLY_PATTERN: Lazy<Regex> = Lazy::new(|| known_pattern(QUICK_REPLY_TAG));

/// A located `[tag]...[/tag]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaggedSection {
    /// Tag name as requested by the caller
    pub tag: String,
    /// Text between the markers, trimmed
    pub raw_body: String,
    /// Byte range of the whole section, markers included
    pub span: Range<usize>,
}

/// Result of locating the first section for a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMatch {
    pub section: TaggedSection,
    /// Input text with the whole section span removed
    pub remaining: String,
}

/// Opening marker for a tag, e.g. `[component]`.
pub fn open_marker(tag: &str) -> String {
    format!("[{}]", tag)
}

/// Closing marker for a tag, e.g. `[/component]`.
pub fn close_marker(tag: &str) -> String {
    format!("[/{}]", tag)
}

/// Locate the first section for `tag`.
///
/// Uses the first opening marker and the first closing marker in the text.
/// The section only matches when the closing marker starts after the opening
/// marker; a stray closing marker that precedes the opening one means no
/// section is present at all.
pub fn match_section(text: &str, tag: &str) -> Option<SectionMatch> {
    debug_assert!(is_valid_tag(tag), "invalid section tag: {:?}", tag);

    // ASCII lowercasing keeps byte offsets identical to `text`.
    let haystack = text.to_ascii_lowercase();
    let open = open_marker(&tag.to_ascii_lowercase());
    let close = close_marker(&tag.to_ascii_lowercase());

    let start = haystack.find(&open)?;
    let end = haystack.find(&close)?;
    if end <= start {
        return None;
    }

    let span_end = end + close.len();
    let raw_body = text[start + open.len()..end].trim().to_string();

    let mut remaining = String::with_capacity(text.len() - (span_end - start));
    remaining.push_str(&text[..start]);
    remaining.push_str(&text[span_end..]);

    Some(SectionMatch {
        section: TaggedSection {
            tag: tag.to_string(),
            raw_body,
            span: start..span_end,
        },
        remaining,
    })
}

/// Remove every section for `tag`, not just the first.
///
/// Sections are matched non-greedily, so two blocks in one message are two
/// separate removals and the prose between them survives.
pub fn strip_sections(text: &str, tag: &str) -> String {
    if !text.contains('[') {
        return text.to_string();
    }

    with_pattern(tag, |pattern| pattern.replace_all(text, "").into_owned())
        .unwrap_or_else(|| text.to_string())
}

/// Collect every section for `tag` in order of appearance.
pub fn find_sections(text: &str, tag: &str) -> Vec<TaggedSection> {
    with_pattern(tag, |pattern| {
        pattern
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let body = caps.get(1)?;
                Some(TaggedSection {
                    tag: tag.to_string(),
                    raw_body: body.as_str().trim().to_string(),
                    span: whole.range(),
                })
            })
            .collect()
    })
    .unwrap_or_default()
}

fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty() && !tag.contains(['[', ']'])
}

fn with_pattern<T>(tag: &str, f: impl FnOnce(&Regex) -> T) -> Option<T> {
    debug_assert!(is_valid_tag(tag), "invalid section tag: {:?}", tag);

    let normalized = tag.to_ascii_lowercase();
    match normalized.as_str() {
        COMPONENT_TAG => Some(f(Lazy::force(&COMPONENT_PATTERN))),
        FORM_DATA_TAG => Some(f(Lazy::force(&FORM_DATA_PATTERN))),
        QUICK_REPLY_TAG => Some(f(Lazy::force(&QUICK_REPLY_PATTERN))),
        _ => match section_pattern(&normalized) {
            Ok(pattern) => Some(f(&pattern)),
            Err(e) => {
                tracing::warn!("Invalid section pattern for tag {}: {}", tag, e);
                None
            }
        },
    }
}

fn section_pattern(tag: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        "(?s){}(.*?){}",
        marker_pattern(&open_marker(tag)),
        marker_pattern(&close_marker(tag))
    ))
}

/// Literal pattern for a marker where only ASCII letters fold case, the same
/// rule `match_section` applies through `to_ascii_lowercase`.
fn marker_pattern(marker: &str) -> String {
    marker
        .chars()
        .map(|c| {
            if c.is_ascii_alphabetic() {
                format!("[{}{}]", c.to_ascii_lowercase(), c.to_ascii_uppercase())
            } else {
                regex::escape(c.encode_utf8(&mut [0; 4]))
            }
        })
        .collect()
}

fn known_pattern(tag: &str) -> Regex {
    section_pattern(tag).expect("Invalid built-in section regex")
}
