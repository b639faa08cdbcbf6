//! Floating assistant widget state.
//!
//! All widget state lives in [`AssistantState`]. Updates are plain methods
//! that return the side effects the host should perform (audio cues,
//! suggestion refreshes) instead of performing them. Persistence goes through
//! [`crate::store::StateStore`].

use crate::config::AssistantConfig;
use crate::markup::{preview_text, quick_replies_for_message};
use crate::types::{ChatStatus, Message, MessageRole};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

const TRIGGER_SIZE: f64 = 64.0;
const PANEL_WIDTH: f64 = 432.0;
const PANEL_HEIGHT: f64 = 568.0;
const PANEL_MARGIN: f64 = 24.0;
const TRIGGER_MARGIN_BOTTOM: f64 = 40.0;

/// Drag offset of the trigger button or the panel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Stored conversation with the time it was last saved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatHistory {
    pub messages: Vec<Message>,
    pub timestamp: DateTime<Utc>,
}

impl ChatHistory {
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.timestamp >= ttl
    }
}

/// Which message the user has seen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ReadStatus {
    pub last_read_message_id: Option<String>,
    pub has_unread: bool,
}

/// Audio cue to play.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Cue {
    /// A user message went out
    Send,
    /// An assistant message arrived
    Receive,
}

/// Side effect requested by a state update.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum AssistantEvent {
    PlayCue(Cue),
    SuggestionsUpdated(Vec<String>),
}

/// Bounds for dragging the trigger or the panel, relative to its anchor.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct DragConstraints {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl DragConstraints {
    /// Constraints for a viewport. The open panel is centred; the closed
    /// trigger sits near the bottom edge.
    pub fn for_viewport(width: f64, height: f64, expanded: bool) -> Self {
        if expanded {
            let horizontal = width / 2.0 - PANEL_WIDTH / 2.0 - PANEL_MARGIN;
            let vertical = height / 2.0 - PANEL_HEIGHT / 2.0 - PANEL_MARGIN;
            Self {
                left: -horizontal,
                right: horizontal,
                top: -vertical,
                bottom: vertical,
            }
        } else {
            let horizontal = width / 2.0 - TRIGGER_SIZE / 2.0 - PANEL_MARGIN;
            Self {
                left: -horizontal,
                right: horizontal,
                top: -(height - TRIGGER_MARGIN_BOTTOM - TRIGGER_SIZE),
                bottom: TRIGGER_MARGIN_BOTTOM,
            }
        }
    }

    pub fn clamp(&self, position: Position) -> Position {
        Position {
            x: position.x.max(self.left).min(self.right),
            y: position.y.max(self.top).min(self.bottom),
        }
    }
}

/// Widget state.
///
/// Only user preferences, positions, history and read status are persisted;
/// the rest is rebuilt from the history by [`AssistantState::resume`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AssistantState {
    /// Panel open
    pub expanded: bool,
    pub muted: bool,
    pub trigger_position: Position,
    pub panel_position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<ChatHistory>,
    pub read_status: ReadStatus,

    #[serde(skip)]
    pub suggestions: Vec<String>,
    /// Preview of the latest assistant message for the closed trigger
    #[serde(skip)]
    pub last_assistant_preview: String,
    #[serde(skip)]
    pub has_shown_welcome: bool,
    #[serde(skip)]
    pub dragging: bool,
    /// Latest message id seen, for cue decisions
    #[serde(skip)]
    last_message_id: Option<String>,
    /// Latest assistant message whose quick replies were adopted
    #[serde(skip)]
    last_processed_message_id: Option<String>,
}

impl AssistantState {
    /// Fresh state for a first visit.
    pub fn new(config: &AssistantConfig) -> Self {
        Self {
            expanded: !config.default_collapsed,
            suggestions: config.default_suggestions.clone(),
            ..Self::default()
        }
    }

    /// Messages currently held, oldest first.
    pub fn messages(&self) -> &[Message] {
        self.history
            .as_ref()
            .map(|history| history.messages.as_slice())
            .unwrap_or_default()
    }

    pub fn has_unread(&self) -> bool {
        self.read_status.has_unread
    }

    /// Drop stored history older than `ttl` and return what survives.
    ///
    /// Expired or empty history takes its read status with it.
    pub fn restore_history(&mut self, now: DateTime<Utc>, ttl: Duration) -> Vec<Message> {
        match self.history.take() {
            Some(history) if !history.is_expired(now, ttl) && !history.messages.is_empty() => {
                let messages = history.messages.clone();
                self.history = Some(history);
                messages
            }
            Some(_) => {
                tracing::debug!("Discarding expired chat history");
                self.read_status = ReadStatus::default();
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Restore history after loading and rebuild the derived fields.
    ///
    /// Restoring never plays a cue.
    pub fn resume(&mut self, now: DateTime<Utc>, config: &AssistantConfig) -> Vec<Message> {
        let messages = self.restore_history(now, config.chat_ttl());
        self.suggestions = config.default_suggestions.clone();
        if !messages.is_empty() {
            self.record_messages(&messages, ChatStatus::Ready, now, config);
        }
        messages
    }

    /// Take a new snapshot of the conversation from the transport.
    ///
    /// - stores the snapshot as history stamped with `now`
    /// - refreshes the preview and marks it unread while the panel is closed
    /// - adopts the latest assistant message's quick replies once it has
    ///   finished streaming, once per message
    /// - requests a cue when the latest message id changes, except for the
    ///   very first snapshot and while muted
    ///
    /// An empty snapshot resets the trackers, suggestions and preview.
    pub fn record_messages(
        &mut self,
        messages: &[Message],
        status: ChatStatus,
        now: DateTime<Utc>,
        config: &AssistantConfig,
    ) -> Vec<AssistantEvent> {
        let mut events = Vec::new();

        let Some(latest) = messages.last() else {
            self.last_message_id = None;
            self.last_processed_message_id = None;
            self.read_status.last_read_message_id = None;
            self.suggestions = config.default_suggestions.clone();
            self.last_assistant_preview.clear();
            return events;
        };

        self.history = Some(ChatHistory {
            messages: messages.to_vec(),
            timestamp: now,
        });

        if latest.role == MessageRole::Assistant {
            let preview = latest
                .text_parts()
                .map(|text| preview_text(text, config.preview_length))
                .find(|preview| !preview.is_empty());

            if let Some(preview) = preview {
                self.last_assistant_preview = preview;
                if !self.expanded
                    && self.read_status.last_read_message_id.as_deref() != Some(latest.id.as_str())
                {
                    self.read_status.has_unread = true;
                }
            }

            if status != ChatStatus::Streaming
                && self.last_processed_message_id.as_deref() != Some(latest.id.as_str())
            {
                let replies = quick_replies_for_message(latest);
                if !replies.is_empty() {
                    tracing::debug!("Adopting {} quick replies from {}", replies.len(), latest.id);
                    self.suggestions = replies.clone();
                    events.push(AssistantEvent::SuggestionsUpdated(replies));
                }
                self.last_processed_message_id = Some(latest.id.clone());
            }
        }

        if self.expanded {
            self.mark_read();
        }

        if let Some(cue) = self.next_cue(latest) {
            events.push(AssistantEvent::PlayCue(cue));
        }

        events
    }

    fn next_cue(&mut self, latest: &Message) -> Option<Cue> {
        let previous = self.last_message_id.replace(latest.id.clone())?;
        if previous == latest.id || self.muted {
            return None;
        }

        match latest.role {
            MessageRole::Assistant => Some(Cue::Receive),
            MessageRole::User => Some(Cue::Send),
            MessageRole::System => None,
        }
    }

    /// Show the welcome preview once, when the widget is ready and the
    /// conversation is empty. The host calls this after
    /// `welcome_delay_secs`.
    pub fn show_welcome(&mut self, config: &AssistantConfig, ready: bool) -> Vec<AssistantEvent> {
        if self.has_shown_welcome || !self.messages().is_empty() || !ready {
            return Vec::new();
        }

        self.last_assistant_preview = config.welcome_message.clone();
        self.read_status.has_unread = true;
        self.has_shown_welcome = true;

        if self.muted {
            Vec::new()
        } else {
            vec![AssistantEvent::PlayCue(Cue::Receive)]
        }
    }

    /// Open or close the panel. A click that ends a drag does not toggle.
    ///
    /// Returns whether the panel state changed.
    pub fn toggle_expanded(&mut self) -> bool {
        if self.dragging {
            self.dragging = false;
            return false;
        }

        self.expanded = !self.expanded;
        if self.expanded {
            self.mark_read();
        }
        tracing::debug!("Assistant panel expanded={}", self.expanded);
        true
    }

    pub fn open(&mut self) -> bool {
        !self.expanded && self.toggle_expanded()
    }

    pub fn close(&mut self) -> bool {
        self.expanded && self.toggle_expanded()
    }

    /// Flip the mute flag and return the new value.
    pub fn toggle_muted(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    pub fn start_drag(&mut self) {
        self.dragging = true;
    }

    /// Record where the trigger was dropped, clamped to `bounds`. The drag
    /// flag stays set so the click that ends the drag is swallowed by
    /// [`Self::toggle_expanded`].
    pub fn move_trigger(&mut self, position: Position, bounds: &DragConstraints) {
        self.trigger_position = bounds.clamp(position);
    }

    /// Clear the drag flag once the host's debounce elapses.
    pub fn settle_drag(&mut self) {
        self.dragging = false;
    }

    /// Record where the open panel was dropped, clamped to `bounds`.
    pub fn move_panel(&mut self, position: Position, bounds: &DragConstraints) {
        self.panel_position = bounds.clamp(position);
    }

    /// Forget the conversation.
    pub fn clear_chat(&mut self, config: &AssistantConfig) {
        self.history = None;
        self.read_status = ReadStatus::default();
        self.last_assistant_preview.clear();
        self.last_message_id = None;
        self.last_processed_message_id = None;
        self.suggestions = config.default_suggestions.clone();
    }

    fn mark_read(&mut self) {
        self.read_status.has_unread = false;
        if let Some(id) = self.messages().last().map(|message| message.id.clone()) {
            self.read_status.last_read_message_id = Some(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn user(id: &str, text: &str) -> Message {
        Message::text(id, MessageRole::User, text)
    }

    fn assistant(id: &str, text: &str) -> Message {
        Message::text(id, MessageRole::Assistant, text)
    }

    fn cues(events: &[AssistantEvent]) -> Vec<Cue> {
        events
            .iter()
            .filter_map(|event| match event {
                AssistantEvent::PlayCue(cue) => Some(*cue),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_new_state_from_config() {
        let mut config = AssistantConfig::default();
        config.default_collapsed = false;
        config.default_suggestions = vec!["Hi".to_string()];

        let state = AssistantState::new(&config);
        assert!(state.expanded);
        assert_eq!(state.suggestions, vec!["Hi"]);
        assert!(state.messages().is_empty());
    }

    #[test]
    fn test_first_snapshot_is_silent() {
        let config = AssistantConfig::default();
        let mut state = AssistantState::new(&config);

        let events = state.record_messages(&[user("u1", "hello")], ChatStatus::Submitted, now(), &config);
        assert!(cues(&events).is_empty());
    }

    #[test]
    fn test_cues_follow_new_messages() {
        let config = AssistantConfig::default();
        let mut state = AssistantState::new(&config);
        let mut messages = vec![user("u1", "hello")];
        state.record_messages(&messages, ChatStatus::Ready, now(), &config);

        messages.push(user("u2", "pricing?"));
        let events = state.record_messages(&messages, ChatStatus::Submitted, now(), &config);
        assert_eq!(cues(&events), vec![Cue::Send]);

        messages.push(assistant("a1", "Our"));
        let events = state.record_messages(&messages, ChatStatus::Streaming, now(), &config);
        assert_eq!(cues(&events), vec![Cue::Receive]);

        // Same id growing while streaming does not replay the cue.
        *messages.last_mut().unwrap() = assistant("a1", "Our plans start at...");
        let events = state.record_messages(&messages, ChatStatus::Streaming, now(), &config);
        assert!(cues(&events).is_empty());
    }

    #[test]
    fn test_muted_and_system_messages_are_silent() {
        let config = AssistantConfig::default();
        let mut state = AssistantState::new(&config);
        let mut messages = vec![user("u1", "hello")];
        state.record_messages(&messages, ChatStatus::Ready, now(), &config);

        assert!(state.toggle_muted());
        messages.push(assistant("a1", "hi"));
        let events = state.record_messages(&messages, ChatStatus::Ready, now(), &config);
        assert!(cues(&events).is_empty());

        assert!(!state.toggle_muted());
        messages.push(Message::text("s1", MessageRole::System, "note"));
        let events = state.record_messages(&messages, ChatStatus::Ready, now(), &config);
        assert!(cues(&events).is_empty());
    }

    #[test]
    fn test_quick_replies_adopted_after_streaming() {
        let config = AssistantConfig::default();
        let mut state = AssistantState::new(&config);
        let messages = vec![
            user("u1", "hi"),
            assistant("a1", "Hello! [quick-reply]\n- Products\n- Pricing\n[/quick-reply]"),
        ];

        let events = state.record_messages(&messages, ChatStatus::Streaming, now(), &config);
        assert!(state.suggestions.is_empty());
        assert!(!events.iter().any(|e| matches!(e, AssistantEvent::SuggestionsUpdated(_))));

        let events = state.record_messages(&messages, ChatStatus::Ready, now(), &config);
        assert_eq!(state.suggestions, vec!["Products", "Pricing"]);
        assert!(events.contains(&AssistantEvent::SuggestionsUpdated(vec![
            "Products".to_string(),
            "Pricing".to_string()
        ])));

        // Processed once per message id.
        let events = state.record_messages(&messages, ChatStatus::Ready, now(), &config);
        assert!(events.is_empty());
    }

    #[test]
    fn test_message_without_replies_keeps_suggestions() {
        let mut config = AssistantConfig::default();
        config.default_suggestions = vec!["Start".to_string()];
        let mut state = AssistantState::new(&config);

        state.record_messages(&[assistant("a1", "Plain answer")], ChatStatus::Ready, now(), &config);
        assert_eq!(state.suggestions, vec!["Start"]);
    }

    #[test]
    fn test_preview_and_unread_when_closed() {
        let config = AssistantConfig::default();
        let mut state = AssistantState::new(&config);
        assert!(!state.expanded);

        let messages = vec![assistant(
            "a1",
            "[component]{\"component\":\"x\"}[/component]Welcome back [quick-reply]- A[/quick-reply]",
        )];
        state.record_messages(&messages, ChatStatus::Ready, now(), &config);

        assert_eq!(state.last_assistant_preview, "Welcome back");
        assert!(state.has_unread());

        assert!(state.open());
        assert!(!state.has_unread());
        assert_eq!(state.read_status.last_read_message_id.as_deref(), Some("a1"));

        // Already read: closing and re-recording the same message stays read.
        assert!(state.close());
        state.record_messages(&messages, ChatStatus::Ready, now(), &config);
        assert!(!state.has_unread());
    }

    #[test]
    fn test_open_panel_marks_new_messages_read() {
        let config = AssistantConfig::default();
        let mut state = AssistantState::new(&config);
        state.open();

        state.record_messages(&[assistant("a1", "hi")], ChatStatus::Ready, now(), &config);
        assert!(!state.has_unread());
        assert_eq!(state.read_status.last_read_message_id.as_deref(), Some("a1"));
    }

    #[test]
    fn test_empty_snapshot_resets() {
        let mut config = AssistantConfig::default();
        config.default_suggestions = vec!["Default".to_string()];
        let mut state = AssistantState::new(&config);
        state.record_messages(
            &[assistant("a1", "x [quick-reply]- Y[/quick-reply]")],
            ChatStatus::Ready,
            now(),
            &config,
        );
        assert_eq!(state.suggestions, vec!["Y"]);

        let events = state.record_messages(&[], ChatStatus::Ready, now(), &config);
        assert!(events.is_empty());
        assert_eq!(state.suggestions, vec!["Default"]);
        assert!(state.last_assistant_preview.is_empty());
        assert!(state.read_status.last_read_message_id.is_none());
    }

    #[test]
    fn test_restore_history_ttl() {
        let config = AssistantConfig::default();
        let mut state = AssistantState::new(&config);
        state.record_messages(&[user("u1", "hi")], ChatStatus::Ready, now(), &config);
        state.read_status.has_unread = true;

        let mut fresh = state.clone();
        let restored = fresh.restore_history(now() + Duration::minutes(119), config.chat_ttl());
        assert_eq!(restored.len(), 1);
        assert!(fresh.has_unread());

        let restored = state.restore_history(now() + Duration::hours(2), config.chat_ttl());
        assert!(restored.is_empty());
        assert!(state.history.is_none());
        assert_eq!(state.read_status, ReadStatus::default());
    }

    #[test]
    fn test_resume_rebuilds_without_cue() {
        let config = AssistantConfig::default();
        let mut state = AssistantState::new(&config);
        let messages = vec![
            user("u1", "hi"),
            assistant("a1", "Hello [quick-reply]- Demo[/quick-reply]"),
        ];
        state.record_messages(&messages, ChatStatus::Ready, now(), &config);

        let json = serde_json::to_string(&state).unwrap();
        let mut loaded: AssistantState = serde_json::from_str(&json).unwrap();
        assert!(loaded.suggestions.is_empty());

        let later = now() + Duration::minutes(30);
        let restored = loaded.resume(later, &config);
        assert_eq!(restored, messages);
        assert_eq!(loaded.suggestions, vec!["Demo"]);
        assert_eq!(loaded.last_assistant_preview, "Hello");
        assert_eq!(loaded.history.as_ref().unwrap().timestamp, later);

        // The next message is the first change after resuming.
        let mut next = messages.clone();
        next.push(user("u2", "Demo"));
        let events = loaded.record_messages(&next, ChatStatus::Submitted, later, &config);
        assert_eq!(cues(&events), vec![Cue::Send]);
    }

    #[test]
    fn test_welcome_once() {
        let config = AssistantConfig::default();
        let mut state = AssistantState::new(&config);

        assert!(state.show_welcome(&config, false).is_empty());

        let events = state.show_welcome(&config, true);
        assert_eq!(events, vec![AssistantEvent::PlayCue(Cue::Receive)]);
        assert_eq!(state.last_assistant_preview, config.welcome_message);
        assert!(state.has_unread());

        assert!(state.show_welcome(&config, true).is_empty());
    }

    #[test]
    fn test_welcome_skipped_with_history() {
        let config = AssistantConfig::default();
        let mut state = AssistantState::new(&config);
        state.record_messages(&[user("u1", "hi")], ChatStatus::Ready, now(), &config);

        assert!(state.show_welcome(&config, true).is_empty());
        assert!(!state.has_shown_welcome);
    }

    #[test]
    fn test_welcome_muted() {
        let config = AssistantConfig::default();
        let mut state = AssistantState::new(&config);
        state.toggle_muted();

        assert!(state.show_welcome(&config, true).is_empty());
        assert!(state.has_shown_welcome);
    }

    #[test]
    fn test_drag_swallows_toggle() {
        let config = AssistantConfig::default();
        let mut state = AssistantState::new(&config);

        state.start_drag();
        state.move_trigger(
            Position::new(-120.0, -300.0),
            &DragConstraints::for_viewport(1280.0, 800.0, false),
        );
        assert!(!state.toggle_expanded());
        assert!(!state.expanded);
        assert!(!state.dragging);
        assert_eq!(state.trigger_position, Position::new(-120.0, -300.0));

        state.start_drag();
        state.settle_drag();
        assert!(state.toggle_expanded());
        assert!(state.expanded);
    }

    #[test]
    fn test_clear_chat() {
        let config = AssistantConfig::default();
        let mut state = AssistantState::new(&config);
        state.record_messages(&[assistant("a1", "hi")], ChatStatus::Ready, now(), &config);
        assert!(state.has_unread());

        state.clear_chat(&config);
        assert!(state.history.is_none());
        assert!(!state.has_unread());
        assert!(state.last_assistant_preview.is_empty());

        // After clearing, the next snapshot is treated as the first one.
        let events = state.record_messages(&[user("u1", "again")], ChatStatus::Ready, now(), &config);
        assert!(cues(&events).is_empty());
    }

    #[test]
    fn test_persisted_fields_only() {
        let config = AssistantConfig::default();
        let mut state = AssistantState::new(&config);
        state.move_panel(
            Position::new(10.0, 20.0),
            &DragConstraints::for_viewport(1280.0, 800.0, true),
        );
        state.suggestions = vec!["x".to_string()];
        state.dragging = true;

        let value = serde_json::to_value(&state).unwrap();
        assert!(value.get("suggestions").is_none());
        assert!(value.get("dragging").is_none());
        assert!(value.get("history").is_none());
        assert_eq!(value["panel_position"]["y"], 20.0);

        let loaded: AssistantState = serde_json::from_value(value).unwrap();
        assert_eq!(loaded.panel_position, Position::new(10.0, 20.0));
        assert!(!loaded.dragging);
    }

    #[test]
    fn test_drag_constraints_expanded() {
        let c = DragConstraints::for_viewport(1280.0, 800.0, true);
        assert_relative_eq!(c.right, 1280.0 / 2.0 - 216.0 - 24.0);
        assert_relative_eq!(c.left, -c.right);
        assert_relative_eq!(c.bottom, 400.0 - 284.0 - 24.0);
        assert_relative_eq!(c.top, -c.bottom);
    }

    #[test]
    fn test_drag_constraints_collapsed() {
        let c = DragConstraints::for_viewport(1280.0, 800.0, false);
        assert_relative_eq!(c.right, 640.0 - 32.0 - 24.0);
        assert_relative_eq!(c.top, -(800.0 - 40.0 - 64.0));
        assert_relative_eq!(c.bottom, 40.0);

        let clamped = c.clamp(Position::new(5000.0, 100.0));
        assert_relative_eq!(clamped.x, c.right);
        assert_relative_eq!(clamped.y, 40.0);
    }

    #[test]
    fn test_dropped_positions_stay_on_screen() {
        let config = AssistantConfig::default();
        let mut state = AssistantState::new(&config);

        let collapsed = DragConstraints::for_viewport(1280.0, 800.0, false);
        state.move_trigger(Position::new(-5000.0, -5000.0), &collapsed);
        assert_eq!(state.trigger_position, Position::new(collapsed.left, collapsed.top));

        let expanded = DragConstraints::for_viewport(1280.0, 800.0, true);
        state.move_panel(Position::new(900.0, 10.0), &expanded);
        assert_relative_eq!(state.panel_position.x, expanded.right);
        assert_relative_eq!(state.panel_position.y, 10.0);
    }
}
