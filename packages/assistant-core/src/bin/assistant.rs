//! Assistant CLI - command line interface over the assistant core.
//!
//! Every command prints a JSON `ApiResponse` on stdout; logs go to stderr.

use anyhow::{Context, Result};
use assistant_core::{
    markup::{extract_quick_replies, preview_text},
    parse_part, should_render_text_bubble, store, ApiResponse, AssistantConfig,
    AssistantMessageBuilder, AssistantState, ChatStatus, CleanOptions, ComponentPayload,
    JsonFileStore, Message, MessageRole, StateStore,
};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;
use std::io::{self, Read};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "assistant")]
#[command(about = "Square AI assistant CLI - message markup and widget state")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a message part (reads stdin when TEXT is omitted)
    Parse {
        text: Option<String>,
        /// Role of the message author
        #[arg(short, long, value_enum, default_value = "assistant")]
        role: RoleArg,
        /// Also remove quick-reply sections from the display text
        #[arg(long)]
        quick_replies: bool,
    },
    /// Preview text for the closed trigger
    Preview {
        text: Option<String>,
        /// Maximum characters (defaults to the configured length)
        #[arg(short, long)]
        length: Option<usize>,
    },
    /// Build an assistant message
    Build {
        /// Component payload as a JSON object
        #[arg(short, long)]
        component: Option<String>,
        /// Form data as a JSON object
        #[arg(short, long)]
        form_data: Option<String>,
        /// Instruction paragraphs
        #[arg(short, long, num_args = 1..)]
        instructions: Vec<String>,
    },
    /// Widget state commands
    State {
        #[command(subcommand)]
        action: StateAction,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
enum StateAction {
    /// Show the stored state
    Show,
    /// Open or close the panel
    ToggleOpen,
    /// Mute or unmute audio cues
    ToggleMute,
    /// Forget the conversation
    Clear,
    /// Record a message snapshot (JSON array on stdin)
    Ingest {
        /// Transport status for the snapshot
        #[arg(short, long, value_enum, default_value = "ready")]
        status: StatusArg,
    },
    /// Show the welcome preview if it is due
    Welcome,
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    User,
    Assistant,
    System,
}

impl From<RoleArg> for MessageRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::User => MessageRole::User,
            RoleArg::Assistant => MessageRole::Assistant,
            RoleArg::System => MessageRole::System,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Submitted,
    Streaming,
    Ready,
    Error,
}

impl From<StatusArg> for ChatStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Submitted => ChatStatus::Submitted,
            StatusArg::Streaming => ChatStatus::Streaming,
            StatusArg::Ready => ChatStatus::Ready,
            StatusArg::Error => ChatStatus::Error,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AssistantConfig::load().context("Failed to load assistant config")?;

    let output = match cli.command {
        Commands::Parse {
            text,
            role,
            quick_replies,
        } => handle_parse(&read_text(text)?, role.into(), quick_replies)?,
        Commands::Preview { text, length } => {
            let length = length.unwrap_or(config.preview_length);
            respond(ApiResponse::ok(json!({
                "preview": preview_text(&read_text(text)?, length),
            })))?
        }
        Commands::Build {
            component,
            form_data,
            instructions,
        } => handle_build(component, form_data, instructions)?,
        Commands::State { action } => handle_state(action, &config)?,
        Commands::Config => respond(ApiResponse::ok(&config))?,
    };

    println!("{}", output);
    Ok(())
}

fn read_text(text: Option<String>) -> Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            Ok(buffer)
        }
    }
}

fn respond<T: Serialize>(response: ApiResponse<T>) -> Result<String> {
    Ok(serde_json::to_string_pretty(&response)?)
}

fn handle_parse(text: &str, role: MessageRole, quick_replies: bool) -> Result<String> {
    let options = CleanOptions {
        strip_quick_replies: quick_replies,
    };
    let parsed = parse_part(text, options);
    let render_text = should_render_text_bubble(parsed.component.as_ref(), &parsed.text, role);

    respond(ApiResponse::ok(json!({
        "component": parsed.component,
        "notification": parsed.component.as_ref().map(ComponentPayload::notification),
        "text": parsed.text,
        "render_text": render_text,
        "quick_replies": extract_quick_replies(text),
    })))
}

fn handle_build(
    component: Option<String>,
    form_data: Option<String>,
    instructions: Vec<String>,
) -> Result<String> {
    let mut builder = AssistantMessageBuilder::new().instructions(instructions);

    if let Some(component) = component {
        match ComponentPayload::from_json(&component) {
            Ok(payload) => builder = builder.component(payload),
            Err(e) => return respond(ApiResponse::<()>::err(e.to_string())),
        }
    }

    if let Some(form_data) = form_data {
        match serde_json::from_str::<serde_json::Value>(&form_data) {
            Ok(serde_json::Value::Object(fields)) => builder = builder.form_data(fields),
            Ok(_) => return respond(ApiResponse::<()>::err("Form data must be a JSON object")),
            Err(e) => return respond(ApiResponse::<()>::err(format!("Invalid form data: {}", e))),
        }
    }

    respond(ApiResponse::ok(json!({
        "message": builder.build(),
    })))
}

fn handle_state(action: StateAction, config: &AssistantConfig) -> Result<String> {
    let mut store = JsonFileStore::new(
        config
            .state_file
            .clone()
            .unwrap_or_else(JsonFileStore::default_path),
    );
    let now = Utc::now();
    let mut state = store::load_or(&store, AssistantState::new(config));
    state.resume(now, config);

    let events = match action {
        StateAction::Show => Vec::new(),
        StateAction::ToggleOpen => {
            state.toggle_expanded();
            Vec::new()
        }
        StateAction::ToggleMute => {
            state.toggle_muted();
            Vec::new()
        }
        StateAction::Clear => {
            state.clear_chat(config);
            Vec::new()
        }
        StateAction::Ingest { status } => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read stdin")?;
            let messages: Vec<Message> = match serde_json::from_str(&input) {
                Ok(messages) => messages,
                Err(e) => return respond(ApiResponse::<()>::err(format!("Invalid messages: {}", e))),
            };
            state.record_messages(&messages, status.into(), now, config)
        }
        StateAction::Welcome => state.show_welcome(config, true),
    };

    if let Err(e) = store.save(&state) {
        return respond(ApiResponse::<()>::err(e.to_string()));
    }

    respond(ApiResponse::ok(json!({
        "expanded": state.expanded,
        "muted": state.muted,
        "has_unread": state.has_unread(),
        "message_count": state.messages().len(),
        "preview": state.last_assistant_preview,
        "suggestions": state.suggestions,
        "trigger_position": state.trigger_position,
        "panel_position": state.panel_position,
        "events": events,
    })))
}
