//! Persistence for [`AssistantState`].

use crate::state::AssistantState;
use crate::Result;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Where widget state is kept between visits.
pub trait StateStore {
    /// Load the stored state. Nothing stored yields `Ok(None)`.
    fn load(&self) -> Result<Option<AssistantState>>;

    fn save(&mut self, state: &AssistantState) -> Result<()>;

    /// Forget the stored state.
    fn clear(&mut self) -> Result<()>;
}

/// Load stored state, falling back to `fallback` when nothing is stored or
/// the stored document cannot be read.
pub fn load_or<S: StateStore + ?Sized>(store: &S, fallback: AssistantState) -> AssistantState {
    match store.load() {
        Ok(Some(state)) => state,
        Ok(None) => fallback,
        Err(e) => {
            tracing::warn!("Failed to load assistant state, starting fresh: {}", e);
            fallback
        }
    }
}

/// State persisted as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the default state file path.
    ///
    /// Default path: `~/.square-ai/assistant/state.json`
    /// Can be overridden with `SQUARE_ASSISTANT_STATE_FILE` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("SQUARE_ASSISTANT_STATE_FILE") {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".square-ai/assistant/state.json"))
            .unwrap_or_else(|| PathBuf::from("assistant_state.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Option<AssistantState>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&mut self, state: &AssistantState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, content)?;
        tracing::debug!("Saved assistant state to {}", self.path.display());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// In-memory store, for hosts without durable storage and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Option<AssistantState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<AssistantState>> {
        Ok(self.state.clone())
    }

    fn save(&mut self, state: &AssistantState) -> Result<()> {
        self.state = Some(state.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.state = None;
        Ok(())
    }
}
