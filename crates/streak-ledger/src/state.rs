//! The durable interaction-state record.
//!
//! Reloaded fresh at the start of every handler invocation and rewritten on
//! every transition, so a restarted process resumes mid-conversation
//! correctly. Nothing that outlives a single event lives only in memory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use streak_core::error::StreakError;

/// Process-wide interaction state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionState {
    /// True between a night "completed" answer and either a hard-topic reply
    /// or the timeout. The reply handler and the timeout are racing consumers
    /// of this flag; whichever observes true and clears it first wins.
    #[serde(default)]
    pub awaiting_hard_topic: bool,
    /// Evening prompts sent today; bounded, reset on "yes" or at the bound.
    #[serde(default)]
    pub evening_retry_count: u32,
}

/// Durable store for [`InteractionState`], one JSON file at a fixed path.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the current state. An absent file is the empty state.
    pub fn load(&self) -> Result<InteractionState, StreakError> {
        if !self.path.exists() {
            return Ok(InteractionState::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| StreakError::State(format!("failed to read {}: {e}", self.path.display())))?;
        serde_json::from_str(&content)
            .map_err(|e| StreakError::State(format!("failed to parse {}: {e}", self.path.display())))
    }

    /// Persist the state atomically (temp file + rename).
    pub fn store(&self, state: &InteractionState) -> Result<(), StreakError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StreakError::State(format!("failed to create state dir: {e}")))?;
        }
        let tmp = self.path.with_extension("tmp");
        let content = serde_json::to_string(state)?;
        std::fs::write(&tmp, content)
            .map_err(|e| StreakError::State(format!("failed to write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| StreakError::State(format!("failed to replace {}: {e}", self.path.display())))?;
        Ok(())
    }
}
