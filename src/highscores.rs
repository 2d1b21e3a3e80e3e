//! Crystal haul leaderboard
//!
//! Every finished level (completed or not) is a candidate entry. Persisted to
//! LocalStorage, keeps the top 10 hauls.

use serde::{Deserialize, Serialize};

use crate::sim::{LevelOutcome, LevelReport};

/// Maximum number of entries to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Crystals collected on the level
    pub crystals: u32,
    pub level: u32,
    /// Whether the rocket made it to the end of the course
    pub completed: bool,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// Crystal haul leaderboard, sorted best first
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// LocalStorage key (used only in wasm32)
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    const STORAGE_KEY: &'static str = "rocket_run_highscores";

    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a haul would make the board
    pub fn qualifies(&self, crystals: u32) -> bool {
        if crystals == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().is_none_or(|e| crystals > e.crystals)
    }

    /// Record a finished level. Returns the rank achieved (1-indexed) or None
    /// if it didn't qualify. Ties rank below earlier entries.
    pub fn record(&mut self, report: &LevelReport, timestamp: f64) -> Option<usize> {
        if !self.qualifies(report.crystals) {
            return None;
        }

        let entry = HighScoreEntry {
            crystals: report.crystals,
            level: report.level,
            completed: report.outcome == LevelOutcome::Completed,
            timestamp,
        };

        let pos = self
            .entries
            .iter()
            .position(|e| report.crystals > e.crystals)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
        self.entries.truncate(MAX_HIGH_SCORES);

        Some(pos + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Best haul so far
    pub fn best(&self) -> Option<u32> {
        self.entries.first().map(|e| e.crystals)
    }

    /// Load the leaderboard from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage
            && let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY)
            && let Ok(scores) = serde_json::from_str::<HighScores>(&json)
        {
            log::info!("Loaded {} high scores", scores.entries.len());
            return scores;
        }

        log::info!("No high scores found, starting fresh");
        Self::new()
    }

    /// Save the leaderboard to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage
            && let Ok(json) = serde_json::to_string(self)
        {
            let _ = storage.set_item(Self::STORAGE_KEY, &json);
            log::info!("High scores saved ({} entries)", self.entries.len());
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
