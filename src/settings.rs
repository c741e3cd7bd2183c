//! Game settings and preferences
//!
//! Persisted as JSON next to the leaderboard.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::sim::Difficulty;

/// Environment variable overriding the settings file location
pub const SETTINGS_ENV: &str = "ROBOT_ARENA_SETTINGS";
/// Default settings file
pub const DEFAULT_SETTINGS_FILE: &str = "robot_arena_settings.json";

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Name recorded on the leaderboard (empty => `$USER`, then "Player")
    pub player_name: String,

    // === Arena ===
    /// Fixed arena width; derived from the terminal when unset
    pub arena_width: Option<i32>,
    /// Fixed arena height; derived from the terminal when unset
    pub arena_height: Option<i32>,
    /// Level 1 board
    pub difficulty: Difficulty,
    /// RNG seed for reproducible boards (OS entropy when unset)
    pub seed: Option<u64>,

    // === Files ===
    /// Leaderboard file
    pub scores_path: PathBuf,
    /// Log destination; logging is off without it unless `RUST_LOG` is set
    pub log_file: Option<PathBuf>,

    // === HUD ===
    /// Entries shown on the welcome screen
    pub welcome_scores: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            player_name: String::new(),

            arena_width: None,
            arena_height: None,
            difficulty: Difficulty::default(),
            seed: None,

            scores_path: PathBuf::from("scores.json"),
            log_file: None,

            welcome_scores: 3,
        }
    }
}

impl Settings {
    /// Settings file location (`ROBOT_ARENA_SETTINGS` or the default name)
    pub fn default_path() -> PathBuf {
        std::env::var_os(SETTINGS_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE))
    }

    /// Load settings, falling back to defaults on a missing or bad file
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(err) => {
                    log::warn!("Bad settings file {}: {}", path.display(), err);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Name to record scores under
    pub fn effective_player_name(&self) -> String {
        let configured = self.player_name.trim();
        if !configured.is_empty() {
            return configured.to_string();
        }
        std::env::var("USER")
            .ok()
            .map(|user| user.trim().to_string())
            .filter(|user| !user.is_empty())
            .unwrap_or_else(|| "Player".to_string())
    }

    /// Arena size for a terminal of `cols` x `rows`: two columns per cell,
    /// plus room for the border and status line. Fixed sizes win.
    pub fn arena_size(&self, cols: u16, rows: u16) -> (i32, i32) {
        let width = self
            .arena_width
            .unwrap_or((i32::from(cols) - 4) / 2);
        let height = self.arena_height.unwrap_or(i32::from(rows) - 5);
        (width, height)
    }
}
