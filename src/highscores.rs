//! High score leaderboard system
//!
//! Persisted as JSON in a flat file, tracks top 10 scores.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Player name
    pub name: String,
    /// Level reached
    pub level: u32,
    /// Final score
    pub score: i64,
}

/// High score leaderboard, sorted by score descending
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<ScoreEntry>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add an entry, keeping the board sorted and trimmed.
    /// Returns the rank achieved (1-indexed) or None if it fell off the end
    pub fn add(&mut self, entry: ScoreEntry) -> Option<usize> {
        // Ties go after existing entries
        let pos = self
            .entries
            .iter()
            .position(|e| entry.score > e.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);

        // Trim to max size
        self.entries.truncate(MAX_HIGH_SCORES);

        (pos < MAX_HIGH_SCORES).then_some(pos + 1)
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<i64> {
        self.entries.first().map(|e| e.score)
    }

    /// Best `n` entries
    pub fn top(&self, n: usize) -> &[ScoreEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    /// Restore ordering and size after loading from disk
    fn normalize(&mut self) {
        // Stable: equal scores keep file order
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(MAX_HIGH_SCORES);
    }
}

/// File-backed leaderboard store
#[derive(Debug, Clone)]
pub struct Leaderboard {
    path: PathBuf,
}

impl Leaderboard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored entries, best first. A missing or unreadable file is an
    /// empty leaderboard, never an error
    pub fn load_all(&self) -> Vec<ScoreEntry> {
        self.load().entries
    }

    /// Best `n` entries
    pub fn top_n(&self, n: usize) -> Vec<ScoreEntry> {
        let mut entries = self.load_all();
        entries.truncate(n);
        entries
    }

    /// Record a finished game and persist the trimmed board.
    /// Returns the rank achieved, if the score made the board
    pub fn save(&self, name: &str, level: u32, score: i64) -> io::Result<Option<usize>> {
        let mut scores = self.load();
        let rank = scores.add(ScoreEntry {
            name: name.to_string(),
            level,
            score,
        });

        let json = serde_json::to_string_pretty(&scores)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        log::info!(
            "High scores saved ({} entries, new rank {:?})",
            scores.entries.len(),
            rank
        );
        Ok(rank)
    }

    fn load(&self) -> HighScores {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    log::warn!("Could not read {}: {}", self.path.display(), err);
                }
                return HighScores::new();
            }
        };

        match serde_json::from_str::<HighScores>(&json) {
            Ok(mut scores) => {
                scores.normalize();
                log::debug!("Loaded {} high scores", scores.entries.len());
                scores
            }
            Err(err) => {
                log::warn!(
                    "Ignoring corrupt high score file {}: {}",
                    self.path.display(),
                    err
                );
                HighScores::new()
            }
        }
    }
}
