//! Score persistence
//!
//! The registry only emits score events; what happens to them is up to the
//! store behind [`ScoreStore`]. Writes are fire-and-forget from the game task,
//! so a slow store never holds up move handling.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use shared::{MatchResult, Score};

#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Adds one result to the tally of `display_name`.
    async fn record(&self, display_name: &str, result: MatchResult) -> anyhow::Result<()>;

    async fn score(&self, display_name: &str) -> anyhow::Result<Option<Score>>;
}

/// Process-local store. Scores are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryScoreStore {
    scores: RwLock<HashMap<String, Score>>,
}

impl InMemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScoreStore for InMemoryScoreStore {
    async fn record(&self, display_name: &str, result: MatchResult) -> anyhow::Result<()> {
        self.scores
            .write()
            .entry(display_name.to_string())
            .or_default()
            .record(result);
        Ok(())
    }

    async fn score(&self, display_name: &str) -> anyhow::Result<Option<Score>> {
        Ok(self.scores.read().get(display_name).copied())
    }
}
