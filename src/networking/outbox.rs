//! Outgoing notifications
//!
//! Registry handlers never talk to the transport. They queue envelopes here
//! and the host drains them after each handler returns, in the order they
//! were queued.

use shared::{ConnectionId, MatchResult, ServerMessage};

/// One message addressed to one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub to: ConnectionId,
    pub message: ServerMessage,
}

/// Result to record against a participant's profile after a game ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreUpdate {
    pub display_name: String,
    pub result: MatchResult,
}

#[derive(Debug, Default)]
pub struct Outbox {
    envelopes: Vec<Envelope>,
    score_updates: Vec<ScoreUpdate>,
}

impl Outbox {
    pub fn send(&mut self, to: ConnectionId, message: ServerMessage) {
        self.envelopes.push(Envelope { to, message });
    }

    /// Queues a copy of `message` for each connection in `to`.
    pub fn send_all(&mut self, to: &[ConnectionId], message: &ServerMessage) {
        for conn in to {
            self.send(*conn, message.clone());
        }
    }

    pub fn record_score(&mut self, display_name: String, result: MatchResult) {
        self.score_updates.push(ScoreUpdate {
            display_name,
            result,
        });
    }

    pub fn drain(&mut self) -> Vec<Envelope> {
        std::mem::take(&mut self.envelopes)
    }

    pub fn drain_scores(&mut self) -> Vec<ScoreUpdate> {
        std::mem::take(&mut self.score_updates)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.envelopes.is_empty() && self.score_updates.is_empty()
    }
}
