//! Session registry and matchmaking queue
//!
//! Owns every live session, the connection → session index and the waiting
//! queue. All methods take `&mut self` and run to completion, so the host
//! must drive one registry from a single task; that is what serialises moves
//! within a session.
//!
//! Notifications are not returned to the caller. They are queued on the
//! [`Outbox`] and drained by the host after each call, because joins and
//! pairings notify a second party that did not make the request.

use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info, warn};

use super::outbox::{Envelope, Outbox, ScoreUpdate};
use crate::core::MatchConfig;
use crate::game::error::{GameError, GameResult};
use crate::game::rules::{RulesEngine, ShakmatyRules};
use crate::game::session::Session;
use shared::{
    AiDifficulty, ClientMessage, Color, ConnectionId, Participant, PlayerProfile, Seats,
    ServerMessage, SessionId, SessionStatus,
};

/// Characters used in session codes.
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Draws tried before session creation gives up on finding a free code.
const MAX_CODE_ATTEMPTS: usize = 64;

/// A participant waiting to be paired.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub connection: ConnectionId,
    pub participant: PlayerProfile,
    pub enqueued_at: DateTime<Utc>,
}

/// In-memory sessions, queue and pending notifications.
pub struct MatchRegistry<R: RulesEngine = ShakmatyRules> {
    pub(crate) rules: R,
    config: MatchConfig,
    pub(crate) sessions: HashMap<SessionId, Session<R::Position>>,
    pub(crate) connection_sessions: HashMap<ConnectionId, SessionId>,
    queue: Vec<QueueEntry>,
    pub(crate) outbox: Outbox,
    pub(crate) rng: StdRng,
}

impl MatchRegistry<ShakmatyRules> {
    pub fn new(config: MatchConfig) -> Self {
        Self::with_rules(ShakmatyRules::new(), config, StdRng::from_os_rng())
    }

    /// Deterministic coin flips, codes and scripted moves.
    pub fn with_seed(config: MatchConfig, seed: u64) -> Self {
        Self::with_rules(ShakmatyRules::new(), config, StdRng::seed_from_u64(seed))
    }
}

impl<R: RulesEngine> MatchRegistry<R> {
    pub fn with_rules(rules: R, config: MatchConfig, rng: StdRng) -> Self {
        Self {
            rules,
            config,
            sessions: HashMap::new(),
            connection_sessions: HashMap::new(),
            queue: Vec::new(),
            outbox: Outbox::default(),
            rng,
        }
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn session(&self, id: &SessionId) -> Option<&Session<R::Position>> {
        self.sessions.get(id)
    }

    /// Session the connection is currently attached to.
    pub fn session_of(&self, connection: ConnectionId) -> Option<&SessionId> {
        self.connection_sessions.get(&connection)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_queued(&self, connection: ConnectionId) -> bool {
        self.queue.iter().any(|e| e.connection == connection)
    }

    pub fn drain_outbox(&mut self) -> Vec<Envelope> {
        self.outbox.drain()
    }

    pub fn drain_score_updates(&mut self) -> Vec<ScoreUpdate> {
        self.outbox.drain_scores()
    }

    /// Dispatches one client request. Failures are reported to the sender as
    /// an `error` message and never touch session state.
    pub fn handle(&mut self, connection: ConnectionId, message: ClientMessage) {
        let result = match message {
            ClientMessage::CreateSession { participant } => {
                self.create_session(connection, participant).map(|_| ())
            }
            ClientMessage::JoinSession {
                session_id,
                participant,
            } => self
                .join_session(connection, &session_id, participant)
                .map(|_| ()),
            ClientMessage::CreateAiSession {
                participant,
                difficulty,
                color,
            } => self
                .create_ai_session(connection, participant, difficulty, color)
                .map(|_| ()),
            ClientMessage::CreateLocalSession { white, black } => self
                .create_local_session(connection, white, black)
                .map(|_| ()),
            ClientMessage::EnqueueForMatch { participant } => {
                self.enqueue_for_match(connection, participant).map(|_| ())
            }
            ClientMessage::CancelQueue => {
                self.cancel_queue(connection);
                Ok(())
            }
            ClientMessage::SubmitMove { session_id, mv } => {
                self.submit_move(connection, &session_id, mv).map(|_| ())
            }
            ClientMessage::Resign { session_id } => self.resign(connection, &session_id),
            ClientMessage::Undo { session_id } => self.undo(connection, &session_id).map(|_| ()),
            ClientMessage::NewRound { session_id } => self.new_round(connection, &session_id),
        };

        if let Err(err) = result {
            debug!("[REGISTRY] Rejected request from {}: {}", connection, err);
            self.outbox.send(
                connection,
                ServerMessage::Error {
                    reason: err.reason(),
                    message: err.to_string(),
                },
            );
        }
    }

    /// Opens a private session with the creator on a random color.
    pub fn create_session(
        &mut self,
        connection: ConnectionId,
        profile: PlayerProfile,
    ) -> GameResult<(SessionId, Color)> {
        self.ensure_free(connection)?;
        self.leave_queue(connection);

        let id = self.generate_code()?;
        let color = self.coin_flip();
        let session = Session::new_pending(
            id.clone(),
            color,
            Participant::human(connection, profile),
            self.rules.initial_position(),
        );
        self.sessions.insert(id.clone(), session);
        self.connection_sessions.insert(connection, id.clone());

        info!("[REGISTRY] Created session {} for {} as {}", id, connection, color);
        self.outbox.send(
            connection,
            ServerMessage::GameCreated {
                session_id: id.clone(),
                color,
            },
        );
        Ok((id, color))
    }

    /// Takes the free seat of a pending session. Filling it starts the game
    /// and both sides get `sessionStarted`.
    pub fn join_session(
        &mut self,
        connection: ConnectionId,
        id: &SessionId,
        profile: PlayerProfile,
    ) -> GameResult<Color> {
        self.ensure_free(connection)?;
        let session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| GameError::NotFound {
                session_id: id.to_string(),
            })?;
        let color = session.fill_empty_seat(Participant::human(connection, profile))?;
        let position = self.rules.encode(session.position());
        let started = session.status() == SessionStatus::Active;
        let seats = session.seats.clone();

        self.leave_queue(connection);
        self.connection_sessions.insert(connection, id.clone());
        info!("[REGISTRY] {} joined session {} as {}", connection, id, color);

        self.outbox.send(
            connection,
            ServerMessage::JoinedGame {
                session_id: id.clone(),
                color,
                position: position.clone(),
            },
        );
        if started {
            self.outbox.send_all(
                &seats.connections(),
                &ServerMessage::SessionStarted {
                    session_id: id.clone(),
                    position,
                    participants: seats,
                },
            );
        }
        Ok(color)
    }

    /// Starts a game against the scripted opponent. The human plays `color`,
    /// or a random one; if the scripted seat is White it moves straight away.
    pub fn create_ai_session(
        &mut self,
        connection: ConnectionId,
        profile: PlayerProfile,
        difficulty: AiDifficulty,
        color: Option<Color>,
    ) -> GameResult<(SessionId, Color)> {
        self.ensure_free(connection)?;
        self.leave_queue(connection);

        let human_color = match color {
            Some(color) => color,
            None => self.coin_flip(),
        };
        let mut seats = Seats::default();
        *seats.slot_mut(human_color) = Some(Participant::human(connection, profile));
        *seats.slot_mut(human_color.opposite()) = Some(Participant::scripted(difficulty));

        let id = self.generate_code()?;
        let position = self.start_active(id.clone(), seats.clone());
        info!(
            "[REGISTRY] Created {:?} scripted session {} for {} as {}",
            difficulty, id, connection, human_color
        );

        self.outbox.send(
            connection,
            ServerMessage::GameCreated {
                session_id: id.clone(),
                color: human_color,
            },
        );
        self.outbox.send(
            connection,
            ServerMessage::SessionStarted {
                session_id: id.clone(),
                position,
                participants: seats,
            },
        );
        self.play_scripted_turns(&id)?;
        Ok((id, human_color))
    }

    /// Hot-seat game: one connection holds both seats.
    pub fn create_local_session(
        &mut self,
        connection: ConnectionId,
        white: PlayerProfile,
        black: PlayerProfile,
    ) -> GameResult<SessionId> {
        self.ensure_free(connection)?;
        self.leave_queue(connection);

        let seats = Seats {
            white: Some(Participant::human(connection, white)),
            black: Some(Participant::human(connection, black)),
        };
        let id = self.generate_code()?;
        let position = self.start_active(id.clone(), seats.clone());
        info!("[REGISTRY] Created local session {} for {}", id, connection);

        self.outbox.send(
            connection,
            ServerMessage::GameCreated {
                session_id: id.clone(),
                color: Color::White,
            },
        );
        self.outbox.send(
            connection,
            ServerMessage::SessionStarted {
                session_id: id.clone(),
                position,
                participants: seats,
            },
        );
        Ok(id)
    }

    /// Pairs the requester with the earliest queued entry whose skill proxy
    /// is within the threshold, or queues them.
    ///
    /// Returns the new session id when a pairing happened.
    pub fn enqueue_for_match(
        &mut self,
        connection: ConnectionId,
        profile: PlayerProfile,
    ) -> GameResult<Option<SessionId>> {
        self.ensure_free(connection)?;
        if self.is_queued(connection) {
            self.outbox.send(connection, ServerMessage::SearchingForMatch);
            return Ok(None);
        }

        let skill = profile.skill();
        let threshold = self.config.match_threshold;
        let found = self
            .queue
            .iter()
            .position(|entry| entry.participant.skill().abs_diff(skill) <= threshold);

        let Some(index) = found else {
            self.queue.push(QueueEntry {
                connection,
                participant: profile,
                enqueued_at: Utc::now(),
            });
            info!(
                "[REGISTRY] {} queued with skill {} ({} waiting)",
                connection,
                skill,
                self.queue.len()
            );
            self.outbox.send(connection, ServerMessage::SearchingForMatch);
            return Ok(None);
        };

        // The waiting entry stays queued if no code can be issued
        let requester_color = self.coin_flip();
        let id = self.generate_code()?;
        let waiting = self.queue.remove(index);
        let mut seats = Seats::default();
        *seats.slot_mut(requester_color) = Some(Participant::human(connection, profile));
        *seats.slot_mut(requester_color.opposite()) =
            Some(Participant::human(waiting.connection, waiting.participant));

        let position = self.start_active(id.clone(), seats.clone());
        let waited = Utc::now().signed_duration_since(waiting.enqueued_at);
        info!(
            "[REGISTRY] Paired {} with {} in session {} after {}s",
            connection,
            waiting.connection,
            id,
            waited.num_seconds()
        );

        self.outbox.send_all(
            &seats.connections(),
            &ServerMessage::MatchFound {
                session_id: id.clone(),
                position,
                participants: seats,
            },
        );
        Ok(Some(id))
    }

    /// Leaves the queue. Always acknowledged, queued or not.
    pub fn cancel_queue(&mut self, connection: ConnectionId) -> bool {
        let removed = self.leave_queue(connection);
        self.outbox.send(connection, ServerMessage::MatchmakingCancelled);
        removed
    }

    /// `connection` gives up the game in `id`.
    pub fn resign(&mut self, connection: ConnectionId, id: &SessionId) -> GameResult<()> {
        let session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| GameError::NotFound {
                session_id: id.to_string(),
            })?;
        session.resign(&self.rules, connection)?;
        self.finish(id, None);
        Ok(())
    }

    /// Drops everything the connection was part of.
    ///
    /// Queue entries go away. A pending session it created is removed; an
    /// active one is forfeited to the opponent.
    pub fn on_disconnect(&mut self, connection: ConnectionId) {
        if self.leave_queue(connection) {
            info!("[REGISTRY] {} left the queue by disconnecting", connection);
        }
        let Some(id) = self.connection_sessions.remove(&connection) else {
            return;
        };
        let Some(session) = self.sessions.get_mut(&id) else {
            return;
        };
        match session.status() {
            SessionStatus::Pending => {
                self.sessions.remove(&id);
                info!("[REGISTRY] Removed pending session {} after its creator left", id);
            }
            SessionStatus::Active => {
                if session.forfeit(&self.rules, connection) {
                    warn!("[REGISTRY] {} disconnected from active session {}", connection, id);
                    self.finish(&id, Some(connection));
                }
            }
            SessionStatus::Over => {}
        }
    }

    /// Discards sessions that have been over for at least the grace period.
    /// Returns how many were removed.
    pub fn sweep_expired(&mut self, now: Instant) -> usize {
        let grace = self.config.grace_period();
        let expired: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|(_, s)| {
                s.over_since()
                    .is_some_and(|since| now.saturating_duration_since(since) >= grace)
            })
            .map(|(id, _)| id.clone())
            .collect();
        if expired.is_empty() {
            return 0;
        }

        for id in &expired {
            self.sessions.remove(id);
        }
        self.connection_sessions.retain(|_, id| !expired.contains(id));
        debug!("[REGISTRY] Swept {} finished sessions", expired.len());
        expired.len()
    }

    /// Announces the outcome of a finished session and queues score updates.
    pub(crate) fn finish(&mut self, id: &SessionId, exclude: Option<ConnectionId>) {
        let Some(session) = self.sessions.get(id) else {
            return;
        };
        let outcome = session.outcome();
        let message = ServerMessage::SessionOver {
            session_id: id.clone(),
            winner: outcome.winner(),
            reason: outcome.message(),
            highlight: session.highlight(&self.rules),
        };
        let recipients: Vec<ConnectionId> = session
            .seats
            .connections()
            .into_iter()
            .filter(|c| Some(*c) != exclude)
            .collect();

        for (display_name, result) in session.results() {
            self.outbox.record_score(display_name, result);
        }
        self.outbox.send_all(&recipients, &message);
    }

    /// Inserts a session that starts Active and attaches its connections.
    /// Returns the encoded starting position.
    fn start_active(&mut self, id: SessionId, seats: Seats) -> String {
        let initial = self.rules.initial_position();
        let position = self.rules.encode(&initial);
        for conn in seats.connections() {
            self.connection_sessions.insert(conn, id.clone());
        }
        self.sessions
            .insert(id.clone(), Session::new_active(id, seats, initial));
        position
    }

    /// A connection may hold one live session at a time. Links to finished
    /// sessions are dropped here so the player can start another game.
    fn ensure_free(&mut self, connection: ConnectionId) -> GameResult<()> {
        if let Some(id) = self.connection_sessions.get(&connection).cloned() {
            let live = self.sessions.get(&id).is_some_and(|s| !s.is_over());
            if live {
                return Err(GameError::AlreadyInSession {
                    session_id: id.to_string(),
                });
            }
            self.connection_sessions.remove(&connection);
        }
        Ok(())
    }

    fn leave_queue(&mut self, connection: ConnectionId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|e| e.connection != connection);
        self.queue.len() != before
    }

    fn coin_flip(&mut self) -> Color {
        if self.rng.random_bool(0.5) {
            Color::White
        } else {
            Color::Black
        }
    }

    fn generate_code(&mut self) -> GameResult<SessionId> {
        let length = self.config.room_code_length;
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code: String = (0..length)
                .map(|_| CODE_CHARSET[self.rng.random_range(0..CODE_CHARSET.len())] as char)
                .collect();
            let id = SessionId::new(code);
            if !self.sessions.contains_key(&id) {
                return Ok(id);
            }
            debug!("[REGISTRY] Session code collision on {}, retrying", id);
        }
        error!(
            "[REGISTRY] No free session code of length {} after {} attempts",
            length, MAX_CODE_ATTEMPTS
        );
        Err(GameError::CodesExhausted {
            attempts: MAX_CODE_ATTEMPTS,
        })
    }
}
