//! Move relay
//!
//! Carries a move from the participant who made it into the session's
//! authoritative state, then out to the other replica:
//!
//! 1. look up the session (`NotFound`)
//! 2. check the requester owns the side to move (`NotYourTurn`)
//! 3. apply through the rules engine (`IllegalMove`)
//! 4. record it, replace the position, send `moveApplied` to the other side
//! 5. on a terminal status, send `sessionOver` to both
//!
//! The requester is not echoed; it already applied the move locally. After a
//! human move, scripted seats reply for as long as it is their turn.

use tracing::{debug, error};

use super::registry::MatchRegistry;
use crate::game::ai::{choose_move, undo_mode_for, ScriptedOpponent};
use crate::game::error::{GameError, GameResult};
use crate::game::rules::RulesEngine;
use shared::{ConnectionId, Move, MoveRecord, ServerMessage, SessionId, SessionStatus};

fn not_found(id: &SessionId) -> GameError {
    GameError::NotFound {
        session_id: id.to_string(),
    }
}

impl<R: RulesEngine> MatchRegistry<R> {
    /// Applies `mv` for `connection` in session `id` and relays it.
    pub fn submit_move(
        &mut self,
        connection: ConnectionId,
        id: &SessionId,
        mv: Move,
    ) -> GameResult<MoveRecord> {
        let session = self.sessions.get_mut(id).ok_or_else(|| not_found(id))?;
        let record = session.apply(&self.rules, connection, &mv)?;
        let position = self.rules.encode(session.position());
        let over = session.is_over();
        let others: Vec<ConnectionId> = session
            .seats
            .connections()
            .into_iter()
            .filter(|c| *c != connection)
            .collect();

        debug!("[RELAY] {} played {} in {}", connection, record.algebraic, id);
        self.outbox.send_all(
            &others,
            &ServerMessage::MoveApplied {
                session_id: id.clone(),
                record: record.clone(),
                position,
            },
        );

        if over {
            self.finish(id, None);
        } else {
            self.play_scripted_turns(id)?;
        }
        Ok(record)
    }

    /// Lets scripted seats move while it is their turn and the game is on.
    pub(crate) fn play_scripted_turns(&mut self, id: &SessionId) -> GameResult<()> {
        loop {
            let Some(session) = self.sessions.get_mut(id) else {
                return Ok(());
            };
            if session.status() != SessionStatus::Active {
                return Ok(());
            }
            let to_move = self.rules.turn_of(session.position());
            let Some(opponent) = ScriptedOpponent::on_turn(&session.seats, to_move) else {
                return Ok(());
            };

            let Some(chosen) = choose_move(
                &self.rules,
                session.position(),
                opponent.difficulty,
                &mut self.rng,
            ) else {
                error!(
                    "[AI] {} scripted seat ({}) has no legal move in live session {}",
                    opponent.color,
                    opponent.description(),
                    id
                );
                return Err(GameError::AiExhausted);
            };

            let record = session.apply_scripted(&self.rules, &chosen.mv)?;
            debug!(
                "[AI] {} replied {} in {}",
                opponent.description(),
                record.algebraic,
                id
            );
            let message = ServerMessage::MoveApplied {
                session_id: id.clone(),
                record,
                position: self.rules.encode(session.position()),
            };
            let humans = session.seats.connections();
            let over = session.is_over();
            self.outbox.send_all(&humans, &message);

            if over {
                self.finish(id, None);
                return Ok(());
            }
        }
    }

    /// Takes back the last ply, or the last full turn against a scripted
    /// seat, and sends the rebuilt state to every human in the session.
    pub fn undo(&mut self, connection: ConnectionId, id: &SessionId) -> GameResult<usize> {
        let session = self.sessions.get_mut(id).ok_or_else(|| not_found(id))?;
        let mode = undo_mode_for(&session.seats);
        let removed = session.undo(&self.rules, connection, mode)?;

        debug!("[RELAY] {} undid {} plies in {}", connection, removed, id);
        let message = ServerMessage::PositionReset {
            session_id: id.clone(),
            position: self.rules.encode(session.position()),
            history: session.history().records(),
        };
        let humans = session.seats.connections();
        self.outbox.send_all(&humans, &message);

        self.play_scripted_turns(id)?;
        Ok(removed)
    }

    /// Starts the session over from its initial position.
    ///
    /// Every human seat must still be attached to this session; a player who
    /// left or moved on to another game cannot be pulled back in.
    pub fn new_round(&mut self, connection: ConnectionId, id: &SessionId) -> GameResult<()> {
        let session = self.sessions.get(id).ok_or_else(|| not_found(id))?;
        if !session.holds_seat(connection) {
            return Err(GameError::NotParticipant);
        }
        let everyone_here = session
            .seats
            .connections()
            .iter()
            .all(|c| self.connection_sessions.get(c) == Some(id));
        if !everyone_here {
            return Err(GameError::SessionNotActive);
        }

        let session = self.sessions.get_mut(id).ok_or_else(|| not_found(id))?;
        session.new_round(connection)?;
        let message = ServerMessage::SessionStarted {
            session_id: id.clone(),
            position: self.rules.encode(session.position()),
            participants: session.seats.clone(),
        };
        let humans = session.seats.connections();
        self.outbox.send_all(&humans, &message);

        self.play_scripted_turns(id)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::MatchConfig;
    use crate::game::rules::RulesEngine;
    use crate::networking::{Envelope, MatchRegistry};
    use shared::{
        AiDifficulty, Color, ConnectionId, ErrorReason, Move, PlayerProfile, ServerMessage,
        SessionId, SessionStatus,
    };

    fn mv(s: &str) -> Move {
        s.parse().unwrap()
    }

    fn to(envelopes: &[Envelope], conn: ConnectionId) -> Vec<ServerMessage> {
        envelopes
            .iter()
            .filter(|e| e.to == conn)
            .map(|e| e.message.clone())
            .collect()
    }

    /// Two humans in an active session, returned as (registry, id, white, black).
    fn started() -> (MatchRegistry, SessionId, ConnectionId, ConnectionId) {
        let mut registry = MatchRegistry::with_seed(MatchConfig::default(), 3);
        let host = ConnectionId::new();
        let guest = ConnectionId::new();
        let (id, host_color) = registry
            .create_session(host, PlayerProfile::new("Ada"))
            .unwrap();
        registry
            .join_session(guest, &id, PlayerProfile::new("Bob"))
            .unwrap();
        registry.drain_outbox();
        match host_color {
            Color::White => (registry, id, host, guest),
            Color::Black => (registry, id, guest, host),
        }
    }

    #[test]
    fn test_move_relayed_to_opponent_only() {
        let (mut registry, id, white, black) = started();
        registry.submit_move(white, &id, mv("e2e4")).unwrap();

        let out = registry.drain_outbox();
        assert!(to(&out, white).is_empty());
        match to(&out, black).as_slice() {
            [ServerMessage::MoveApplied {
                record, position, ..
            }] => {
                assert_eq!(record.algebraic, "e4");
                assert!(position.contains(" b "));
            }
            other => panic!("unexpected messages: {other:?}"),
        }
    }

    #[test]
    fn test_out_of_turn_and_illegal_moves_rejected() {
        let (mut registry, id, white, black) = started();
        let before = registry
            .rules()
            .encode(registry.session(&id).unwrap().position());

        registry.handle(
            black,
            shared::ClientMessage::SubmitMove {
                session_id: id.clone(),
                mv: mv("e7e5"),
            },
        );
        registry.handle(
            white,
            shared::ClientMessage::SubmitMove {
                session_id: id.clone(),
                mv: mv("e2e5"),
            },
        );

        let out = registry.drain_outbox();
        assert!(matches!(
            to(&out, black).as_slice(),
            [ServerMessage::Error {
                reason: ErrorReason::NotYourTurn,
                ..
            }]
        ));
        assert!(matches!(
            to(&out, white).as_slice(),
            [ServerMessage::Error {
                reason: ErrorReason::IllegalMove,
                ..
            }]
        ));
        let session = registry.session(&id).unwrap();
        assert_eq!(registry.rules().encode(session.position()), before);
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_checkmate_notifies_both_with_highlight() {
        let (mut registry, id, white, black) = started();
        registry.submit_move(white, &id, mv("f2f3")).unwrap();
        registry.submit_move(black, &id, mv("e7e5")).unwrap();
        registry.submit_move(white, &id, mv("g2g4")).unwrap();
        registry.drain_outbox();
        registry.submit_move(black, &id, mv("d8h4")).unwrap();

        let out = registry.drain_outbox();
        for conn in [white, black] {
            let over = to(&out, conn)
                .into_iter()
                .find_map(|m| match m {
                    ServerMessage::SessionOver {
                        winner, highlight, ..
                    } => Some((winner, highlight)),
                    _ => None,
                })
                .expect("sessionOver sent to both");
            assert_eq!(over.0, Some(Color::Black));
            let highlight = over.1.expect("checkmate carries a highlight");
            assert_eq!(highlight.king_square, "e1".parse().unwrap());
            assert_eq!(highlight.attackers, vec!["h4".parse().unwrap()]);
        }
        assert_eq!(
            registry.session(&id).unwrap().status(),
            SessionStatus::Over
        );
    }

    #[test]
    fn test_scripted_seat_replies_immediately() {
        let mut registry = MatchRegistry::with_seed(MatchConfig::default(), 11);
        let human = ConnectionId::new();
        let (id, color) = registry
            .create_ai_session(
                human,
                PlayerProfile::new("Ada"),
                AiDifficulty::Easy,
                Some(Color::White),
            )
            .unwrap();
        assert_eq!(color, Color::White);
        registry.drain_outbox();

        registry.submit_move(human, &id, mv("e2e4")).unwrap();
        let out = registry.drain_outbox();
        let replies: Vec<_> = to(&out, human)
            .into_iter()
            .filter(|m| matches!(m, ServerMessage::MoveApplied { .. }))
            .collect();
        assert_eq!(replies.len(), 1);

        let session = registry.session(&id).unwrap();
        assert_eq!(session.history().len(), 2);
        assert_eq!(registry.rules().turn_of(session.position()), Color::White);
    }

    #[test]
    fn test_scripted_white_opens() {
        let mut registry = MatchRegistry::with_seed(MatchConfig::default(), 5);
        let human = ConnectionId::new();
        let (id, _) = registry
            .create_ai_session(
                human,
                PlayerProfile::new("Ada"),
                AiDifficulty::Medium,
                Some(Color::Black),
            )
            .unwrap();
        let session = registry.session(&id).unwrap();
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history().get_move(0).unwrap().color, Color::White);
    }

    #[test]
    fn test_undo_against_scripted_seat_takes_full_turn() {
        let mut registry = MatchRegistry::with_seed(MatchConfig::default(), 8);
        let human = ConnectionId::new();
        let (id, _) = registry
            .create_ai_session(
                human,
                PlayerProfile::new("Ada"),
                AiDifficulty::Hard,
                Some(Color::White),
            )
            .unwrap();
        registry.submit_move(human, &id, mv("d2d4")).unwrap();
        registry.drain_outbox();

        assert_eq!(registry.undo(human, &id), Ok(2));
        let out = registry.drain_outbox();
        match to(&out, human).as_slice() {
            [ServerMessage::PositionReset { history, .. }] => assert!(history.is_empty()),
            other => panic!("unexpected messages: {other:?}"),
        }
    }

    #[test]
    fn test_undo_between_humans_takes_one_ply() {
        let (mut registry, id, white, black) = started();
        registry.submit_move(white, &id, mv("e2e4")).unwrap();
        registry.submit_move(black, &id, mv("e7e5")).unwrap();
        registry.drain_outbox();

        assert_eq!(registry.undo(black, &id), Ok(1));
        let out = registry.drain_outbox();
        for conn in [white, black] {
            match to(&out, conn).as_slice() {
                [ServerMessage::PositionReset { history, .. }] => assert_eq!(history.len(), 1),
                other => panic!("unexpected messages: {other:?}"),
            }
        }
    }

    #[test]
    fn test_undo_of_opponents_move_refused() {
        let (mut registry, id, white, black) = started();
        registry.submit_move(white, &id, mv("e2e4")).unwrap();
        registry.drain_outbox();

        assert_eq!(
            registry.undo(black, &id),
            Err(crate::game::error::GameError::UndoNotAllowed)
        );
        assert!(registry.drain_outbox().is_empty());
        assert_eq!(registry.session(&id).unwrap().history().len(), 1);
    }

    #[test]
    fn test_new_round_refused_mid_game() {
        let (mut registry, id, white, black) = started();
        registry.submit_move(white, &id, mv("e2e4")).unwrap();
        registry.submit_move(black, &id, mv("f7f6")).unwrap();
        registry.drain_outbox();

        assert_eq!(
            registry.new_round(black, &id),
            Err(crate::game::error::GameError::GameInProgress)
        );
        assert!(registry.drain_outbox().is_empty());
        let session = registry.session(&id).unwrap();
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.status(), SessionStatus::Active);
    }

    #[test]
    fn test_new_round_after_resignation() {
        let (mut registry, id, white, black) = started();
        registry.submit_move(white, &id, mv("e2e4")).unwrap();
        registry.resign(black, &id).unwrap();
        registry.drain_outbox();

        registry.new_round(white, &id).unwrap();
        let session = registry.session(&id).unwrap();
        assert_eq!(session.status(), SessionStatus::Active);
        assert!(session.history().is_empty());

        let out = registry.drain_outbox();
        for conn in [white, black] {
            assert!(matches!(
                to(&out, conn).as_slice(),
                [ServerMessage::SessionStarted { .. }]
            ));
        }
    }

    #[test]
    fn test_new_round_refused_after_opponent_left() {
        let (mut registry, id, white, black) = started();
        registry.on_disconnect(black);
        assert_eq!(
            registry.new_round(white, &id),
            Err(crate::game::error::GameError::SessionNotActive)
        );
    }

    #[test]
    fn test_new_round_refused_while_pending() {
        let mut registry = MatchRegistry::with_seed(MatchConfig::default(), 1);
        let host = ConnectionId::new();
        let (id, _) = registry
            .create_session(host, PlayerProfile::new("Ada"))
            .unwrap();
        assert_eq!(
            registry.new_round(host, &id),
            Err(crate::game::error::GameError::SessionNotActive)
        );
    }
}
