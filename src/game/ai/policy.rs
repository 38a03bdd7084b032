//! Move selection for scripted seats
//!
//! A heuristic opponent, not a search engine: every tier takes an immediate
//! mate when one exists, and difficulty only biases which of the remaining
//! legal moves is picked.
//!
//! | Tier   | Preference after mate-in-one                                  |
//! |--------|---------------------------------------------------------------|
//! | Easy   | uniformly random                                              |
//! | Medium | half the time a random capture or check, otherwise random     |
//! | Hard   | most valuable capture, else a random check, otherwise random  |

use rand::Rng;
use tracing::debug;

use crate::game::rules::RulesEngine;
use crate::game::types::{LegalMove, TerminalStatus};
use shared::AiDifficulty;

/// Chooses a move for the side to move in `position`.
///
/// Returns `None` only when there are no legal moves, which means the
/// caller let a finished game keep running.
pub fn choose_move<R, G>(
    rules: &R,
    position: &R::Position,
    difficulty: AiDifficulty,
    rng: &mut G,
) -> Option<LegalMove>
where
    R: RulesEngine,
    G: Rng + ?Sized,
{
    let moves = rules.legal_moves(position, None);
    if moves.is_empty() {
        return None;
    }

    let mut checks = Vec::new();
    for candidate in &moves {
        let Ok(result) = rules.apply_move(position, &candidate.mv) else {
            continue;
        };
        if rules.terminal_status(&result.position) == TerminalStatus::Checkmate {
            debug!("[AI] {:?} found mate with {}", difficulty, candidate.algebraic);
            return Some(candidate.clone());
        }
        if rules.in_check(&result.position) {
            checks.push(candidate);
        }
    }

    let captures: Vec<&LegalMove> = moves.iter().filter(|m| m.is_capture).collect();

    let chosen = match difficulty {
        AiDifficulty::Easy => None,
        AiDifficulty::Hard => best_capture(&captures).or_else(|| pick(&checks, rng)),
        AiDifficulty::Medium => {
            if rng.random_bool(0.5) {
                let mut tactical = captures.clone();
                for &check in &checks {
                    if !tactical.iter().any(|m| m.mv == check.mv) {
                        tactical.push(check);
                    }
                }
                pick(&tactical, rng)
            } else {
                None
            }
        }
    };

    let all: Vec<&LegalMove> = moves.iter().collect();
    chosen.or_else(|| pick(&all, rng)).cloned()
}

/// Capture of the most valuable piece; the first one wins ties.
fn best_capture<'a>(captures: &[&'a LegalMove]) -> Option<&'a LegalMove> {
    let mut best: Option<(&LegalMove, u32)> = None;
    for &capture in captures {
        let value = capture.captured.map_or(0, |kind| kind.value());
        if best.is_none_or(|(_, top)| value > top) {
            best = Some((capture, value));
        }
    }
    best.map(|(capture, _)| capture)
}

fn pick<'a, G: Rng + ?Sized>(moves: &[&'a LegalMove], rng: &mut G) -> Option<&'a LegalMove> {
    if moves.is_empty() {
        None
    } else {
        Some(moves[rng.random_range(0..moves.len())])
    }
}
