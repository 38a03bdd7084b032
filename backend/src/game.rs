//! Game server task
//!
//! One tokio task owns the [`MatchRegistry`]; every request, disconnect and
//! sweep runs on it in arrival order. Sockets talk to it through a
//! [`GameServerHandle`] and get their notifications back on a per-connection
//! channel.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chess_match::core::ServerConfig;
use chess_match::networking::{MatchRegistry, ScoreUpdate};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::scores::ScoreStore;
use shared::{ClientMessage, ConnectionId, ServerMessage};

/// Messages the game task accepts.
#[derive(Debug)]
pub enum ServerCommand {
    Connect {
        connection: ConnectionId,
        outbound: mpsc::UnboundedSender<ServerMessage>,
    },
    Client {
        connection: ConnectionId,
        message: ClientMessage,
    },
    Disconnect {
        connection: ConnectionId,
    },
    Stats {
        reply: oneshot::Sender<ServerStats>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStats {
    pub sessions: usize,
    pub queued: usize,
    pub connections: usize,
}

/// Cloneable sender side of the game task.
#[derive(Debug, Clone)]
pub struct GameServerHandle {
    commands: mpsc::UnboundedSender<ServerCommand>,
}

impl GameServerHandle {
    /// Registers a new connection whose notifications go to `outbound`.
    pub fn connect(&self, outbound: mpsc::UnboundedSender<ServerMessage>) -> ConnectionId {
        let connection = ConnectionId::new();
        self.submit(ServerCommand::Connect {
            connection,
            outbound,
        });
        connection
    }

    pub fn send(&self, connection: ConnectionId, message: ClientMessage) {
        self.submit(ServerCommand::Client {
            connection,
            message,
        });
    }

    pub fn disconnect(&self, connection: ConnectionId) {
        self.submit(ServerCommand::Disconnect { connection });
    }

    /// `None` once the game task has stopped.
    pub async fn stats(&self) -> Option<ServerStats> {
        let (reply, rx) = oneshot::channel();
        self.submit(ServerCommand::Stats { reply });
        rx.await.ok()
    }

    fn submit(&self, command: ServerCommand) {
        if self.commands.send(command).is_err() {
            warn!("[BACKEND] Game server task is gone; command dropped");
        }
    }
}

struct GameServer {
    registry: MatchRegistry,
    connections: HashMap<ConnectionId, mpsc::UnboundedSender<ServerMessage>>,
    scores: Arc<dyn ScoreStore>,
}

/// Spawns the game task on the current runtime.
pub fn spawn_game_server(config: &ServerConfig, scores: Arc<dyn ScoreStore>) -> GameServerHandle {
    let (commands, rx) = mpsc::unbounded_channel();
    let server = GameServer {
        registry: MatchRegistry::new(config.matching.clone()),
        connections: HashMap::new(),
        scores,
    };
    tokio::spawn(server.run(rx, config.sweep_interval()));
    info!("[BACKEND] Game server started");
    GameServerHandle { commands }
}

impl GameServer {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<ServerCommand>, sweep: Duration) {
        // tokio::time::interval panics on a zero period
        let mut sweep = tokio::time::interval(sweep.max(Duration::from_millis(1)));
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.apply(command),
                    None => break,
                },
                _ = sweep.tick() => {
                    let removed = self.registry.sweep_expired(Instant::now());
                    if removed > 0 {
                        info!("[BACKEND] Discarded {} finished sessions", removed);
                    }
                }
            }
            self.flush();
        }
        info!("[BACKEND] Game server stopped");
    }

    fn apply(&mut self, command: ServerCommand) {
        match command {
            ServerCommand::Connect {
                connection,
                outbound,
            } => {
                debug!("[BACKEND] {} connected", connection);
                self.connections.insert(connection, outbound);
            }
            ServerCommand::Client {
                connection,
                message,
            } => self.registry.handle(connection, message),
            ServerCommand::Disconnect { connection } => {
                debug!("[BACKEND] {} disconnected", connection);
                self.connections.remove(&connection);
                self.registry.on_disconnect(connection);
            }
            ServerCommand::Stats { reply } => {
                let _ = reply.send(ServerStats {
                    sessions: self.registry.session_count(),
                    queued: self.registry.queue_len(),
                    connections: self.connections.len(),
                });
            }
        }
    }

    /// Delivers queued notifications and hands score events to the store.
    fn flush(&mut self) {
        for envelope in self.registry.drain_outbox() {
            let Some(outbound) = self.connections.get(&envelope.to) else {
                continue;
            };
            if outbound.send(envelope.message).is_err() {
                debug!("[BACKEND] Dropped message for closed connection {}", envelope.to);
            }
        }

        for ScoreUpdate {
            display_name,
            result,
        } in self.registry.drain_score_updates()
        {
            let scores = Arc::clone(&self.scores);
            tokio::spawn(async move {
                if let Err(err) = scores.record(&display_name, result).await {
                    warn!("[BACKEND] Failed to record score for {}: {}", display_name, err);
                }
            });
        }
    }
}
