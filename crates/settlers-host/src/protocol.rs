//! JSON-lines protocol messages for the settlers host.

use crate::host::{GameSummary, HostView};
use serde::{Deserialize, Serialize};
use settlers_core::{Action, ActionResult, ErrorClass, GameState, PlayerId};
use uuid::Uuid;

/// Messages read from the client, one per line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start a game; a seed makes board and dice reproducible
    CreateGame {
        players: Vec<String>,
        #[serde(default)]
        seed: Option<u64>,
    },

    /// Request a player's view and fresh options
    View { game_id: Uuid, player: PlayerId },

    /// Submit an action, optionally pinned to an option token
    SubmitAction {
        game_id: Uuid,
        player: PlayerId,
        action: Action,
        #[serde(default)]
        token: Option<u64>,
    },

    /// Request the full game state
    GetState { game_id: Uuid },

    DeleteGame { game_id: Uuid },

    ListGames,

    /// Liveness check
    Ping,
}

/// Messages written to the client, one line per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    GameCreated { game: GameSummary },

    View { view: Box<HostView> },

    ActionResult { result: Box<ActionResult> },

    GameState { state: Box<GameState> },

    GameDeleted { game_id: Uuid },

    GameList { games: Vec<GameSummary> },

    /// Pong response
    Pong,

    /// Request failed before reaching the engine, or the game is unknown
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        class: Option<ErrorClass>,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>, class: Option<ErrorClass>) -> Self {
        ServerMessage::Error {
            message: message.into(),
            class,
        }
    }
}
