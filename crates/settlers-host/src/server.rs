//! JSON-lines request loop and message dispatch.

use crate::host::{GameHost, HostError};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::store::GameStore;
use std::time::SystemTime;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

/// Serve requests from `input` until it closes, writing one response line
/// per non-blank request line.
pub async fn run<S, R, W>(host: &GameHost<S>, input: R, mut output: W) -> anyhow::Result<()>
where
    S: GameStore,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut served = 0usize;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let now = SystemTime::now();
        host.purge_idle(now);

        let response = handle_line(host, &line, now);
        let mut text = serde_json::to_string(&response)?;
        text.push('\n');
        output.write_all(text.as_bytes()).await?;
        output.flush().await?;
        served += 1;
    }

    info!(served, "input closed");
    Ok(())
}

/// Parse and handle one request line
pub fn handle_line<S: GameStore>(host: &GameHost<S>, line: &str, now: SystemTime) -> ServerMessage {
    match serde_json::from_str::<ClientMessage>(line) {
        Ok(message) => handle_message(host, message, now),
        Err(e) => {
            warn!(error = %e, "invalid message");
            ServerMessage::error(format!("Invalid message: {e}"), None)
        }
    }
}

/// Handle a client message.
pub fn handle_message<S: GameStore>(
    host: &GameHost<S>,
    message: ClientMessage,
    now: SystemTime,
) -> ServerMessage {
    debug!(?message, "request");
    let outcome = match message {
        ClientMessage::CreateGame { players, seed } => host
            .create_game(players, seed, now)
            .map(|game| ServerMessage::GameCreated { game }),

        ClientMessage::View { game_id, player } => host
            .view(game_id, player, now)
            .map(|view| ServerMessage::View {
                view: Box::new(view),
            }),

        ClientMessage::SubmitAction {
            game_id,
            player,
            action,
            token,
        } => host
            .submit(game_id, player, &action, token, now)
            .map(|result| ServerMessage::ActionResult {
                result: Box::new(result),
            }),

        ClientMessage::GetState { game_id } => host
            .state(game_id)
            .map(|state| ServerMessage::GameState {
                state: Box::new(state),
            }),

        ClientMessage::DeleteGame { game_id } => host
            .delete(game_id)
            .map(|()| ServerMessage::GameDeleted { game_id }),

        ClientMessage::ListGames => Ok(ServerMessage::GameList { games: host.list() }),

        ClientMessage::Ping => Ok(ServerMessage::Pong),
    };

    outcome.unwrap_or_else(|e: HostError| ServerMessage::error(e.to_string(), e.class()))
}
