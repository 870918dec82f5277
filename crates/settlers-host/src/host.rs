//! Game hosting: creation, views with published options, action submission.

use crate::config::HostConfig;
use crate::store::{GameSession, GameStore, InMemoryGameStore};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use settlers_core::{
    agent_view, execute, rank_edges, rank_vertices, Action, ActionResult, AgentView, Board,
    Engine, ErrorClass, GameError, GamePhase, GameState, OptionIndex, PlayerId, RankedEdge,
    RankedVertex, TracingObserver,
};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Game {0} not found")]
    GameNotFound(Uuid),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error("Invalid {key}: {message}")]
    Config { key: &'static str, message: String },
}

impl HostError {
    /// Error class reported to callers; configuration problems have none
    pub fn class(&self) -> Option<ErrorClass> {
        match self {
            HostError::GameNotFound(_) => Some(ErrorClass::Structural),
            HostError::Game(error) => Some(error.class()),
            HostError::Config { .. } => None,
        }
    }
}

/// Listing entry for a hosted game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub id: Uuid,
    pub players: Vec<String>,
    pub phase: GamePhase,
    pub turn: u32,
    pub current_player: PlayerId,
    pub winner: Option<PlayerId>,
}

impl GameSummary {
    fn of(session: &GameSession) -> Self {
        let state = &session.state;
        Self {
            id: session.id,
            players: state.players.iter().map(|p| p.name.clone()).collect(),
            phase: state.phase,
            turn: state.turn,
            current_player: state.current_player,
            winner: state.winner,
        }
    }
}

/// Published option session; ordinal `n` names entry `n - 1`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedOptions {
    pub token: u64,
    pub expires_at: SystemTime,
    pub vertices: Vec<RankedVertex>,
    pub edges: Vec<RankedEdge>,
}

/// A player's view plus the options just published for them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostView {
    pub game_id: Uuid,
    pub view: AgentView,
    pub options: PublishedOptions,
}

pub struct GameHost<S = InMemoryGameStore> {
    store: S,
    config: HostConfig,
}

impl<S: GameStore> GameHost<S> {
    pub fn new(store: S, config: HostConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Start a game on a freshly generated board. A seed makes the board
    /// and every dice roll reproducible.
    pub fn create_game(
        &self,
        player_names: Vec<String>,
        seed: Option<u64>,
        now: SystemTime,
    ) -> Result<GameSummary, HostError> {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let board = Board::standard_with_rng(&mut rng);
        let state = GameState::new(player_names, board)?;

        let id = Uuid::new_v4();
        let session = GameSession::new(
            id,
            state,
            OptionIndex::new(self.config.option_ttl),
            rng,
            now,
        );
        let summary = GameSummary::of(&session);
        self.store.insert(session);

        info!(game_id = %id, players = summary.players.len(), "game created");
        Ok(summary)
    }

    /// Build `player`'s view and publish the best-ranked legal placements
    /// as numbered options
    pub fn view(&self, game: Uuid, player: PlayerId, now: SystemTime) -> Result<HostView, HostError> {
        let limit = self.config.option_limit;
        self.store
            .with_session(game, |session| -> Result<HostView, HostError> {
                let view = agent_view(&session.state, player)?;
                let board = &session.state.board;
                let vertices = rank_vertices(board, &view.legal_moves.vertices, limit);
                let edges = rank_edges(board, &view.legal_moves.edges, limit);

                let published = session.options.publish(
                    player,
                    vertices.iter().map(|v| v.id),
                    edges.iter().map(|e| e.id),
                    now,
                );
                session.touch(now);

                debug!(
                    game_id = %game,
                    player,
                    token = published.token,
                    vertices = vertices.len(),
                    edges = edges.len(),
                    "options published"
                );
                Ok(HostView {
                    game_id: game,
                    view,
                    options: PublishedOptions {
                        token: published.token,
                        expires_at: published.expires_at,
                        vertices,
                        edges,
                    },
                })
            })
            .ok_or(HostError::GameNotFound(game))?
    }

    /// Resolve and apply an action for `player`
    pub fn submit(
        &self,
        game: Uuid,
        player: PlayerId,
        action: &Action,
        token: Option<u64>,
        now: SystemTime,
    ) -> Result<ActionResult, HostError> {
        self.store
            .with_session(game, |session| {
                let GameSession {
                    state,
                    options,
                    rng,
                    ..
                } = &mut *session;
                options.purge_expired(now);

                let mut engine = Engine::new(rng, TracingObserver::for_game(game.to_string()));
                let result = execute(&mut engine, state, options, player, action, token, now);
                session.touch(now);
                result
            })
            .ok_or(HostError::GameNotFound(game))
    }

    pub fn state(&self, game: Uuid) -> Result<GameState, HostError> {
        self.store
            .snapshot(game)
            .ok_or(HostError::GameNotFound(game))
    }

    pub fn delete(&self, game: Uuid) -> Result<(), HostError> {
        if self.store.remove(game).is_none() {
            return Err(HostError::GameNotFound(game));
        }
        info!(game_id = %game, "game deleted");
        Ok(())
    }

    pub fn list(&self) -> Vec<GameSummary> {
        self.store
            .ids()
            .into_iter()
            .filter_map(|id| self.store.with_session(id, |session| GameSummary::of(session)))
            .collect()
    }

    /// Drop games idle past the configured timeout
    pub fn purge_idle(&self, now: SystemTime) -> Vec<Uuid> {
        let purged = self.store.purge_idle(self.config.idle_game_timeout, now);
        for id in &purged {
            info!(game_id = %id, "idle game purged");
        }
        purged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use settlers_core::{ActionKind, Target};
    use std::time::Duration;

    fn host() -> GameHost {
        GameHost::new(InMemoryGameStore::new(), HostConfig::default())
    }

    fn t0() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
    }

    fn names() -> Vec<String> {
        vec!["Ada".into(), "Grace".into(), "Linus".into()]
    }

    #[test]
    fn test_create_and_list() {
        let host = host();
        let summary = host.create_game(names(), Some(1), t0()).unwrap();
        assert_eq!(summary.phase, GamePhase::SetupSettlement1);
        assert_eq!(summary.players, names());
        assert_eq!(host.list(), vec![summary.clone()]);

        let err = host.create_game(vec!["Solo".into()], None, t0()).unwrap_err();
        assert!(matches!(err, HostError::Game(GameError::InvalidPlayerCount(1))));
        assert_eq!(err.class(), Some(ErrorClass::Structural));
    }

    #[test]
    fn test_seeded_games_share_a_board() {
        let host = host();
        let a = host.create_game(names(), Some(42), t0()).unwrap();
        let b = host.create_game(names(), Some(42), t0()).unwrap();
        assert_eq!(host.state(a.id).unwrap(), host.state(b.id).unwrap());
    }

    #[test]
    fn test_view_publishes_ranked_options() {
        let host = host();
        let game = host.create_game(names(), Some(3), t0()).unwrap();

        let view = host.view(game.id, 0, t0()).unwrap();
        assert_eq!(view.options.vertices.len(), 5);
        assert_eq!(view.options.expires_at, t0() + Duration::from_secs(300));
        assert!(view.options.vertices[0].score >= view.options.vertices[4].score);
        assert_eq!(view.view.possible_actions, vec![ActionKind::BuildSettlement]);

        let best = view.options.vertices[0].id;
        let result = host
            .submit(
                game.id,
                0,
                &Action::BuildSettlement {
                    vertex: Target::Option(1),
                },
                Some(view.options.token),
                t0(),
            )
            .unwrap();
        assert!(result.success, "{}", result.message);

        let state = host.state(game.id).unwrap();
        assert_eq!(state.board.vertex(best).unwrap().owner(), Some(0));
        assert_eq!(state.last_settlement, Some(best));
    }

    #[test]
    fn test_stale_token_is_structural() {
        let host = host();
        let game = host.create_game(names(), Some(3), t0()).unwrap();
        let first = host.view(game.id, 0, t0()).unwrap();
        host.view(game.id, 0, t0()).unwrap();

        let result = host
            .submit(
                game.id,
                0,
                &Action::BuildSettlement {
                    vertex: Target::Option(1),
                },
                Some(first.options.token),
                t0(),
            )
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.error_class, Some(ErrorClass::Structural));
    }

    #[test]
    fn test_expired_options_are_rejected() {
        let host = host();
        let game = host.create_game(names(), Some(3), t0()).unwrap();
        host.view(game.id, 0, t0()).unwrap();

        let later = t0() + Duration::from_secs(301);
        let result = host
            .submit(
                game.id,
                0,
                &Action::BuildSettlement {
                    vertex: Target::Option(1),
                },
                None,
                later,
            )
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.error_class, Some(ErrorClass::Structural));
    }

    #[test]
    fn test_unknown_game() {
        let host = host();
        let missing = Uuid::new_v4();
        assert!(matches!(host.view(missing, 0, t0()), Err(HostError::GameNotFound(_))));
        assert!(matches!(
            host.submit(missing, 0, &Action::Roll, None, t0()),
            Err(HostError::GameNotFound(_))
        ));
        assert!(host.delete(missing).is_err());
    }

    #[test]
    fn test_delete_and_purge() {
        let host = host();
        let kept = host.create_game(names(), Some(1), t0()).unwrap();
        let idle = host.create_game(names(), Some(2), t0()).unwrap();
        let gone = host.create_game(names(), Some(3), t0()).unwrap();

        host.delete(gone.id).unwrap();
        assert!(host.state(gone.id).is_err());

        let later = t0() + Duration::from_secs(3_000);
        host.view(kept.id, 0, later).unwrap();

        let purged = host.purge_idle(t0() + Duration::from_secs(3_601));
        assert_eq!(purged, vec![idle.id]);
        assert_eq!(host.list().len(), 1);
    }
}
