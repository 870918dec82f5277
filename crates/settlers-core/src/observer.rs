//! Observability hook injected into the engine.
//!
//! The engine never logs from inside rule checks. It reports each emitted
//! event and each rejected action to an `EngineObserver`; callers decide
//! whether that ends up in `tracing`, a test buffer, or nowhere.

use crate::actions::{GameAction, GameEvent};
use crate::board::PlayerId;
use crate::game::{GameError, GameState};

/// Receives engine outcomes after the state has been updated (or left alone)
pub trait EngineObserver {
    /// Called once per event of a successful action, in emission order
    fn on_event(&mut self, _state: &GameState, _event: &GameEvent) {}

    /// Called when an action is rejected; `state` is unchanged
    fn on_rejected(
        &mut self,
        _state: &GameState,
        _player: PlayerId,
        _action: &GameAction,
        _error: &GameError,
    ) {
    }
}

impl<T: EngineObserver + ?Sized> EngineObserver for &mut T {
    fn on_event(&mut self, state: &GameState, event: &GameEvent) {
        (**self).on_event(state, event);
    }

    fn on_rejected(
        &mut self,
        state: &GameState,
        player: PlayerId,
        action: &GameAction,
        error: &GameError,
    ) {
        (**self).on_rejected(state, player, action, error);
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl EngineObserver for NoopObserver {}

/// Forwards engine outcomes to `tracing`
#[derive(Debug, Clone, Default)]
pub struct TracingObserver {
    game_id: Option<String>,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag every record with the game it belongs to
    pub fn for_game(game_id: impl Into<String>) -> Self {
        Self {
            game_id: Some(game_id.into()),
        }
    }

    fn game(&self) -> &str {
        self.game_id.as_deref().unwrap_or("-")
    }
}

impl EngineObserver for TracingObserver {
    fn on_event(&mut self, state: &GameState, event: &GameEvent) {
        match event {
            GameEvent::GameWon {
                player,
                victory_points,
            } => {
                tracing::info!(game_id = self.game(), player, victory_points, turn = state.turn, "game won");
            }
            GameEvent::LongestRoadChanged {
                previous,
                current,
                length,
            } => {
                tracing::info!(game_id = self.game(), ?previous, ?current, length, "longest road changed");
            }
            other => {
                tracing::debug!(game_id = self.game(), phase = %state.phase, event = ?other, "engine event");
            }
        }
    }

    fn on_rejected(
        &mut self,
        state: &GameState,
        player: PlayerId,
        action: &GameAction,
        error: &GameError,
    ) {
        tracing::warn!(
            game_id = self.game(),
            player,
            action = action.label(),
            phase = %state.phase,
            class = ?error.class(),
            %error,
            "action rejected"
        );
    }
}
