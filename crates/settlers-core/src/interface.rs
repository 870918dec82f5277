//! Caller-facing contract: actions, results and the per-player view.
//!
//! External callers never see engine internals. They submit an `Action`
//! whose placement targets may be canonical ids or option ordinals, get back
//! an `ActionResult`, and query an `AgentView` that hides opponents'
//! resource contents.

use crate::actions::{GameAction, GameEvent};
use crate::board::{Board, BuildingKind, EdgeId, PlayerId, Resource, VertexId};
use crate::game::{Engine, ErrorClass, GameError, GamePhase, GameState};
use crate::legal::{city_candidates, legal_moves, LegalMoves};
use crate::observer::EngineObserver;
use crate::options::{OptionError, OptionIndex};
use crate::player::{PlayerColor, ResourceHand};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// A placement target: a canonical id or an ordinal from the latest option
/// session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target<T> {
    Id(T),
    Option(u32),
}

/// Actions accepted from outside the core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Roll,
    BuildRoad { edge: Target<EdgeId> },
    BuildSettlement { vertex: Target<VertexId> },
    BuildCity { vertex: VertexId },
    TradeBank { give: ResourceHand, receive: Resource },
    EndTurn,
}

/// Closed set of action kinds offered to a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Roll,
    BuildRoad,
    BuildSettlement,
    BuildCity,
    TradeBank,
    EndTurn,
    Wait,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Roll => ActionKind::Roll,
            Action::BuildRoad { .. } => ActionKind::BuildRoad,
            Action::BuildSettlement { .. } => ActionKind::BuildSettlement,
            Action::BuildCity { .. } => ActionKind::BuildCity,
            Action::TradeBank { .. } => ActionKind::TradeBank,
            Action::EndTurn => ActionKind::EndTurn,
        }
    }

    /// Turn option ordinals into canonical ids. Raw ids pass through
    /// unchecked; the engine rejects unknown ones.
    pub fn resolve(
        &self,
        options: &OptionIndex,
        player: PlayerId,
        token: Option<u64>,
        now: SystemTime,
    ) -> Result<GameAction, OptionError> {
        Ok(match self {
            Action::Roll => GameAction::RollDice,
            Action::BuildRoad { edge } => GameAction::BuildRoad(match edge {
                Target::Id(id) => *id,
                Target::Option(n) => options.resolve_edge(player, *n, token, now)?,
            }),
            Action::BuildSettlement { vertex } => GameAction::BuildSettlement(match vertex {
                Target::Id(id) => *id,
                Target::Option(n) => options.resolve_vertex(player, *n, token, now)?,
            }),
            Action::BuildCity { vertex } => GameAction::BuildCity(*vertex),
            Action::TradeBank { give, receive } => GameAction::TradeWithBank {
                give: *give,
                receive: *receive,
            },
            Action::EndTurn => GameAction::EndTurn,
        })
    }
}

/// Outcome of `execute`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_class: Option<ErrorClass>,
    #[serde(default)]
    pub events: Vec<GameEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_state: Option<GameState>,
}

impl ActionResult {
    fn failure(message: String, class: ErrorClass) -> Self {
        Self {
            success: false,
            message,
            error_class: Some(class),
            events: Vec::new(),
            updated_state: None,
        }
    }
}

/// Resolve `action` through the option index and apply it.
///
/// Never panics on caller input; every failure is a typed `ActionResult`
/// and leaves `state` untouched.
pub fn execute<R: Rng, O: EngineObserver>(
    engine: &mut Engine<R, O>,
    state: &mut GameState,
    options: &OptionIndex,
    player: PlayerId,
    action: &Action,
    token: Option<u64>,
    now: SystemTime,
) -> ActionResult {
    let canonical = match action.resolve(options, player, token, now) {
        Ok(canonical) => canonical,
        Err(error) => return ActionResult::failure(error.to_string(), ErrorClass::Structural),
    };

    match engine.apply(state, player, canonical.clone()) {
        Ok(events) => ActionResult {
            success: true,
            message: describe(&canonical, &events),
            error_class: None,
            events,
            updated_state: Some(state.clone()),
        },
        Err(error) => ActionResult::failure(error.to_string(), error.class()),
    }
}

fn describe(action: &GameAction, events: &[GameEvent]) -> String {
    let won = events.iter().find_map(|e| match e {
        GameEvent::GameWon {
            player,
            victory_points,
        } => Some((*player, *victory_points)),
        _ => None,
    });

    let base = match action {
        GameAction::RollDice => events
            .iter()
            .find_map(|e| match e {
                GameEvent::DiceRolled { roll, total, .. } => {
                    Some(format!("Rolled {} + {} = {}", roll.0, roll.1, total))
                }
                _ => None,
            })
            .unwrap_or_else(|| "Rolled".to_string()),
        GameAction::BuildRoad(edge) => format!("Road built on edge {edge}"),
        GameAction::BuildSettlement(vertex) => format!("Settlement built on vertex {vertex}"),
        GameAction::BuildCity(vertex) => format!("City built on vertex {vertex}"),
        GameAction::TradeWithBank { give, receive } => format!("Traded {give} for 1 {receive}"),
        GameAction::EndTurn => "Turn ended".to_string(),
    };

    match won {
        Some((player, vp)) => format!("{base}; player {player} wins with {vp} victory points"),
        None => base,
    }
}

/// Action kinds `player` may attempt now, from phase and resource
/// thresholds only
pub fn possible_actions(state: &GameState, player: PlayerId) -> Vec<ActionKind> {
    let Some(me) = state.player(player) else {
        return Vec::new();
    };
    if state.phase == GamePhase::GameOver {
        return Vec::new();
    }
    if state.current_player != player {
        return vec![ActionKind::Wait];
    }

    match state.phase {
        GamePhase::DiceRoll => vec![ActionKind::Roll],
        phase if phase.is_setup_settlement() => vec![ActionKind::BuildSettlement],
        phase if phase.is_setup_road() => vec![ActionKind::BuildRoad],
        GamePhase::Main => {
            let mut kinds = Vec::new();
            if me.can_afford_road() {
                kinds.push(ActionKind::BuildRoad);
            }
            if me.can_afford_settlement() {
                kinds.push(ActionKind::BuildSettlement);
            }
            if me.can_afford_city() {
                kinds.push(ActionKind::BuildCity);
            }
            if me.resources.total() >= crate::game::BANK_TRADE_RATIO {
                kinds.push(ActionKind::TradeBank);
            }
            kinds.push(ActionKind::EndTurn);
            kinds
        }
        _ => Vec::new(),
    }
}

/// Turn and phase summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    pub turn: u32,
    pub phase: GamePhase,
    pub current_player: PlayerId,
    pub current_player_name: String,
    pub is_your_turn: bool,
    pub dice_roll: Option<(u8, u8)>,
    pub winner: Option<PlayerId>,
}

/// Road, settlement and city counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceCounts {
    pub roads: u32,
    pub settlements: u32,
    pub cities: u32,
}

/// Where a player's pieces stand
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingSummary {
    pub settlements: Vec<VertexId>,
    pub cities: Vec<VertexId>,
    pub roads: Vec<EdgeId>,
}

impl BuildingSummary {
    fn of(board: &Board, player: PlayerId) -> Self {
        let mut summary = Self::default();
        for vertex in board.buildings_of(player) {
            match vertex.building.map(|b| b.kind) {
                Some(BuildingKind::Settlement) => summary.settlements.push(vertex.id),
                Some(BuildingKind::City) => summary.cities.push(vertex.id),
                None => {}
            }
        }
        summary.roads = board.roads_of(player).map(|e| e.id).collect();
        summary
    }
}

/// The requesting player's own state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnInfo {
    pub id: PlayerId,
    pub name: String,
    pub color: PlayerColor,
    pub victory_points: u32,
    pub resources: ResourceHand,
    pub remaining: PieceCounts,
    pub buildings: BuildingSummary,
}

/// What everyone can see about an opponent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpponentInfo {
    pub id: PlayerId,
    pub name: String,
    pub color: PlayerColor,
    pub victory_points: u32,
    /// Card count only; contents stay hidden
    pub resource_count: u32,
    pub placed: PieceCounts,
    pub buildings: BuildingSummary,
}

/// State projection for one player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentView {
    pub game: GameInfo,
    pub you: OwnInfo,
    pub opponents: Vec<OpponentInfo>,
    pub board: Board,
    pub legal_moves: LegalMoves,
    pub city_candidates: Vec<VertexId>,
    pub possible_actions: Vec<ActionKind>,
}

/// Build the view of `state` for `player`
pub fn agent_view(state: &GameState, player: PlayerId) -> Result<AgentView, GameError> {
    let me = state.player(player).ok_or(GameError::UnknownPlayer(player))?;
    let current = state
        .player(state.current_player)
        .ok_or(GameError::UnknownPlayer(state.current_player))?;

    let opponents = state
        .players
        .iter()
        .filter(|p| p.id != player)
        .map(|p| {
            let (roads, settlements, cities) = p.pieces_placed();
            OpponentInfo {
                id: p.id,
                name: p.name.clone(),
                color: p.color,
                victory_points: p.victory_points(),
                resource_count: p.resources.total(),
                placed: PieceCounts {
                    roads,
                    settlements,
                    cities,
                },
                buildings: BuildingSummary::of(&state.board, p.id),
            }
        })
        .collect();

    Ok(AgentView {
        game: GameInfo {
            turn: state.turn,
            phase: state.phase,
            current_player: state.current_player,
            current_player_name: current.name.clone(),
            is_your_turn: state.current_player == player,
            dice_roll: state.dice_roll,
            winner: state.winner,
        },
        you: OwnInfo {
            id: me.id,
            name: me.name.clone(),
            color: me.color,
            victory_points: me.victory_points(),
            resources: me.resources,
            remaining: PieceCounts {
                roads: me.roads_remaining,
                settlements: me.settlements_remaining,
                cities: me.cities_remaining,
            },
            buildings: BuildingSummary::of(&state.board, player),
        },
        opponents,
        board: state.board.clone(),
        legal_moves: legal_moves(state, player),
        city_candidates: city_candidates(&state.board, player),
        possible_actions: possible_actions(state, player),
    })
}
