//! Core game state machine.
//!
//! This module contains the `GameState` data, the phase machine and the
//! `Engine` that validates and applies actions against it. Every operation
//! validates completely before it writes, so a rejected action leaves the
//! state exactly as it was.

use crate::actions::{GameAction, GameEvent};
use crate::board::{Board, BuildingKind, EdgeId, PlayerId, Resource, VertexId};
use crate::observer::{EngineObserver, NoopObserver};
use crate::player::{costs, Player, ResourceHand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Minimum road length for Longest Road
pub const MIN_LONGEST_ROAD: u32 = 5;

/// Victory points needed to win
pub const VICTORY_POINTS_TO_WIN: u32 = 10;

/// Cards given per bank trade
pub const BANK_TRADE_RATIO: u32 = 4;

/// Allowed number of players
pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 4;

/// Game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// First setup round, forward order: place a settlement
    #[serde(rename = "setup_settlement_1")]
    SetupSettlement1,
    /// First setup round: place a road at that settlement
    #[serde(rename = "setup_road_1")]
    SetupRoad1,
    /// Second setup round, reverse order: place a settlement
    #[serde(rename = "setup_settlement_2")]
    SetupSettlement2,
    /// Second setup round: place a road at that settlement
    #[serde(rename = "setup_road_2")]
    SetupRoad2,
    /// Start of a turn, dice not yet rolled
    #[serde(rename = "dice_roll")]
    DiceRoll,
    /// Build, trade, end turn
    #[serde(rename = "main")]
    Main,
    /// Someone reached the victory target
    #[serde(rename = "game_over")]
    GameOver,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::SetupSettlement1 => "setup_settlement_1",
            GamePhase::SetupRoad1 => "setup_road_1",
            GamePhase::SetupSettlement2 => "setup_settlement_2",
            GamePhase::SetupRoad2 => "setup_road_2",
            GamePhase::DiceRoll => "dice_roll",
            GamePhase::Main => "main",
            GamePhase::GameOver => "game_over",
        }
    }

    pub fn is_setup(&self) -> bool {
        self.is_setup_settlement() || self.is_setup_road()
    }

    pub fn is_setup_settlement(&self) -> bool {
        matches!(self, GamePhase::SetupSettlement1 | GamePhase::SetupSettlement2)
    }

    pub fn is_setup_road(&self) -> bool {
        matches!(self, GamePhase::SetupRoad1 | GamePhase::SetupRoad2)
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Piece kinds drawn from a player's stock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Road,
    Settlement,
    City,
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PieceKind::Road => "roads",
            PieceKind::Settlement => "settlements",
            PieceKind::City => "cities",
        })
    }
}

/// How a failure should be treated by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// A referenced id does not exist
    Structural,
    /// The action breaks a game rule
    RuleViolation,
    /// The board contradicts its own topology
    Integrity,
}

/// Errors that can occur when applying actions
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    // ==================== Structural ====================
    #[error("Unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("Unknown vertex {0}")]
    UnknownVertex(VertexId),

    #[error("Unknown edge {0}")]
    UnknownEdge(EdgeId),

    #[error("A game needs 2-4 players, got {0}")]
    InvalidPlayerCount(usize),

    // ==================== Rule violations ====================
    #[error("Not your turn")]
    NotYourTurn,

    #[error("Action not allowed during {0}")]
    InvalidPhase(GamePhase),

    #[error("Vertex {0} is already occupied")]
    VertexOccupied(VertexId),

    #[error("Vertex {0} is too close to another building")]
    DistanceRule(VertexId),

    #[error("Edge {0} already has a road")]
    EdgeOccupied(EdgeId),

    #[error("Not connected to your roads or buildings")]
    NotConnected,

    #[error("Setup road must touch the settlement just placed")]
    MustTouchLastSettlement,

    #[error("Vertex {0} does not hold your settlement")]
    NotYourSettlement(VertexId),

    #[error("Not enough resources")]
    InsufficientResources,

    #[error("No {0} remaining")]
    NoPiecesRemaining(PieceKind),

    #[error("Invalid trade: {0}")]
    InvalidTrade(String),

    #[error("Game is over")]
    GameOver,

    // ==================== Integrity ====================
    #[error("Edge {0} does not join adjacent vertices")]
    MalformedEdge(EdgeId),
}

impl GameError {
    pub fn class(&self) -> ErrorClass {
        match self {
            GameError::UnknownPlayer(_)
            | GameError::UnknownVertex(_)
            | GameError::UnknownEdge(_)
            | GameError::InvalidPlayerCount(_) => ErrorClass::Structural,
            GameError::MalformedEdge(_) => ErrorClass::Integrity,
            _ => ErrorClass::RuleViolation,
        }
    }
}

/// The complete game state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// The game board
    pub board: Board,
    /// All players, indexed by id
    pub players: Vec<Player>,
    /// Current player index
    pub current_player: PlayerId,
    /// Current game phase
    pub phase: GamePhase,
    /// Last dice roll, cleared at end of turn
    pub dice_roll: Option<(u8, u8)>,
    /// Turn number (starts at 1)
    pub turn: u32,
    /// Holder of the longest road bonus
    pub longest_road_holder: Option<PlayerId>,
    /// Never awarded; knights are not part of this rule set
    pub largest_army_holder: Option<PlayerId>,
    /// Settlement just placed during setup, the anchor for the paired road
    pub last_settlement: Option<VertexId>,
    /// Set once the game is over
    pub winner: Option<PlayerId>,
}

impl GameState {
    /// Create a new game. Player 0 places first.
    pub fn new(player_names: Vec<String>, board: Board) -> Result<Self, GameError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&player_names.len()) {
            return Err(GameError::InvalidPlayerCount(player_names.len()));
        }

        let players = player_names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Player::new(i as PlayerId, name))
            .collect();

        Ok(Self {
            board,
            players,
            current_player: 0,
            phase: GamePhase::SetupSettlement1,
            dice_roll: None,
            turn: 1,
            longest_road_holder: None,
            largest_army_holder: None,
            last_settlement: None,
            winner: None,
        })
    }

    /// Get the number of players
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Get a player by ID
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id as usize)
    }

    fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, GameError> {
        self.players
            .get_mut(id as usize)
            .ok_or(GameError::UnknownPlayer(id))
    }

    /// Check if the game is finished
    pub fn is_finished(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Victory points derived from the board and award flags
    pub fn recomputed_victory_points(&self, id: PlayerId) -> u32 {
        self.player(id)
            .map(|p| self.board.building_points(id) + p.award_points())
            .unwrap_or(0)
    }

    fn refresh_victory_points(&mut self) {
        for index in 0..self.players.len() {
            let id = index as PlayerId;
            let points = self.recomputed_victory_points(id);
            self.players[index].victory_points = points;
        }
    }

    /// Validate and apply an action for `player`.
    ///
    /// Dice rolls draw from `rng`. On error the state is unchanged.
    pub fn apply_action<R: Rng>(
        &mut self,
        player: PlayerId,
        action: GameAction,
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.player(player).is_none() {
            return Err(GameError::UnknownPlayer(player));
        }
        if self.is_finished() {
            return Err(GameError::GameOver);
        }

        let events = match action {
            GameAction::RollDice => self.roll_dice(player, rng)?,
            GameAction::BuildRoad(edge) => self.build_road(player, edge)?,
            GameAction::BuildSettlement(vertex) => self.build_settlement(player, vertex)?,
            GameAction::BuildCity(vertex) => self.build_city(player, vertex)?,
            GameAction::TradeWithBank { give, receive } => {
                self.trade_with_bank(player, give, receive)?
            }
            GameAction::EndTurn => self.end_turn(player)?,
        };

        self.refresh_victory_points();
        Ok(events)
    }

    fn require_turn(&self, player: PlayerId) -> Result<(), GameError> {
        if player != self.current_player {
            return Err(GameError::NotYourTurn);
        }
        Ok(())
    }

    fn require_phase(&self, allowed: impl Fn(GamePhase) -> bool) -> Result<(), GameError> {
        if !allowed(self.phase) {
            return Err(GameError::InvalidPhase(self.phase));
        }
        Ok(())
    }

    // ==================== Dice ====================

    fn roll_dice<R: Rng>(
        &mut self,
        player: PlayerId,
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.require_turn(player)?;
        self.require_phase(|p| p == GamePhase::DiceRoll)?;

        let die1: u8 = rng.gen_range(1..=6);
        let die2: u8 = rng.gen_range(1..=6);
        let total = die1 + die2;

        self.dice_roll = Some((die1, die2));
        self.phase = GamePhase::Main;

        let mut events = vec![GameEvent::DiceRolled {
            player,
            roll: (die1, die2),
            total,
        }];
        events.extend(self.distribute_resources(total));
        Ok(events)
    }

    /// Credit every building on a hex numbered `total` with that hex's
    /// resource: 1 per settlement, 2 per city. A 7 pays nothing.
    pub fn distribute_resources(&mut self, total: u8) -> Vec<GameEvent> {
        let production = self.board.production_for_roll(total);

        let mut distributions = Vec::new();
        for (id, hand) in production {
            if let Some(player) = self.players.get_mut(id as usize) {
                player.resources.add_hand(&hand);
                distributions.extend(hand.iter().map(|(resource, amount)| (id, resource, amount)));
            }
        }

        if distributions.is_empty() {
            Vec::new()
        } else {
            vec![GameEvent::ResourcesDistributed { distributions }]
        }
    }

    // ==================== Building ====================

    fn build_settlement(
        &mut self,
        player: PlayerId,
        vertex: VertexId,
    ) -> Result<Vec<GameEvent>, GameError> {
        let target = self
            .board
            .vertex(vertex)
            .ok_or(GameError::UnknownVertex(vertex))?;
        self.require_turn(player)?;
        self.require_phase(|p| p.is_setup_settlement() || p == GamePhase::Main)?;

        if target.is_occupied() {
            return Err(GameError::VertexOccupied(vertex));
        }
        if !self.board.satisfies_distance_rule(vertex) {
            return Err(GameError::DistanceRule(vertex));
        }

        let setup = self.phase.is_setup();
        let owner = self.player_mut(player)?;
        if owner.settlements_remaining == 0 {
            return Err(GameError::NoPiecesRemaining(PieceKind::Settlement));
        }

        let remaining = if setup {
            owner.resources
        } else {
            if !self.board.vertex_touches_road(vertex, player) {
                return Err(GameError::NotConnected);
            }
            self.player_mut(player)?
                .resources
                .checked_sub(&costs::settlement())
                .ok_or(GameError::InsufficientResources)?
        };

        let owner = self.player_mut(player)?;
        owner.resources = remaining;
        owner.settlements_remaining -= 1;
        self.board.place_settlement(vertex, player);

        match self.phase {
            GamePhase::SetupSettlement1 => {
                self.last_settlement = Some(vertex);
                self.phase = GamePhase::SetupRoad1;
            }
            GamePhase::SetupSettlement2 => {
                self.last_settlement = Some(vertex);
                self.phase = GamePhase::SetupRoad2;
            }
            _ => {}
        }

        let mut events = vec![GameEvent::SettlementBuilt { player, vertex }];
        // A new building can cut an opponent's road.
        events.extend(self.update_longest_road());
        Ok(events)
    }

    fn build_road(&mut self, player: PlayerId, edge: EdgeId) -> Result<Vec<GameEvent>, GameError> {
        let target = self.board.edge(edge).ok_or(GameError::UnknownEdge(edge))?;
        self.require_turn(player)?;
        self.require_phase(|p| p.is_setup_road() || p == GamePhase::Main)?;

        if target.road.is_some() {
            return Err(GameError::EdgeOccupied(edge));
        }
        if !self.board.is_well_formed_edge(edge) {
            return Err(GameError::MalformedEdge(edge));
        }

        let setup = self.phase.is_setup();
        if setup {
            match self.last_settlement {
                Some(anchor) if target.touches(anchor) => {}
                _ => return Err(GameError::MustTouchLastSettlement),
            }
        } else if !self.board.edge_touches_network(edge, player) {
            return Err(GameError::NotConnected);
        }

        let owner = self.player_mut(player)?;
        if owner.roads_remaining == 0 {
            return Err(GameError::NoPiecesRemaining(PieceKind::Road));
        }
        let remaining = if setup {
            owner.resources
        } else {
            owner
                .resources
                .checked_sub(&costs::road())
                .ok_or(GameError::InsufficientResources)?
        };

        owner.resources = remaining;
        owner.roads_remaining -= 1;
        self.board.place_road(edge, player);

        let mut events = vec![GameEvent::RoadBuilt { player, edge }];
        events.extend(self.update_longest_road());
        if setup {
            self.last_settlement = None;
            events.extend(self.advance_setup_phase());
        }
        Ok(events)
    }

    fn build_city(&mut self, player: PlayerId, vertex: VertexId) -> Result<Vec<GameEvent>, GameError> {
        let target = self
            .board
            .vertex(vertex)
            .ok_or(GameError::UnknownVertex(vertex))?;
        self.require_turn(player)?;
        self.require_phase(|p| p == GamePhase::Main)?;

        match target.building {
            Some(building) if building.player == player && building.kind == BuildingKind::Settlement => {}
            _ => return Err(GameError::NotYourSettlement(vertex)),
        }

        let owner = self.player_mut(player)?;
        if owner.cities_remaining == 0 {
            return Err(GameError::NoPiecesRemaining(PieceKind::City));
        }
        let remaining = owner
            .resources
            .checked_sub(&costs::city())
            .ok_or(GameError::InsufficientResources)?;

        owner.resources = remaining;
        owner.cities_remaining -= 1;
        owner.settlements_remaining += 1;
        self.board.upgrade_to_city(vertex);

        Ok(vec![GameEvent::CityBuilt { player, vertex }])
    }

    // ==================== Trading ====================

    fn trade_with_bank(
        &mut self,
        player: PlayerId,
        give: ResourceHand,
        receive: Resource,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.require_turn(player)?;
        self.require_phase(|p| p == GamePhase::Main)?;

        let offered = give
            .checked_total()
            .ok_or_else(|| GameError::InvalidTrade("offered hand is too large".into()))?;
        if offered != BANK_TRADE_RATIO {
            return Err(GameError::InvalidTrade(format!(
                "must give exactly {BANK_TRADE_RATIO} resources, offered {offered}"
            )));
        }

        let owner = self.player_mut(player)?;
        let mut remaining = owner
            .resources
            .checked_sub(&give)
            .ok_or(GameError::InsufficientResources)?;
        remaining.add(receive, 1);
        owner.resources = remaining;

        Ok(vec![GameEvent::BankTrade {
            player,
            gave: give,
            received: receive,
        }])
    }

    // ==================== Turn Management ====================

    fn end_turn(&mut self, player: PlayerId) -> Result<Vec<GameEvent>, GameError> {
        self.require_turn(player)?;
        self.require_phase(|p| p == GamePhase::Main)?;

        let next_player = ((player as usize + 1) % self.player_count()) as PlayerId;
        self.current_player = next_player;
        self.phase = GamePhase::DiceRoll;
        self.dice_roll = None;
        self.turn += 1;

        let mut events = vec![GameEvent::TurnEnded {
            player,
            next_player,
        }];
        events.extend(self.check_win_condition());
        Ok(events)
    }

    /// Snake order: round one runs 0..n, round two runs n-1..0, and the last
    /// player of round one places twice in a row.
    fn advance_setup_phase(&mut self) -> Vec<GameEvent> {
        let last = (self.player_count() - 1) as PlayerId;

        match self.phase {
            GamePhase::SetupRoad1 if self.current_player == last => {
                self.phase = GamePhase::SetupSettlement2;
            }
            GamePhase::SetupRoad1 => {
                self.current_player += 1;
                self.phase = GamePhase::SetupSettlement1;
            }
            GamePhase::SetupRoad2 if self.current_player == 0 => {
                self.phase = GamePhase::DiceRoll;
            }
            GamePhase::SetupRoad2 => {
                self.current_player -= 1;
                self.phase = GamePhase::SetupSettlement2;
            }
            _ => return Vec::new(),
        }

        vec![GameEvent::SetupAdvanced {
            phase: self.phase,
            next_player: self.current_player,
        }]
    }

    /// Recompute the Longest Road award. Ties keep the current holder; a
    /// tie with no holder awards nobody.
    fn update_longest_road(&mut self) -> Vec<GameEvent> {
        let lengths: Vec<(PlayerId, u32)> = self
            .players
            .iter()
            .map(|p| (p.id, self.board.longest_road(p.id)))
            .collect();

        let best = lengths
            .iter()
            .map(|(_, length)| *length)
            .filter(|length| *length >= MIN_LONGEST_ROAD)
            .max();

        let current_holder = self.longest_road_holder;
        let new_holder = best.and_then(|best| {
            let leaders: Vec<PlayerId> = lengths
                .iter()
                .filter(|(_, length)| *length == best)
                .map(|(id, _)| *id)
                .collect();
            match leaders.as_slice() {
                [only] => Some(*only),
                _ if current_holder.is_some_and(|h| leaders.contains(&h)) => current_holder,
                _ => None,
            }
        });

        if new_holder == current_holder {
            return Vec::new();
        }

        for player in &mut self.players {
            player.has_longest_road = Some(player.id) == new_holder;
        }
        self.longest_road_holder = new_holder;

        vec![GameEvent::LongestRoadChanged {
            previous: current_holder,
            current: new_holder,
            length: best.unwrap_or(0),
        }]
    }

    /// End the game if anyone reached the target. Highest score wins; the
    /// lower player id wins a tie.
    fn check_win_condition(&mut self) -> Vec<GameEvent> {
        let leader = self
            .players
            .iter()
            .map(|p| (p.id, self.recomputed_victory_points(p.id)))
            .filter(|(_, vp)| *vp >= VICTORY_POINTS_TO_WIN)
            .fold(None, |best: Option<(PlayerId, u32)>, candidate| match best {
                Some((_, vp)) if vp >= candidate.1 => best,
                _ => Some(candidate),
            });

        let Some((winner, victory_points)) = leader else {
            return Vec::new();
        };

        self.phase = GamePhase::GameOver;
        self.winner = Some(winner);
        vec![GameEvent::GameWon {
            player: winner,
            victory_points,
        }]
    }
}

/// The rules engine: applies actions to a `GameState` with an injected
/// dice RNG and observer.
#[derive(Debug)]
pub struct Engine<R, O = NoopObserver> {
    rng: R,
    observer: O,
}

impl Engine<StdRng, NoopObserver> {
    /// Deterministic engine without observation, mostly for tests and replays
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed), NoopObserver)
    }
}

impl<R: Rng, O: EngineObserver> Engine<R, O> {
    pub fn new(rng: R, observer: O) -> Self {
        Self { rng, observer }
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Validate and apply `action`, reporting the outcome to the observer
    pub fn apply(
        &mut self,
        state: &mut GameState,
        player: PlayerId,
        action: GameAction,
    ) -> Result<Vec<GameEvent>, GameError> {
        match state.apply_action(player, action.clone(), &mut self.rng) {
            Ok(events) => {
                for event in &events {
                    self.observer.on_event(state, event);
                }
                Ok(events)
            }
            Err(error) => {
                self.observer.on_rejected(state, player, &action, &error);
                Err(error)
            }
        }
    }

    pub fn roll_dice(&mut self, state: &mut GameState, player: PlayerId) -> Result<Vec<GameEvent>, GameError> {
        self.apply(state, player, GameAction::RollDice)
    }

    pub fn build_road(
        &mut self,
        state: &mut GameState,
        player: PlayerId,
        edge: EdgeId,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.apply(state, player, GameAction::BuildRoad(edge))
    }

    pub fn build_settlement(
        &mut self,
        state: &mut GameState,
        player: PlayerId,
        vertex: VertexId,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.apply(state, player, GameAction::BuildSettlement(vertex))
    }

    pub fn build_city(
        &mut self,
        state: &mut GameState,
        player: PlayerId,
        vertex: VertexId,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.apply(state, player, GameAction::BuildCity(vertex))
    }

    pub fn trade_with_bank(
        &mut self,
        state: &mut GameState,
        player: PlayerId,
        give: ResourceHand,
        receive: Resource,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.apply(state, player, GameAction::TradeWithBank { give, receive })
    }

    pub fn end_turn(&mut self, state: &mut GameState, player: PlayerId) -> Result<Vec<GameEvent>, GameError> {
        self.apply(state, player, GameAction::EndTurn)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::board::tests::fixed_board;
    use pretty_assertions::assert_eq;

    pub(crate) fn two_player_game() -> GameState {
        GameState::new(vec!["Alice".into(), "Bob".into()], fixed_board()).unwrap()
    }

    /// First open vertex by id, and the first free edge at it
    fn open_spot(state: &GameState) -> (VertexId, EdgeId) {
        let vertex = state
            .board
            .vertices()
            .iter()
            .find(|v| state.board.is_open_for_settlement(v.id))
            .unwrap();
        let edge = vertex
            .edge_ids
            .iter()
            .copied()
            .find(|e| state.board.edge(*e).unwrap().road.is_none())
            .unwrap();
        (vertex.id, edge)
    }

    /// Run both setup rounds, each player taking the lowest open vertex
    pub(crate) fn complete_setup(engine: &mut Engine<StdRng>, state: &mut GameState) {
        while state.phase.is_setup() {
            let player = state.current_player;
            let (vertex, edge) = open_spot(state);
            engine.build_settlement(state, player, vertex).unwrap();
            engine.build_road(state, player, edge).unwrap();
        }
    }

    #[test]
    fn test_new_game_starts_in_setup() {
        let game = two_player_game();
        assert_eq!(game.phase, GamePhase::SetupSettlement1);
        assert_eq!(game.current_player, 0);
        assert_eq!(game.turn, 1);
        assert_eq!(game.players[1].color, crate::player::PlayerColor::Blue);
    }

    #[test]
    fn test_player_count_limits() {
        let err = GameState::new(vec!["Solo".into()], fixed_board()).unwrap_err();
        assert_eq!(err, GameError::InvalidPlayerCount(1));
        assert_eq!(err.class(), ErrorClass::Structural);

        let names = (0..5).map(|i| format!("P{i}")).collect();
        assert!(GameState::new(names, fixed_board()).is_err());
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(
            serde_json::to_string(&GamePhase::SetupSettlement1).unwrap(),
            "\"setup_settlement_1\""
        );
        assert_eq!(GamePhase::DiceRoll.to_string(), "dice_roll");
        let phase: GamePhase = serde_json::from_str("\"game_over\"").unwrap();
        assert_eq!(phase, GamePhase::GameOver);
    }

    #[test]
    fn test_snake_draft_order() {
        let mut engine = Engine::seeded(1);
        let mut state =
            GameState::new(vec!["A".into(), "B".into(), "C".into()], fixed_board()).unwrap();

        let mut order = Vec::new();
        while state.phase.is_setup() {
            let player = state.current_player;
            order.push((player, state.phase));
            let (vertex, edge) = open_spot(&state);
            engine.build_settlement(&mut state, player, vertex).unwrap();
            engine.build_road(&mut state, player, edge).unwrap();
        }

        use GamePhase::{SetupSettlement1 as S1, SetupSettlement2 as S2};
        assert_eq!(
            order,
            vec![(0, S1), (1, S1), (2, S1), (2, S2), (1, S2), (0, S2)]
        );
        assert_eq!(state.phase, GamePhase::DiceRoll);
        assert_eq!(state.current_player, 0);
        assert_eq!(state.last_settlement, None);
    }

    #[test]
    fn test_setup_settlement_then_road_phase() {
        let mut engine = Engine::seeded(1);
        let mut state = two_player_game();
        let (vertex, _) = open_spot(&state);

        let events = engine.build_settlement(&mut state, 0, vertex).unwrap();
        assert_eq!(events, vec![GameEvent::SettlementBuilt { player: 0, vertex }]);
        assert_eq!(state.phase, GamePhase::SetupRoad1);
        assert_eq!(state.last_settlement, Some(vertex));
        assert_eq!(state.players[0].settlements_remaining, 4);
        assert_eq!(state.players[0].victory_points(), 1);
        assert!(state.players[0].resources.is_empty());
    }

    #[test]
    fn test_setup_road_must_touch_last_settlement() {
        let mut engine = Engine::seeded(1);
        let mut state = two_player_game();
        let (vertex, _) = open_spot(&state);
        engine.build_settlement(&mut state, 0, vertex).unwrap();

        let far_edge = state
            .board
            .edges()
            .iter()
            .find(|e| !e.touches(vertex))
            .unwrap()
            .id;
        let before = state.clone();

        let err = engine.build_road(&mut state, 0, far_edge).unwrap_err();
        assert_eq!(err, GameError::MustTouchLastSettlement);
        assert_eq!(err.class(), ErrorClass::RuleViolation);
        assert_eq!(state, before);
        assert_eq!(state.players[0].roads_remaining, 15);
    }

    #[test]
    fn test_wrong_turn_and_phase_are_rejected() {
        let mut engine = Engine::seeded(1);
        let mut state = two_player_game();
        let (vertex, _) = open_spot(&state);

        assert_eq!(
            engine.build_settlement(&mut state, 1, vertex),
            Err(GameError::NotYourTurn)
        );
        assert_eq!(
            engine.roll_dice(&mut state, 0),
            Err(GameError::InvalidPhase(GamePhase::SetupSettlement1))
        );
        assert_eq!(
            engine.build_settlement(&mut state, 7, vertex),
            Err(GameError::UnknownPlayer(7))
        );
        assert_eq!(
            engine.build_settlement(&mut state, 0, VertexId(99)),
            Err(GameError::UnknownVertex(VertexId(99)))
        );
        assert_eq!(
            engine.build_road(&mut state, 0, EdgeId(0)),
            Err(GameError::UnknownEdge(EdgeId(0)))
        );
    }

    #[test]
    fn test_distance_rule_enforced() {
        let mut engine = Engine::seeded(1);
        let mut state = two_player_game();
        let (vertex, edge) = open_spot(&state);
        engine.build_settlement(&mut state, 0, vertex).unwrap();
        engine.build_road(&mut state, 0, edge).unwrap();

        let neighbor = state.board.vertex(vertex).unwrap().adjacent_vertex_ids[0];
        assert_eq!(
            engine.build_settlement(&mut state, 1, neighbor),
            Err(GameError::DistanceRule(neighbor))
        );
        assert_eq!(
            engine.build_settlement(&mut state, 1, vertex),
            Err(GameError::VertexOccupied(vertex))
        );
    }

    #[test]
    fn test_roll_dice_moves_to_main() {
        let mut engine = Engine::seeded(7);
        let mut state = two_player_game();
        complete_setup(&mut engine, &mut state);

        let events = engine.roll_dice(&mut state, 0).unwrap();
        let (d1, d2) = state.dice_roll.unwrap();
        assert!((1..=6).contains(&d1) && (1..=6).contains(&d2));
        assert_eq!(state.phase, GamePhase::Main);
        assert!(matches!(events[0], GameEvent::DiceRolled { total, .. } if total == d1 + d2));

        assert_eq!(
            engine.roll_dice(&mut state, 0),
            Err(GameError::InvalidPhase(GamePhase::Main))
        );
    }

    #[test]
    fn test_main_phase_road_costs_and_connects() {
        let mut engine = Engine::seeded(3);
        let mut state = two_player_game();
        complete_setup(&mut engine, &mut state);
        engine.roll_dice(&mut state, 0).unwrap();

        let own_edge = state
            .board
            .edges()
            .iter()
            .find(|e| e.road.is_none() && state.board.edge_touches_network(e.id, 0))
            .unwrap()
            .id;

        state.players[0].resources = ResourceHand::new();
        assert_eq!(
            engine.build_road(&mut state, 0, own_edge),
            Err(GameError::InsufficientResources)
        );

        state.players[0].resources = ResourceHand::with_amounts(1, 1, 0, 0, 0);
        engine.build_road(&mut state, 0, own_edge).unwrap();
        assert!(state.players[0].resources.is_empty());
        assert_eq!(state.players[0].roads_remaining, 12);

        let loose_edge = state
            .board
            .edges()
            .iter()
            .find(|e| {
                e.road.is_none()
                    && !state.board.edge_touches_network(e.id, 0)
                    && !state.board.edge_touches_network(e.id, 1)
            })
            .unwrap()
            .id;
        state.players[0].resources = ResourceHand::with_amounts(1, 1, 0, 0, 0);
        assert_eq!(
            engine.build_road(&mut state, 0, loose_edge),
            Err(GameError::NotConnected)
        );
    }

    #[test]
    fn test_build_city_upgrade() {
        let mut engine = Engine::seeded(3);
        let mut state = two_player_game();
        complete_setup(&mut engine, &mut state);
        engine.roll_dice(&mut state, 0).unwrap();

        let own = state.board.buildings_of(0).next().unwrap().id;
        let theirs = state.board.buildings_of(1).next().unwrap().id;
        state.players[0].resources = ResourceHand::with_amounts(0, 0, 0, 2, 3);

        assert_eq!(
            engine.build_city(&mut state, 0, theirs),
            Err(GameError::NotYourSettlement(theirs))
        );

        let vp_before = state.players[0].victory_points();
        engine.build_city(&mut state, 0, own).unwrap();
        assert_eq!(state.players[0].victory_points(), vp_before + 1);
        assert_eq!(state.players[0].cities_remaining, 3);
        assert_eq!(state.players[0].settlements_remaining, 4);
        assert!(state.players[0].resources.is_empty());

        state.players[0].resources = ResourceHand::with_amounts(0, 0, 0, 2, 3);
        assert_eq!(
            engine.build_city(&mut state, 0, own),
            Err(GameError::NotYourSettlement(own))
        );
    }

    #[test]
    fn test_bank_trade() {
        let mut engine = Engine::seeded(3);
        let mut state = two_player_game();
        complete_setup(&mut engine, &mut state);
        engine.roll_dice(&mut state, 0).unwrap();

        state.players[0].resources = ResourceHand::with_amounts(4, 0, 0, 0, 1);
        let give = ResourceHand::single(Resource::Wood, 3);
        assert!(matches!(
            engine.trade_with_bank(&mut state, 0, give, Resource::Brick),
            Err(GameError::InvalidTrade(_))
        ));

        let give = ResourceHand::single(Resource::Wood, 4);
        engine
            .trade_with_bank(&mut state, 0, give, Resource::Brick)
            .unwrap();
        assert_eq!(
            state.players[0].resources,
            ResourceHand::with_amounts(0, 1, 0, 0, 1)
        );

        assert_eq!(
            engine.trade_with_bank(&mut state, 0, give, Resource::Brick),
            Err(GameError::InsufficientResources)
        );
    }

    #[test]
    fn test_end_turn_advances_player() {
        let mut engine = Engine::seeded(3);
        let mut state = two_player_game();
        complete_setup(&mut engine, &mut state);
        engine.roll_dice(&mut state, 0).unwrap();

        let events = engine.end_turn(&mut state, 0).unwrap();
        assert_eq!(
            events,
            vec![GameEvent::TurnEnded {
                player: 0,
                next_player: 1
            }]
        );
        assert_eq!(state.current_player, 1);
        assert_eq!(state.phase, GamePhase::DiceRoll);
        assert_eq!(state.dice_roll, None);
        assert_eq!(state.turn, 2);
    }

    #[test]
    fn test_distribute_resources_on_eight() {
        let mut state = two_player_game();
        // Hex 3 is wheat on 8.
        let vertex = state
            .board
            .vertices_of_hex(crate::board::HexId(3))
            .find(|v| v.hex_ids.iter().all(|h| h.0 != 19))
            .unwrap()
            .id;
        state.board.place_settlement(vertex, 1);

        let events = state.distribute_resources(8);
        assert_eq!(state.players[1].resources.wheat, 1);
        assert_eq!(
            events,
            vec![GameEvent::ResourcesDistributed {
                distributions: vec![(1, Resource::Wheat, 1)]
            }]
        );

        assert!(state.distribute_resources(7).is_empty());
        assert_eq!(state.players[1].resources.total(), 1);
    }

    #[test]
    fn test_longest_road_award_and_ties() {
        let mut state = two_player_game();
        let corners = crate::hex::HexCoord::ORIGIN.corners();
        let ids: Vec<VertexId> = corners
            .iter()
            .map(|c| {
                state
                    .board
                    .vertices()
                    .iter()
                    .find(|v| v.position == *c)
                    .unwrap()
                    .id
            })
            .collect();

        for i in 0..5 {
            let edge = state.board.edge_between(ids[i], ids[i + 1]).unwrap();
            state.board.place_road(edge, 0);
        }
        let events = state.update_longest_road();
        assert_eq!(state.longest_road_holder, Some(0));
        assert!(state.players[0].has_longest_road);
        assert_eq!(
            events,
            vec![GameEvent::LongestRoadChanged {
                previous: None,
                current: Some(0),
                length: 5
            }]
        );
        state.refresh_victory_points();
        assert_eq!(state.players[0].victory_points(), 2);

        // Unchanged holder emits nothing.
        assert!(state.update_longest_road().is_empty());

        let far = state.board.hex(crate::board::HexId(12)).unwrap().position;
        let far_ids: Vec<VertexId> = far
            .corners()
            .iter()
            .map(|c| {
                state
                    .board
                    .vertices()
                    .iter()
                    .find(|v| v.position == *c)
                    .unwrap()
                    .id
            })
            .collect();
        for i in 0..5 {
            let edge = state.board.edge_between(far_ids[i], far_ids[i + 1]).unwrap();
            state.board.place_road(edge, 1);
        }
        // A tie keeps the holder.
        assert!(state.update_longest_road().is_empty());
        assert_eq!(state.longest_road_holder, Some(0));

        let closing = state.board.edge_between(far_ids[5], far_ids[0]).unwrap();
        state.board.place_road(closing, 1);
        let events = state.update_longest_road();
        assert_eq!(state.longest_road_holder, Some(1));
        assert!(!state.players[0].has_longest_road);
        assert_eq!(
            events,
            vec![GameEvent::LongestRoadChanged {
                previous: Some(0),
                current: Some(1),
                length: 6
            }]
        );
    }

    #[test]
    fn test_engine_reports_to_observer() {
        #[derive(Default)]
        struct Counter {
            events: usize,
            rejected: usize,
        }
        impl EngineObserver for Counter {
            fn on_event(&mut self, _: &GameState, _: &GameEvent) {
                self.events += 1;
            }
            fn on_rejected(&mut self, _: &GameState, _: PlayerId, _: &GameAction, _: &GameError) {
                self.rejected += 1;
            }
        }

        let mut counter = Counter::default();
        let mut state = two_player_game();
        let (vertex, _) = open_spot(&state);
        {
            let mut engine = Engine::new(StdRng::seed_from_u64(1), &mut counter);
            engine.build_settlement(&mut state, 0, vertex).unwrap();
            engine.end_turn(&mut state, 0).unwrap_err();
        }
        assert_eq!(counter.events, 1);
        assert_eq!(counter.rejected, 1);
    }

    /// Give `player` cities on fresh open vertices
    fn grant_cities(state: &mut GameState, player: PlayerId, count: usize) {
        for _ in 0..count {
            let vertex = crate::legal::available_vertices(&state.board)[0];
            state.board.place_settlement(vertex, player);
            state.board.upgrade_to_city(vertex);
        }
    }

    #[test]
    fn test_victory_checked_at_end_turn() {
        let mut engine = Engine::seeded(3);
        let mut state = two_player_game();
        complete_setup(&mut engine, &mut state);
        engine.roll_dice(&mut state, 0).unwrap();

        grant_cities(&mut state, 1, 4);
        assert_eq!(state.recomputed_victory_points(1), 10);
        assert_eq!(state.phase, GamePhase::Main);

        let events = engine.end_turn(&mut state, 0).unwrap();
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.winner, Some(1));
        assert!(events.contains(&GameEvent::GameWon {
            player: 1,
            victory_points: 10
        }));
        assert_eq!(engine.roll_dice(&mut state, 1), Err(GameError::GameOver));
    }

    #[test]
    fn test_victory_tie_goes_to_lower_id() {
        let mut engine = Engine::seeded(3);
        let mut state = two_player_game();
        complete_setup(&mut engine, &mut state);
        engine.roll_dice(&mut state, 0).unwrap();

        grant_cities(&mut state, 0, 4);
        grant_cities(&mut state, 1, 4);
        engine.end_turn(&mut state, 0).unwrap();
        assert_eq!(state.winner, Some(0));
    }

    #[test]
    fn test_game_over_blocks_actions() {
        let mut engine = Engine::seeded(1);
        let mut state = two_player_game();
        state.phase = GamePhase::GameOver;
        assert_eq!(engine.end_turn(&mut state, 0), Err(GameError::GameOver));
    }
}
