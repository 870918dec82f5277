//! Game actions that players can take.
//!
//! This module defines the canonical actions the engine applies and the
//! events that result from those actions. Actions name board locations by
//! id only; option ordinals are resolved before they reach this level.

use crate::board::{EdgeId, PlayerId, Resource, VertexId};
use crate::game::GamePhase;
use crate::player::ResourceHand;
use serde::{Deserialize, Serialize};

/// All possible actions a player can take
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    // ==================== Turn Actions ====================
    /// Roll the dice (must be done at start of turn)
    RollDice,

    // ==================== Building Actions ====================
    /// Build a road; during setup this is the free road after a settlement
    BuildRoad(EdgeId),
    /// Build a settlement; during setup this is the free placement
    BuildSettlement(VertexId),
    /// Upgrade a settlement to a city
    BuildCity(VertexId),

    // ==================== Trading Actions ====================
    /// Trade four resources with the bank for one
    TradeWithBank { give: ResourceHand, receive: Resource },

    // ==================== Turn Management ====================
    /// End your turn
    EndTurn,
}

impl GameAction {
    /// Short snake_case label used in logs
    pub fn label(&self) -> &'static str {
        match self {
            GameAction::RollDice => "roll_dice",
            GameAction::BuildRoad(_) => "build_road",
            GameAction::BuildSettlement(_) => "build_settlement",
            GameAction::BuildCity(_) => "build_city",
            GameAction::TradeWithBank { .. } => "trade_bank",
            GameAction::EndTurn => "end_turn",
        }
    }
}

/// Events that occur as a result of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// Dice were rolled
    DiceRolled {
        player: PlayerId,
        roll: (u8, u8),
        total: u8,
    },

    /// Resources were distributed after a dice roll
    ResourcesDistributed {
        distributions: Vec<(PlayerId, Resource, u32)>,
    },

    /// A settlement was built
    SettlementBuilt { player: PlayerId, vertex: VertexId },

    /// A settlement was upgraded to a city
    CityBuilt { player: PlayerId, vertex: VertexId },

    /// A road was built
    RoadBuilt { player: PlayerId, edge: EdgeId },

    /// Four-for-one bank trade completed
    BankTrade {
        player: PlayerId,
        gave: ResourceHand,
        received: Resource,
    },

    /// Longest road changed hands
    LongestRoadChanged {
        previous: Option<PlayerId>,
        current: Option<PlayerId>,
        length: u32,
    },

    /// Setup moved to its next step
    SetupAdvanced {
        phase: GamePhase,
        next_player: PlayerId,
    },

    /// Turn ended
    TurnEnded {
        player: PlayerId,
        next_player: PlayerId,
    },

    /// A player won the game
    GameWon {
        player: PlayerId,
        victory_points: u32,
    },
}
