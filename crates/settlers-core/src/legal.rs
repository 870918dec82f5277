//! Legal move resolution.
//!
//! Derives, for one player and the current phase, the vertices and edges a
//! placement may target. Vertices are purely geometric (empty and clear of
//! neighbours); resources and road connectivity for settlements are left to
//! the engine. Edges follow the phase: the setup road must start at the
//! settlement just placed, main-phase roads must extend the player's network.

use crate::board::{Board, BuildingKind, EdgeId, PlayerId, VertexId};
use crate::game::{GamePhase, GameState};
use serde::{Deserialize, Serialize};

/// Legal placement targets for one player, ascending ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalMoves {
    pub vertices: Vec<VertexId>,
    pub edges: Vec<EdgeId>,
}

impl LegalMoves {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.edges.is_empty()
    }
}

/// Vertices and edges `player` could target right now
pub fn legal_moves(state: &GameState, player: PlayerId) -> LegalMoves {
    LegalMoves {
        vertices: available_vertices(&state.board),
        edges: available_edges(state, player),
    }
}

/// Unoccupied vertices with no occupied neighbour
pub fn available_vertices(board: &Board) -> Vec<VertexId> {
    board
        .vertices()
        .iter()
        .filter(|v| board.is_open_for_settlement(v.id))
        .map(|v| v.id)
        .collect()
}

/// Unoccupied edges, narrowed by phase
pub fn available_edges(state: &GameState, player: PlayerId) -> Vec<EdgeId> {
    let board = &state.board;

    let candidates: Vec<EdgeId> = match state.phase {
        phase if phase.is_setup_road() => {
            let anchor = state
                .last_settlement
                .filter(|v| board.vertex(*v).and_then(|v| v.owner()) == Some(player));
            match anchor.and_then(|v| board.vertex(v)) {
                Some(vertex) => vertex.edge_ids.clone(),
                None => Vec::new(),
            }
        }
        phase if phase.is_setup_settlement() || phase == GamePhase::DiceRoll => {
            board.edges().iter().map(|e| e.id).collect()
        }
        _ => board
            .edges()
            .iter()
            .filter(|e| board.edge_touches_network(e.id, player))
            .map(|e| e.id)
            .collect(),
    };

    let mut edges: Vec<EdgeId> = candidates
        .into_iter()
        .filter(|id| board.edge(*id).is_some_and(|e| e.road.is_none()))
        .filter(|id| {
            let well_formed = board.is_well_formed_edge(*id);
            if !well_formed {
                tracing::error!(edge = %id, "dropping edge whose endpoints are not adjacent");
            }
            well_formed
        })
        .collect();
    edges.sort_unstable();
    edges
}

/// Settlements of `player` that could become cities
pub fn city_candidates(board: &Board, player: PlayerId) -> Vec<VertexId> {
    board
        .buildings_of(player)
        .filter(|v| {
            v.building
                .is_some_and(|b| b.kind == BuildingKind::Settlement)
        })
        .map(|v| v.id)
        .collect()
}
