//! Position ranking for legal placements.
//!
//! Scores legal vertices by expected production and legal edges by
//! expansion potential, so callers can be offered the best few first.

use crate::board::{Board, EdgeId, HexTile, Resource, Terrain, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Options published per query unless configured otherwise
pub const DEFAULT_LIMIT: usize = 5;

/// Chance of rolling `number` with two dice; 0 for 7 and out-of-range values
pub fn dice_probability(number: u8) -> f64 {
    let ways = match number {
        2 | 12 => 1,
        3 | 11 => 2,
        4 | 10 => 3,
        5 | 9 => 4,
        6 | 8 => 5,
        _ => 0,
    };
    ways as f64 / 36.0
}

/// Relative worth of a resource
pub fn resource_value(resource: Resource) -> f64 {
    match resource {
        Resource::Wood | Resource::Brick => 1.0,
        Resource::Sheep => 0.9,
        Resource::Wheat => 1.1,
        Resource::Ore => 1.2,
    }
}

fn is_hot(hex: &HexTile) -> bool {
    matches!(hex.number, Some(6) | Some(8))
}

/// A scored settlement spot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedVertex {
    pub id: VertexId,
    pub score: i64,
    /// Numbers of producing neighbours, highest first
    pub numbers: Vec<u8>,
    pub terrains: Vec<Terrain>,
    pub reasoning: String,
}

/// A scored road spot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEdge {
    pub id: EdgeId,
    pub vertex_ids: [VertexId; 2],
    pub score: i64,
    pub reasoning: String,
}

/// Score `candidates` and keep the best `limit`, highest score first,
/// lower id first on ties. Unknown ids are skipped.
pub fn rank_vertices(board: &Board, candidates: &[VertexId], limit: usize) -> Vec<RankedVertex> {
    let mut ranked: Vec<RankedVertex> = candidates
        .iter()
        .filter_map(|id| score_vertex(board, *id))
        .collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));
    ranked.truncate(limit);
    ranked
}

/// Score `candidates` and keep the best `limit`, highest score first,
/// lower id first on ties. Unknown ids are skipped.
pub fn rank_edges(board: &Board, candidates: &[EdgeId], limit: usize) -> Vec<RankedEdge> {
    let mut ranked: Vec<RankedEdge> = candidates
        .iter()
        .filter_map(|id| score_edge(board, *id))
        .collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));
    ranked.truncate(limit);
    ranked
}

fn score_vertex(board: &Board, id: VertexId) -> Option<RankedVertex> {
    board.vertex(id)?;

    let producing: Vec<&HexTile> = board
        .hexes_at_vertex(id)
        .into_iter()
        .filter(|hex| hex.resource().is_some())
        .collect();

    let mut total = 0.0;
    let mut kinds = BTreeSet::new();
    for hex in &producing {
        if let Some(resource) = hex.resource() {
            let number = hex.number.unwrap_or(0);
            total += dice_probability(number) * resource_value(resource) * 100.0;
            kinds.insert(resource);
        }
    }
    total += 5.0 * kinds.len() as f64;

    let hot = producing.iter().any(|hex| is_hot(hex));
    if hot {
        total += 10.0;
    }

    let mut numbers: Vec<u8> = producing.iter().filter_map(|hex| hex.number).collect();
    numbers.sort_unstable_by(|a, b| b.cmp(a));
    let terrains: Vec<Terrain> = producing.iter().map(|hex| hex.terrain).collect();

    let mut reasoning = if numbers.is_empty() {
        "numbers: none".to_string()
    } else {
        let list: Vec<String> = numbers.iter().map(u8::to_string).collect();
        format!("numbers: [{}]", list.join(", "))
    };
    if !kinds.is_empty() {
        let list: Vec<&str> = kinds.iter().map(Resource::name).collect();
        reasoning.push_str(&format!(" | resources: {}", list.join(", ")));
    }
    if hot {
        reasoning.push_str(" | has 6 or 8");
    }

    Some(RankedVertex {
        id,
        score: total.round() as i64,
        numbers,
        terrains,
        reasoning,
    })
}

fn score_edge(board: &Board, id: EdgeId) -> Option<RankedEdge> {
    let edge = board.edge(id)?;
    let mut score = 50;
    let mut reasoning = String::from("extends network");

    let endpoints: Vec<_> = edge
        .vertex_ids
        .iter()
        .filter_map(|v| board.vertex(*v))
        .collect();

    if endpoints.iter().any(|v| !v.is_occupied()) {
        score += 20;
        reasoning.push_str(" | reaches open vertices");
    }

    // Hexes shared by both endpoints count once per endpoint.
    let hot = endpoints
        .iter()
        .flat_map(|v| v.hex_ids.iter())
        .filter_map(|h| board.hex(*h))
        .filter(|hex| is_hot(hex))
        .count() as i64;
    if hot > 0 {
        score += 15 * hot;
        reasoning.push_str(" | near 6/8");
    }

    Some(RankedEdge {
        id,
        vertex_ids: edge.vertex_ids,
        score,
        reasoning,
    })
}
