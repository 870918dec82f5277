//! Board topology: hex tiles, corner vertices and the edges between them.
//!
//! This module contains:
//! - Resource and terrain types
//! - `HexTile`, `Vertex`, `Edge` with stable numeric ids
//! - The topology builder (randomized, seeded, or fixed layout)
//! - Occupancy queries used by the rules engine and the legal-move resolver
//!
//! The topology (ids, adjacency, hex membership) is fixed at construction.
//! Only `Vertex::building` and `Edge::road` change during a game.

use crate::hex::{HexCoord, VertexCoord};
use crate::player::ResourceHand;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use thiserror::Error;

/// Player identifier (index into `GameState::players`, 0-3)
pub type PlayerId = u8;

/// Number of land hexes on the standard board
pub const HEX_COUNT: usize = 19;

/// Number of corners on the standard board
pub const VERTEX_COUNT: usize = 54;

/// Number of hex sides on the standard board
pub const EDGE_COUNT: usize = 72;

/// Rings around the center hex
const BOARD_RADIUS: u32 = 2;

/// Shuffles tried before accepting a number layout with adjacent 6/8
const MAX_NUMBER_ATTEMPTS: usize = 100;

macro_rules! board_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u8);

        impl $name {
            /// Position of this id in its board collection (ids start at 1)
            fn index(self) -> usize {
                (self.0 as usize).wrapping_sub(1)
            }

            fn from_index(index: usize) -> Self {
                Self(index as u8 + 1)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

board_id!(
    /// Stable hex id, `1..=19` in ring order from the center
    HexId
);
board_id!(
    /// Stable vertex id, `1..=54`
    VertexId
);
board_id!(
    /// Stable edge id, `1..=72`
    EdgeId
);

/// The five tradeable resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Wood,
    Brick,
    Sheep,
    Wheat,
    Ore,
}

impl Resource {
    /// All resource types
    pub const ALL: [Resource; 5] = [
        Resource::Wood,
        Resource::Brick,
        Resource::Sheep,
        Resource::Wheat,
        Resource::Ore,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Resource::Wood => "wood",
            Resource::Brick => "brick",
            Resource::Sheep => "sheep",
            Resource::Wheat => "wheat",
            Resource::Ore => "ore",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Terrain of a hex tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terrain {
    Wood,
    Brick,
    Sheep,
    Wheat,
    Ore,
    Desert,
}

impl Terrain {
    /// The resource this terrain produces, `None` for desert
    pub fn resource(&self) -> Option<Resource> {
        match self {
            Terrain::Wood => Some(Resource::Wood),
            Terrain::Brick => Some(Resource::Brick),
            Terrain::Sheep => Some(Resource::Sheep),
            Terrain::Wheat => Some(Resource::Wheat),
            Terrain::Ore => Some(Resource::Ore),
            Terrain::Desert => None,
        }
    }

    /// Standard terrain mix: 4 wood, 4 sheep, 4 wheat, 3 brick, 3 ore, 1 desert
    pub fn standard_set() -> Vec<Terrain> {
        let mut terrains = Vec::with_capacity(HEX_COUNT);
        terrains.extend([Terrain::Wood; 4]);
        terrains.extend([Terrain::Sheep; 4]);
        terrains.extend([Terrain::Wheat; 4]);
        terrains.extend([Terrain::Brick; 3]);
        terrains.extend([Terrain::Ore; 3]);
        terrains.push(Terrain::Desert);
        terrains
    }
}

/// Standard production numbers, one per non-desert hex
pub const STANDARD_NUMBERS: [u8; 18] = [2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12];

/// A single hex tile on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexTile {
    pub id: HexId,
    pub terrain: Terrain,
    /// Dice total that triggers production (2-12, `None` for desert)
    pub number: Option<u8>,
    pub position: HexCoord,
}

impl HexTile {
    /// The resource this tile produces, if any
    pub fn resource(&self) -> Option<Resource> {
        self.terrain.resource()
    }

    /// Whether a dice total makes this tile produce
    pub fn produces_on(&self, total: u8) -> bool {
        total != 7 && self.number == Some(total) && self.resource().is_some()
    }
}

/// Settlement or city
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildingKind {
    Settlement,
    City,
}

/// What stands on a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub player: PlayerId,
    pub kind: BuildingKind,
}

impl Building {
    pub fn settlement(player: PlayerId) -> Self {
        Self {
            player,
            kind: BuildingKind::Settlement,
        }
    }

    /// Victory points provided by this building
    pub fn victory_points(&self) -> u32 {
        match self.kind {
            BuildingKind::Settlement => 1,
            BuildingKind::City => 2,
        }
    }

    /// Resources produced per matching roll
    pub fn resource_multiplier(&self) -> u32 {
        match self.kind {
            BuildingKind::Settlement => 1,
            BuildingKind::City => 2,
        }
    }
}

/// A road on an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Road {
    pub player: PlayerId,
}

/// A hex corner, the unit of settlement and city placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,
    /// Hexes meeting at this corner (1 to 3), ascending
    pub hex_ids: Vec<HexId>,
    /// Geometry for renderers; rules only use ids
    pub position: VertexCoord,
    /// Corners one side away (2 or 3), ascending
    pub adjacent_vertex_ids: Vec<VertexId>,
    /// Sides ending at this corner, ascending
    pub edge_ids: Vec<EdgeId>,
    pub building: Option<Building>,
}

impl Vertex {
    pub fn owner(&self) -> Option<PlayerId> {
        self.building.map(|b| b.player)
    }

    pub fn is_occupied(&self) -> bool {
        self.building.is_some()
    }
}

/// A hex side, the unit of road placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    /// Endpoints, lower id first
    pub vertex_ids: [VertexId; 2],
    pub road: Option<Road>,
}

impl Edge {
    pub fn touches(&self, vertex: VertexId) -> bool {
        self.vertex_ids.contains(&vertex)
    }

    pub fn owner(&self) -> Option<PlayerId> {
        self.road.map(|r| r.player)
    }
}

/// Rejected fixed board layouts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("layout has {0} tiles, expected {HEX_COUNT}")]
    WrongTileCount(usize),

    #[error("desert tile {0} must not carry a number")]
    NumberedDesert(usize),

    #[error("resource tile {0} is missing its number")]
    MissingNumber(usize),

    #[error("tile {index} has invalid number {number}")]
    InvalidNumber { index: usize, number: u8 },
}

/// The complete game board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    hexes: Vec<HexTile>,
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
}

impl Board {
    /// Create the standard board with randomized terrain and numbers
    pub fn standard() -> Self {
        let mut rng = rand::thread_rng();
        Self::standard_with_rng(&mut rng)
    }

    /// Create the standard board with a provided RNG.
    /// A seeded RNG gives a reproducible board.
    pub fn standard_with_rng<R: Rng>(rng: &mut R) -> Self {
        let positions = HexCoord::ORIGIN.spiral(BOARD_RADIUS);

        let mut terrains = Terrain::standard_set();
        terrains.shuffle(rng);

        let numbers = deal_numbers(&positions, &terrains, rng);
        let layout: Vec<(Terrain, Option<u8>)> = terrains.into_iter().zip(numbers).collect();

        Self::assemble(&positions, &layout)
    }

    /// Create a board from a fixed list of 19 `(terrain, number)` pairs in hex
    /// id order.
    pub fn from_layout(layout: &[(Terrain, Option<u8>)]) -> Result<Self, LayoutError> {
        if layout.len() != HEX_COUNT {
            return Err(LayoutError::WrongTileCount(layout.len()));
        }

        for (index, (terrain, number)) in layout.iter().enumerate() {
            match (terrain, number) {
                (Terrain::Desert, Some(_)) => return Err(LayoutError::NumberedDesert(index)),
                (Terrain::Desert, None) => {}
                (_, None) => return Err(LayoutError::MissingNumber(index)),
                (_, Some(number)) => {
                    if !(2..=12).contains(number) || *number == 7 {
                        return Err(LayoutError::InvalidNumber {
                            index,
                            number: *number,
                        });
                    }
                }
            }
        }

        let positions = HexCoord::ORIGIN.spiral(BOARD_RADIUS);
        Ok(Self::assemble(&positions, layout))
    }

    /// Derive vertices and edges from the hex layout.
    ///
    /// Panics if the geometry does not produce the closed-form counts; that
    /// can only mean a bug in the coordinate math.
    fn assemble(positions: &[HexCoord], layout: &[(Terrain, Option<u8>)]) -> Self {
        let hexes: Vec<HexTile> = positions
            .iter()
            .zip(layout)
            .enumerate()
            .map(|(index, (position, (terrain, number)))| HexTile {
                id: HexId::from_index(index),
                terrain: *terrain,
                number: *number,
                position: *position,
            })
            .collect();

        // Collapse corners shared by up to three hexes.
        let mut corner_hexes: HashMap<VertexCoord, BTreeSet<HexId>> = HashMap::new();
        for hex in &hexes {
            for corner in hex.position.corners() {
                corner_hexes.entry(corner).or_default().insert(hex.id);
            }
        }

        let mut coords: Vec<VertexCoord> = corner_hexes.keys().copied().collect();
        coords.sort_by_key(|c| (c.r, c.q, c.s));

        let ids: HashMap<VertexCoord, VertexId> = coords
            .iter()
            .enumerate()
            .map(|(index, coord)| (*coord, VertexId::from_index(index)))
            .collect();

        // Walk each perimeter; consecutive corners share a side.
        let mut adjacency: Vec<BTreeSet<VertexId>> = vec![BTreeSet::new(); coords.len()];
        for hex in &hexes {
            let ring = hex.position.corners();
            for i in 0..ring.len() {
                let a = ids[&ring[i]];
                let b = ids[&ring[(i + 1) % ring.len()]];
                adjacency[a.index()].insert(b);
                adjacency[b.index()].insert(a);
            }
        }

        let pairs: BTreeSet<(VertexId, VertexId)> = adjacency
            .iter()
            .enumerate()
            .flat_map(|(index, neighbors)| {
                let id = VertexId::from_index(index);
                neighbors
                    .iter()
                    .filter(move |n| id < **n)
                    .map(move |n| (id, *n))
            })
            .collect();

        let edges: Vec<Edge> = pairs
            .iter()
            .enumerate()
            .map(|(index, (a, b))| Edge {
                id: EdgeId::from_index(index),
                vertex_ids: [*a, *b],
                road: None,
            })
            .collect();

        let mut incident: Vec<Vec<EdgeId>> = vec![Vec::new(); coords.len()];
        for edge in &edges {
            for vertex in edge.vertex_ids {
                incident[vertex.index()].push(edge.id);
            }
        }

        let vertices: Vec<Vertex> = coords
            .iter()
            .enumerate()
            .map(|(index, coord)| Vertex {
                id: VertexId::from_index(index),
                hex_ids: corner_hexes[coord].iter().copied().collect(),
                position: *coord,
                adjacent_vertex_ids: adjacency[index].iter().copied().collect(),
                edge_ids: std::mem::take(&mut incident[index]),
                building: None,
            })
            .collect();

        assert_eq!(hexes.len(), HEX_COUNT, "board geometry: wrong hex count");
        assert_eq!(vertices.len(), VERTEX_COUNT, "board geometry: wrong vertex count");
        assert_eq!(edges.len(), EDGE_COUNT, "board geometry: wrong edge count");
        for edge in &edges {
            let [a, b] = edge.vertex_ids;
            assert!(
                vertices[a.index()].position.is_adjacent(&vertices[b.index()].position),
                "board geometry: edge {} joins non-adjacent corners",
                edge.id
            );
        }

        Self {
            hexes,
            vertices,
            edges,
        }
    }

    // ==================== Query Methods ====================

    pub fn hexes(&self) -> &[HexTile] {
        &self.hexes
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn hex(&self, id: HexId) -> Option<&HexTile> {
        self.hexes.get(id.index())
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id.index())
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.index())
    }

    /// The edge joining two vertices, if they are adjacent
    pub fn edge_between(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        let vertex = self.vertex(a)?;
        vertex
            .edge_ids
            .iter()
            .copied()
            .find(|e| self.edge(*e).is_some_and(|edge| edge.touches(b)))
    }

    /// Hex tiles meeting at a vertex
    pub fn hexes_at_vertex(&self, id: VertexId) -> Vec<&HexTile> {
        self.vertex(id)
            .map(|v| v.hex_ids.iter().filter_map(|h| self.hex(*h)).collect())
            .unwrap_or_default()
    }

    /// Vertices on the perimeter of a hex
    pub fn vertices_of_hex(&self, id: HexId) -> impl Iterator<Item = &Vertex> {
        self.vertices.iter().filter(move |v| v.hex_ids.contains(&id))
    }

    // ==================== Validation Methods ====================

    /// Check the distance rule: no building on any neighbouring vertex
    pub fn satisfies_distance_rule(&self, id: VertexId) -> bool {
        self.vertex(id).is_some_and(|vertex| {
            vertex
                .adjacent_vertex_ids
                .iter()
                .all(|n| self.vertex(*n).is_some_and(|v| !v.is_occupied()))
        })
    }

    /// Empty and clear of neighbours: the geometric half of settlement legality
    pub fn is_open_for_settlement(&self, id: VertexId) -> bool {
        self.vertex(id).is_some_and(|v| !v.is_occupied()) && self.satisfies_distance_rule(id)
    }

    /// Check that an edge's endpoints exist, list each other as neighbours
    /// and sit one side apart
    pub fn is_well_formed_edge(&self, id: EdgeId) -> bool {
        let Some(edge) = self.edge(id) else {
            return false;
        };
        let [a, b] = edge.vertex_ids;
        match (self.vertex(a), self.vertex(b)) {
            (Some(va), Some(vb)) => {
                va.adjacent_vertex_ids.contains(&b)
                    && vb.adjacent_vertex_ids.contains(&a)
                    && va.position.is_adjacent(&vb.position)
            }
            _ => false,
        }
    }

    /// Whether any road of `player` ends at this vertex
    pub fn vertex_touches_road(&self, id: VertexId, player: PlayerId) -> bool {
        self.vertex(id).is_some_and(|vertex| {
            vertex
                .edge_ids
                .iter()
                .any(|e| self.edge(*e).and_then(Edge::owner) == Some(player))
        })
    }

    /// Whether an edge extends the network of `player`: one endpoint holds
    /// their building, or another of their roads shares an endpoint
    pub fn edge_touches_network(&self, id: EdgeId, player: PlayerId) -> bool {
        let Some(edge) = self.edge(id) else {
            return false;
        };

        edge.vertex_ids.iter().any(|endpoint| {
            let Some(vertex) = self.vertex(*endpoint) else {
                return false;
            };
            if vertex.owner() == Some(player) {
                return true;
            }
            vertex.edge_ids.iter().any(|other| {
                *other != id && self.edge(*other).and_then(Edge::owner) == Some(player)
            })
        })
    }

    /// Vertices holding a building of `player`
    pub fn buildings_of(&self, player: PlayerId) -> impl Iterator<Item = &Vertex> {
        self.vertices.iter().filter(move |v| v.owner() == Some(player))
    }

    /// Edges holding a road of `player`
    pub fn roads_of(&self, player: PlayerId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.owner() == Some(player))
    }

    /// Victory points from buildings owned by `player`
    pub fn building_points(&self, player: PlayerId) -> u32 {
        self.buildings_of(player)
            .filter_map(|v| v.building)
            .map(|b| b.victory_points())
            .sum()
    }

    // ==================== Mutation Methods ====================
    // Callers validate first; these only write.

    pub(crate) fn place_settlement(&mut self, id: VertexId, player: PlayerId) {
        if let Some(vertex) = self.vertices.get_mut(id.index()) {
            vertex.building = Some(Building::settlement(player));
        }
    }

    pub(crate) fn upgrade_to_city(&mut self, id: VertexId) {
        if let Some(building) = self
            .vertices
            .get_mut(id.index())
            .and_then(|v| v.building.as_mut())
        {
            building.kind = BuildingKind::City;
        }
    }

    pub(crate) fn place_road(&mut self, id: EdgeId, player: PlayerId) {
        if let Some(edge) = self.edges.get_mut(id.index()) {
            edge.road = Some(Road { player });
        }
    }

    // ==================== Resource Distribution ====================

    /// Resources produced for a dice total, per player.
    ///
    /// A 7 and the desert produce nothing.
    pub fn production_for_roll(&self, total: u8) -> BTreeMap<PlayerId, ResourceHand> {
        let mut production: BTreeMap<PlayerId, ResourceHand> = BTreeMap::new();

        for hex in self.hexes.iter().filter(|h| h.produces_on(total)) {
            let Some(resource) = hex.resource() else {
                continue;
            };
            for vertex in self.vertices_of_hex(hex.id) {
                if let Some(building) = vertex.building {
                    production
                        .entry(building.player)
                        .or_default()
                        .add(resource, building.resource_multiplier());
                }
            }
        }

        production
    }

    // ==================== Longest Road Calculation ====================

    /// Length of the longest continuous road of `player`.
    /// Opponent buildings break a road.
    pub fn longest_road(&self, player: PlayerId) -> u32 {
        let mut visited = HashSet::new();
        self.roads_of(player)
            .flat_map(|edge| edge.vertex_ids)
            .map(|start| self.trail_length(player, start, &mut visited))
            .max()
            .unwrap_or(0)
    }

    /// Longest trail of unvisited `player` roads leaving `from`
    fn trail_length(
        &self,
        player: PlayerId,
        from: VertexId,
        visited: &mut HashSet<EdgeId>,
    ) -> u32 {
        let Some(vertex) = self.vertex(from) else {
            return 0;
        };

        let mut best = 0;
        for next in &vertex.edge_ids {
            let Some(edge) = self.edge(*next) else {
                continue;
            };
            if edge.owner() != Some(player) || !visited.insert(*next) {
                continue;
            }

            let [a, b] = edge.vertex_ids;
            let far = if a == from { b } else { a };
            let blocked = self
                .vertex(far)
                .and_then(Vertex::owner)
                .is_some_and(|owner| owner != player);
            let onward = if blocked {
                0
            } else {
                self.trail_length(player, far, visited)
            };

            visited.remove(next);
            best = best.max(1 + onward);
        }
        best
    }
}

/// Deal production numbers to the non-desert hexes, retrying shuffles so
/// that no two neighbouring hexes both hold a 6 or an 8.
fn deal_numbers<R: Rng>(
    positions: &[HexCoord],
    terrains: &[Terrain],
    rng: &mut R,
) -> Vec<Option<u8>> {
    let mut numbers = STANDARD_NUMBERS.to_vec();
    let mut layout = Vec::new();

    for _ in 0..MAX_NUMBER_ATTEMPTS {
        numbers.shuffle(rng);
        layout = lay_out_numbers(terrains, &numbers);
        if !has_adjacent_hot_numbers(positions, &layout) {
            break;
        }
    }

    layout
}

fn lay_out_numbers(terrains: &[Terrain], numbers: &[u8]) -> Vec<Option<u8>> {
    let mut numbers = numbers.iter().copied();
    terrains
        .iter()
        .map(|terrain| match terrain {
            Terrain::Desert => None,
            _ => numbers.next(),
        })
        .collect()
}

fn has_adjacent_hot_numbers(positions: &[HexCoord], numbers: &[Option<u8>]) -> bool {
    let hot: HashSet<HexCoord> = positions
        .iter()
        .zip(numbers)
        .filter(|(_, n)| matches!(n, Some(6) | Some(8)))
        .map(|(p, _)| *p)
        .collect();

    hot.iter()
        .any(|hex| hex.neighbors().iter().any(|n| hot.contains(n)))
}
