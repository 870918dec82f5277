//! Settlers - rules engine for a hex-grid settlement-building game
//!
//! This crate provides the core game logic, including:
//! - Cube coordinates for hexes and their corners
//! - A fixed 19-hex board with 54 vertices and 72 edges
//! - Player state and resource management
//! - The phase machine and `Engine` with full rule enforcement
//! - Legal move resolution, position ranking and option indexing
//! - The caller-facing action contract and per-player views
//!
//! # Architecture
//!
//! The engine is synchronous and owns no I/O. Dice randomness and event
//! observation are injected into `Engine`, so a seeded engine replays a game
//! exactly. Hosting, persistence and transport live in `settlers-host`.
//!
//! # Modules
//!
//! - [`hex`]: Coordinate system for hexes and vertices
//! - [`board`]: Board topology, tiles and piece placement
//! - [`player`]: Player state and resources
//! - [`game`]: Game state machine and engine
//! - [`legal`]: Legal placement targets per player and phase
//! - [`ranker`]: Scoring of legal placements
//! - [`options`]: Ordinal options standing in for board ids
//! - [`interface`]: Actions, results and views for external callers

pub mod actions;
pub mod board;
pub mod game;
pub mod hex;
pub mod interface;
pub mod legal;
pub mod observer;
pub mod options;
pub mod player;
pub mod ranker;

// Re-export commonly used types
pub use actions::{GameAction, GameEvent};
pub use board::{
    Board, Building, BuildingKind, Edge, EdgeId, HexId, HexTile, LayoutError, PlayerId, Resource,
    Road, Terrain, Vertex, VertexId,
};
pub use game::{Engine, ErrorClass, GameError, GamePhase, GameState, PieceKind};
pub use hex::{HexCoord, HexDirection, VertexCoord};
pub use interface::{
    agent_view, execute, possible_actions, Action, ActionKind, ActionResult, AgentView, Target,
};
pub use legal::{available_edges, available_vertices, city_candidates, legal_moves, LegalMoves};
pub use observer::{EngineObserver, NoopObserver, TracingObserver};
pub use options::{OptionError, OptionIndex, OptionKind, OptionSession};
pub use player::{Player, PlayerColor, ResourceHand};
pub use ranker::{rank_edges, rank_vertices, RankedEdge, RankedVertex};
