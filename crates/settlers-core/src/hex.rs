//! Cube coordinate system for hex tiles and their corners.
//!
//! This module provides the geometry the board builder works from:
//! - `HexCoord`: identifies a hex tile, `q + r + s == 0`
//! - `VertexCoord`: identifies a hex corner, `q + r + s == ±1`
//!
//! A corner of hex `h` is `h` plus one unit axis vector (`±q`, `±r` or `±s`).
//! Every corner shared by three hexes lands on the same integer triple, so
//! corners can be deduplicated by plain hashing. Corners whose coordinates sum
//! to `+1` and `-1` alternate around each hex, and two corners are joined by a
//! hex side exactly when their Chebyshev distance is 1 and their sums differ.

use serde::{Deserialize, Serialize};

/// Direction from a hex to one of its six neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HexDirection {
    East,
    NorthEast,
    NorthWest,
    West,
    SouthWest,
    SouthEast,
}

impl HexDirection {
    /// All directions, counter-clockwise starting from East
    pub const ALL: [HexDirection; 6] = [
        HexDirection::East,
        HexDirection::NorthEast,
        HexDirection::NorthWest,
        HexDirection::West,
        HexDirection::SouthWest,
        HexDirection::SouthEast,
    ];

    /// Unit offset `(dq, dr)` for this direction
    const fn offset(self) -> (i32, i32) {
        match self {
            HexDirection::East => (1, 0),
            HexDirection::NorthEast => (1, -1),
            HexDirection::NorthWest => (0, -1),
            HexDirection::West => (-1, 0),
            HexDirection::SouthWest => (-1, 1),
            HexDirection::SouthEast => (0, 1),
        }
    }
}

/// Cube coordinate of a hex tile.
///
/// `s` is stored alongside `q` and `r` so serialized boards carry the full
/// `(q, r, s)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
    pub s: i32,
}

impl HexCoord {
    /// The center of the board
    pub const ORIGIN: HexCoord = HexCoord::new(0, 0);

    /// Create a hex coordinate from its axial part; `s` is derived
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r, s: -q - r }
    }

    /// The six neighbouring hexes, in `HexDirection::ALL` order
    pub fn neighbors(&self) -> [HexCoord; 6] {
        HexDirection::ALL.map(|direction| self.neighbor(direction))
    }

    /// Get the neighbour in a specific direction
    pub fn neighbor(&self, direction: HexDirection) -> HexCoord {
        let (dq, dr) = direction.offset();
        HexCoord::new(self.q + dq, self.r + dr)
    }

    /// Distance to another hex (in hex steps)
    pub fn distance_to(&self, other: &HexCoord) -> u32 {
        chebyshev((self.q, self.r, self.s), (other.q, other.r, other.s))
    }

    /// Hexes exactly `radius` steps away, walking the ring counter-clockwise.
    pub fn ring(&self, radius: u32) -> Vec<HexCoord> {
        if radius == 0 {
            return vec![*self];
        }

        let (dq, dr) = HexDirection::SouthWest.offset();
        let steps = radius as i32;
        let mut hex = HexCoord::new(self.q + dq * steps, self.r + dr * steps);

        let mut ring = Vec::with_capacity(6 * radius as usize);
        for direction in HexDirection::ALL {
            for _ in 0..radius {
                ring.push(hex);
                hex = hex.neighbor(direction);
            }
        }
        ring
    }

    /// Pixel center of this hex (pointy-top layout)
    pub fn to_pixel(&self, hex_size: f64) -> (f64, f64) {
        let x = hex_size * (3.0_f64.sqrt() * self.q as f64 + 3.0_f64.sqrt() / 2.0 * self.r as f64);
        let y = hex_size * (3.0 / 2.0 * self.r as f64);
        (x, y)
    }

    /// This hex followed by every ring out to `radius`
    pub fn spiral(&self, radius: u32) -> Vec<HexCoord> {
        (0..=radius).flat_map(|r| self.ring(r)).collect()
    }

    /// The six corners of this hex, in walking order around its perimeter.
    ///
    /// Consecutive entries (and the last with the first) share a hex side.
    pub fn corners(&self) -> [VertexCoord; 6] {
        let (q, r, s) = (self.q, self.r, self.s);
        [
            VertexCoord::new(q + 1, r, s),
            VertexCoord::new(q, r, s - 1),
            VertexCoord::new(q, r + 1, s),
            VertexCoord::new(q - 1, r, s),
            VertexCoord::new(q, r, s + 1),
            VertexCoord::new(q, r - 1, s),
        ]
    }
}

/// Cube coordinate of a hex corner, where settlements and cities stand.
///
/// Valid corners satisfy `q + r + s == 1` or `q + r + s == -1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexCoord {
    pub q: i32,
    pub r: i32,
    pub s: i32,
}

impl VertexCoord {
    pub const fn new(q: i32, r: i32, s: i32) -> Self {
        Self { q, r, s }
    }

    /// Coordinate sum: `+1` or `-1` for a real corner
    pub const fn parity(&self) -> i32 {
        self.q + self.r + self.s
    }

    /// Whether this triple is a corner at all
    pub const fn is_corner(&self) -> bool {
        self.parity() == 1 || self.parity() == -1
    }

    /// Chebyshev distance: `max(|Δq|, |Δr|, |Δs|)`
    pub fn chebyshev_distance(&self, other: &VertexCoord) -> u32 {
        chebyshev((self.q, self.r, self.s), (other.q, other.r, other.s))
    }

    /// Whether a hex side joins these two corners
    pub fn is_adjacent(&self, other: &VertexCoord) -> bool {
        self.is_corner()
            && other.is_corner()
            && self.parity() == -other.parity()
            && self.chebyshev_distance(other) == 1
    }

    /// The three hexes meeting at this corner (some may be off the board)
    pub fn touching_hexes(&self) -> [HexCoord; 3] {
        // Step back along each axis; `HexCoord::new` re-derives `s`.
        let step = self.parity().signum();
        [
            HexCoord::new(self.q - step, self.r),
            HexCoord::new(self.q, self.r - step),
            HexCoord::new(self.q, self.r),
        ]
    }

    /// Pixel position: the centroid of the three touching hex centers
    pub fn to_pixel(&self, hex_size: f64) -> (f64, f64) {
        let (x, y) = self
            .touching_hexes()
            .iter()
            .map(|hex| hex.to_pixel(hex_size))
            .fold((0.0, 0.0), |(ax, ay), (x, y)| (ax + x, ay + y));
        (x / 3.0, y / 3.0)
    }

    /// The three corners one hex side away (some may be off the board)
    pub fn adjacent_corners(&self) -> [VertexCoord; 3] {
        let step = -self.parity().signum();
        let (q, r, s) = (self.q, self.r, self.s);
        [
            VertexCoord::new(q + step, r + step, s),
            VertexCoord::new(q + step, r, s + step),
            VertexCoord::new(q, r + step, s + step),
        ]
    }
}

fn chebyshev(a: (i32, i32, i32), b: (i32, i32, i32)) -> u32 {
    let dq = (a.0 - b.0).unsigned_abs();
    let dr = (a.1 - b.1).unsigned_abs();
    let ds = (a.2 - b.2).unsigned_abs();
    dq.max(dr).max(ds)
}
