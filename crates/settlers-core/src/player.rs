//! Player state and resource management.
//!
//! This module contains:
//! - ResourceHand for managing resource counts
//! - Building costs
//! - Player struct with resources, piece stock and awards

use crate::board::{PlayerId, Resource};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Roads each player starts with
pub const ROAD_STOCK: u32 = 15;

/// Settlements each player starts with
pub const SETTLEMENT_STOCK: u32 = 5;

/// Cities each player starts with
pub const CITY_STOCK: u32 = 4;

/// Player color for UI rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    Red,
    Blue,
    White,
    Orange,
}

impl PlayerColor {
    /// Get color for a player index
    pub fn for_player(id: PlayerId) -> Self {
        match id % 4 {
            0 => PlayerColor::Red,
            1 => PlayerColor::Blue,
            2 => PlayerColor::White,
            _ => PlayerColor::Orange,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PlayerColor::Red => "red",
            PlayerColor::Blue => "blue",
            PlayerColor::White => "white",
            PlayerColor::Orange => "orange",
        }
    }
}

impl fmt::Display for PlayerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A hand of resources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHand {
    #[serde(default)]
    pub wood: u32,
    #[serde(default)]
    pub brick: u32,
    #[serde(default)]
    pub sheep: u32,
    #[serde(default)]
    pub wheat: u32,
    #[serde(default)]
    pub ore: u32,
}

impl ResourceHand {
    /// Create an empty hand
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hand with specific amounts
    pub fn with_amounts(wood: u32, brick: u32, sheep: u32, wheat: u32, ore: u32) -> Self {
        Self {
            wood,
            brick,
            sheep,
            wheat,
            ore,
        }
    }

    /// Create a hand with a single resource
    pub fn single(resource: Resource, amount: u32) -> Self {
        let mut hand = Self::new();
        hand.add(resource, amount);
        hand
    }

    /// Total number of resource cards, saturating at `u32::MAX`
    pub fn total(&self) -> u32 {
        self.iter()
            .fold(0u32, |sum, (_, count)| sum.saturating_add(count))
    }

    /// Total number of resource cards, `None` on overflow
    pub fn checked_total(&self) -> Option<u32> {
        self.iter()
            .try_fold(0u32, |sum, (_, count)| sum.checked_add(count))
    }

    /// Check if hand is empty
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Get count of a specific resource
    pub fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Wood => self.wood,
            Resource::Brick => self.brick,
            Resource::Sheep => self.sheep,
            Resource::Wheat => self.wheat,
            Resource::Ore => self.ore,
        }
    }

    fn slot(&mut self, resource: Resource) -> &mut u32 {
        match resource {
            Resource::Wood => &mut self.wood,
            Resource::Brick => &mut self.brick,
            Resource::Sheep => &mut self.sheep,
            Resource::Wheat => &mut self.wheat,
            Resource::Ore => &mut self.ore,
        }
    }

    /// Add resources to hand
    pub fn add(&mut self, resource: Resource, amount: u32) {
        *self.slot(resource) += amount;
    }

    /// Add another hand to this one
    pub fn add_hand(&mut self, other: &ResourceHand) {
        for (resource, amount) in other.iter() {
            self.add(resource, amount);
        }
    }

    /// Check if can afford a cost
    pub fn can_afford(&self, cost: &ResourceHand) -> bool {
        Resource::ALL
            .iter()
            .all(|r| self.get(*r) >= cost.get(*r))
    }

    /// Subtract a cost, or `None` (hand untouched) if any count is short
    pub fn checked_sub(&self, cost: &ResourceHand) -> Option<ResourceHand> {
        let mut rest = *self;
        for resource in Resource::ALL {
            *rest.slot(resource) = self.get(resource).checked_sub(cost.get(resource))?;
        }
        Some(rest)
    }

    /// Non-zero `(resource, count)` pairs in `Resource::ALL` order
    pub fn iter(&self) -> impl Iterator<Item = (Resource, u32)> + '_ {
        Resource::ALL
            .into_iter()
            .map(|r| (r, self.get(r)))
            .filter(|(_, count)| *count > 0)
    }
}

impl fmt::Display for ResourceHand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("nothing");
        }
        let parts: Vec<String> = self
            .iter()
            .map(|(resource, count)| format!("{count} {resource}"))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// Building costs
pub mod costs {
    use super::ResourceHand;

    /// Cost to build a road: 1 wood, 1 brick
    pub fn road() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 0, 0, 0)
    }

    /// Cost to build a settlement: 1 wood, 1 brick, 1 sheep, 1 wheat
    pub fn settlement() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 1, 1, 0)
    }

    /// Cost to upgrade to city: 2 wheat, 3 ore
    pub fn city() -> ResourceHand {
        ResourceHand::with_amounts(0, 0, 0, 2, 3)
    }
}

/// A single player's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Player ID (0-3)
    pub id: PlayerId,
    /// Display name
    pub name: String,
    /// Player color
    pub color: PlayerColor,
    /// Current resources
    pub resources: ResourceHand,
    /// Number of roads remaining to build
    pub roads_remaining: u32,
    /// Number of settlements remaining to build
    pub settlements_remaining: u32,
    /// Number of cities remaining to build
    pub cities_remaining: u32,
    /// Derived by the engine from the board and award flags
    pub(crate) victory_points: u32,
    /// Whether this player has the Longest Road award
    pub has_longest_road: bool,
    /// Whether this player has the Largest Army award
    pub has_largest_army: bool,
}

impl Player {
    /// Create a new player
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            color: PlayerColor::for_player(id),
            resources: ResourceHand::new(),
            roads_remaining: ROAD_STOCK,
            settlements_remaining: SETTLEMENT_STOCK,
            cities_remaining: CITY_STOCK,
            victory_points: 0,
            has_longest_road: false,
            has_largest_army: false,
        }
    }

    /// Current victory points
    pub fn victory_points(&self) -> u32 {
        self.victory_points
    }

    /// Bonus points from held awards
    pub fn award_points(&self) -> u32 {
        let mut vp = 0;
        if self.has_longest_road {
            vp += 2;
        }
        if self.has_largest_army {
            vp += 2;
        }
        vp
    }

    /// Pieces already on the board: (roads, settlements, cities)
    pub fn pieces_placed(&self) -> (u32, u32, u32) {
        (
            ROAD_STOCK.saturating_sub(self.roads_remaining),
            // A city returns its settlement to stock.
            SETTLEMENT_STOCK.saturating_sub(self.settlements_remaining),
            CITY_STOCK.saturating_sub(self.cities_remaining),
        )
    }

    /// Can this player afford a road?
    pub fn can_afford_road(&self) -> bool {
        self.resources.can_afford(&costs::road()) && self.roads_remaining > 0
    }

    /// Can this player afford a settlement?
    pub fn can_afford_settlement(&self) -> bool {
        self.resources.can_afford(&costs::settlement()) && self.settlements_remaining > 0
    }

    /// Can this player afford a city upgrade?
    pub fn can_afford_city(&self) -> bool {
        self.resources.can_afford(&costs::city()) && self.cities_remaining > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resource_hand_total() {
        let hand = ResourceHand::with_amounts(1, 2, 3, 4, 5);
        assert_eq!(hand.total(), 15);
        assert_eq!(hand.checked_total(), Some(15));
    }

    #[test]
    fn test_resource_hand_total_overflow() {
        let hand = ResourceHand::with_amounts(u32::MAX, 5, 0, 0, 0);
        assert_eq!(hand.checked_total(), None);
        assert_eq!(hand.total(), u32::MAX);
    }

    #[test]
    fn test_resource_hand_can_afford() {
        let hand = ResourceHand::with_amounts(2, 2, 2, 2, 2);
        let cost = ResourceHand::with_amounts(1, 1, 1, 1, 1);
        assert!(hand.can_afford(&cost));

        let expensive = ResourceHand::with_amounts(3, 0, 0, 0, 0);
        assert!(!hand.can_afford(&expensive));
    }

    #[test]
    fn test_resource_hand_checked_sub() {
        let hand = ResourceHand::with_amounts(3, 3, 3, 3, 3);
        let cost = ResourceHand::with_amounts(1, 1, 1, 1, 1);
        assert_eq!(
            hand.checked_sub(&cost),
            Some(ResourceHand::with_amounts(2, 2, 2, 2, 2))
        );

        let short = ResourceHand::with_amounts(0, 0, 0, 0, 4);
        assert_eq!(hand.checked_sub(&short), None);
    }

    #[test]
    fn test_resource_hand_iter_and_display() {
        let hand = ResourceHand::with_amounts(4, 0, 0, 1, 0);
        let pairs: Vec<_> = hand.iter().collect();
        assert_eq!(pairs, vec![(Resource::Wood, 4), (Resource::Wheat, 1)]);
        assert_eq!(hand.to_string(), "4 wood, 1 wheat");
        assert_eq!(ResourceHand::new().to_string(), "nothing");
    }

    #[test]
    fn test_resource_hand_json_uses_resource_names() {
        let hand: ResourceHand = serde_json::from_str(r#"{"wood": 4}"#).unwrap();
        assert_eq!(hand, ResourceHand::single(Resource::Wood, 4));
    }

    #[test]
    fn test_building_costs() {
        assert_eq!(costs::road().total(), 2);
        assert_eq!(costs::settlement().total(), 4);
        assert_eq!(costs::settlement().ore, 0);
        assert_eq!(costs::city(), ResourceHand::with_amounts(0, 0, 0, 2, 3));
    }

    #[test]
    fn test_new_player_stock() {
        let player = Player::new(2, "Test".to_string());
        assert_eq!(player.color, PlayerColor::White);
        assert_eq!(player.roads_remaining, 15);
        assert_eq!(player.settlements_remaining, 5);
        assert_eq!(player.cities_remaining, 4);
        assert_eq!(player.victory_points(), 0);
        assert_eq!(player.pieces_placed(), (0, 0, 0));
    }

    #[test]
    fn test_award_points() {
        let mut player = Player::new(0, "Test".to_string());
        assert_eq!(player.award_points(), 0);

        player.has_longest_road = true;
        assert_eq!(player.award_points(), 2);

        player.has_largest_army = true;
        assert_eq!(player.award_points(), 4);
    }

    #[test]
    fn test_pieces_placed_counts_city_upgrades() {
        let mut player = Player::new(0, "Test".to_string());
        // Three settlements built, one of them upgraded.
        player.settlements_remaining = 3;
        player.cities_remaining = 3;
        player.roads_remaining = 12;
        assert_eq!(player.pieces_placed(), (3, 2, 1));
    }

    #[test]
    fn test_can_afford_respects_stock() {
        let mut player = Player::new(0, "Test".to_string());
        player.resources = ResourceHand::with_amounts(5, 5, 5, 5, 5);
        assert!(player.can_afford_road());
        assert!(player.can_afford_city());

        player.roads_remaining = 0;
        assert!(!player.can_afford_road());
    }
}
