//! Option index: numbered choices standing in for board ids.
//!
//! A caller is shown "option 1..n" for vertices and edges and answers with
//! an ordinal; the index maps it back to the canonical id. Each publish
//! returns an `OptionSession` carrying a token and an explicit expiry, and
//! resolution checks both. Nothing here knows the game rules.

use crate::board::{EdgeId, PlayerId, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, SystemTime};
use thiserror::Error;

/// How long a published session stays resolvable
pub const OPTION_TTL: Duration = Duration::from_secs(5 * 60);

/// Which list an ordinal refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Vertex,
    Edge,
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OptionKind::Vertex => "vertex",
            OptionKind::Edge => "edge",
        })
    }
}

/// Failures resolving an ordinal
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("No options published for player {0}")]
    NoSession(PlayerId),

    #[error("Options for player {player} expired; query legal moves again")]
    Expired { player: PlayerId },

    #[error("Option token {given} is stale, current token is {current}")]
    StaleSession { given: u64, current: u64 },

    #[error("No {kind} option {option}; valid options are 1..={available}")]
    UnknownOption {
        kind: OptionKind,
        option: u32,
        available: usize,
    },
}

/// One published mapping, 1-indexed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSession {
    pub token: u64,
    pub player: PlayerId,
    pub vertices: Vec<VertexId>,
    pub edges: Vec<EdgeId>,
    pub issued_at: SystemTime,
    pub expires_at: SystemTime,
}

impl OptionSession {
    pub fn is_expired(&self, now: SystemTime) -> bool {
        now > self.expires_at
    }

    pub fn vertex(&self, option: u32) -> Option<VertexId> {
        nth(&self.vertices, option)
    }

    pub fn edge(&self, option: u32) -> Option<EdgeId> {
        nth(&self.edges, option)
    }
}

fn nth<T: Copy>(items: &[T], option: u32) -> Option<T> {
    let index = (option as usize).checked_sub(1)?;
    items.get(index).copied()
}

/// Per-game store of the latest session for each player
#[derive(Debug, Clone)]
pub struct OptionIndex {
    ttl: Duration,
    next_token: u64,
    sessions: HashMap<PlayerId, OptionSession>,
}

impl Default for OptionIndex {
    fn default() -> Self {
        Self::new(OPTION_TTL)
    }
}

impl OptionIndex {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            next_token: 1,
            sessions: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Store a fresh mapping for `player`, replacing any earlier one
    pub fn publish(
        &mut self,
        player: PlayerId,
        vertices: impl IntoIterator<Item = VertexId>,
        edges: impl IntoIterator<Item = EdgeId>,
        now: SystemTime,
    ) -> OptionSession {
        let token = self.next_token;
        self.next_token += 1;

        let session = OptionSession {
            token,
            player,
            vertices: vertices.into_iter().collect(),
            edges: edges.into_iter().collect(),
            issued_at: now,
            expires_at: now + self.ttl,
        };
        self.sessions.insert(player, session.clone());
        session
    }

    /// Latest session for `player`, expired or not
    pub fn session(&self, player: PlayerId) -> Option<&OptionSession> {
        self.sessions.get(&player)
    }

    /// Resolve a vertex ordinal. `token`, when given, must match the latest
    /// session.
    pub fn resolve_vertex(
        &self,
        player: PlayerId,
        option: u32,
        token: Option<u64>,
        now: SystemTime,
    ) -> Result<VertexId, OptionError> {
        let session = self.live_session(player, token, now)?;
        session.vertex(option).ok_or(OptionError::UnknownOption {
            kind: OptionKind::Vertex,
            option,
            available: session.vertices.len(),
        })
    }

    /// Resolve an edge ordinal. `token`, when given, must match the latest
    /// session.
    pub fn resolve_edge(
        &self,
        player: PlayerId,
        option: u32,
        token: Option<u64>,
        now: SystemTime,
    ) -> Result<EdgeId, OptionError> {
        let session = self.live_session(player, token, now)?;
        session.edge(option).ok_or(OptionError::UnknownOption {
            kind: OptionKind::Edge,
            option,
            available: session.edges.len(),
        })
    }

    fn live_session(
        &self,
        player: PlayerId,
        token: Option<u64>,
        now: SystemTime,
    ) -> Result<&OptionSession, OptionError> {
        let session = self
            .sessions
            .get(&player)
            .ok_or(OptionError::NoSession(player))?;

        if let Some(given) = token {
            if given != session.token {
                return Err(OptionError::StaleSession {
                    given,
                    current: session.token,
                });
            }
        }
        if session.is_expired(now) {
            return Err(OptionError::Expired { player });
        }
        Ok(session)
    }

    /// Drop every session past its expiry; returns how many were dropped
    pub fn purge_expired(&mut self, now: SystemTime) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired(now));
        before - self.sessions.len()
    }

    /// Forget everything published for `player`
    pub fn clear(&mut self, player: PlayerId) {
        self.sessions.remove(&player);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn t0() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000)
    }

    fn vertices(ids: &[u8]) -> Vec<VertexId> {
        ids.iter().map(|id| VertexId(*id)).collect()
    }

    #[test]
    fn test_publish_is_one_indexed() {
        let mut index = OptionIndex::default();
        index.publish(0, vertices(&[17, 4, 30]), vec![EdgeId(9)], t0());

        assert_eq!(index.resolve_vertex(0, 1, None, t0()), Ok(VertexId(17)));
        assert_eq!(index.resolve_vertex(0, 3, None, t0()), Ok(VertexId(30)));
        assert_eq!(index.resolve_edge(0, 1, None, t0()), Ok(EdgeId(9)));
        assert_eq!(
            index.resolve_vertex(0, 0, None, t0()),
            Err(OptionError::UnknownOption {
                kind: OptionKind::Vertex,
                option: 0,
                available: 3
            })
        );
        assert!(index.resolve_edge(0, 2, None, t0()).is_err());
    }

    #[test]
    fn test_players_are_isolated() {
        let mut index = OptionIndex::default();
        index.publish(0, vertices(&[1]), Vec::<EdgeId>::new(), t0());

        assert_eq!(
            index.resolve_vertex(1, 1, None, t0()),
            Err(OptionError::NoSession(1))
        );
    }

    #[test]
    fn test_republish_replaces_and_bumps_token() {
        let mut index = OptionIndex::default();
        let first = index.publish(0, vertices(&[1, 2]), Vec::<EdgeId>::new(), t0());
        let second = index.publish(0, vertices(&[5]), Vec::<EdgeId>::new(), t0());

        assert!(second.token > first.token);
        assert_eq!(index.resolve_vertex(0, 1, None, t0()), Ok(VertexId(5)));
        assert_eq!(
            index.resolve_vertex(0, 1, Some(first.token), t0()),
            Err(OptionError::StaleSession {
                given: first.token,
                current: second.token
            })
        );
        assert_eq!(
            index.resolve_vertex(0, 1, Some(second.token), t0()),
            Ok(VertexId(5))
        );
    }

    #[test]
    fn test_expiry_is_checked_at_resolve_time() {
        let mut index = OptionIndex::new(Duration::from_secs(60));
        let session = index.publish(2, vertices(&[8]), Vec::<EdgeId>::new(), t0());
        assert_eq!(session.expires_at, t0() + Duration::from_secs(60));

        let at_expiry = t0() + Duration::from_secs(60);
        assert_eq!(index.resolve_vertex(2, 1, None, at_expiry), Ok(VertexId(8)));

        let later = t0() + Duration::from_secs(61);
        assert_eq!(
            index.resolve_vertex(2, 1, None, later),
            Err(OptionError::Expired { player: 2 })
        );
    }

    #[test]
    fn test_purge_expired() {
        let mut index = OptionIndex::new(Duration::from_secs(60));
        index.publish(0, vertices(&[1]), Vec::<EdgeId>::new(), t0());
        index.publish(1, vertices(&[2]), Vec::<EdgeId>::new(), t0() + Duration::from_secs(50));

        assert_eq!(index.purge_expired(t0() + Duration::from_secs(61)), 1);
        assert!(index.session(0).is_none());
        assert!(index.session(1).is_some());

        index.clear(1);
        assert!(index.session(1).is_none());
    }
}
