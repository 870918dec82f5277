//! Game storage.
//!
//! Each game lives in a `GameSession` together with its option index and
//! dice RNG. Access to one game goes through `with_session`, which holds
//! that game exclusively for the duration of the closure; different games
//! proceed independently.

use dashmap::DashMap;
use rand::rngs::StdRng;
use settlers_core::{GameState, OptionIndex};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// One hosted game
#[derive(Debug, Clone)]
pub struct GameSession {
    pub id: Uuid,
    pub state: GameState,
    pub options: OptionIndex,
    /// Dice RNG, persisted so seeded games replay
    pub rng: StdRng,
    pub created_at: SystemTime,
    pub last_activity: SystemTime,
}

impl GameSession {
    pub fn new(id: Uuid, state: GameState, options: OptionIndex, rng: StdRng, now: SystemTime) -> Self {
        Self {
            id,
            state,
            options,
            rng,
            created_at: now,
            last_activity: now,
        }
    }

    pub fn touch(&mut self, now: SystemTime) {
        self.last_activity = self.last_activity.max(now);
    }

    pub fn is_idle(&self, max_idle: Duration, now: SystemTime) -> bool {
        now.duration_since(self.last_activity)
            .is_ok_and(|idle| idle > max_idle)
    }
}

/// Storage seam for hosted games
pub trait GameStore: Send + Sync {
    fn insert(&self, session: GameSession);

    fn contains(&self, id: Uuid) -> bool;

    /// Run `f` with exclusive access to one game; `None` if it is unknown
    fn with_session<T>(&self, id: Uuid, f: impl FnOnce(&mut GameSession) -> T) -> Option<T>;

    /// Copy of a game's current state
    fn snapshot(&self, id: Uuid) -> Option<GameState>;

    fn remove(&self, id: Uuid) -> Option<GameSession>;

    /// Ids of every stored game, ascending
    fn ids(&self) -> Vec<Uuid>;

    /// Drop games idle for longer than `max_idle`; returns their ids
    fn purge_idle(&self, max_idle: Duration, now: SystemTime) -> Vec<Uuid>;
}

/// Process-local store backed by a sharded concurrent map
#[derive(Debug, Default)]
pub struct InMemoryGameStore {
    games: DashMap<Uuid, GameSession>,
}

impl InMemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

impl GameStore for InMemoryGameStore {
    fn insert(&self, session: GameSession) {
        self.games.insert(session.id, session);
    }

    fn contains(&self, id: Uuid) -> bool {
        self.games.contains_key(&id)
    }

    fn with_session<T>(&self, id: Uuid, f: impl FnOnce(&mut GameSession) -> T) -> Option<T> {
        self.games.get_mut(&id).map(|mut entry| f(entry.value_mut()))
    }

    fn snapshot(&self, id: Uuid) -> Option<GameState> {
        self.games.get(&id).map(|entry| entry.state.clone())
    }

    fn remove(&self, id: Uuid) -> Option<GameSession> {
        self.games.remove(&id).map(|(_, session)| session)
    }

    fn ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.games.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    fn purge_idle(&self, max_idle: Duration, now: SystemTime) -> Vec<Uuid> {
        let mut purged = Vec::new();
        self.games.retain(|id, session| {
            let idle = session.is_idle(max_idle, now);
            if idle {
                purged.push(*id);
            }
            !idle
        });
        purged.sort_unstable();
        purged
    }
}
