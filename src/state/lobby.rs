use std::fmt;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use uuid::Uuid;

pub type LobbyCode = String;

/// Spies of the current round, usually one or two per lobby
pub type SpySet = SmallVec<[Player; 4]>;

/// Identity of one live transport connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Player in a lobby, keyed by its connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: ConnectionId,
    pub name: String,
}

impl Player {
    pub fn new(id: ConnectionId, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

/// Lobby state - one instance per lobby code, guarded by its own lock
#[derive(Debug)]
pub struct Lobby {
    pub code: LobbyCode,
    pub players: Vec<Player>, // join order
    pub started: bool,
    pub owner_id: ConnectionId,
    pub current_spies: SpySet, // kept after the round ends for the reveal
}

impl Lobby {
    /// New lobby with the creator as its only player and owner
    pub fn new(code: LobbyCode, owner: Player) -> Self {
        Self {
            code,
            owner_id: owner.id,
            players: vec![owner],
            started: false,
            current_spies: SpySet::new(),
        }
    }

    pub fn is_owner(&self, id: ConnectionId) -> bool {
        self.owner_id == id
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.players.iter().any(|p| p.id == id)
    }

    pub fn spy_names(&self) -> Vec<String> {
        self.current_spies.iter().map(|p| p.name.clone()).collect()
    }

    /// Read-only copy of the lobby for callers outside the lock
    pub fn snapshot(&self) -> LobbySnapshot {
        LobbySnapshot {
            code: self.code.clone(),
            players: self.players.clone(),
            started: self.started,
            owner_id: self.owner_id,
            spy_names: self.spy_names(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbySnapshot {
    pub code: LobbyCode,
    pub players: Vec<Player>,
    pub started: bool,
    pub owner_id: ConnectionId,
    pub spy_names: Vec<String>,
}

impl LobbySnapshot {
    pub fn player_names(&self) -> Vec<&str> {
        self.players.iter().map(|p| p.name.as_str()).collect()
    }
}
