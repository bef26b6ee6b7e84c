use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::state::lobby::{Lobby, LobbyCode};

pub type LobbyHandle = Arc<RwLock<Lobby>>;

/// Lobby store partitioned by code
/// Uses DashMap for concurrent access without global locks
pub struct ServerState {
    lobbies: DashMap<LobbyCode, LobbyHandle>,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            lobbies: DashMap::new(),
        }
    }

    /// Get lobby handle
    /// Returns None if lobby doesn't exist
    pub fn get_lobby(&self, lobby_code: &str) -> Option<LobbyHandle> {
        self.lobbies.get(lobby_code).map(|entry| entry.value().clone())
    }

    /// True while `handle` is still the lobby stored under `lobby_code`
    pub fn is_live(&self, lobby_code: &str, handle: &LobbyHandle) -> bool {
        self.lobbies
            .get(lobby_code)
            .map(|entry| Arc::ptr_eq(entry.value(), handle))
            .unwrap_or(false)
    }

    /// Insert a new lobby unless the code is taken
    /// Returns false on collision; the existing lobby is left alone
    pub fn insert_if_vacant(&self, code: LobbyCode, handle: LobbyHandle) -> bool {
        match self.lobbies.entry(code) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(handle);
                true
            }
        }
    }

    /// Remove a lobby
    pub fn remove_lobby(&self, lobby_code: &str) -> Option<LobbyHandle> {
        self.lobbies.remove(lobby_code).map(|(_, handle)| handle)
    }

    /// Copy of every lobby handle
    /// Callers lock lobbies one by one without holding a map shard
    pub fn all_lobbies(&self) -> Vec<(LobbyCode, LobbyHandle)> {
        self.lobbies
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Get lobby count
    pub fn lobby_count(&self) -> usize {
        self.lobbies.len()
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}
