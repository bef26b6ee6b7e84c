use std::collections::HashSet;
use dashmap::DashMap;
use tokio::sync::mpsc;
use crate::handlers::models::ServerEvent;
use crate::state::lobby::{ConnectionId, LobbyCode};

pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Connection registry - live connections and their broadcast rooms
/// Sends never block; a closed receiver just drops the event
pub struct Registry {
    connections: DashMap<ConnectionId, EventSender>,
    rooms: DashMap<LobbyCode, HashSet<ConnectionId>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            rooms: DashMap::new(),
        }
    }

    /// Register a new connection and return its id
    pub fn register(&self, tx: EventSender) -> ConnectionId {
        let id = ConnectionId::new();
        self.connections.insert(id, tx);
        id
    }

    /// Drop a connection and remove it from every room
    pub fn unregister(&self, id: ConnectionId) {
        self.connections.remove(&id);
        for mut room in self.rooms.iter_mut() {
            room.value_mut().remove(&id);
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Subscribe a connection to a lobby's room
    pub fn join_room(&self, code: &str, id: ConnectionId) {
        self.rooms.entry(code.to_string()).or_default().insert(id);
    }

    /// Forget a room entirely (pruned lobby)
    pub fn close_room(&self, code: &str) {
        self.rooms.remove(code);
    }

    pub fn room_members(&self, code: &str) -> Vec<ConnectionId> {
        self.rooms
            .get(code)
            .map(|room| room.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Point-to-point delivery
    /// Returns false if the connection is gone
    pub fn emit_to(&self, id: ConnectionId, event: ServerEvent) -> bool {
        let Some(tx) = self.connections.get(&id).map(|entry| entry.value().clone()) else {
            log::debug!("Dropping {} for unknown connection {}", event.name(), id);
            return false;
        };
        if tx.send(event).is_err() {
            log::debug!("Connection {} closed its queue", id);
            return false;
        }
        true
    }

    /// Deliver to every member of a room
    /// Returns the number of connections reached
    pub fn emit_to_room(&self, code: &str, event: ServerEvent) -> usize {
        // copy members so no room shard stays locked while sending
        let members = self.room_members(code);
        members
            .into_iter()
            .filter(|id| self.emit_to(*id, event.clone()))
            .count()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
