use std::sync::Arc;
use crate::domain::manager::LobbyManager;
use crate::state::registry::Registry;
use crate::utils::config::Config;
use crate::utils::worddb::WordDb;

/// Text served by the health route
pub const HEALTH_TEXT: &str = "🕵️ Spion Backend läuft!";

/// App state for HTTP and WebSocket handlers
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<LobbyManager>,
    pub registry: Arc<Registry>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire a fresh registry and lobby manager around the loaded word data
    pub fn new(config: Arc<Config>, words: Arc<WordDb>) -> Self {
        let registry = Arc::new(Registry::new());
        let manager = Arc::new(LobbyManager::new(
            registry.clone(),
            words,
            config.prune_empty_lobbies,
        ));
        Self {
            manager,
            registry,
            config,
        }
    }
}

/// Thin HTTP handler: health check
pub async fn health() -> &'static str {
    HEALTH_TEXT
}
