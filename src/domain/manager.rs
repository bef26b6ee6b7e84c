use std::sync::{Arc, Mutex};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use crate::domain::lobbies;
use crate::domain::roles::{self, CategorySelector};
use crate::error::LobbyError;
use crate::handlers::models::{GameData, GameEnd, ServerEvent};
use crate::state::lobby::{ConnectionId, Lobby, LobbyCode, LobbySnapshot, Player};
use crate::state::registry::Registry;
use crate::state::server_state::ServerState;
use crate::utils::worddb::WordDb;

/// Lobby manager - owns every lobby and runs the lobby operations
///
/// Each operation holds its lobby's write lock from the first read until the
/// last event is queued, so operations on one lobby never interleave.
/// Events go out through the registry's non-blocking queues.
pub struct LobbyManager {
    state: ServerState,
    registry: Arc<Registry>,
    words: Arc<WordDb>,
    prune_empty: bool,
    rng: Mutex<StdRng>,
}

impl LobbyManager {
    pub fn new(registry: Arc<Registry>, words: Arc<WordDb>, prune_empty: bool) -> Self {
        Self::with_rng(registry, words, prune_empty, StdRng::from_os_rng())
    }

    /// Manager with a caller-provided generator (seeded in tests)
    pub fn with_rng(registry: Arc<Registry>, words: Arc<WordDb>, prune_empty: bool, rng: StdRng) -> Self {
        Self {
            state: ServerState::new(),
            registry,
            words,
            prune_empty,
            rng: Mutex::new(rng),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn lobby_count(&self) -> usize {
        self.state.lobby_count()
    }

    /// Create a lobby owned by `requester` and return its code
    pub async fn create_lobby(&self, requester: ConnectionId, player_name: String) -> LobbyCode {
        let owner = Player::new(requester, player_name);

        let (code, handle) = loop {
            let code = self.draw(|rng| lobbies::generate_code(rng));
            let handle = Arc::new(RwLock::new(Lobby::new(code.clone(), owner.clone())));
            if self.state.insert_if_vacant(code.clone(), handle.clone()) {
                break (code, handle);
            }
            debug!("Lobby code {} already taken, drawing again", code);
        };

        let lobby = handle.write().await;
        self.registry.join_room(&code, requester);
        self.registry.emit_to_room(&code, ServerEvent::update_players(&lobby.players));

        info!("Lobby {} created by {} ({})", code, owner.name, requester);
        code
    }

    /// Add `requester` to an open lobby
    pub async fn join_lobby(
        &self,
        requester: ConnectionId,
        lobby_code: &str,
        player_name: String,
    ) -> Result<(), LobbyError> {
        let mut lobby = self.lock(lobby_code).await?;
        lobbies::add_player(&mut lobby, Player::new(requester, player_name))?;

        self.registry.join_room(lobby_code, requester);
        self.registry.emit_to_room(lobby_code, ServerEvent::update_players(&lobby.players));

        info!("{} joined lobby {} ({} players)", requester, lobby_code, lobby.players.len());
        Ok(())
    }

    /// Assign roles and start a round
    /// Anybody may start, even while a round is running
    pub async fn start_game(
        &self,
        requester: ConnectionId,
        lobby_code: &str,
        spy_count: i64,
        category: &CategorySelector,
    ) -> Result<(), LobbyError> {
        let mut lobby = self.lock(lobby_code).await?;
        debug!("{} starts lobby {}", requester, lobby_code);
        self.run_round(&mut lobby, spy_count, category)
    }

    /// End the running round and reveal the spies
    /// Owner only; returns the revealed names
    pub async fn end_game(&self, requester: ConnectionId, lobby_code: &str) -> Result<Vec<String>, LobbyError> {
        let mut lobby = self.lock(lobby_code).await?;
        let spy_names = lobbies::end_round(&mut lobby, requester)?;

        self.registry.emit_to_room(
            lobby_code,
            ServerEvent::GameEnd(GameEnd {
                spy_names: spy_names.clone(),
            }),
        );

        info!("Lobby {} ended, spies: {:?}", lobby_code, spy_names);
        Ok(spy_names)
    }

    /// Start the next round once the previous one was ended
    pub async fn restart_game(
        &self,
        requester: ConnectionId,
        lobby_code: &str,
        spy_count: i64,
        category: &CategorySelector,
    ) -> Result<(), LobbyError> {
        let mut lobby = self.lock(lobby_code).await?;
        lobbies::ensure_can_restart(&lobby, requester)?;
        self.run_round(&mut lobby, spy_count, category)
    }

    /// Remove a closed connection from every lobby
    ///
    /// Every lobby gets a fresh player list, member or not. Returns the
    /// number of lobbies the connection was removed from.
    pub async fn disconnect(&self, connection: ConnectionId) -> usize {
        let mut removed = 0;

        for (code, handle) in self.state.all_lobbies() {
            let mut lobby = handle.clone().write_owned().await;
            if !self.state.is_live(&code, &handle) {
                continue;
            }

            if lobbies::remove_player(&mut lobby, connection) {
                removed += 1;
                debug!("Removed {} from lobby {}", connection, code);
            }
            self.registry.emit_to_room(&code, ServerEvent::update_players(&lobby.players));

            if self.prune_empty && lobby.players.is_empty() {
                self.state.remove_lobby(&code);
                self.registry.close_room(&code);
                info!("Lobby {} pruned", code);
            }
        }

        removed
    }

    /// Read-only copy of a lobby
    pub async fn snapshot(&self, lobby_code: &str) -> Option<LobbySnapshot> {
        let handle = self.state.get_lobby(lobby_code)?;
        let lobby = handle.read().await;
        Some(lobby.snapshot())
    }

    /// Write-lock a live lobby
    /// A lobby pruned while we waited counts as missing
    async fn lock(&self, lobby_code: &str) -> Result<OwnedRwLockWriteGuard<Lobby>, LobbyError> {
        let handle = self.state.get_lobby(lobby_code).ok_or(LobbyError::NotFound)?;
        let lobby = handle.clone().write_owned().await;
        if !self.state.is_live(lobby_code, &handle) {
            return Err(LobbyError::NotFound);
        }
        Ok(lobby)
    }

    /// Shared round start for start and restart, run under the lobby lock
    fn run_round(&self, lobby: &mut Lobby, spy_count: i64, category: &CategorySelector) -> Result<(), LobbyError> {
        let assignment = self.draw(|rng| {
            roles::assign_roles(&lobby.players, spy_count, category, &self.words, rng)
        })?;
        lobbies::begin_round(lobby, &assignment);

        for (player, role) in &assignment.roles {
            self.registry.emit_to(
                player.id,
                ServerEvent::GameData(GameData {
                    category: assignment.category.clone(),
                    role: role.clone(),
                }),
            );
        }
        self.registry.emit_to_room(&lobby.code, ServerEvent::update_players(&lobby.players));

        info!(
            "Lobby {} started: category {}, {} of {} players are spies",
            lobby.code,
            assignment.category,
            assignment.spies.len(),
            lobby.players.len()
        );
        Ok(())
    }

    fn draw<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }
}
