use rand::Rng;
use crate::domain::roles::RoleAssignment;
use crate::error::LobbyError;
use crate::state::lobby::{ConnectionId, Lobby, LobbyCode, Player};

/// Length of generated lobby codes
pub const CODE_LENGTH: usize = 5;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a short human-typeable lobby code (upper-case alphanumeric)
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> LobbyCode {
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Add a joining player
/// Only lobbies that are not running accept new players
pub fn add_player(lobby: &mut Lobby, player: Player) -> Result<(), LobbyError> {
    if lobby.started {
        return Err(LobbyError::AlreadyStarted);
    }
    // one entry per connection; names may repeat
    if lobby.contains(player.id) {
        return Ok(());
    }
    lobby.players.push(player);
    Ok(())
}

/// Remove a player by connection
/// Returns true if the player was a member
pub fn remove_player(lobby: &mut Lobby, id: ConnectionId) -> bool {
    let before = lobby.players.len();
    lobby.players.retain(|p| p.id != id);
    lobby.players.len() != before
}

/// Owner-only guard for end and restart
pub fn ensure_owner(lobby: &Lobby, requester: ConnectionId) -> Result<(), LobbyError> {
    if lobby.is_owner(requester) {
        Ok(())
    } else {
        Err(LobbyError::Forbidden)
    }
}

/// Restart is allowed for the owner once the previous round was ended
pub fn ensure_can_restart(lobby: &Lobby, requester: ConnectionId) -> Result<(), LobbyError> {
    ensure_owner(lobby, requester)?;
    if lobby.started {
        return Err(LobbyError::InvalidState);
    }
    Ok(())
}

/// Record a finished assignment as the running round
pub fn begin_round(lobby: &mut Lobby, assignment: &RoleAssignment) {
    lobby.current_spies = assignment.spies.clone();
    lobby.started = true;
}

/// Close the running round and return the spy names to reveal
/// Players and spies are kept as they are
pub fn end_round(lobby: &mut Lobby, requester: ConnectionId) -> Result<Vec<String>, LobbyError> {
    ensure_owner(lobby, requester)?;
    let spy_names = lobby.spy_names();
    lobby.started = false;
    Ok(spy_names)
}
