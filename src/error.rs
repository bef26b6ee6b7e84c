use thiserror::Error;

/// Failure of a lobby operation.
///
/// Only `NotFound` and `AlreadyStarted` reach the client (through the join
/// acknowledgement); the other kinds are logged and dropped by the handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LobbyError {
    #[error("Lobby nicht gefunden.")]
    NotFound,
    #[error("Lobby wurde schon gestartet.")]
    AlreadyStarted,
    #[error("Nur der Ersteller der Lobby darf das.")]
    Forbidden,
    #[error("Das Spiel läuft noch.")]
    InvalidState,
    #[error("Unbekannte Kategorie: {0}")]
    UnknownCategory(String),
}

impl LobbyError {
    /// Stable machine-readable name, sent next to the message
    pub fn kind(&self) -> &'static str {
        match self {
            LobbyError::NotFound => "LobbyNotFound",
            LobbyError::AlreadyStarted => "LobbyAlreadyStarted",
            LobbyError::Forbidden => "Forbidden",
            LobbyError::InvalidState => "InvalidState",
            LobbyError::UnknownCategory(_) => "UnknownCategory",
        }
    }
}
