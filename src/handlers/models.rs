use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::error::LobbyError;
use crate::state::lobby::{ConnectionId, LobbyCode, Player};

// WebSocket message DTOs

/// Raw inbound frame: `{"event": .., "data": .., "ack": ..}`
#[derive(Deserialize, Debug)]
pub struct InboundFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub ack: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateLobbyRequest {
    pub player_name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JoinLobbyRequest {
    pub lobby_code: LobbyCode,
    pub player_name: String,
}

/// Payload of both startGame and restartGame
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StartGameRequest {
    pub lobby_code: LobbyCode,
    pub spy_count: i64,
    pub category: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EndGameRequest {
    pub lobby_code: LobbyCode,
}

/// Client event after the payload was decoded
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    CreateLobby(CreateLobbyRequest),
    JoinLobby(JoinLobbyRequest),
    StartGame(StartGameRequest),
    EndGame(EndGameRequest),
    RestartGame(StartGameRequest),
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown event '{0}'")]
    UnknownEvent(String),
}

impl ClientEvent {
    /// Decode the payload for a named event
    pub fn parse(event: &str, data: Value) -> Result<Self, FrameError> {
        let parsed = match event {
            "createLobby" => ClientEvent::CreateLobby(serde_json::from_value(data)?),
            "joinLobby" => ClientEvent::JoinLobby(serde_json::from_value(data)?),
            "startGame" => ClientEvent::StartGame(serde_json::from_value(data)?),
            "endGame" => ClientEvent::EndGame(serde_json::from_value(data)?),
            "restartGame" => ClientEvent::RestartGame(serde_json::from_value(data)?),
            other => return Err(FrameError::UnknownEvent(other.to_string())),
        };
        Ok(parsed)
    }
}

impl FrameError {
    pub fn kind(&self) -> &'static str {
        match self {
            FrameError::Malformed(_) => "MalformedFrame",
            FrameError::UnknownEvent(_) => "UnknownEvent",
        }
    }
}

impl InboundFrame {
    /// Decode the envelope only; the payload stays raw
    pub fn from_text(text: &str) -> Result<Self, FrameError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn into_event(self) -> Result<ClientEvent, FrameError> {
        ClientEvent::parse(&self.event, self.data)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PlayerInfo {
    pub id: ConnectionId,
    pub name: String,
}

impl From<&Player> for PlayerInfo {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
        }
    }
}

/// Private role message for one player
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GameData {
    pub category: String,
    pub role: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameEnd {
    pub spy_names: Vec<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Ack {
    pub id: u64,
    #[serde(flatten)]
    pub result: AckResult,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum AckResult {
    LobbyCreated {
        #[serde(rename = "lobbyCode")]
        lobby_code: LobbyCode,
    },
    Joined {
        success: bool,
    },
    Failed {
        error: String,
        kind: &'static str,
    },
}

impl From<LobbyError> for AckResult {
    fn from(err: LobbyError) -> Self {
        AckResult::Failed {
            error: err.to_string(),
            kind: err.kind(),
        }
    }
}

impl From<FrameError> for AckResult {
    fn from(err: FrameError) -> Self {
        AckResult::Failed {
            error: err.to_string(),
            kind: err.kind(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ErrorPayload {
    pub message: String,
}

/// Outbound message: `{"event": .., "data": ..}`
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    UpdatePlayers(Vec<PlayerInfo>),
    GameData(GameData),
    GameEnd(GameEnd),
    Ack(Ack),
    Error(ErrorPayload),
}

impl ServerEvent {
    pub fn update_players(players: &[Player]) -> Self {
        ServerEvent::UpdatePlayers(players.iter().map(PlayerInfo::from).collect())
    }

    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::UpdatePlayers(_) => "updatePlayers",
            ServerEvent::GameData(_) => "gameData",
            ServerEvent::GameEnd(_) => "gameEnd",
            ServerEvent::Ack(_) => "ack",
            ServerEvent::Error(_) => "error",
        }
    }
}
