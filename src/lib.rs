pub mod domain;
pub mod error;
pub mod handlers;
pub mod server;
pub mod state;
pub mod utils;

pub use domain::manager::LobbyManager;
pub use error::LobbyError;
pub use handlers::AppState;
