pub mod lobbies;
pub mod manager;
pub mod roles;
