pub mod lobby;
pub mod registry;
pub mod server_state;
