pub mod http;
pub mod models;
pub mod ws;

pub use http::AppState;
