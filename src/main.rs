use std::sync::Arc;
use spion_server::handlers::AppState;
use spion_server::server;
use spion_server::utils::config::Config;
use spion_server::utils::logging;
use spion_server::utils::worddb::WordDb;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load immutable globals
    let config = Arc::new(Config::from_env()?);
    logging::setup(&config)?;

    let words = match &config.words_file {
        Some(path) => {
            let db = WordDb::from_path(path)?;
            log::info!("Loaded {} categories from {}", db.names().count(), path.display());
            db
        }
        None => WordDb::load(),
    };
    log::info!("Categories: {}", words.names().collect::<Vec<_>>().join(", "));

    let app_state = AppState::new(config, Arc::new(words));
    server::start_server(app_state).await
}
