//! depot server binary.

use depot::db::Database;
use depot::web::server;
use depot::{logging, Config, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "depot.toml".to_string());

    let config = Config::load(&config_path)?;
    logging::init(&config.logging)?;
    config.validate()?;

    tracing::info!("Starting depot (config: {})", config_path);

    let db = Database::open(&config.database.path).await?;

    server::serve(&config, db).await
}
