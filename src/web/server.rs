//! Web server bootstrap for depot.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::auth::TokenCodec;
use crate::config::Config;
use crate::db::Database;
use crate::file::{FileService, FileStorage, MagicInspector, NoopInspector, UploadPolicy};
use crate::web::handlers::AppState;
use crate::web::middleware::JwtState;
use crate::web::router::create_router;
use crate::Result;

/// Build the shared application state from configuration.
pub fn build_state(config: &Config, db: Database) -> Result<(Arc<AppState>, Arc<JwtState>)> {
    let storage = FileStorage::new(&config.storage.root)?;
    let policy = UploadPolicy::from_config(&config.storage);

    // The capability is selected once here; the pipeline itself always
    // calls the inspector interface.
    let mut files = FileService::new(db.clone(), storage, policy);
    if config.storage.verify_content {
        files = files.with_inspector(Arc::new(MagicInspector));
    } else {
        files = files.with_inspector(Arc::new(NoopInspector));
    }

    let tokens = TokenCodec::new(
        &config.web.jwt_secret,
        config.web.jwt_access_token_expiry_secs,
    );

    let app_state = Arc::new(AppState::new(
        db,
        files,
        tokens.clone(),
        config.web.jwt_access_token_expiry_secs,
    ));
    let jwt_state = Arc::new(JwtState::new(tokens));

    Ok((app_state, jwt_state))
}

/// Start serving the Web API. Runs until the process is stopped.
pub async fn serve(config: &Config, db: Database) -> Result<()> {
    let (app_state, jwt_state) = build_state(config, db)?;
    let router = create_router(app_state, jwt_state, &config.web.cors_origins);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Web API listening on {}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
