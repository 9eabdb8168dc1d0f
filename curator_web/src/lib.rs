//! Curator - sources and their infos
//!
//! A small server-rendered application to keep track of sources and the
//! infos (work items) filed under each of them.
//!
//! ## Architecture
//!
//! - **database**: connection pool, schema, and one module of queries per record type
//! - **forms / validator**: what the user submitted, and whether it can be stored
//! - **web**: axum handlers and askama pages
//! - **error**: how failures turn into HTTP responses

mod config;
mod database;
mod error;
mod forms;
mod models;
mod validator;
mod web;

pub use config::{Config, ConfigError};
pub use database::{ARCHIVED_STATUS, Database, DatabaseError, infos, sources};
pub use error::AppError;
pub use forms::{InfoForm, SourceForm};
pub use validator::Validator;
pub use models::{Info, InfoFields, InfoSummary, Source, SourceFields, SourceSummary};
pub use web::{AppState, app, routes};

use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ServeError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Open the database, bind the listener and serve until Ctrl-C.
pub async fn serve(config: Config) -> Result<(), ServeError> {
    info!(
        database = config.database_url.as_str(),
        bind_address = config.bind_address.as_str(),
        static_dir = config.static_dir.as_str(),
        "Starting Curator"
    );

    let db = Database::new(&config).await?;
    let bind_address = config.bind_address.clone();
    let state = AppState::new(db.clone(), config);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .map_err(|source| ServeError::Bind {
            address: bind_address.clone(),
            source,
        })?;

    info!("Listening on {}", bind_address);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(signal())
        .await?;

    db.close().await;
    info!("Curator stopped");
    Ok(())
}

async fn signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(?err, "Failed to install CTRL+C signal handler");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, terminating...");
}
