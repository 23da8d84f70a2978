//! Shared application state.
//!
//! `CoreState` is built once at start-up, wrapped in `Arc`, and shared by
//! every request. It owns no connection: each handler opens its own, so
//! no lock is held across requests.

use rusqlite::Connection;
use thiserror::Error;

use crate::config::Config;
use crate::crypto::{self, CryptoError};
use crate::db::{self, DatabaseError};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct CoreState {
    pub config: Config,
}

impl CoreState {
    /// Create the state and bring the database schema up to date.
    pub fn new(config: Config) -> Result<Self, CoreError> {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = db::open_database(&config.database_path)?;
        let pruned = db::prune_expired_sessions(&conn, chrono::Utc::now())?;
        tracing::info!(
            path = %config.database_path.display(),
            pruned_sessions = pruned,
            "Database ready"
        );

        Ok(Self { config })
    }

    /// Open a database connection. Most common operation in handlers.
    pub fn open_db(&self) -> Result<Connection, CoreError> {
        db::open_connection(&self.config.database_path).map_err(CoreError::Database)
    }

    /// Hash a password with the configured cost factor off the async runtime.
    pub async fn hash_password(&self, password: String) -> Result<String, CoreError> {
        let iterations = self.config.pbkdf2_iterations;
        tokio::task::spawn_blocking(move || {
            let password = zeroize::Zeroizing::new(password);
            crypto::hash_password(&password, iterations)
        })
        .await
        .map_err(|e| CoreError::Crypto(CryptoError::TaskFailed(e.to_string())))
    }

    /// Verify a password against a stored hash off the async runtime.
    ///
    /// With no stored hash, runs an equivalent dummy derivation and returns
    /// `false`, so unknown accounts cost the same as wrong passwords.
    pub async fn verify_password(
        &self,
        password: String,
        stored: Option<String>,
    ) -> Result<bool, CoreError> {
        let iterations = self.config.pbkdf2_iterations;
        tokio::task::spawn_blocking(move || {
            let password = zeroize::Zeroizing::new(password);
            match stored {
                Some(hash) => crypto::verify_password(&password, &hash),
                None => {
                    crypto::dummy_verify(&password, iterations);
                    Ok(false)
                }
            }
        })
        .await
        .map_err(|e| CoreError::Crypto(CryptoError::TaskFailed(e.to_string())))?
        .map_err(CoreError::Crypto)
    }
}
