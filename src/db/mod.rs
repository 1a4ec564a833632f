//! Database handle.
//!
//! The server only needs the connection to exist and answer a ping before it
//! accepts traffic; domain queries belong to the routers that receive a clone
//! of [`Database`].

use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, DatabaseBackend, DatabaseConnection, DbErr};

use crate::config::DatabaseConfig;

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("failed to connect to database: {0}")]
    Connect(#[source] DbErr),

    #[error("database did not answer ping: {0}")]
    Ping(#[source] DbErr),
}

/// Shared connection pool. Cloning is cheap.
#[derive(Clone)]
pub struct Database {
    conn: DatabaseConnection,
}

impl Database {
    /// Open the pool and verify it with a ping.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let timeout = Duration::from_secs(config.connect_timeout_secs);
        let mut opt = ConnectOptions::new(config.url.clone());
        opt.sqlx_logging(false)
            .connect_timeout(timeout)
            .acquire_timeout(timeout);

        let conn = sea_orm::Database::connect(opt)
            .await
            .map_err(DatabaseError::Connect)?;
        conn.ping().await.map_err(DatabaseError::Ping)?;

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<(), DbErr> {
        self.conn.ping().await
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    pub fn backend(&self) -> DatabaseBackend {
        self.conn.get_database_backend()
    }

    pub async fn close(self) -> Result<(), DbErr> {
        self.conn.close().await
    }
}
