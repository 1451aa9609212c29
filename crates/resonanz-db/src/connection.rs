//! SurrealDB connection management.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use surrealdb::Surreal;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;

/// Storage engine to connect to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DbEngine {
    /// In-process, in-memory store. Nothing survives a restart.
    #[default]
    Memory,
    /// In-process store persisted under [`DbConfig::path`].
    File,
    /// A SurrealDB server reached over WebSocket at [`DbConfig::url`].
    Remote,
}

/// Configuration for connecting to SurrealDB.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub engine: DbEngine,
    /// Data directory for [`DbEngine::File`].
    pub path: Option<PathBuf>,
    /// Host and port for [`DbEngine::Remote`] (e.g., `127.0.0.1:8000`).
    pub url: String,
    /// SurrealDB namespace.
    pub namespace: String,
    /// SurrealDB database name.
    pub database: String,
    /// Root username, used with [`DbEngine::Remote`] only.
    pub username: String,
    /// Root password, used with [`DbEngine::Remote`] only.
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            engine: DbEngine::Memory,
            path: None,
            url: "127.0.0.1:8000".into(),
            namespace: "resonanz".into(),
            database: "registry".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

impl DbConfig {
    /// Endpoint string understood by `surrealdb::engine::any`.
    pub fn endpoint(&self) -> Result<String, DbError> {
        match self.engine {
            DbEngine::Memory => Ok("mem://".into()),
            DbEngine::File => {
                let path = self.path.as_ref().ok_or_else(|| {
                    DbError::Config("the file engine requires `path`".into())
                })?;
                Ok(format!("surrealkv://{}", path.display()))
            }
            DbEngine::Remote => {
                if self.url.trim().is_empty() {
                    return Err(DbError::Config("the remote engine requires `url`".into()));
                }
                Ok(format!("ws://{}", self.url))
            }
        }
    }
}

/// Manages a connection to SurrealDB.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Any>,
}

impl DbManager {
    /// Connect to SurrealDB using the provided configuration.
    ///
    /// Authenticates as root for remote servers, selects the configured
    /// namespace and database, and returns a ready-to-use manager.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        let endpoint = config.endpoint()?;
        info!(
            endpoint = %endpoint,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );

        let db = any::connect(endpoint).await?;

        if config.engine == DbEngine::Remote {
            db.signin(Root {
                username: config.username.clone(),
                password: config.password.clone(),
            })
            .await?;
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        info!("Successfully connected to SurrealDB");

        Ok(Self { db })
    }

    /// Returns a reference to the underlying SurrealDB client.
    pub fn client(&self) -> &Surreal<Any> {
        &self.db
    }
}
