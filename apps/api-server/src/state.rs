//! Application state - shared across all handlers.

use std::sync::Arc;

use blog_core::ports::{
    CommentRepository, PasswordService, PostLikeRepository, PostRepository, TokenService,
    UserRepository,
};
use blog_infra::{Argon2PasswordService, InMemoryStore, JwtTokenService};

use crate::config::AppConfig;

/// Shared application state. Cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub likes: Arc<dyn PostLikeRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    /// Storage backend name, reported by `/health`.
    pub storage: &'static str,
}

impl AppState {
    /// Build the application state, preferring PostgreSQL when configured.
    pub async fn new(config: &AppConfig) -> Self {
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(config.jwt.clone()));
        let passwords: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());

        #[cfg(feature = "postgres")]
        if let Some(db_config) = &config.database {
            match postgres::connect(db_config, config.run_migrations).await {
                Ok(conn) => {
                    let state = postgres::state(conn, tokens, passwords);
                    tracing::info!(storage = state.storage, "Application state initialized");
                    return state;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Database unavailable; falling back to in-memory storage");
                }
            }
        } else {
            tracing::warn!("DATABASE_URL not set; data will not survive a restart");
        }

        let state = Self::in_memory(tokens, passwords);
        tracing::info!(storage = state.storage, "Application state initialized");
        state
    }

    /// State backed by a fresh [`InMemoryStore`].
    pub fn in_memory(tokens: Arc<dyn TokenService>, passwords: Arc<dyn PasswordService>) -> Self {
        let store = Arc::new(InMemoryStore::new());

        Self {
            users: store.clone(),
            posts: store.clone(),
            comments: store.clone(),
            likes: store,
            tokens,
            passwords,
            storage: "memory",
        }
    }
}

#[cfg(feature = "postgres")]
mod postgres {
    use std::sync::Arc;

    use blog_core::ports::{PasswordService, TokenService};
    use blog_infra::database::{
        DatabaseConfig, DatabaseConnections, PostgresCommentRepository,
        PostgresPostLikeRepository, PostgresPostRepository, PostgresUserRepository,
    };
    use migration::{DbErr, Migrator, MigratorTrait};

    use super::AppState;

    /// Open the pool and optionally bring the schema up to date.
    pub(super) async fn connect(
        config: &DatabaseConfig,
        run_migrations: bool,
    ) -> Result<DatabaseConnections, DbErr> {
        let conn = DatabaseConnections::init(config).await?;

        if run_migrations {
            tracing::info!("Applying pending migrations");
            Migrator::up(&conn.main, None).await?;
        }

        Ok(conn)
    }

    pub(super) fn state(
        conn: DatabaseConnections,
        tokens: Arc<dyn TokenService>,
        passwords: Arc<dyn PasswordService>,
    ) -> AppState {
        let db = conn.main;

        AppState {
            users: Arc::new(PostgresUserRepository::new(db.clone())),
            posts: Arc::new(PostgresPostRepository::new(db.clone())),
            comments: Arc::new(PostgresCommentRepository::new(db.clone())),
            likes: Arc::new(PostgresPostLikeRepository::new(db)),
            tokens,
            passwords,
            storage: "postgres",
        }
    }
}
