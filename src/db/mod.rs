use anyhow::{Context, Result};
use sea_orm::{ConnectionTrait, DatabaseConnection, SqlxSqliteConnector, Statement};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::comment::{CommentRow, InsertOutcome, ScoredComment};
pub use repositories::post::PostRow;
pub use repositories::user::{NewUser, ProfileUpdate, User};

/// How long a writer waits for the database lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");
        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
        }

        let mut options = SqliteConnectOptions::from_str(db_url)
            .with_context(|| format!("Invalid database URL: {db_url}"))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);
        if !in_memory {
            options = options
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);
        }

        // Every pooled connection to `:memory:` opens its own empty database,
        // so keep exactly one and never recycle it.
        let mut pool = SqlitePoolOptions::new()
            .acquire_timeout(Duration::from_secs(10));
        pool = if in_memory {
            pool.max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool.max_connections(max_connections)
                .min_connections(min_connections)
                .idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600))
        };

        let pool = pool
            .connect_with(options)
            .await
            .context("Failed to open database")?;
        let conn = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool);

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    #[must_use]
    pub fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn post_repo(&self) -> repositories::post::PostRepository {
        repositories::post::PostRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn comment_repo(&self) -> repositories::comment::CommentRepository {
        repositories::comment::CommentRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn social_repo(&self) -> repositories::social::SocialRepository {
        repositories::social::SocialRepository::new(self.conn.clone())
    }

    // ========== User Repository Methods ==========

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn set_user_reputation(&self, username: &str, score: f64) -> Result<Option<User>> {
        self.user_repo().set_reputation_score(username, score).await
    }

    // ========== Post Repository Methods ==========

    pub async fn get_post(&self, id: i32) -> Result<Option<PostRow>> {
        self.post_repo().get(id).await
    }

    // ========== Comment Repository Methods ==========

    pub async fn insert_scored_comment(&self, scored: ScoredComment<'_>) -> Result<InsertOutcome> {
        self.comment_repo().insert_scored(scored).await
    }
}
