use sqlx::{
    Pool, Sqlite, Transaction,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::utils::error::AppResult;

pub type DbPool = Arc<Pool<Sqlite>>;

/// One operation's unit of work. Every authorization read and the write
/// that follows it go through the same handle.
pub type DbTx = Transaction<'static, Sqlite>;

/// How long a writer queues behind another writer before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<DbPool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    Ok(Arc::new(pool))
}

/// A private in-memory database. SQLite gives every connection its own
/// in-memory store, so the pool is pinned to a single connection that is
/// never recycled.
pub async fn create_memory_pool() -> anyhow::Result<DbPool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    Ok(Arc::new(pool))
}

/// Opens a write transaction. The write lock is taken up front, so two
/// operations that check then write are serialized instead of deadlocking
/// on the lock upgrade.
pub async fn begin(pool: &DbPool) -> AppResult<DbTx> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// Opens a read-only transaction. It never blocks writers.
pub async fn begin_read(pool: &DbPool) -> AppResult<DbTx> {
    Ok(pool.begin().await?)
}

pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
