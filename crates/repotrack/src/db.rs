//! Database connection utilities.
//!
//! The returned [`DatabaseConnection`] is a connection pool: create it once at
//! startup and hand it to [`crate::store::DbStore`]. Broken pooled connections
//! are re-opened on demand by the pool, and [`connect`] itself retries
//! transient failures while the database comes up.

use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, RuntimeErr};

/// Attempts made by [`connect`] before giving up.
pub const CONNECT_MAX_RETRIES: usize = 4;

const CONNECT_MIN_DELAY: Duration = Duration::from_millis(250);
const CONNECT_MAX_DELAY: Duration = Duration::from_secs(5);

/// Configure SQLite-specific pragmas.
///
/// - `journal_mode=WAL` so the scheduler and the menu can read while a pull writes
/// - `busy_timeout=5000` to wait for locks instead of failing immediately
/// - `synchronous=NORMAL`, which is safe with WAL
/// - `foreign_keys=ON` so deleting a repository cascades to its commits
async fn configure_sqlite(db: &DatabaseConnection) -> Result<(), DbErr> {
    use sea_orm::{ConnectionTrait, Statement};

    for pragma in [
        "PRAGMA journal_mode=WAL",
        "PRAGMA busy_timeout=5000",
        "PRAGMA synchronous=NORMAL",
        "PRAGMA foreign_keys=ON",
    ] {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            pragma.to_string(),
        ))
        .await?;
    }

    Ok(())
}

/// Driver-level connection failures are worth retrying; sea-orm's own
/// `Internal` errors (unsupported scheme, malformed URL) are not.
fn is_transient(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) => true,
        DbErr::Conn(RuntimeErr::Internal(_)) => false,
        DbErr::Conn(_) => true,
        _ => false,
    }
}

/// Establish a connection to the database.
///
/// Connection errors are retried with exponential backoff; configuration
/// errors (bad URL, unknown scheme) fail immediately.
///
/// # Arguments
/// * `database_url` - e.g. `sqlite:///path/to/repotrack.db?mode=rwc` or `postgres:///repotrack`
///
/// # Errors
/// Returns `DbErr` if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url.to_string());
    options.sqlx_logging(false);

    let open = || async { Database::connect(options.clone()).await };
    let db = open
        .retry(
            ExponentialBuilder::default()
                .with_min_delay(CONNECT_MIN_DELAY)
                .with_max_delay(CONNECT_MAX_DELAY)
                .with_max_times(CONNECT_MAX_RETRIES),
        )
        .when(is_transient)
        .notify(|err, delay| {
            tracing::warn!(error = %err, ?delay, "Database connection failed, retrying");
        })
        .await?;

    if database_url.starts_with("sqlite:") {
        configure_sqlite(&db).await?;
    }

    Ok(db)
}

/// Create or upgrade the schema. Safe to call on every startup.
///
/// # Errors
/// Returns `DbErr` if a migration fails.
#[cfg(feature = "migrate")]
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    use sea_orm_migration::MigratorTrait;

    crate::migration::Migrator::up(db, None).await
}

/// Connect and run [`ensure_schema`].
///
/// # Example
/// ```ignore
/// let db = repotrack::connect_and_migrate("sqlite::memory:").await?;
/// ```
#[cfg(feature = "migrate")]
pub async fn connect_and_migrate(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = connect(database_url).await?;
    ensure_schema(&db).await?;
    Ok(db)
}
