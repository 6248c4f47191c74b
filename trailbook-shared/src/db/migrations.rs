/// Database migration runner
///
/// Migrations are stored in the `migrations/` directory at the workspace root.
/// Each migration consists of two files:
/// - `{timestamp}_{name}.up.sql` - the "up" migration
/// - `{timestamp}_{name}.down.sql` - the "down" migration (rollback)
///
/// # Example
///
/// ```no_run
/// use trailbook_shared::db::pool::{create_pool, DatabaseConfig};
/// use trailbook_shared::db::migrations::run_migrations;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// run_migrations(&pool).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::postgres::PgPool;
use tracing::info;

/// Runs all pending database migrations
///
/// Migrations are embedded in the binary at compile time and applied in
/// timestamp order. Already-applied migrations are skipped.
///
/// # Errors
///
/// Returns an error if a migration fails to execute or the connection is
/// lost during migration. Failed migrations are rolled back.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");

    sqlx::migrate!("../migrations").run(pool).await?;

    info!("Database migrations complete");
    Ok(())
}
