/// Database utilities
///
/// - [`pool`]: PostgreSQL connection pool creation and health checks
/// - [`migrations`]: schema migration runner

pub mod migrations;
pub mod pool;
