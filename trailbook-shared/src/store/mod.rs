/// Generic CRUD store
///
/// This module provides resource-agnostic create/read/update/delete/list
/// operations parameterized by a [`Resource`] descriptor. Query construction
/// is decoupled from execution via an explicit [`query::QuerySpec`] value, and
/// lifecycle hooks are explicit pipeline steps on the descriptor rather than
/// hidden ORM callbacks.
///
/// # Modules
///
/// - [`query`]: query-specification object (filter/sort/fields/pagination)
/// - [`factory`]: the five generic operations
///
/// # Example
///
/// ```no_run
/// use trailbook_shared::models::tour::{Tour, CreateTour};
/// use trailbook_shared::store::{factory, query::QuerySpec};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, input: CreateTour) -> Result<(), Box<dyn std::error::Error>> {
/// let tour = factory::create_one::<Tour, _>(&pool, &input).await?;
/// let page = factory::get_all::<Tour>(&pool, &QuerySpec::default()).await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::{PgRow, Postgres};
use sqlx::{FromRow, PgPool, QueryBuilder};
use uuid::Uuid;
use validator::Validate;

pub mod factory;
pub mod query;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No row matched the identifier (or it is excluded by the default scope)
    #[error("resource not found")]
    NotFound,

    /// Input failed schema validation
    #[error("validation failed")]
    Validation(#[from] validator::ValidationErrors),

    /// Underlying database failure (including unique-constraint violations)
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// True if this is a unique-constraint violation
    pub fn is_unique_violation(&self) -> bool {
        match self {
            StoreError::Database(sqlx::Error::Database(db_err)) => {
                db_err.code().as_deref() == Some("23505")
            }
            _ => false,
        }
    }
}

/// A bindable SQL value for dynamically built statements
///
/// Write inputs describe themselves as `(column, SqlValue)` pairs; the factory
/// binds every value as a parameter, never splicing it into the SQL text.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    TextArray(Vec<String>),
    TimestampArray(Vec<DateTime<Utc>>),
    /// A Postgres enum value: (pg type name, label). Bound as text and cast.
    Enum(&'static str, String),
    Null,
}

impl SqlValue {
    /// Pushes this value onto a query builder as a bound parameter
    pub fn push_bind(self, qb: &mut QueryBuilder<'static, Postgres>) {
        match self {
            SqlValue::Text(v) => {
                qb.push_bind(v);
            }
            SqlValue::Int(v) => {
                qb.push_bind(v);
            }
            SqlValue::Float(v) => {
                qb.push_bind(v);
            }
            SqlValue::Bool(v) => {
                qb.push_bind(v);
            }
            SqlValue::Uuid(v) => {
                qb.push_bind(v);
            }
            SqlValue::Timestamp(v) => {
                qb.push_bind(v);
            }
            SqlValue::TextArray(v) => {
                qb.push_bind(v);
            }
            SqlValue::TimestampArray(v) => {
                qb.push_bind(v);
            }
            SqlValue::Enum(pg_type, label) => {
                qb.push_bind(label);
                qb.push("::");
                qb.push(pg_type);
            }
            SqlValue::Null => {
                qb.push("NULL");
            }
        }
    }
}

/// Resource-type descriptor driving the generic operations
///
/// `DEFAULT_FILTER` is the explicit replacement for pre-find hooks: a SQL
/// predicate applied to every read (e.g. `active` users, non-secret tours).
/// `after_write`/`after_delete` are explicit post-persistence steps that run
/// before the operation's result is returned (e.g. recomputing a tour's
/// rating aggregate when a review changes).
#[async_trait]
pub trait Resource: Send + Sync {
    /// Table name
    const TABLE: &'static str;

    /// Comma-separated column list used for SELECT and RETURNING
    const COLUMNS: &'static str;

    /// Predicate scoping all reads, or None
    const DEFAULT_FILTER: Option<&'static str> = None;

    /// Fields clients may filter on
    const FILTERABLE: &'static [&'static str] = &[];

    /// Fields clients may sort on
    const SORTABLE: &'static [&'static str] = &[];

    /// Filterable columns backed by a Postgres enum, as (column, pg type
    /// name) pairs; text filter values on these columns are cast on bind
    const ENUM_COLUMNS: &'static [(&'static str, &'static str)] = &[];

    /// The row type returned by every operation
    type Row: for<'r> FromRow<'r, PgRow> + Serialize + Send + Sync + Unpin;

    /// Runs synchronously after a successful insert or update
    async fn after_write(_pool: &PgPool, _row: &Self::Row) -> Result<(), StoreError> {
        Ok(())
    }

    /// Runs synchronously after a successful delete, with the deleted row
    async fn after_delete(_pool: &PgPool, _row: &Self::Row) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Write input for `create_one`/`update_one`
///
/// Implementors list the columns they set. For partial updates only the
/// present fields appear, so validation re-runs on changed fields only.
pub trait WriteColumns: Validate + Send + Sync {
    fn columns(&self) -> Vec<(&'static str, SqlValue)>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_value_text_bind() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        SqlValue::Text("hello".to_string()).push_bind(&mut qb);
        assert_eq!(qb.sql(), "SELECT $1");
    }

    #[test]
    fn test_sql_value_enum_bind_casts() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        SqlValue::Enum("tour_difficulty", "easy".to_string()).push_bind(&mut qb);
        assert_eq!(qb.sql(), "SELECT $1::tour_difficulty");
    }

    #[test]
    fn test_sql_value_null_is_literal() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        SqlValue::Null.push_bind(&mut qb);
        assert_eq!(qb.sql(), "SELECT NULL");
    }
}
