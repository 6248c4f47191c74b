/// Generic CRUD operations
///
/// Five resource-agnostic operations parameterized by a [`Resource`]
/// descriptor. All statements are built with `sqlx::QueryBuilder`; field
/// names from the client are checked against the descriptor's allow-lists
/// and values are always bound, never interpolated.

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::query::{Filter, Page, QuerySpec, SortDir};
use super::{Resource, SqlValue, StoreError, WriteColumns};

/// Validates the input and inserts a new row
///
/// Runs the resource's `after_write` hook synchronously after persistence,
/// before the created row is returned.
pub async fn create_one<R, I>(pool: &PgPool, input: &I) -> Result<R::Row, StoreError>
where
    R: Resource,
    I: WriteColumns,
{
    input.validate()?;

    let cols = input.columns();
    let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO ");
    qb.push(R::TABLE).push(" (");
    for (i, (name, _)) in cols.iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        qb.push(*name);
    }
    qb.push(") VALUES (");
    for (i, (_, value)) in cols.into_iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        value.push_bind(&mut qb);
    }
    qb.push(") RETURNING ").push(R::COLUMNS);

    let row = qb.build_query_as::<R::Row>().fetch_one(pool).await?;
    R::after_write(pool, &row).await?;
    Ok(row)
}

/// Fetches a single row by id, respecting the resource's default scope
pub async fn get_one<R: Resource>(pool: &PgPool, id: Uuid) -> Result<R::Row, StoreError> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
    qb.push(R::COLUMNS)
        .push(" FROM ")
        .push(R::TABLE)
        .push(" WHERE id = ")
        .push_bind(id);
    if let Some(filter) = R::DEFAULT_FILTER {
        qb.push(" AND (").push(filter).push(")");
    }

    qb.build_query_as::<R::Row>()
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::NotFound)
}

/// Lists rows matching a query spec, with the total match count
///
/// An empty or out-of-range page yields an empty `items` vector, never an
/// error. Filter and sort fields not in the descriptor's allow-lists are
/// ignored.
pub async fn get_all<R: Resource>(pool: &PgPool, spec: &QuerySpec) -> Result<Page<R::Row>, StoreError> {
    let mut qb = build_list_query::<R>(spec);
    let items = qb.build_query_as::<R::Row>().fetch_all(pool).await?;

    let mut cq = build_count_query::<R>(spec);
    let total: i64 = cq.build_query_scalar().fetch_one(pool).await?;

    Ok(Page {
        items,
        total,
        page: spec.page,
        page_size: spec.page_size,
    })
}

/// Validates and applies a partial update
///
/// Only the fields present in the patch are written. An empty patch reads
/// the current row back. Runs `after_write` before returning.
pub async fn update_one<R, I>(pool: &PgPool, id: Uuid, patch: &I) -> Result<R::Row, StoreError>
where
    R: Resource,
    I: WriteColumns,
{
    patch.validate()?;

    let cols = patch.columns();
    if cols.is_empty() {
        return get_one::<R>(pool, id).await;
    }

    let mut qb = QueryBuilder::<Postgres>::new("UPDATE ");
    qb.push(R::TABLE).push(" SET ");
    for (i, (name, value)) in cols.into_iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        qb.push(name).push(" = ");
        value.push_bind(&mut qb);
    }
    qb.push(" WHERE id = ").push_bind(id);
    if let Some(filter) = R::DEFAULT_FILTER {
        qb.push(" AND (").push(filter).push(")");
    }
    qb.push(" RETURNING ").push(R::COLUMNS);

    let row = qb
        .build_query_as::<R::Row>()
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::NotFound)?;
    R::after_write(pool, &row).await?;
    Ok(row)
}

/// Deletes a row by id
///
/// Runs `after_delete` with the removed row before returning, so hooks can
/// see the deleted data (e.g. which tour a review belonged to).
pub async fn delete_one<R: Resource>(pool: &PgPool, id: Uuid) -> Result<(), StoreError> {
    let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM ");
    qb.push(R::TABLE)
        .push(" WHERE id = ")
        .push_bind(id)
        .push(" RETURNING ")
        .push(R::COLUMNS);

    let row = qb
        .build_query_as::<R::Row>()
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::NotFound)?;
    R::after_delete(pool, &row).await?;
    Ok(())
}

fn build_list_query<R: Resource>(spec: &QuerySpec) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
    qb.push(R::COLUMNS).push(" FROM ").push(R::TABLE);
    push_where::<R>(&mut qb, spec);

    let sort_keys: Vec<_> = spec
        .sort
        .iter()
        .filter(|k| R::SORTABLE.contains(&k.field.as_str()))
        .collect();
    if sort_keys.is_empty() {
        qb.push(" ORDER BY created_at DESC");
    } else {
        qb.push(" ORDER BY ");
        for (i, key) in sort_keys.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(key.field.as_str());
            qb.push(match key.dir {
                SortDir::Asc => " ASC",
                SortDir::Desc => " DESC",
            });
        }
    }

    qb.push(" LIMIT ")
        .push_bind(i64::from(spec.page_size))
        .push(" OFFSET ")
        .push_bind(spec.offset());
    qb
}

fn build_count_query<R: Resource>(spec: &QuerySpec) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM ");
    qb.push(R::TABLE);
    push_where::<R>(&mut qb, spec);
    qb
}

fn push_where<R: Resource>(qb: &mut QueryBuilder<'static, Postgres>, spec: &QuerySpec) {
    let mut has_where = false;

    if let Some(filter) = R::DEFAULT_FILTER {
        qb.push(" WHERE (").push(filter).push(")");
        has_where = true;
    }

    for filter in spec
        .filters
        .iter()
        .filter(|f| R::FILTERABLE.contains(&f.field.as_str()))
    {
        qb.push(if has_where { " AND " } else { " WHERE " });
        has_where = true;
        qb.push(filter.field.as_str()).push(filter.op.sql());
        bind_filter_value::<R>(qb, filter);
    }
}

/// Binds a filter value, casting text to the column's declared enum type
///
/// Query-string values arrive untyped, so a filter on an enum column would
/// otherwise bind as text and fail to compare against the column.
fn bind_filter_value<R: Resource>(qb: &mut QueryBuilder<'static, Postgres>, filter: &Filter) {
    let enum_type = R::ENUM_COLUMNS
        .iter()
        .find(|(column, _)| *column == filter.field)
        .map(|(_, pg_type)| *pg_type);

    match (&filter.value, enum_type) {
        (SqlValue::Text(label), Some(pg_type)) => {
            SqlValue::Enum(pg_type, label.clone()).push_bind(qb);
        }
        _ => filter.value.clone().push_bind(qb),
    }
}
