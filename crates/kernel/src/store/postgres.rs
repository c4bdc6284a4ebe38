//! PostgreSQL record storage.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sea_query::{Alias, ColumnDef, Expr, PostgresQueryBuilder, Query, Table};
use sqlx::PgPool;
use tracing::{debug, info};

use super::ContentStore;
use crate::content::{ContentRecord, table_name};
use crate::db;

/// Columns of a record table, in bind order.
const COLUMNS: [&str; 8] = [
    "id",
    "language",
    "sunrise",
    "sunset",
    "approval",
    "publishable",
    "value",
    "author",
];

/// Record storage backed by one PostgreSQL table per content type.
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    /// Create a new store over a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the tables of every given content type.
    pub async fn ensure_tables<'a>(&self, type_slugs: impl IntoIterator<Item = &'a str>) -> Result<()> {
        let mut count = 0;
        for slug in type_slugs {
            self.ensure_table(slug).await?;
            count += 1;
        }
        info!(count, "content record tables ready");
        Ok(())
    }
}

/// `CREATE TABLE IF NOT EXISTS` for a record table.
fn create_table_sql(table: &str) -> String {
    Table::create()
        .table(Alias::new(table))
        .if_not_exists()
        .col(ColumnDef::new(Alias::new("id")).uuid().not_null().primary_key())
        .col(ColumnDef::new(Alias::new("language")).string().not_null())
        .col(ColumnDef::new(Alias::new("sunrise")).timestamp_with_time_zone())
        .col(ColumnDef::new(Alias::new("sunset")).timestamp_with_time_zone())
        .col(
            ColumnDef::new(Alias::new("approval"))
                .integer()
                .not_null()
                .default(0),
        )
        .col(
            ColumnDef::new(Alias::new("publishable"))
                .boolean()
                .not_null()
                .default(false),
        )
        .col(ColumnDef::new(Alias::new("value")).json_binary().not_null())
        .col(ColumnDef::new(Alias::new("author")).uuid().not_null())
        .to_string(PostgresQueryBuilder)
}

/// Parameterized `INSERT` for a record table; values bind as `$1..$8`.
fn insert_sql(table: &str) -> Result<String> {
    let mut query = Query::insert();
    query
        .into_table(Alias::new(table))
        .columns(COLUMNS.iter().map(|c| Alias::new(*c)))
        .values((1..=COLUMNS.len()).map(|i| Expr::cust(format!("${i}"))))
        .context("failed to build insert statement")?;

    Ok(query.to_string(PostgresQueryBuilder))
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn ensure_table(&self, type_slug: &str) -> Result<()> {
        let table = table_name(type_slug);
        sqlx::query(&create_table_sql(&table))
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to create table {table}"))?;

        debug!(table = %table, "record table ensured");
        Ok(())
    }

    async fn insert(&self, type_slug: &str, record: &ContentRecord) -> Result<()> {
        let table = table_name(type_slug);
        let sql = insert_sql(&table)?;

        sqlx::query(&sql)
            .bind(record.id)
            .bind(&record.language)
            .bind(record.sunrise)
            .bind(record.sunset)
            .bind(record.approval)
            .bind(record.publishable)
            .bind(&record.value)
            .bind(record.author)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to insert record into {table}"))?;

        debug!(table = %table, id = %record.id, "record inserted");
        Ok(())
    }

    async fn health(&self) -> bool {
        db::check_health(&self.pool).await
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn create_table_quotes_dashed_names() {
        let sql = create_table_sql("content-type--services");
        assert!(
            sql.starts_with(r#"CREATE TABLE IF NOT EXISTS "content-type--services""#),
            "{sql}"
        );
        assert!(sql.contains(r#""value" jsonb"#), "{sql}");
        assert!(sql.contains(r#""sunrise" timestamp with time zone"#), "{sql}");
    }

    #[test]
    fn insert_uses_placeholders() {
        let sql = insert_sql("content-type--services").unwrap();
        assert!(
            sql.starts_with(r#"INSERT INTO "content-type--services""#),
            "{sql}"
        );
        assert!(
            sql.contains(r#"("id", "language", "sunrise", "sunset", "approval", "publishable", "value", "author")"#),
            "{sql}"
        );
        assert!(sql.contains("VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"), "{sql}");
    }
}
