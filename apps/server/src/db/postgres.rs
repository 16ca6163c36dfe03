//! PostgreSQL-backed `Store` implementation

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::{postgres::PgArguments, query::Query, PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use super::{Page, Predicate, RecordQuery, Store, UnitOfWork};
use crate::{models::EntityKind, Error, Result};

/// PostgreSQL-backed Store implementation
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await.map_err(Error::Database)?;
        Ok(Box::new(PostgresUnitOfWork { tx }))
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}

struct PostgresUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

enum Bind {
    Json(JsonValue),
    Text(String),
}

/// `kind = $1 AND <predicates>`; returns the clause and the values for
/// `$2..`.
fn where_clause(predicates: &[Predicate]) -> (String, Vec<Bind>) {
    let mut binds = Vec::new();
    let mut clauses = vec!["kind = $1".to_string()];
    clauses.extend(predicates.iter().map(|p| translate(p, &mut binds)));
    (clauses.join(" AND "), binds)
}

// Field names are static identifiers, never client input.
fn translate(predicate: &Predicate, binds: &mut Vec<Bind>) -> String {
    match predicate {
        Predicate::Eq { field, value } => {
            binds.push(Bind::Json(value.clone()));
            format!("resource->'{field}' = ${}::jsonb", binds.len() + 1)
        }
        Predicate::NotEq { field, value } => {
            binds.push(Bind::Json(value.clone()));
            format!(
                "(resource->'{field}') IS DISTINCT FROM ${}::jsonb",
                binds.len() + 1
            )
        }
        Predicate::IsNull(field) => {
            format!("COALESCE(resource->'{field}', 'null'::jsonb) = 'null'::jsonb")
        }
        Predicate::NotNull(field) => {
            format!("COALESCE(resource->'{field}', 'null'::jsonb) <> 'null'::jsonb")
        }
        Predicate::Search { fields, term } => {
            binds.push(Bind::Text(like_pattern(term)));
            let n = binds.len() + 1;
            let any = fields
                .iter()
                .map(|field| format!("COALESCE(resource->>'{field}', '') ILIKE ${n} ESCAPE '\\'"))
                .collect::<Vec<_>>()
                .join(" OR ");
            format!("({any})")
        }
        Predicate::Any(inner) if inner.is_empty() => "FALSE".to_string(),
        Predicate::Any(inner) => {
            let any = inner
                .iter()
                .map(|p| translate(p, binds))
                .collect::<Vec<_>>()
                .join(" OR ");
            format!("({any})")
        }
    }
}

fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    binds: Vec<Bind>,
) -> Query<'q, Postgres, PgArguments> {
    for bind in binds {
        query = match bind {
            Bind::Json(value) => query.bind(value),
            Bind::Text(text) => query.bind(text),
        };
    }
    query
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn fetch(&mut self, kind: EntityKind, id: Uuid) -> Result<Option<JsonValue>> {
        let row = sqlx::query("SELECT resource FROM records WHERE kind = $1 AND id = $2")
            .bind(kind.as_str())
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(Error::Database)?;
        Ok(row.map(|r| r.get("resource")))
    }

    async fn insert(&mut self, kind: EntityKind, id: Uuid, document: JsonValue) -> Result<()> {
        sqlx::query("INSERT INTO records (kind, id, resource) VALUES ($1, $2, $3)")
            .bind(kind.as_str())
            .bind(id)
            .bind(document)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn replace(&mut self, kind: EntityKind, id: Uuid, document: JsonValue) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE records SET resource = $3, last_updated = NOW()
             WHERE kind = $1 AND id = $2",
        )
        .bind(kind.as_str())
        .bind(id)
        .bind(document)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_where(&mut self, kind: EntityKind, predicates: &[Predicate]) -> Result<u64> {
        let (clause, binds) = where_clause(predicates);
        let sql = format!("DELETE FROM records WHERE {clause}");
        let result = bind_all(sqlx::query(&sql).bind(kind.as_str()), binds)
            .execute(&mut *self.tx)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }

    async fn find_ids(&mut self, kind: EntityKind, predicates: &[Predicate]) -> Result<Vec<Uuid>> {
        let (clause, binds) = where_clause(predicates);
        let sql = format!("SELECT id FROM records WHERE {clause} ORDER BY seq");
        let rows = bind_all(sqlx::query(&sql).bind(kind.as_str()), binds)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(Error::Database)?;
        Ok(rows.into_iter().map(|r| r.get("id")).collect())
    }

    async fn query(&mut self, kind: EntityKind, query: &RecordQuery) -> Result<Page<JsonValue>> {
        let (clause, binds) = where_clause(&query.predicates);

        let count_sql = format!("SELECT COUNT(*) AS total FROM records WHERE {clause}");
        let total: i64 = bind_all(sqlx::query(&count_sql).bind(kind.as_str()), binds)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(Error::Database)?
            .get("total");

        let (clause, binds) = where_clause(&query.predicates);
        let n = binds.len() + 2;
        let sql = format!(
            "SELECT resource FROM records WHERE {clause}
             ORDER BY seq
             OFFSET ${n} LIMIT ${}",
            n + 1
        );
        let rows = bind_all(sqlx::query(&sql).bind(kind.as_str()), binds)
            .bind(query.offset.unwrap_or(0) as i64)
            .bind(query.limit.map(|l| l as i64))
            .fetch_all(&mut *self.tx)
            .await
            .map_err(Error::Database)?;

        Ok(Page {
            items: rows.into_iter().map(|r| r.get("resource")).collect(),
            total: total.max(0) as u64,
        })
    }

    async fn fetch_attachment(&mut self, kind: EntityKind, id: Uuid) -> Result<Option<Vec<u8>>> {
        let row = sqlx::query("SELECT attachment FROM records WHERE kind = $1 AND id = $2")
            .bind(kind.as_str())
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(Error::Database)?;
        Ok(row.and_then(|r| r.get::<Option<Vec<u8>>, _>("attachment")))
    }

    async fn store_attachment(
        &mut self,
        kind: EntityKind,
        id: Uuid,
        content: &[u8],
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE records SET attachment = $3, last_updated = NOW()
             WHERE kind = $1 AND id = $2",
        )
        .bind(kind.as_str())
        .bind(id)
        .bind(content)
        .execute(&mut *self.tx)
        .await
        .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(Error::Database)
    }
}
