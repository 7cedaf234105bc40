//! PostgreSQL implementation of the link store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use std::ops::DerefMut;
use std::sync::Arc;

use crate::domain::entities::{Link, LinkCounts, LinkStatus, NewLink};
use crate::domain::repositories::{LinkRepository, LinkStore, LinkTransaction};
use crate::error::AppError;

const FIND_BY_ID: &str = r#"
    SELECT id, original, short, status, created_at, updated_at
    FROM links
    WHERE id = $1
"#;

const FIND_BY_ORIGINAL: &str = r#"
    SELECT id, original, short, status, created_at, updated_at
    FROM links
    WHERE original = $1 AND owner_id = $2
"#;

const FIND_BY_SHORT: &str = r#"
    SELECT id, original, short, status, created_at, updated_at
    FROM links
    WHERE short = $1
"#;

const LIST_BY_OWNER: &str = r#"
    SELECT id, original, short, status, created_at, updated_at
    FROM links
    WHERE owner_id = $1 AND ($2::smallint IS NULL OR status = $2)
    ORDER BY created_at, id
"#;

#[derive(sqlx::FromRow)]
struct LinkRow {
    id: String,
    original: String,
    short: String,
    status: i16,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LinkRow> for Link {
    type Error = AppError;

    fn try_from(row: LinkRow) -> Result<Self, Self::Error> {
        Ok(Link {
            status: LinkStatus::try_from(row.status)?,
            id: row.id,
            original: row.original,
            short: row.short,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Link repository running on one PostgreSQL connection.
///
/// `C` is either a pooled connection (autocommit) or an open
/// [`Transaction`]; every query goes through `&mut *conn`.
pub struct PgLinkRepository<C> {
    conn: C,
}

impl<C> PgLinkRepository<C>
where
    C: DerefMut<Target = PgConnection> + Send,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    async fn fetch_link(
        &mut self,
        operation: &'static str,
        sql: &'static str,
        args: &[&str],
    ) -> Result<Option<Link>, AppError> {
        let mut query = sqlx::query_as::<_, LinkRow>(sql);
        for arg in args {
            query = query.bind(*arg);
        }

        query
            .fetch_optional(&mut *self.conn)
            .await
            .map_err(|e| AppError::from_sqlx(operation, e))?
            .map(Link::try_from)
            .transpose()
    }
}

#[async_trait]
impl<C> LinkRepository for PgLinkRepository<C>
where
    C: DerefMut<Target = PgConnection> + Send,
{
    async fn find_by_id(&mut self, id: &str) -> Result<Option<Link>, AppError> {
        self.fetch_link("links.find_by_id", FIND_BY_ID, &[id]).await
    }

    async fn find_by_original(
        &mut self,
        original: &str,
        owner_id: &str,
    ) -> Result<Option<Link>, AppError> {
        self.fetch_link(
            "links.find_by_original",
            FIND_BY_ORIGINAL,
            &[original, owner_id],
        )
        .await
    }

    async fn find_by_short(&mut self, short: &str) -> Result<Option<Link>, AppError> {
        self.fetch_link("links.find_by_short", FIND_BY_SHORT, &[short])
            .await
    }

    async fn get_id_by_original(
        &mut self,
        original: &str,
        owner_id: &str,
    ) -> Result<Option<String>, AppError> {
        sqlx::query_scalar::<_, String>(
            "SELECT id FROM links WHERE original = $1 AND owner_id = $2",
        )
        .bind(original)
        .bind(owner_id)
        .fetch_optional(&mut *self.conn)
        .await
        .map_err(|e| AppError::from_sqlx("links.get_id_by_original", e))
    }

    async fn list_by_owner(
        &mut self,
        owner_id: &str,
        status: Option<LinkStatus>,
    ) -> Result<Vec<Link>, AppError> {
        let rows = sqlx::query_as::<_, LinkRow>(LIST_BY_OWNER)
            .bind(owner_id)
            .bind(status.map(LinkStatus::as_i16))
            .fetch_all(&mut *self.conn)
            .await
            .map_err(|e| AppError::from_sqlx("links.list_by_owner", e))?;

        rows.into_iter().map(Link::try_from).collect()
    }

    async fn count_by_owner(&mut self, owner_id: &str) -> Result<LinkCounts, AppError> {
        let (total, active) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE status = 1)
            FROM links
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(&mut *self.conn)
        .await
        .map_err(|e| AppError::from_sqlx("links.count_by_owner", e))?;

        Ok(LinkCounts { total, active })
    }

    async fn insert(&mut self, link: &NewLink, owner_id: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO links (id, owner_id, original, short, status)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&link.id)
        .bind(owner_id)
        .bind(&link.original)
        .bind(&link.short)
        .bind(link.status.as_i16())
        .execute(&mut *self.conn)
        .await
        .map_err(|e| {
            let on_primary_key = e
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation() && db.constraint() == Some("links_pkey"));

            if on_primary_key {
                AppError::id_conflict(&link.id)
            } else {
                AppError::from_sqlx("links.insert", e)
            }
        })?;

        Ok(())
    }

    async fn update_status(&mut self, id: &str, status: LinkStatus) -> Result<(), AppError> {
        sqlx::query("UPDATE links SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status.as_i16())
            .execute(&mut *self.conn)
            .await
            .map_err(|e| AppError::from_sqlx("links.update_status", e))?;

        Ok(())
    }
}

#[async_trait]
impl LinkTransaction for PgLinkRepository<Transaction<'static, Postgres>> {
    async fn commit(self) -> Result<(), AppError> {
        self.conn
            .commit()
            .await
            .map_err(|e| AppError::from_sqlx("links.commit", e))
    }

    async fn rollback(self) -> Result<(), AppError> {
        self.conn
            .rollback()
            .await
            .map_err(|e| AppError::from_sqlx("links.rollback", e))
    }
}

/// PostgreSQL link store backed by a connection pool.
#[derive(Clone)]
pub struct PgLinkStore {
    pool: Arc<PgPool>,
}

impl PgLinkStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LinkStore for PgLinkStore {
    type Tx = PgLinkRepository<Transaction<'static, Postgres>>;
    type Conn = PgLinkRepository<PoolConnection<Postgres>>;

    async fn begin(&self) -> Result<Self::Tx, AppError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::store("links.begin", e))?;

        Ok(PgLinkRepository::new(tx))
    }

    async fn acquire(&self) -> Result<Self::Conn, AppError> {
        let conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| AppError::store("links.acquire", e))?;

        Ok(PgLinkRepository::new(conn))
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .map_err(|e| AppError::store("links.ping", e))?;

        Ok(())
    }
}
