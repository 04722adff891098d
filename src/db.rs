use async_trait::async_trait;
use chrono::Utc;
use sqlx::{AnyPool, Row};
use std::borrow::Cow;

use crate::error::Result;
use crate::store::{ChannelStore, ContactStore, FlowStore};
use crate::types::{Channel, Contact, FlowEntry, Flows};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    Sqlite,
    Postgres,
}

pub fn db_kind_from_url(url: &str) -> DbKind {
    let lower = url.to_lowercase();
    if lower.starts_with("postgres://") || lower.starts_with("postgresql://") {
        DbKind::Postgres
    } else {
        DbKind::Sqlite
    }
}

pub fn rewrite_sql<'a>(sql: &'a str, kind: DbKind) -> Cow<'a, str> {
    match kind {
        DbKind::Sqlite => Cow::Borrowed(sql),
        DbKind::Postgres => {
            let mut out = String::with_capacity(sql.len() + 8);
            let mut idx = 1;
            for ch in sql.chars() {
                if ch == '?' {
                    out.push('$');
                    out.push_str(&idx.to_string());
                    idx += 1;
                } else {
                    out.push(ch);
                }
            }
            Cow::Owned(out)
        }
    }
}

pub async fn init_db(pool: &AnyPool, kind: DbKind) -> Result<()> {
    let stmts = vec![
        r#"CREATE TABLE IF NOT EXISTS contacts (
            id TEXT PRIMARY KEY,
            urn TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            channel_id TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )"#,
        r#"CREATE TABLE IF NOT EXISTS channels (
            id TEXT PRIMARY KEY,
            uuid TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            token TEXT NOT NULL UNIQUE,
            created_at INTEGER NOT NULL
        )"#,
        r#"CREATE TABLE IF NOT EXISTS flows (
            channel_uuid TEXT PRIMARY KEY,
            flows TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        )"#,
        r#"CREATE TABLE IF NOT EXISTS credentials (
            id INTEGER PRIMARY KEY,
            token TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        )"#,
    ];

    for stmt in stmts {
        let sql = rewrite_sql(stmt, kind);
        sqlx::query(sql.as_ref()).execute(pool).await?;
    }

    Ok(())
}

/// Production adapter for the store traits, one struct shared across all
/// three since they ride the same pool.
#[derive(Clone)]
pub struct SqlStore {
    pool: AnyPool,
    kind: DbKind,
}

impl SqlStore {
    pub fn new(pool: AnyPool, kind: DbKind) -> Self {
        Self { pool, kind }
    }

    /// Provider auth token persisted across restarts, single row.
    pub async fn load_auth_token(&self) -> Result<Option<String>> {
        let sql = rewrite_sql("SELECT token FROM credentials WHERE id = 1", self.kind);
        let row = sqlx::query(sql.as_ref()).fetch_optional(&self.pool).await?;
        Ok(match row {
            Some(row) => Some(row.try_get("token")?),
            None => None,
        })
    }

    pub async fn save_auth_token(&self, token: &str) -> Result<()> {
        let sql = rewrite_sql(
            r#"INSERT INTO credentials (id, token, updated_at) VALUES (1, ?, ?)
               ON CONFLICT(id) DO UPDATE SET token=excluded.token, updated_at=excluded.updated_at"#,
            self.kind,
        );
        sqlx::query(sql.as_ref())
            .bind(token)
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ContactStore for SqlStore {
    async fn find_by_urn(&self, urn: &str) -> Result<Option<Contact>> {
        let sql = rewrite_sql(
            "SELECT id, urn, name, channel_id FROM contacts WHERE urn = ?",
            self.kind,
        );
        let row = sqlx::query(sql.as_ref())
            .bind(urn)
            .fetch_optional(&self.pool)
            .await?;

        Ok(match row {
            Some(row) => Some(Contact {
                id: row.try_get("id")?,
                urn: row.try_get("urn")?,
                name: row.try_get("name")?,
                channel_id: row.try_get("channel_id")?,
            }),
            None => None,
        })
    }

    async fn insert(&self, contact: &Contact) -> Result<()> {
        let now = Utc::now().timestamp();
        let sql = rewrite_sql(
            r#"INSERT INTO contacts (id, urn, name, channel_id, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
            self.kind,
        );
        sqlx::query(sql.as_ref())
            .bind(&contact.id)
            .bind(&contact.urn)
            .bind(&contact.name)
            .bind(contact.channel_id.as_deref())
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_channel(&self, urn: &str, channel_id: &str) -> Result<()> {
        let sql = rewrite_sql(
            "UPDATE contacts SET channel_id = ?, updated_at = ? WHERE urn = ?",
            self.kind,
        );
        sqlx::query(sql.as_ref())
            .bind(channel_id)
            .bind(Utc::now().timestamp())
            .bind(urn)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ChannelStore for SqlStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Channel>> {
        let sql = rewrite_sql(
            "SELECT id, uuid, name, token FROM channels WHERE id = ?",
            self.kind,
        );
        let row = sqlx::query(sql.as_ref())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(read_channel).transpose()?)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Channel>> {
        let sql = rewrite_sql(
            "SELECT id, uuid, name, token FROM channels WHERE token = ?",
            self.kind,
        );
        let row = sqlx::query(sql.as_ref())
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(read_channel).transpose()?)
    }

    async fn insert(&self, channel: &Channel) -> Result<()> {
        let sql = rewrite_sql(
            r#"INSERT INTO channels (id, uuid, name, token, created_at)
               VALUES (?, ?, ?, ?, ?)"#,
            self.kind,
        );
        sqlx::query(sql.as_ref())
            .bind(&channel.id)
            .bind(&channel.uuid)
            .bind(&channel.name)
            .bind(&channel.token)
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn read_channel(row: sqlx::any::AnyRow) -> std::result::Result<Channel, sqlx::Error> {
    Ok(Channel {
        id: row.try_get("id")?,
        uuid: row.try_get("uuid")?,
        name: row.try_get("name")?,
        token: row.try_get("token")?,
    })
}

#[async_trait]
impl FlowStore for SqlStore {
    async fn find_by_channel(&self, channel_uuid: &str) -> Result<Option<Flows>> {
        let sql = rewrite_sql(
            "SELECT channel_uuid, flows FROM flows WHERE channel_uuid = ?",
            self.kind,
        );
        let row = sqlx::query(sql.as_ref())
            .bind(channel_uuid)
            .fetch_optional(&self.pool)
            .await?;

        Ok(match row {
            Some(row) => {
                let raw: String = row.try_get("flows")?;
                let flows: Vec<FlowEntry> = serde_json::from_str(&raw).unwrap_or_default();
                Some(Flows {
                    channel_uuid: row.try_get("channel_uuid")?,
                    flows,
                })
            }
            None => None,
        })
    }

    async fn upsert(&self, flows: &Flows) -> Result<()> {
        let raw = serde_json::to_string(&flows.flows)?;
        let sql = rewrite_sql(
            r#"INSERT INTO flows (channel_uuid, flows, updated_at) VALUES (?, ?, ?)
               ON CONFLICT(channel_uuid) DO UPDATE SET flows=excluded.flows, updated_at=excluded.updated_at"#,
            self.kind,
        );
        sqlx::query(sql.as_ref())
            .bind(&flows.channel_uuid)
            .bind(raw)
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
