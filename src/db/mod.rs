// Keystone persistence (SQLite via sqlx).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// Opaque chat-platform user id (Discord snowflakes fit in i64).
pub type UserId = i64;

/// One registered keystone. A new insertion for the same
/// (owner, character) supersedes the previous record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct KeystoneRecord {
    pub owner_id: UserId,
    pub character: String,
    pub dungeon_id: u32,
    pub level: u32,
}

/// Persistence facade consumed by the command handlers. Handlers never
/// see failure causes; `add_keystone` collapses them to `false` and the
/// query side simply yields no entries.
pub trait KeystoneStore {
    fn add_keystone(&self, record: &KeystoneRecord) -> impl std::future::Future<Output = bool>;

    fn keystones_for_users(
        &self,
        user_ids: &[UserId],
    ) -> impl std::future::Future<Output = HashMap<UserId, Vec<KeystoneRecord>>>;
}

/// SQLite-backed store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        Self::with_pool_size(database_url, 5).await
    }

    /// In-memory store for tests. A single connection, so every query
    /// sees the same database.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        Self::with_pool_size("sqlite::memory:", 1).await
    }

    async fn with_pool_size(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS keystones (
                owner_id INTEGER NOT NULL,
                character TEXT NOT NULL,
                dungeon_id INTEGER NOT NULL,
                level INTEGER NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (owner_id, character)
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn try_add(&self, record: &KeystoneRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO keystones (owner_id, character, dungeon_id, level)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(owner_id, character) DO UPDATE SET
                dungeon_id = excluded.dungeon_id,
                level = excluded.level,
                updated_at = datetime('now')
        "#,
        )
        .bind(record.owner_id)
        .bind(&record.character)
        .bind(record.dungeon_id)
        .bind(record.level)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn keystones_for_user(&self, user_id: UserId) -> Result<Vec<KeystoneRecord>, sqlx::Error> {
        sqlx::query_as::<_, KeystoneRecord>(
            "SELECT owner_id, character, dungeon_id, level FROM keystones \
             WHERE owner_id = ? ORDER BY character",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }
}

impl KeystoneStore for SqliteStore {
    async fn add_keystone(&self, record: &KeystoneRecord) -> bool {
        match self.try_add(record).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("DB error adding keystone: {e}");
                false
            }
        }
    }

    async fn keystones_for_users(
        &self,
        user_ids: &[UserId],
    ) -> HashMap<UserId, Vec<KeystoneRecord>> {
        let mut keys = HashMap::new();
        for &user_id in user_ids {
            match self.keystones_for_user(user_id).await {
                Ok(records) if !records.is_empty() => {
                    keys.insert(user_id, records);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("DB error fetching keystones for {user_id}: {e}");
                }
            }
        }
        keys
    }
}
