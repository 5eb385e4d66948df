// Credential persistence
// One token pair per realm; only the refresh coordinator and fresh logins
// write, only logout and session teardown clear.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use crate::realm::Realm;

/// Access/refresh token pair for one realm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,

    /// When the pair was issued or last rotated.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            updated_at: Some(Utc::now()),
        }
    }
}

/// Persistent storage for per-realm credentials.
pub trait CredentialStore: Send + Sync {
    fn load(&self, realm: Realm) -> Result<Option<TokenPair>>;
    fn save(&self, realm: Realm, tokens: &TokenPair) -> Result<()>;
    fn clear(&self, realm: Realm) -> Result<()>;
}

/// SQLite-backed credential store. Survives process restarts.
pub struct SqliteStore {
    conn: Mutex<rusqlite::Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = rusqlite::Connection::open(path)
            .with_context(|| format!("Failed to open credential store: {}", path.display()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS auth_kv (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )
        .context("Failed to initialize credential store schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, rusqlite::Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("Credential store lock poisoned"))
    }
}

impl CredentialStore for SqliteStore {
    fn load(&self, realm: Realm) -> Result<Option<TokenPair>> {
        let conn = self.lock()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT value FROM auth_kv WHERE key = ?",
                [realm.storage_key()],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to load token pair from credential store")?;

        match json {
            Some(json) => {
                let tokens =
                    serde_json::from_str(&json).context("Failed to parse stored token pair")?;
                Ok(Some(tokens))
            }
            None => Ok(None),
        }
    }

    fn save(&self, realm: Realm, tokens: &TokenPair) -> Result<()> {
        let json = serde_json::to_string(tokens).context("Failed to serialize token pair")?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO auth_kv (key, value) VALUES (?, ?)",
            [realm.storage_key(), json.as_str()],
        )
        .context("Failed to persist token pair")?;

        tracing::debug!(realm = ?realm, "Stored token pair");
        Ok(())
    }

    fn clear(&self, realm: Realm) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM auth_kv WHERE key = ?",
            [realm.storage_key()],
        )
        .context("Failed to clear stored token pair")?;

        tracing::debug!(realm = ?realm, "Cleared token pair");
        Ok(())
    }
}

/// In-memory credential store for ephemeral sessions and tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<Realm, TokenPair>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Realm, TokenPair>>> {
        self.inner
            .lock()
            .map_err(|_| anyhow::anyhow!("Credential store lock poisoned"))
    }
}

impl CredentialStore for MemoryStore {
    fn load(&self, realm: Realm) -> Result<Option<TokenPair>> {
        Ok(self.lock()?.get(&realm).cloned())
    }

    fn save(&self, realm: Realm, tokens: &TokenPair) -> Result<()> {
        self.lock()?.insert(realm, tokens.clone());
        Ok(())
    }

    fn clear(&self, realm: Realm) -> Result<()> {
        self.lock()?.remove(&realm);
        Ok(())
    }
}
