//! Vendor API key storage and lookup
//!
//! Keys are probed from JSON key files first (shared data volume, local
//! data directory), then from a SQLite settings database. Loaded names are
//! normalized to vendor service names so the rest of the system only ever
//! sees `openai`, `anthropic`, `together`, `cohere`, `mistral`, ...

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::Row;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// File name of the JSON key file inside the data directory.
pub const KEY_FILE: &str = "api_keys.json";

/// Environment-variable style names mapped to vendor service names.
fn normalize_service(raw: &str) -> String {
    match raw {
        "OPENAI_API_KEY" | "chatgpt_api_key" => "openai".to_string(),
        "ANTHROPIC_API_KEY" | "claude_api_key" => "anthropic".to_string(),
        "TOGETHER_AI_API_KEY" | "llama_api_key" => "together".to_string(),
        "COHERE_API_KEY" => "cohere".to_string(),
        "MISTRAL_API_KEY" => "mistral".to_string(),
        other => other.to_lowercase(),
    }
}

fn is_placeholder(value: &str) -> bool {
    value.is_empty() || value == "your-api-key" || value.starts_with("your-")
}

/// In-memory view of the vendor keys, plus the path writes go to.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    data_dir: PathBuf,
    keys: HashMap<String, String>,
}

impl CredentialStore {
    /// Probe the known key locations and build the store.
    ///
    /// Lookup order: `<data_dir>/api_keys.json`, `/data/api_keys.json`,
    /// `./data/api_keys.json`, `../data/api_keys.json`; first parseable
    /// file wins. With no file hit, the SQLite databases next to the data
    /// directory are consulted. Unreadable candidates are logged and
    /// skipped — an empty store is a valid (if useless) outcome.
    pub async fn load(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();

        let mut raw = HashMap::new();
        for candidate in Self::key_file_candidates(&data_dir) {
            match Self::read_key_file(&candidate).await {
                Ok(Some(keys)) => {
                    tracing::info!(path = %candidate.display(), "loaded API keys");
                    raw = keys;
                    break;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(path = %candidate.display(), error = %e, "failed to read key file");
                }
            }
        }

        if raw.is_empty() {
            raw = Self::load_from_sqlite(&data_dir).await;
        }

        let keys: HashMap<String, String> = raw
            .into_iter()
            .filter(|(_, value)| !is_placeholder(value))
            .map(|(name, value)| (normalize_service(&name), value))
            .collect();

        if keys.is_empty() {
            tracing::warn!("no API keys found; no model backends will be available");
        }

        Self { data_dir, keys }
    }

    fn key_file_candidates(data_dir: &Path) -> Vec<PathBuf> {
        vec![
            data_dir.join(KEY_FILE),
            PathBuf::from("/data").join(KEY_FILE),
            PathBuf::from("./data").join(KEY_FILE),
            PathBuf::from("../data").join(KEY_FILE),
        ]
    }

    async fn read_key_file(path: &Path) -> Result<Option<HashMap<String, String>>, StorageError> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = tokio::fs::read_to_string(path).await?;
        let keys: HashMap<String, String> = serde_json::from_str(&raw)?;
        Ok(Some(keys))
    }

    /// Fall back to SQLite: an `api_keys(service, key)` table, then any
    /// `settings(key, value)` rows whose key mentions an api key.
    async fn load_from_sqlite(data_dir: &Path) -> HashMap<String, String> {
        let candidates = [
            data_dir.join("quorum.db"),
            PathBuf::from("./quorum.db"),
            PathBuf::from("/data/quorum.db"),
        ];

        for db_path in candidates {
            if !db_path.exists() {
                continue;
            }
            match Self::query_sqlite(&db_path).await {
                Ok(keys) if !keys.is_empty() => {
                    tracing::info!(
                        path = %db_path.display(),
                        count = keys.len(),
                        "loaded API keys from database"
                    );
                    return keys;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(path = %db_path.display(), error = %e, "database key lookup failed");
                }
            }
        }
        HashMap::new()
    }

    async fn query_sqlite(db_path: &Path) -> Result<HashMap<String, String>, StorageError> {
        let url = format!("sqlite:{}", db_path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut keys = HashMap::new();

        let has_api_keys: Option<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name='api_keys'",
        )
        .fetch_optional(&pool)
        .await?;
        if has_api_keys.is_some() {
            let rows = sqlx::query("SELECT service, key FROM api_keys WHERE key IS NOT NULL")
                .fetch_all(&pool)
                .await?;
            for row in rows {
                let service: String = row.try_get(0)?;
                let key: String = row.try_get(1)?;
                keys.insert(service, key);
            }
        }

        let has_settings: Option<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name='settings'",
        )
        .fetch_optional(&pool)
        .await?;
        if has_settings.is_some() {
            let rows = sqlx::query(
                "SELECT key, value FROM settings WHERE key LIKE '%api_key%' OR key LIKE '%API_KEY%'",
            )
            .fetch_all(&pool)
            .await?;
            for row in rows {
                let name: String = row.try_get(0)?;
                let value: Option<String> = row.try_get(1)?;
                if let Some(value) = value {
                    keys.insert(name, value);
                }
            }
        }

        pool.close().await;
        Ok(keys)
    }

    pub fn get(&self, service: &str) -> Option<&str> {
        self.keys.get(service).map(String::as_str)
    }

    /// Add or replace a key. The caller persists with [`save`](Self::save)
    /// and rebuilds the model registry afterwards.
    pub fn set(&mut self, service: &str, key: impl Into<String>) {
        self.keys.insert(normalize_service(service), key.into());
    }

    /// All keys by vendor service name.
    pub fn all(&self) -> &HashMap<String, String> {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Write the key file back to the data directory.
    pub async fn save(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.data_dir).await?;
        let path = self.data_dir.join(KEY_FILE);
        let raw = serde_json::to_string_pretty(&self.keys)?;
        tokio::fs::write(&path, raw).await?;
        tracing::info!(path = %path.display(), count = self.keys.len(), "API keys saved");
        Ok(())
    }
}
