use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::bracket::BracketData;
use crate::config::{resolve_repo_path, AppConfig};
use crate::error::PicksError;

/// On-disk envelope for one user's picks in one tournament.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPrediction {
    pub user: String,
    pub tournament_id: String,
    pub bracket_data: BracketData,
    pub created_at: DateTime<Utc>,
}

/// Persistence gateway for bracket snapshots, keyed by user and tournament.
/// Saving overwrites any prior snapshot for the same pair.
#[allow(async_fn_in_trait)]
pub trait BracketStore {
    async fn load_bracket(
        &self,
        user_id: &str,
        tournament_id: &str,
    ) -> Result<Option<BracketData>, PicksError>;

    async fn save_bracket(
        &self,
        user_id: &str,
        tournament_id: &str,
        bracket: &BracketData,
    ) -> Result<(), PicksError>;
}

// ── In-memory store ────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryBracketStore {
    records: Mutex<HashMap<(String, String), BracketData>>,
}

impl MemoryBracketStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BracketStore for MemoryBracketStore {
    async fn load_bracket(
        &self,
        user_id: &str,
        tournament_id: &str,
    ) -> Result<Option<BracketData>, PicksError> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records
            .get(&(user_id.to_string(), tournament_id.to_string()))
            .cloned())
    }

    async fn save_bracket(
        &self,
        user_id: &str,
        tournament_id: &str,
        bracket: &BracketData,
    ) -> Result<(), PicksError> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.insert(
            (user_id.to_string(), tournament_id.to_string()),
            bracket.clone(),
        );
        Ok(())
    }
}

// ── JSON file store ────────────────────────────────────────────────────

/// One JSON file per user×tournament under a data directory.
pub struct JsonFileBracketStore {
    dir: PathBuf,
}

impl JsonFileBracketStore {
    pub fn new(dir: PathBuf) -> Self {
        JsonFileBracketStore { dir }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        JsonFileBracketStore::new(resolve_repo_path(&config.data_dir))
    }

    fn record_path(&self, user_id: &str, tournament_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}__{}.json", sanitize_key(user_id), sanitize_key(tournament_id)))
    }

    async fn read_record(
        &self,
        user_id: &str,
        tournament_id: &str,
    ) -> Result<Option<StoredPrediction>, PicksError> {
        let path = self.record_path(user_id, tournament_id);
        if !path.is_file() {
            return Ok(None);
        }
        let data = fs::read_to_string(&path)
            .await
            .map_err(|e| PicksError::Persistence(format!("read prediction {}: {e}", path.display())))?;
        let record = serde_json::from_str::<StoredPrediction>(&data)
            .map_err(|e| PicksError::Persistence(format!("parse prediction {}: {e}", path.display())))?;
        Ok(Some(record))
    }
}

fn sanitize_key(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

impl BracketStore for JsonFileBracketStore {
    async fn load_bracket(
        &self,
        user_id: &str,
        tournament_id: &str,
    ) -> Result<Option<BracketData>, PicksError> {
        Ok(self
            .read_record(user_id, tournament_id)
            .await?
            .map(|record| record.bracket_data))
    }

    async fn save_bracket(
        &self,
        user_id: &str,
        tournament_id: &str,
        bracket: &BracketData,
    ) -> Result<(), PicksError> {
        // Upserts keep the original creation stamp.
        let created_at = self
            .read_record(user_id, tournament_id)
            .await
            .ok()
            .flatten()
            .map(|record| record.created_at)
            .unwrap_or_else(Utc::now);
        let record = StoredPrediction {
            user: user_id.to_string(),
            tournament_id: tournament_id.to_string(),
            bracket_data: bracket.clone(),
            created_at,
        };
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PicksError::Persistence(format!("create data dir {}: {e}", self.dir.display())))?;
        let path = self.record_path(user_id, tournament_id);
        let payload = serde_json::to_string_pretty(&record)
            .map_err(|e| PicksError::Persistence(format!("encode prediction: {e}")))?;
        fs::write(&path, payload)
            .await
            .map_err(|e| PicksError::Persistence(format!("write prediction {}: {e}", path.display())))?;
        debug!("saved prediction {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::Player;
    use crate::config::now_ms;
    use crate::seed::seed_bracket;

    fn test_bracket(name: &str) -> BracketData {
        let entrants = vec![
            Player::seeded("A. One", "FR"),
            Player::seeded("B. Two", "ES"),
            Player::seeded("C. Three", "US"),
            Player::seeded("D. Four", "AR"),
        ];
        seed_bracket(name, "Testville", "2025", entrants).unwrap()
    }

    fn temp_store(tag: &str) -> JsonFileBracketStore {
        let dir = std::env::temp_dir().join(format!(
            "bracket-picks-{tag}-{}-{}",
            std::process::id(),
            now_ms()
        ));
        JsonFileBracketStore::new(dir)
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryBracketStore::new();
        assert_eq!(store.load_bracket("u1", "t1").await.unwrap(), None);

        let bracket = test_bracket("Test Open");
        store.save_bracket("u1", "t1", &bracket).await.unwrap();
        assert_eq!(store.load_bracket("u1", "t1").await.unwrap(), Some(bracket));
        assert_eq!(store.load_bracket("u2", "t1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let store = temp_store("roundtrip");
        assert_eq!(store.load_bracket("u1", "t1").await.unwrap(), None);

        let bracket = test_bracket("Test Open");
        store.save_bracket("u1", "t1", &bracket).await.unwrap();
        assert_eq!(store.load_bracket("u1", "t1").await.unwrap(), Some(bracket));
    }

    #[tokio::test]
    async fn test_file_store_upsert_keeps_created_at() {
        let store = temp_store("upsert");
        let bracket = test_bracket("Test Open");
        store.save_bracket("u1", "t1", &bracket).await.unwrap();
        let first = store.read_record("u1", "t1").await.unwrap().unwrap();

        let mut updated = bracket.clone();
        updated.is_locked = Some(true);
        store.save_bracket("u1", "t1", &updated).await.unwrap();
        let second = store.read_record("u1", "t1").await.unwrap().unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert!(second.bracket_data.locked());
    }

    #[tokio::test]
    async fn test_file_store_sanitizes_keys() {
        let store = temp_store("sanitize");
        let bracket = test_bracket("Test Open");
        store
            .save_bracket("user@mail.test", "monte/carlo 2025", &bracket)
            .await
            .unwrap();
        assert_eq!(
            store
                .load_bracket("user@mail.test", "monte/carlo 2025")
                .await
                .unwrap(),
            Some(bracket)
        );
    }
}
