//! Per-user assessment history, one JSON file per user.
//!
//! Each save reads the whole file, appends, and writes it back. There is no
//! locking: two saves racing for the same user end with whichever wrote last.

use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{Result, VocabError};
use crate::levels::LevelScale;
use crate::scoring::round_to_hundred;
use crate::types::{AssessmentResult, UserHistory};

pub const AVERAGE_WINDOW: usize = 3;

#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
    scale: LevelScale,
}

fn validate_user_id(user_id: &str) -> Result<()> {
    let invalid = user_id.is_empty()
        || user_id == "."
        || user_id == ".."
        || user_id.contains(|c: char| matches!(c, '/' | '\\' | '\0'));
    if invalid {
        return Err(VocabError::InvalidUserId(user_id.to_string()));
    }
    Ok(())
}

impl HistoryStore {
    pub fn new(dir: impl Into<PathBuf>, scale: LevelScale) -> Self {
        Self {
            dir: dir.into(),
            scale,
        }
    }

    fn user_file(&self, user_id: &str) -> Result<PathBuf> {
        validate_user_id(user_id)?;
        Ok(self.dir.join(format!("{user_id}.json")))
    }

    pub fn get_user_history(&self, user_id: &str) -> Result<UserHistory> {
        let path = self.user_file(user_id)?;
        if !path.exists() {
            debug!(user_id, "No history yet");
            return Ok(UserHistory::default());
        }
        let file = File::open(&path)?;
        Ok(serde_json::from_reader(file)?)
    }

    pub fn save_result(&self, user_id: &str, mut result: AssessmentResult) -> Result<UserHistory> {
        let path = self.user_file(user_id)?;
        let mut history = self.get_user_history(user_id)?;

        result.timestamp = Utc::now();
        history.results.push(result);
        self.update_averages(&mut history);

        fs::create_dir_all(&self.dir)?;
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        serde_json::to_writer_pretty(file, &history)?;

        info!(
            user_id,
            results = history.results.len(),
            average_vocabulary_size = ?history.average_vocabulary_size,
            average_cefr_level = ?history.average_cefr_level,
            "Saved assessment result"
        );
        Ok(history)
    }

    fn update_averages(&self, history: &mut UserHistory) {
        let start = history.results.len().saturating_sub(AVERAGE_WINDOW);
        let recent = &history.results[start..];
        if recent.is_empty() {
            history.average_vocabulary_size = None;
            history.average_cefr_level = None;
            return;
        }

        let total: f64 = recent.iter().map(|r| f64::from(r.vocabulary_size)).sum();
        history.average_vocabulary_size = Some(round_to_hundred(total / recent.len() as f64));

        let indices: Vec<usize> = recent
            .iter()
            .filter_map(|r| {
                let idx = self.scale.index_of(&r.cefr_level);
                if idx.is_none() {
                    warn!(level = %r.cefr_level, "Result level not on current scale");
                }
                idx
            })
            .collect();

        history.average_cefr_level = if indices.is_empty() {
            None
        } else {
            let mean = indices.iter().sum::<usize>() as f64 / indices.len() as f64;
            let idx = (mean.round_ties_even() as usize).min(self.scale.len() - 1);
            self.scale.label_at(idx).map(str::to_string)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn result(vocabulary_size: u32, cefr_level: &str) -> AssessmentResult {
        AssessmentResult {
            vocabulary_size,
            cefr_level: cefr_level.to_string(),
            level_proportions: BTreeMap::new(),
            confidence: 90,
            test_id: 1000,
            timestamp: Utc::now(),
        }
    }

    fn store() -> (tempfile::TempDir, HistoryStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("user_results"), LevelScale::default());
        (dir, store)
    }

    #[test]
    fn unknown_user_has_empty_history() {
        let (_dir, store) = store();
        let history = store.get_user_history("nobody").unwrap();
        assert!(history.results.is_empty());
        assert_eq!(history.average_vocabulary_size, None);
        assert_eq!(history.average_cefr_level, None);
    }

    #[test]
    fn first_save_creates_history() {
        let (_dir, store) = store();
        let saved = store.save_result("alice", result(2000, "B1")).unwrap();
        assert_eq!(saved.results.len(), 1);
        assert_eq!(saved.average_vocabulary_size, Some(2000));
        assert_eq!(saved.average_cefr_level.as_deref(), Some("B1"));

        let loaded = store.get_user_history("alice").unwrap();
        assert_eq!(loaded, saved);
    }

    #[test]
    fn averages_cover_last_three_only() {
        let (_dir, store) = store();
        store.save_result("bob", result(16_000, "C2")).unwrap();
        store.save_result("bob", result(1000, "A2")).unwrap();
        store.save_result("bob", result(2000, "B1")).unwrap();
        let history = store.save_result("bob", result(3000, "B2")).unwrap();

        assert_eq!(history.results.len(), 4);
        assert_eq!(history.average_vocabulary_size, Some(2000));
        // Indices 1, 2, 3 average to 2.
        assert_eq!(history.average_cefr_level.as_deref(), Some("B1"));
    }

    #[test]
    fn average_size_rounds_to_hundred() {
        let (_dir, store) = store();
        store.save_result("carol", result(1000, "A2")).unwrap();
        let history = store.save_result("carol", result(1100, "A2")).unwrap();
        // Mean 1050 rounds half to even.
        assert_eq!(history.average_vocabulary_size, Some(1000));
    }

    #[test]
    fn save_stamps_current_time() {
        let (_dir, store) = store();
        let before = Utc::now();
        let mut stale = result(500, "A1");
        stale.timestamp = before - chrono::Duration::days(30);

        let history = store.save_result("dave", stale).unwrap();
        assert!(history.results[0].timestamp >= before);
    }

    #[test]
    fn results_keep_insertion_order() {
        let (_dir, store) = store();
        for size in [500, 900, 1300] {
            store.save_result("erin", result(size, "A1")).unwrap();
        }
        let sizes: Vec<_> = store
            .get_user_history("erin")
            .unwrap()
            .results
            .iter()
            .map(|r| r.vocabulary_size)
            .collect();
        assert_eq!(sizes, [500, 900, 1300]);
    }

    #[test]
    fn rejects_path_like_user_ids() {
        let (_dir, store) = store();
        for id in ["", "..", "a/b", "a\\b"] {
            assert!(matches!(
                store.get_user_history(id),
                Err(VocabError::InvalidUserId(_))
            ));
        }
    }
}
