//! Score store
//!
//! The "last known score" per subject, consulted by the loan ledger when
//! credit gating is enabled. Writes are administrative and are never issued
//! by the scorer on its own.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sharc_common::{Address, CreditScore, ScoringError, MAX_CREDIT_SCORE};

/// Where a stored score came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    /// Published from a scorer decision
    FreelanceScorer,
    /// Set directly by an administrator
    Manual,
}

/// Stored score with its update time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub score: CreditScore,
    /// Unix seconds of the last write (0 = never written)
    pub last_updated: i64,
}

/// One entry of a subject's score history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreHistoryEntry {
    pub score: CreditScore,
    pub source: ScoreSource,
    /// Unix seconds
    pub recorded_at: i64,
}

/// Storage backend for stored credit scores
pub trait ScoreStore: Send + Sync {
    /// Current score; `(0, 0)` for unknown subjects
    fn get_score(&self, subject: &Address) -> ScoreRecord;

    /// Overwrite the subject's score
    fn set_score(
        &self,
        subject: &Address,
        score: CreditScore,
        source: ScoreSource,
    ) -> Result<ScoreRecord, ScoringError>;

    /// All writes for a subject, oldest first
    fn score_history(&self, subject: &Address) -> Vec<ScoreHistoryEntry>;
}

/// In-memory score store
///
/// Each subject's slot lives in one DashMap shard entry, so a write replaces
/// the record and appends history under a single entry lock.
#[derive(Default)]
pub struct InMemoryScoreStore {
    scores: DashMap<Address, (ScoreRecord, Vec<ScoreHistoryEntry>)>,
}

impl InMemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of subjects with a stored score
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl ScoreStore for InMemoryScoreStore {
    fn get_score(&self, subject: &Address) -> ScoreRecord {
        self.scores
            .get(subject)
            .map(|entry| entry.0)
            .unwrap_or_default()
    }

    fn set_score(
        &self,
        subject: &Address,
        score: CreditScore,
        source: ScoreSource,
    ) -> Result<ScoreRecord, ScoringError> {
        if score > MAX_CREDIT_SCORE {
            return Err(ScoringError::ScoreOutOfRange { score });
        }

        let now = chrono::Utc::now().timestamp();
        let record = ScoreRecord {
            score,
            last_updated: now,
        };

        let mut entry = self.scores.entry(subject.clone()).or_default();
        entry.0 = record;
        entry.1.push(ScoreHistoryEntry {
            score,
            source,
            recorded_at: now,
        });

        Ok(record)
    }

    fn score_history(&self, subject: &Address) -> Vec<ScoreHistoryEntry> {
        self.scores
            .get(subject)
            .map(|entry| entry.1.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject() -> Address {
        Address::parse("0x1111111111111111111111111111111111111111").unwrap()
    }

    #[test]
    fn test_unknown_subject_is_zero() {
        let store = InMemoryScoreStore::new();
        assert_eq!(store.get_score(&subject()), ScoreRecord { score: 0, last_updated: 0 });
        assert!(store.score_history(&subject()).is_empty());
    }

    #[test]
    fn test_set_overwrites_and_records_history() {
        let store = InMemoryScoreStore::new();
        store.set_score(&subject(), 650, ScoreSource::Manual).unwrap();
        store
            .set_score(&subject(), 720, ScoreSource::FreelanceScorer)
            .unwrap();

        let record = store.get_score(&subject());
        assert_eq!(record.score, 720);
        assert!(record.last_updated > 0);

        let history = store.score_history(&subject());
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].score, 650);
        assert_eq!(history[1].source, ScoreSource::FreelanceScorer);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let store = InMemoryScoreStore::new();
        assert_eq!(
            store.set_score(&subject(), 1_001, ScoreSource::Manual),
            Err(ScoringError::ScoreOutOfRange { score: 1_001 })
        );
        assert!(store.is_empty());
    }
}
