//! Scoring service
//!
//! Wraps the pure [`CreditScorer`] with the per-subject last-decision cache
//! and access to the shared [`ScoreStore`].

use std::sync::Arc;

use dashmap::DashMap;
use sharc_common::{Address, CreditDecision, FreelanceHistory, ScoringError};
use tracing::{debug, info, instrument, warn};

use crate::engine::{CreditScorer, ScoreReport};
use crate::store::{ScoreRecord, ScoreSource, ScoreStore};

pub struct ScoringService {
    store: Arc<dyn ScoreStore>,
    /// Last decision per subject
    decisions: DashMap<Address, CreditDecision>,
}

impl ScoringService {
    pub fn new(store: Arc<dyn ScoreStore>) -> Self {
        Self {
            store,
            decisions: DashMap::new(),
        }
    }

    /// Shared score store
    pub fn store(&self) -> &Arc<dyn ScoreStore> {
        &self.store
    }

    /// Score a history and cache the decision as the subject's last one
    #[instrument(skip(self, history), fields(subject = %subject))]
    pub fn evaluate(
        &self,
        subject: &Address,
        history: &FreelanceHistory,
    ) -> Result<CreditDecision, ScoringError> {
        let decision = match CreditScorer::evaluate(history) {
            Ok(decision) => decision,
            Err(e) => {
                warn!(error = %e, "Rejected history");
                return Err(e);
            }
        };

        self.decisions.insert(subject.clone(), decision);
        info!(
            score = decision.credit_score,
            apr_bps = decision.apr_bps,
            limit = decision.borrowing_limit_minor_units,
            "Stored credit decision"
        );

        Ok(decision)
    }

    /// Score a history with no side effects
    pub fn preview(&self, history: &FreelanceHistory) -> Result<CreditDecision, ScoringError> {
        let decision = CreditScorer::evaluate(history)?;
        debug!(score = decision.credit_score, "Previewed credit decision");
        Ok(decision)
    }

    /// Preview including the component breakdown
    pub fn report(&self, history: &FreelanceHistory) -> Result<ScoreReport, ScoringError> {
        CreditScorer::report(history)
    }

    /// Last cached decision; zero-valued if none
    pub fn get_last_decision(&self, subject: &Address) -> CreditDecision {
        self.decisions
            .get(subject)
            .map(|d| *d)
            .unwrap_or_default()
    }

    /// Write the subject's cached decision score to the store
    #[instrument(skip(self), fields(subject = %subject))]
    pub fn publish_decision(&self, subject: &Address) -> Result<ScoreRecord, ScoringError> {
        let decision = self
            .decisions
            .get(subject)
            .map(|d| *d)
            .ok_or_else(|| ScoringError::NoDecision {
                subject: subject.clone(),
            })?;

        let record = self
            .store
            .set_score(subject, decision.credit_score, ScoreSource::FreelanceScorer)?;
        info!(score = record.score, "Published credit score");
        Ok(record)
    }

    /// Number of subjects with a cached decision
    pub fn decision_count(&self) -> usize {
        self.decisions.len()
    }
}
