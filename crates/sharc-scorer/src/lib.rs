//! # ShArc Scorer
//!
//! Deterministic creditworthiness decisions for freelancers from aggregated
//! multi-platform payment history.
//!
//! ## Decision
//!
//! ```text
//! score   = min(1000, income + history + diversity + reliability + quality + freshness)
//! limit   = total_volume * 40 / 100
//! apr     = max(500, 2500 - score * 1500 / 1000)   (basis points)
//! plan    = score >= 800 -> 6 x 30d, score >= 650 -> 4 x 30d, else 3 x 30d
//! ```
//!
//! The engine is pure and replayable. [`ScoringService`] adds the per-subject
//! last-decision cache; [`ScoreStore`] holds the scores the loan ledger gates on.

pub mod engine;
pub mod payload;
pub mod service;
pub mod store;

pub use engine::{CreditScorer, ScoreBreakdown, ScoreReport};
pub use payload::{FreelanceHistoryPayload, HistorySummary};
pub use service::ScoringService;
pub use store::{InMemoryScoreStore, ScoreHistoryEntry, ScoreRecord, ScoreSource, ScoreStore};
