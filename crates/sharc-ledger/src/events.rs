//! Ledger event journal
//!
//! Append-only record of every committed ledger operation with:
//! - Monotonic sequence numbers (journal order is commit order)
//! - UUIDv7 event ids for external correlation
//! - Filtered, paginated reads by borrower, event kind and loan id
//!
//! Observers implement [`EventSink`] and are notified as each record is
//! appended.

use serde::{Deserialize, Serialize};
use sharc_common::{Address, BasisPoints, CreditScore, LoanId, MinorUnits};

/// Default page size for journal reads
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Largest page a single read may return
pub const MAX_PAGE_SIZE: usize = 100;

/// Events recorded by the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum LedgerEvent {
    /// Owner added liquidity
    PoolFunded {
        amount: MinorUnits,
        liquidity: MinorUnits,
    },
    /// Owner removed liquidity
    PoolWithdrawn {
        amount: MinorUnits,
        liquidity: MinorUnits,
    },
    /// Principal disbursed to a borrower
    LoanIssued {
        loan_id: LoanId,
        borrower: Address,
        principal: MinorUnits,
        service_fee: MinorUnits,
        total_owed: MinorUnits,
    },
    /// Partial or final repayment accepted
    LoanRepaid {
        loan_id: LoanId,
        borrower: Address,
        amount: MinorUnits,
        remaining: MinorUnits,
    },
    /// Remaining balance reached zero
    LoanFullyRepaid {
        loan_id: LoanId,
        borrower: Address,
        total_repaid: MinorUnits,
    },
    /// Owner deactivated a loan
    LoanCancelled {
        loan_id: LoanId,
        borrower: Address,
        outstanding: MinorUnits,
    },
    ServiceFeeRateUpdated {
        previous: BasisPoints,
        current: BasisPoints,
    },
    MinCreditScoreUpdated {
        previous: CreditScore,
        current: CreditScore,
    },
}

/// Event discriminant for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PoolFunded,
    PoolWithdrawn,
    LoanIssued,
    LoanRepaid,
    LoanFullyRepaid,
    LoanCancelled,
    ServiceFeeRateUpdated,
    MinCreditScoreUpdated,
}

impl LedgerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            LedgerEvent::PoolFunded { .. } => EventKind::PoolFunded,
            LedgerEvent::PoolWithdrawn { .. } => EventKind::PoolWithdrawn,
            LedgerEvent::LoanIssued { .. } => EventKind::LoanIssued,
            LedgerEvent::LoanRepaid { .. } => EventKind::LoanRepaid,
            LedgerEvent::LoanFullyRepaid { .. } => EventKind::LoanFullyRepaid,
            LedgerEvent::LoanCancelled { .. } => EventKind::LoanCancelled,
            LedgerEvent::ServiceFeeRateUpdated { .. } => EventKind::ServiceFeeRateUpdated,
            LedgerEvent::MinCreditScoreUpdated { .. } => EventKind::MinCreditScoreUpdated,
        }
    }

    /// Loan the event concerns, if any
    pub fn loan_id(&self) -> Option<LoanId> {
        match self {
            LedgerEvent::LoanIssued { loan_id, .. }
            | LedgerEvent::LoanRepaid { loan_id, .. }
            | LedgerEvent::LoanFullyRepaid { loan_id, .. }
            | LedgerEvent::LoanCancelled { loan_id, .. } => Some(*loan_id),
            _ => None,
        }
    }

    /// Borrower the event concerns, if any
    pub fn borrower(&self) -> Option<&Address> {
        match self {
            LedgerEvent::LoanIssued { borrower, .. }
            | LedgerEvent::LoanRepaid { borrower, .. }
            | LedgerEvent::LoanFullyRepaid { borrower, .. }
            | LedgerEvent::LoanCancelled { borrower, .. } => Some(borrower),
            _ => None,
        }
    }
}

/// Journal entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// 0-based position in the journal
    pub sequence: u64,
    pub event_id: String,
    /// Unix milliseconds
    pub recorded_at: i64,
    pub event: LedgerEvent,
}

/// Observer notified of every appended record
///
/// Invoked while the ledger's write lock is held: implementations must be
/// quick and must not call back into the ledger.
pub trait EventSink: Send + Sync {
    fn on_event(&self, record: &EventRecord);
}

/// Journal read filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalQuery {
    pub borrower: Option<Address>,
    pub kind: Option<EventKind>,
    pub loan_id: Option<LoanId>,
    /// 1-based page number
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl JournalQuery {
    fn matches(&self, record: &EventRecord) -> bool {
        if let Some(kind) = self.kind {
            if record.event.kind() != kind {
                return false;
            }
        }
        if let Some(loan_id) = self.loan_id {
            if record.event.loan_id() != Some(loan_id) {
                return false;
            }
        }
        if let Some(borrower) = &self.borrower {
            if record.event.borrower() != Some(borrower) {
                return false;
            }
        }
        true
    }
}

/// One page of journal records, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPage {
    pub events: Vec<EventRecord>,
    /// Matching records across all pages
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

/// Append-only event list
#[derive(Debug, Default)]
pub(crate) struct Journal {
    records: Vec<EventRecord>,
}

impl Journal {
    pub(crate) fn append(&mut self, event: LedgerEvent) -> &EventRecord {
        let record = EventRecord {
            sequence: self.records.len() as u64,
            event_id: uuid::Uuid::now_v7().to_string(),
            recorded_at: chrono::Utc::now().timestamp_millis(),
            event,
        };
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn query(&self, query: &JournalQuery) -> EventPage {
        let page = query.page.unwrap_or(1).max(1);
        let page_size = query
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        let matching: Vec<&EventRecord> = self
            .records
            .iter()
            .rev()
            .filter(|r| query.matches(r))
            .collect();
        let total = matching.len();

        let events = matching
            .into_iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .cloned()
            .collect();

        EventPage {
            events,
            total,
            page,
            page_size,
        }
    }
}
