//! # ShArc Ledger
//!
//! Loan issuance and repayment against a single liquidity pool.
//!
//! ## Accounting
//!
//! ```text
//! fee        = principal * service_fee_rate_bps / 10_000   (truncating)
//! total_owed = principal + fee
//! issue      : liquidity -= principal
//! repay(x)   : liquidity += x
//! fund(x)    : liquidity += x
//! withdraw(x): liquidity -= x
//! cancel     : no liquidity effect
//! ```
//!
//! Issuance can be gated on the score held by a shared [`sharc_scorer::ScoreStore`].
//! Token movement is delegated to a [`FundsTransfer`]; every committed
//! operation lands in the event journal.

pub mod config;
pub mod events;
pub mod ledger;
pub mod transfer;

pub use config::{LedgerConfig, DEFAULT_SERVICE_FEE_RATE_BPS};
pub use events::{
    EventKind, EventPage, EventRecord, EventSink, JournalQuery, LedgerEvent, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};
pub use ledger::{LedgerStats, LoanFilter, LoanLedger, RepaymentReceipt};
pub use transfer::{FundsTransfer, NoopTransfer, TransferError};
