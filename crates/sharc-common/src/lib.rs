//! # ShArc Common
//!
//! Shared types, errors, and fixed-point helpers for the Loan ShArc credit core.
//!
//! ## Core Types
//!
//! - [`Address`]: normalized `0x`-prefixed subject identifier (borrowers, owner)
//! - [`FreelanceHistory`]/[`PlatformReceipt`]: aggregated payment history fed to the scorer
//! - [`CreditDecision`]: score, borrowing limit, APR and repayment schedule
//! - [`Loan`]: ledger-owned loan record
//!
//! ## Conventions
//!
//! All money is carried as [`MinorUnits`] (6-decimal USDC) and all ratios as
//! [`BasisPoints`]. Every division truncates toward zero; no floating point is
//! used anywhere in scoring or loan accounting.

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{AddressError, LedgerError, Result, ScoringError, SharcError};
pub use types::{
    address::Address,
    decision::{CreditDecision, RepaymentSchedule},
    history::{FreelanceHistory, PlatformReceipt},
    loan::{Loan, LoanStatus, RepaymentOutcome},
    money::{self, BasisPoints, CreditScore, LoanId, MinorUnits},
};

/// ShArc version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Basis-point denominator (100%)
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Minor units per whole USDC
pub const MINOR_UNITS_PER_USDC: u64 = 1_000_000;

/// Maximum credit score value
pub const MAX_CREDIT_SCORE: CreditScore = 1000;

/// Service fee ceiling (50%)
pub const MAX_SERVICE_FEE_RATE_BPS: BasisPoints = 5_000;

/// Seconds in one day
pub const SECONDS_PER_DAY: u64 = 86_400;
