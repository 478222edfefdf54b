//! Error types for the ShArc credit core
//!
//! Provides a unified error type and the domain-specific rejection variants.
//! Every variant is a rejection of a single request; none is retried internally.

use thiserror::Error;

use crate::types::address::Address;
use crate::types::money::{BasisPoints, CreditScore, LoanId, MinorUnits};

/// Result type alias using SharcError
pub type Result<T> = std::result::Result<T, SharcError>;

/// Unified error type for ShArc operations
#[derive(Debug, Error)]
pub enum SharcError {
    // Scoring errors
    #[error("Scoring error: {0}")]
    Scoring(#[from] ScoringError),

    // Ledger errors
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    // Identity errors
    #[error("Address error: {0}")]
    Address(#[from] AddressError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Credit scorer and score store errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScoringError {
    #[error("Invalid history: {reason}")]
    InvalidHistory { reason: &'static str },

    #[error("Score {score} is outside 0..=1000")]
    ScoreOutOfRange { score: CreditScore },

    #[error("Invalid history payload: {0}")]
    InvalidPayload(String),

    #[error("No decision recorded for {subject}")]
    NoDecision { subject: Address },
}

/// Loan ledger rejections
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Invalid amount {amount}: {reason}")]
    InvalidAmount {
        amount: MinorUnits,
        reason: &'static str,
    },

    #[error("Insufficient liquidity: requested {requested}, available {available}")]
    InsufficientLiquidity {
        requested: MinorUnits,
        available: MinorUnits,
    },

    #[error("Credit score below minimum for {borrower}: {score} < {minimum}")]
    InsufficientCreditScore {
        borrower: Address,
        score: CreditScore,
        minimum: CreditScore,
    },

    #[error("No active loan with id {loan_id}")]
    NoActiveLoan { loan_id: LoanId },

    #[error("{caller} is not the borrower of loan {loan_id}")]
    NotBorrower { loan_id: LoanId, caller: Address },

    #[error("Overpayment not allowed on loan {loan_id}: amount {amount} > remaining {remaining}")]
    OverpaymentNotAllowed {
        loan_id: LoanId,
        amount: MinorUnits,
        remaining: MinorUnits,
    },

    #[error("Service fee rate {rate} bps exceeds maximum {max} bps")]
    InvalidServiceFeeRate { rate: BasisPoints, max: BasisPoints },

    #[error("{caller} is not authorized for this operation")]
    Unauthorized { caller: Address },

    #[error("Amount overflow")]
    AmountOverflow,

    #[error("Funds transfer failed: {0}")]
    TransferFailed(String),
}

/// Subject identifier errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid address format: {0}")]
    Invalid(String),
}
