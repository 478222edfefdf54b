//! Loan - ledger-owned loan record
//!
//! Principal, service fee and total owed are frozen at issuance. The only
//! mutable fields are `amount_repaid_minor_units` (monotonically increasing,
//! never above `total_owed_minor_units`) and `status`, which leaves `Active`
//! exactly once.

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::types::address::Address;
use crate::types::money::{apply_bps, BasisPoints, CreditScore, LoanId, MinorUnits};

/// Loan lifecycle state; `Inactive` is absorbing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Active,
    Inactive,
}

/// Outcome of an applied repayment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepaymentOutcome {
    pub remaining: MinorUnits,
    /// True when this repayment closed the loan
    pub closed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub borrower: Address,
    pub principal_minor_units: MinorUnits,
    pub service_fee_minor_units: MinorUnits,
    pub total_owed_minor_units: MinorUnits,
    pub amount_repaid_minor_units: MinorUnits,
    pub status: LoanStatus,

    /// Stored score consulted at issuance (0 when none was stored)
    pub credit_score_at_issuance: CreditScore,

    /// APR tier implied by that score, recorded for the loan history
    pub apr_bps_at_issuance: BasisPoints,

    /// Issuance time (Unix milliseconds)
    pub issued_at: i64,
}

impl Loan {
    /// Build a fresh active loan, freezing fee and total owed
    pub fn issue(
        id: LoanId,
        borrower: Address,
        principal: MinorUnits,
        fee_rate_bps: BasisPoints,
        credit_score_at_issuance: CreditScore,
        apr_bps_at_issuance: BasisPoints,
    ) -> Result<Self, LedgerError> {
        let service_fee = apply_bps(principal, fee_rate_bps);
        let total_owed = principal
            .checked_add(service_fee)
            .ok_or(LedgerError::AmountOverflow)?;

        Ok(Self {
            id,
            borrower,
            principal_minor_units: principal,
            service_fee_minor_units: service_fee,
            total_owed_minor_units: total_owed,
            amount_repaid_minor_units: 0,
            status: LoanStatus::Active,
            credit_score_at_issuance,
            apr_bps_at_issuance,
            issued_at: chrono::Utc::now().timestamp_millis(),
        })
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Active
    }

    /// Outstanding balance; 0 once inactive
    pub fn remaining_balance(&self) -> MinorUnits {
        if !self.is_active() {
            return 0;
        }
        self.total_owed_minor_units - self.amount_repaid_minor_units
    }

    /// Check a repayment without mutating; returns the current remaining balance
    pub fn check_repayment(&self, caller: &Address, amount: MinorUnits) -> Result<MinorUnits, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount {
                amount,
                reason: "repayment must be positive",
            });
        }

        if !self.is_active() {
            return Err(LedgerError::NoActiveLoan { loan_id: self.id });
        }

        if *caller != self.borrower {
            return Err(LedgerError::NotBorrower {
                loan_id: self.id,
                caller: caller.clone(),
            });
        }

        let remaining = self.remaining_balance();
        if amount > remaining {
            return Err(LedgerError::OverpaymentNotAllowed {
                loan_id: self.id,
                amount,
                remaining,
            });
        }

        Ok(remaining)
    }

    /// Apply a repayment that already passed [`Loan::check_repayment`]
    pub fn apply_repayment(&mut self, caller: &Address, amount: MinorUnits) -> Result<RepaymentOutcome, LedgerError> {
        self.check_repayment(caller, amount)?;

        self.amount_repaid_minor_units += amount;
        let remaining = self.total_owed_minor_units - self.amount_repaid_minor_units;
        let closed = remaining == 0;
        if closed {
            self.status = LoanStatus::Inactive;
        }

        Ok(RepaymentOutcome { remaining, closed })
    }

    /// Deactivate without any repayment effect
    pub fn cancel(&mut self) -> Result<(), LedgerError> {
        if !self.is_active() {
            return Err(LedgerError::NoActiveLoan { loan_id: self.id });
        }
        self.status = LoanStatus::Inactive;
        Ok(())
    }
}
