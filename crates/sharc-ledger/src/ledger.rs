//! Loan ledger
//!
//! Issues principal from a shared liquidity pool, accepts repayments and
//! enforces the per-loan state machine:
//!
//! ```text
//! Active --repay (partial)--> Active --repay (final)--> Inactive
//! Active --cancel---------------------------------------> Inactive
//! ```
//!
//! Every mutation runs under one write lock, so checks and effects of a single
//! operation are never interleaved with another. An operation either commits
//! all of its effects (state, transfer, journal entry) or none of them.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sharc_common::{
    money::format_usdc, Address, BasisPoints, CreditScore, LedgerError, Loan, LoanId, MinorUnits,
};
use sharc_scorer::{engine::apr_bps, ScoreStore};
use tracing::{info, instrument, warn};

use crate::config::{validate_fee_rate, LedgerConfig};
use crate::events::{EventPage, EventSink, Journal, JournalQuery, LedgerEvent};
use crate::transfer::{FundsTransfer, NoopTransfer, TransferError};

/// Result of an accepted repayment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepaymentReceipt {
    pub loan_id: LoanId,
    pub amount: MinorUnits,
    pub remaining: MinorUnits,
    /// True when this repayment closed the loan
    pub fully_repaid: bool,
}

/// Loan listing filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanFilter {
    pub borrower: Option<Address>,
    pub active: Option<bool>,
}

/// Pool-wide snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub total_loans: usize,
    pub active_loans: usize,
    /// Sum of remaining balances over active loans
    pub outstanding_minor_units: u128,
    pub liquidity_minor_units: MinorUnits,
    pub service_fee_rate_bps: BasisPoints,
    pub min_credit_score: CreditScore,
    pub journal_len: usize,
}

struct LedgerState {
    liquidity: MinorUnits,
    service_fee_rate_bps: BasisPoints,
    min_credit_score: CreditScore,
    /// Ids are dense from 0, so a loan's id is its index
    loans: Vec<Loan>,
    /// Append-only; ids stay after a loan goes inactive
    borrower_loans: HashMap<Address, Vec<LoanId>>,
    journal: Journal,
}

impl LedgerState {
    fn loan(&self, loan_id: LoanId) -> Option<&Loan> {
        usize::try_from(loan_id).ok().and_then(|i| self.loans.get(i))
    }

    fn loan_mut(&mut self, loan_id: LoanId) -> Option<&mut Loan> {
        usize::try_from(loan_id).ok().and_then(move |i| self.loans.get_mut(i))
    }
}

pub struct LoanLedger {
    owner: Address,
    state: RwLock<LedgerState>,
    scores: Arc<dyn ScoreStore>,
    transfers: Arc<dyn FundsTransfer>,
    sinks: Vec<Arc<dyn EventSink>>,
}

impl LoanLedger {
    /// Create an empty ledger with no liquidity
    pub fn new(config: LedgerConfig, scores: Arc<dyn ScoreStore>) -> Result<Self, LedgerError> {
        config.validate()?;

        info!(
            owner = %config.owner,
            fee_bps = config.service_fee_rate_bps,
            min_score = config.min_credit_score,
            "Loan ledger initialized"
        );

        Ok(Self {
            owner: config.owner,
            state: RwLock::new(LedgerState {
                liquidity: 0,
                service_fee_rate_bps: config.service_fee_rate_bps,
                min_credit_score: config.min_credit_score,
                loans: Vec::new(),
                borrower_loans: HashMap::new(),
                journal: Journal::default(),
            }),
            scores,
            transfers: Arc::new(NoopTransfer),
            sinks: Vec::new(),
        })
    }

    /// Route funds movement through an external collaborator
    pub fn with_transfers(mut self, transfers: Arc<dyn FundsTransfer>) -> Self {
        self.transfers = transfers;
        self
    }

    /// Register an event observer
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    fn ensure_owner(&self, caller: &Address) -> Result<(), LedgerError> {
        if *caller != self.owner {
            return Err(LedgerError::Unauthorized {
                caller: caller.clone(),
            });
        }
        Ok(())
    }

    fn record(&self, state: &mut LedgerState, event: LedgerEvent) {
        let record = state.journal.append(event);
        for sink in &self.sinks {
            sink.on_event(record);
        }
    }

    // ============ ADMINISTRATION ============

    /// Add liquidity to the pool; returns the new liquidity
    #[instrument(skip(self), fields(caller = %caller))]
    pub fn fund(&self, caller: &Address, amount: MinorUnits) -> Result<MinorUnits, LedgerError> {
        rejected("fund", self.fund_inner(caller, amount))
    }

    fn fund_inner(&self, caller: &Address, amount: MinorUnits) -> Result<MinorUnits, LedgerError> {
        self.ensure_owner(caller)?;
        if amount == 0 {
            return Err(LedgerError::InvalidAmount {
                amount,
                reason: "funding must be positive",
            });
        }

        let mut state = self.state.write();
        let liquidity = state
            .liquidity
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;

        self.transfers.pull(caller, amount).map_err(transfer_failed)?;

        state.liquidity = liquidity;
        self.record(&mut state, LedgerEvent::PoolFunded { amount, liquidity });
        info!(amount, liquidity, "Pool funded");
        Ok(liquidity)
    }

    /// Disburse `principal` to `borrower` as a new active loan
    #[instrument(skip(self), fields(caller = %caller, borrower = %borrower))]
    pub fn issue_loan(
        &self,
        caller: &Address,
        borrower: &Address,
        principal: MinorUnits,
    ) -> Result<Loan, LedgerError> {
        rejected("issue_loan", self.issue_loan_inner(caller, borrower, principal))
    }

    fn issue_loan_inner(
        &self,
        caller: &Address,
        borrower: &Address,
        principal: MinorUnits,
    ) -> Result<Loan, LedgerError> {
        self.ensure_owner(caller)?;
        if principal == 0 {
            return Err(LedgerError::InvalidAmount {
                amount: principal,
                reason: "principal must be positive",
            });
        }

        let mut state = self.state.write();
        if principal > state.liquidity {
            return Err(LedgerError::InsufficientLiquidity {
                requested: principal,
                available: state.liquidity,
            });
        }

        // Unknown borrowers read as score 0
        let score = self.scores.get_score(borrower).score;
        if state.min_credit_score > 0 && score < state.min_credit_score {
            return Err(LedgerError::InsufficientCreditScore {
                borrower: borrower.clone(),
                score,
                minimum: state.min_credit_score,
            });
        }

        let loan_id = state.loans.len() as LoanId;
        let loan = Loan::issue(
            loan_id,
            borrower.clone(),
            principal,
            state.service_fee_rate_bps,
            score,
            apr_bps(score),
        )?;

        self.transfers.push(borrower, principal).map_err(transfer_failed)?;

        state.liquidity -= principal;
        state.loans.push(loan.clone());
        state
            .borrower_loans
            .entry(borrower.clone())
            .or_default()
            .push(loan_id);

        self.record(
            &mut state,
            LedgerEvent::LoanIssued {
                loan_id,
                borrower: borrower.clone(),
                principal,
                service_fee: loan.service_fee_minor_units,
                total_owed: loan.total_owed_minor_units,
            },
        );
        info!(
            loan_id,
            principal = %format_usdc(principal),
            fee = loan.service_fee_minor_units,
            total_owed = loan.total_owed_minor_units,
            score,
            "Loan issued"
        );

        Ok(loan)
    }

    /// Deactivate a loan without any repayment or liquidity effect
    #[instrument(skip(self), fields(caller = %caller))]
    pub fn cancel_loan(&self, caller: &Address, loan_id: LoanId) -> Result<Loan, LedgerError> {
        rejected("cancel_loan", self.cancel_loan_inner(caller, loan_id))
    }

    fn cancel_loan_inner(&self, caller: &Address, loan_id: LoanId) -> Result<Loan, LedgerError> {
        self.ensure_owner(caller)?;

        let mut state = self.state.write();
        let loan = state
            .loan_mut(loan_id)
            .ok_or(LedgerError::NoActiveLoan { loan_id })?;

        let outstanding = loan.remaining_balance();
        loan.cancel()?;
        let loan = loan.clone();

        self.record(
            &mut state,
            LedgerEvent::LoanCancelled {
                loan_id,
                borrower: loan.borrower.clone(),
                outstanding,
            },
        );
        info!(loan_id, outstanding, "Loan cancelled");
        Ok(loan)
    }

    /// Remove liquidity to the owner; returns the new liquidity
    #[instrument(skip(self), fields(caller = %caller))]
    pub fn withdraw(&self, caller: &Address, amount: MinorUnits) -> Result<MinorUnits, LedgerError> {
        rejected("withdraw", self.withdraw_inner(caller, amount))
    }

    fn withdraw_inner(&self, caller: &Address, amount: MinorUnits) -> Result<MinorUnits, LedgerError> {
        self.ensure_owner(caller)?;
        if amount == 0 {
            return Err(LedgerError::InvalidAmount {
                amount,
                reason: "withdrawal must be positive",
            });
        }

        let mut state = self.state.write();
        if amount > state.liquidity {
            return Err(LedgerError::InvalidAmount {
                amount,
                reason: "withdrawal exceeds liquidity",
            });
        }

        self.transfers.push(caller, amount).map_err(transfer_failed)?;

        state.liquidity -= amount;
        let liquidity = state.liquidity;
        self.record(&mut state, LedgerEvent::PoolWithdrawn { amount, liquidity });
        info!(amount, liquidity, "Pool withdrawn");
        Ok(liquidity)
    }

    /// Change the fee applied to loans issued from now on
    #[instrument(skip(self), fields(caller = %caller))]
    pub fn update_service_fee_rate(
        &self,
        caller: &Address,
        rate: BasisPoints,
    ) -> Result<(), LedgerError> {
        rejected("update_service_fee_rate", self.update_service_fee_rate_inner(caller, rate))
    }

    fn update_service_fee_rate_inner(
        &self,
        caller: &Address,
        rate: BasisPoints,
    ) -> Result<(), LedgerError> {
        self.ensure_owner(caller)?;
        validate_fee_rate(rate)?;

        let mut state = self.state.write();
        let previous = state.service_fee_rate_bps;
        state.service_fee_rate_bps = rate;
        self.record(
            &mut state,
            LedgerEvent::ServiceFeeRateUpdated {
                previous,
                current: rate,
            },
        );
        info!(previous, current = rate, "Service fee rate updated");
        Ok(())
    }

    /// Set the stored-score gate; 0 disables it
    #[instrument(skip(self), fields(caller = %caller))]
    pub fn update_min_credit_score(
        &self,
        caller: &Address,
        min: CreditScore,
    ) -> Result<(), LedgerError> {
        rejected("update_min_credit_score", self.update_min_credit_score_inner(caller, min))
    }

    fn update_min_credit_score_inner(
        &self,
        caller: &Address,
        min: CreditScore,
    ) -> Result<(), LedgerError> {
        self.ensure_owner(caller)?;

        let mut state = self.state.write();
        let previous = state.min_credit_score;
        state.min_credit_score = min;
        self.record(
            &mut state,
            LedgerEvent::MinCreditScoreUpdated {
                previous,
                current: min,
            },
        );
        info!(previous, current = min, "Minimum credit score updated");
        Ok(())
    }

    // ============ BORROWER ============

    /// Repay part or all of a loan; only the recorded borrower may repay
    #[instrument(skip(self), fields(caller = %caller))]
    pub fn repay(
        &self,
        caller: &Address,
        loan_id: LoanId,
        amount: MinorUnits,
    ) -> Result<RepaymentReceipt, LedgerError> {
        rejected("repay", self.repay_inner(caller, loan_id, amount))
    }

    fn repay_inner(
        &self,
        caller: &Address,
        loan_id: LoanId,
        amount: MinorUnits,
    ) -> Result<RepaymentReceipt, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount {
                amount,
                reason: "repayment must be positive",
            });
        }

        let mut state = self.state.write();
        let loan = state
            .loan(loan_id)
            .ok_or(LedgerError::NoActiveLoan { loan_id })?;
        loan.check_repayment(caller, amount)?;

        let liquidity = state
            .liquidity
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;

        self.transfers.pull(caller, amount).map_err(transfer_failed)?;

        let (outcome, borrower, total_repaid) = {
            let loan = state
                .loan_mut(loan_id)
                .ok_or(LedgerError::NoActiveLoan { loan_id })?;
            let outcome = loan.apply_repayment(caller, amount)?;
            (outcome, loan.borrower.clone(), loan.amount_repaid_minor_units)
        };
        state.liquidity = liquidity;

        self.record(
            &mut state,
            LedgerEvent::LoanRepaid {
                loan_id,
                borrower: borrower.clone(),
                amount,
                remaining: outcome.remaining,
            },
        );
        info!(loan_id, amount, remaining = outcome.remaining, "Loan repayment");

        if outcome.closed {
            self.record(
                &mut state,
                LedgerEvent::LoanFullyRepaid {
                    loan_id,
                    borrower,
                    total_repaid,
                },
            );
            info!(loan_id, total_repaid, "Loan fully repaid");
        }

        Ok(RepaymentReceipt {
            loan_id,
            amount,
            remaining: outcome.remaining,
            fully_repaid: outcome.closed,
        })
    }

    // ============ READS ============

    /// Outstanding balance; 0 for inactive or unknown loans
    pub fn get_remaining_balance(&self, loan_id: LoanId) -> MinorUnits {
        self.state
            .read()
            .loan(loan_id)
            .map(Loan::remaining_balance)
            .unwrap_or(0)
    }

    /// Every loan id ever issued to `borrower`, in issuance order
    pub fn get_borrower_loans(&self, borrower: &Address) -> Vec<LoanId> {
        self.state
            .read()
            .borrower_loans
            .get(borrower)
            .cloned()
            .unwrap_or_default()
    }

    /// Pool liquidity
    pub fn get_balance(&self) -> MinorUnits {
        self.state.read().liquidity
    }

    pub fn service_fee_rate(&self) -> BasisPoints {
        self.state.read().service_fee_rate_bps
    }

    pub fn min_credit_score(&self) -> CreditScore {
        self.state.read().min_credit_score
    }

    /// Id the next issued loan will receive
    pub fn next_loan_id(&self) -> LoanId {
        self.state.read().loans.len() as LoanId
    }

    pub fn loan(&self, loan_id: LoanId) -> Option<Loan> {
        self.state.read().loan(loan_id).cloned()
    }

    /// Loan snapshots matching `filter`, newest first
    pub fn loans(&self, filter: &LoanFilter) -> Vec<Loan> {
        let state = self.state.read();
        state
            .loans
            .iter()
            .rev()
            .filter(|loan| {
                filter
                    .borrower
                    .as_ref()
                    .map_or(true, |b| loan.borrower == *b)
                    && filter.active.map_or(true, |a| loan.is_active() == a)
            })
            .cloned()
            .collect()
    }

    /// Journal page matching `query`
    pub fn events(&self, query: &JournalQuery) -> EventPage {
        self.state.read().journal.query(query)
    }

    pub fn stats(&self) -> LedgerStats {
        let state = self.state.read();
        let active: Vec<&Loan> = state.loans.iter().filter(|l| l.is_active()).collect();

        LedgerStats {
            total_loans: state.loans.len(),
            active_loans: active.len(),
            outstanding_minor_units: active
                .iter()
                .map(|l| l.remaining_balance() as u128)
                .sum(),
            liquidity_minor_units: state.liquidity,
            service_fee_rate_bps: state.service_fee_rate_bps,
            min_credit_score: state.min_credit_score,
            journal_len: state.journal.len(),
        }
    }
}

fn transfer_failed(err: TransferError) -> LedgerError {
    LedgerError::TransferFailed(err.0)
}

fn rejected<T>(operation: &'static str, result: Result<T, LedgerError>) -> Result<T, LedgerError> {
    if let Err(e) = &result {
        warn!(operation, error = %e, "Ledger operation rejected");
    }
    result
}
