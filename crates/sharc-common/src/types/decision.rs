//! CreditDecision - immutable output of one scorer evaluation

use serde::{Deserialize, Serialize};

use crate::types::money::{format_usdc, BasisPoints, CreditScore, MinorUnits};

/// Days covered by one installment
pub const DAYS_PER_INSTALLMENT: u32 = 30;

/// Installment plan attached to a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepaymentSchedule {
    pub installments: u32,
    pub period_days: u32,
}

impl RepaymentSchedule {
    /// Schedule with `installments` monthly payments
    pub const fn monthly(installments: u32) -> Self {
        Self {
            installments,
            period_days: installments * DAYS_PER_INSTALLMENT,
        }
    }
}

/// Score, borrowing limit, APR and repayment plan for one history
///
/// The `Default` value is the zero decision returned for subjects that were
/// never evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditDecision {
    /// 0-1000
    pub credit_score: CreditScore,

    /// Maximum principal suggested for this subject
    pub borrowing_limit_minor_units: MinorUnits,

    /// 500-2500 for any computed decision
    pub apr_bps: BasisPoints,

    /// Always `repayment_count * 30`
    pub repayment_period_days: u32,

    pub repayment_count: u32,
}

impl CreditDecision {
    /// True for the zero-valued placeholder
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl std::fmt::Display for CreditDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CreditDecision(score={}/1000, limit={} USDC, apr={}bps, {}x over {}d)",
            self.credit_score,
            format_usdc(self.borrowing_limit_minor_units),
            self.apr_bps,
            self.repayment_count,
            self.repayment_period_days
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monthly_schedule() {
        let schedule = RepaymentSchedule::monthly(4);
        assert_eq!(schedule.period_days, 120);
    }

    #[test]
    fn test_default_is_empty() {
        assert!(CreditDecision::default().is_empty());
        let decision = CreditDecision {
            credit_score: 1,
            ..Default::default()
        };
        assert!(!decision.is_empty());
    }
}
