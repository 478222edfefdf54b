//! Ledger configuration

use serde::{Deserialize, Serialize};
use sharc_common::{Address, BasisPoints, CreditScore, LedgerError, MAX_SERVICE_FEE_RATE_BPS};

/// Default service fee (10%)
pub const DEFAULT_SERVICE_FEE_RATE_BPS: BasisPoints = 1_000;

/// Initial ledger settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Single administrative owner
    pub owner: Address,
    /// Fee charged on principal at issuance, 0-5000 bps
    pub service_fee_rate_bps: BasisPoints,
    /// Minimum stored score to borrow; 0 disables gating
    pub min_credit_score: CreditScore,
}

impl LedgerConfig {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            service_fee_rate_bps: DEFAULT_SERVICE_FEE_RATE_BPS,
            min_credit_score: 0,
        }
    }

    pub fn with_service_fee_rate(mut self, rate: BasisPoints) -> Self {
        self.service_fee_rate_bps = rate;
        self
    }

    pub fn with_min_credit_score(mut self, min: CreditScore) -> Self {
        self.min_credit_score = min;
        self
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        validate_fee_rate(self.service_fee_rate_bps)
    }
}

pub(crate) fn validate_fee_rate(rate: BasisPoints) -> Result<(), LedgerError> {
    if rate > MAX_SERVICE_FEE_RATE_BPS {
        return Err(LedgerError::InvalidServiceFeeRate {
            rate,
            max: MAX_SERVICE_FEE_RATE_BPS,
        });
    }
    Ok(())
}
