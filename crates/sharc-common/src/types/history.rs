//! FreelanceHistory - aggregated multi-platform payment history
//!
//! One [`PlatformReceipt`] summarizes a single income platform over the
//! lookback window. The scorer consumes the whole [`FreelanceHistory`].

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::types::money::{BasisPoints, MinorUnits};

/// Aggregated earnings summary for one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformReceipt {
    /// Opaque platform identifier (e.g. "upwork")
    pub platform_id: String,

    /// Total earnings in USDC minor units
    pub total_earned_minor_units: MinorUnits,

    /// Number of underlying transaction records
    pub sample_count: u64,

    /// Unix seconds of the most recent payout (0 = unknown)
    pub last_payout_epoch: u64,

    /// Share of payouts received on schedule, 0-10000
    pub on_time_ratio_bps: BasisPoints,
}

impl PlatformReceipt {
    pub fn new(
        platform_id: impl Into<String>,
        total_earned_minor_units: MinorUnits,
        sample_count: u64,
        last_payout_epoch: u64,
        on_time_ratio_bps: BasisPoints,
    ) -> Self {
        Self {
            platform_id: platform_id.into(),
            total_earned_minor_units,
            sample_count,
            last_payout_epoch,
            on_time_ratio_bps,
        }
    }
}

/// Scorer input
///
/// Platform order does not affect the result, and duplicate platform ids
/// simply aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreelanceHistory {
    pub platforms: Vec<PlatformReceipt>,

    /// Months spanned by the history
    pub lookback_months: u32,

    /// Unix seconds at which the history was assembled
    pub snapshot_timestamp: u64,
}

impl FreelanceHistory {
    pub fn new(platforms: Vec<PlatformReceipt>, lookback_months: u32, snapshot_timestamp: u64) -> Self {
        Self {
            platforms,
            lookback_months,
            snapshot_timestamp,
        }
    }

    /// Reject malformed input before any scoring math runs
    pub fn validate(&self) -> Result<(), ScoringError> {
        if self.platforms.is_empty() {
            return Err(ScoringError::InvalidHistory {
                reason: "no platform receipts",
            });
        }
        if self.lookback_months == 0 {
            return Err(ScoringError::InvalidHistory {
                reason: "lookback months must be positive",
            });
        }
        if self.snapshot_timestamp == 0 {
            return Err(ScoringError::InvalidHistory {
                reason: "snapshot timestamp must be set",
            });
        }
        Ok(())
    }

    /// Sum of earnings across all receipts (128-bit, cannot overflow)
    pub fn total_volume(&self) -> u128 {
        self.platforms
            .iter()
            .map(|p| p.total_earned_minor_units as u128)
            .sum()
    }

    /// Most recent payout across all receipts
    pub fn freshest_payout(&self) -> u64 {
        self.platforms
            .iter()
            .map(|p| p.last_payout_epoch)
            .max()
            .unwrap_or(0)
    }
}
