//! Data-collector payload ingestion
//!
//! The collector emits one JSON document per freelancer with a per-platform
//! summary block. Only the summary fields feed the scorer; raw transaction
//! rows and FX metadata are ignored.

use serde::{Deserialize, Serialize};
use sharc_common::{
    Address, BasisPoints, FreelanceHistory, MinorUnits, PlatformReceipt, ScoringError,
    BPS_DENOMINATOR,
};

/// Collector document for one freelancer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreelanceHistoryPayload {
    pub freelancer_address: String,
    /// Human-readable snapshot time, informational only
    #[serde(default)]
    pub snapshot_timestamp: Option<String>,
    pub snapshot_timestamp_epoch: u64,
    pub lookback_months: u32,
    pub platforms: Vec<PlatformEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformEntry {
    pub platform: String,
    #[serde(default)]
    pub currency: Option<String>,
    pub summary: PlatformSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSummary {
    /// Aggregated earnings in 6-decimal USDC units
    pub total_earned_usdc: MinorUnits,
    pub csv_sample_count: u64,
    #[serde(default)]
    pub last_payout_date: Option<String>,
    #[serde(default)]
    pub last_payout_epoch: Option<u64>,
    #[serde(default)]
    pub on_time_ratio_bps: Option<BasisPoints>,
}

/// Lightweight summary returned before scoring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    pub platform_count: usize,
    pub total_earned_usdc: MinorUnits,
    pub lookback_months: u32,
    pub snapshot_timestamp_epoch: u64,
}

impl FreelanceHistoryPayload {
    pub fn from_json(json: &str) -> Result<Self, ScoringError> {
        serde_json::from_str(json).map_err(|e| ScoringError::InvalidPayload(e.to_string()))
    }

    /// Parsed freelancer address
    pub fn subject(&self) -> Result<Address, ScoringError> {
        Address::parse(&self.freelancer_address)
            .map_err(|e| ScoringError::InvalidPayload(e.to_string()))
    }

    /// Convert to scorer input
    ///
    /// A missing payout epoch becomes 0 and a missing on-time ratio becomes 0.
    pub fn to_history(&self) -> Result<FreelanceHistory, ScoringError> {
        let platforms = self
            .platforms
            .iter()
            .map(PlatformEntry::to_receipt)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FreelanceHistory::new(
            platforms,
            self.lookback_months,
            self.snapshot_timestamp_epoch,
        ))
    }

    pub fn summary(&self) -> HistorySummary {
        let total_earned_usdc = self
            .platforms
            .iter()
            .fold(0u64, |acc, p| acc.saturating_add(p.summary.total_earned_usdc));

        HistorySummary {
            platform_count: self.platforms.len(),
            total_earned_usdc,
            lookback_months: self.lookback_months,
            snapshot_timestamp_epoch: self.snapshot_timestamp_epoch,
        }
    }
}

impl PlatformEntry {
    fn to_receipt(&self) -> Result<PlatformReceipt, ScoringError> {
        let on_time = self.summary.on_time_ratio_bps.unwrap_or(0);
        if on_time > BPS_DENOMINATOR {
            return Err(ScoringError::InvalidPayload(format!(
                "{}: on-time ratio {} bps exceeds {}",
                self.platform, on_time, BPS_DENOMINATOR
            )));
        }

        Ok(PlatformReceipt::new(
            self.platform.clone(),
            self.summary.total_earned_usdc,
            self.summary.csv_sample_count,
            self.summary.last_payout_epoch.unwrap_or(0),
            on_time,
        ))
    }
}
