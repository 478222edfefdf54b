//! Credit scoring engine
//!
//! Pure function from [`FreelanceHistory`] to [`CreditDecision`]. Six
//! components are capped independently and summed:
//!
//! | Component | Formula | Cap |
//! |---|---|---|
//! | Annual income | `(avg_monthly / 1e6) * 12` | 400 |
//! | History length | `lookback_months * 12` | 150 |
//! | Platform diversity | `platforms * 70` | 200 |
//! | Payment reliability | `avg_on_time_bps * 150 / 10000` | 150 |
//! | Data quality | `samples * 5` | 150 |
//! | Data freshness | linear decay over 90 days | 150 |
//!
//! Income is converted to whole USDC before scaling, so the income term is
//! tied to the 6-decimal minor-unit scale.

use serde::{Deserialize, Serialize};
use sharc_common::money::whole_usdc;
use sharc_common::{
    BasisPoints, CreditDecision, CreditScore, FreelanceHistory, MinorUnits, RepaymentSchedule,
    ScoringError, BPS_DENOMINATOR, MAX_CREDIT_SCORE, SECONDS_PER_DAY,
};

pub const INCOME_CAP: u128 = 400;
pub const HISTORY_CAP: u128 = 150;
pub const DIVERSITY_CAP: u128 = 200;
pub const RELIABILITY_CAP: u128 = 150;
pub const QUALITY_CAP: u128 = 150;
pub const FRESHNESS_MAX: u128 = 150;

const HISTORY_POINTS_PER_MONTH: u128 = 12;
const DIVERSITY_POINTS_PER_PLATFORM: u128 = 70;
const QUALITY_POINTS_PER_SAMPLE: u128 = 5;
const MONTHS_PER_YEAR: u128 = 12;

/// Payouts older than this earn no freshness points
pub const STALE_AFTER_DAYS: u64 = 90;

/// Borrowing limit as a percentage of total volume
pub const BORROWING_LIMIT_PERCENT: u128 = 40;

pub const BASE_APR_BPS: BasisPoints = 2_500;
pub const MIN_APR_BPS: BasisPoints = 500;
const APR_SPREAD_BPS: u32 = 1_500;

/// Score needed for the 6-installment plan
pub const PRIME_SCORE: CreditScore = 800;
/// Score needed for the 4-installment plan
pub const STANDARD_SCORE: CreditScore = 650;

/// Per-component points, each already capped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub annual_income: u16,
    pub history_length: u16,
    pub platform_diversity: u16,
    pub payment_reliability: u16,
    pub data_quality: u16,
    pub data_freshness: u16,
}

impl ScoreBreakdown {
    /// Sum of components, capped at 1000
    pub fn total(&self) -> CreditScore {
        let sum = self.annual_income
            + self.history_length
            + self.platform_diversity
            + self.payment_reliability
            + self.data_quality
            + self.data_freshness;
        sum.min(MAX_CREDIT_SCORE)
    }
}

/// Aggregates accumulated across all platform receipts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryAggregates {
    pub total_volume: u128,
    pub weighted_on_time: u128,
    pub total_samples: u128,
    pub freshest_payout: u64,
    pub platform_count: u128,
}

impl HistoryAggregates {
    fn collect(history: &FreelanceHistory) -> Self {
        let mut agg = Self {
            total_volume: 0,
            weighted_on_time: 0,
            total_samples: 0,
            freshest_payout: 0,
            platform_count: history.platforms.len() as u128,
        };

        for receipt in &history.platforms {
            let earned = receipt.total_earned_minor_units as u128;
            agg.total_volume = agg.total_volume.saturating_add(earned);
            agg.weighted_on_time = agg
                .weighted_on_time
                .saturating_add(receipt.on_time_ratio_bps as u128 * earned);
            agg.total_samples = agg.total_samples.saturating_add(receipt.sample_count as u128);
            agg.freshest_payout = agg.freshest_payout.max(receipt.last_payout_epoch);
        }

        agg
    }

    /// Earnings-weighted on-time ratio; full marks when nothing was earned
    pub fn avg_on_time_bps(&self) -> u128 {
        if self.total_volume == 0 {
            return BPS_DENOMINATOR as u128;
        }
        self.weighted_on_time / self.total_volume
    }
}

/// Breakdown and decision from one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub breakdown: ScoreBreakdown,
    pub decision: CreditDecision,
}

/// Stateless credit scorer
pub struct CreditScorer;

impl CreditScorer {
    /// Compute the decision for a history
    pub fn evaluate(history: &FreelanceHistory) -> Result<CreditDecision, ScoringError> {
        Self::report(history).map(|r| r.decision)
    }

    /// Compute the decision together with its component breakdown
    pub fn report(history: &FreelanceHistory) -> Result<ScoreReport, ScoringError> {
        history.validate()?;

        let agg = HistoryAggregates::collect(history);
        let lookback = history.lookback_months as u128;
        let avg_monthly_income = agg.total_volume / lookback;

        let breakdown = ScoreBreakdown {
            annual_income: capped(
                whole_usdc(avg_monthly_income).saturating_mul(MONTHS_PER_YEAR),
                INCOME_CAP,
            ),
            history_length: capped(lookback * HISTORY_POINTS_PER_MONTH, HISTORY_CAP),
            platform_diversity: capped(
                agg.platform_count.saturating_mul(DIVERSITY_POINTS_PER_PLATFORM),
                DIVERSITY_CAP,
            ),
            payment_reliability: capped(
                agg.avg_on_time_bps().saturating_mul(RELIABILITY_CAP) / BPS_DENOMINATOR as u128,
                RELIABILITY_CAP,
            ),
            data_quality: capped(
                agg.total_samples.saturating_mul(QUALITY_POINTS_PER_SAMPLE),
                QUALITY_CAP,
            ),
            data_freshness: freshness_score(history.snapshot_timestamp, agg.freshest_payout),
        };

        let credit_score = breakdown.total();
        let schedule = repayment_schedule(credit_score);

        let decision = CreditDecision {
            credit_score,
            borrowing_limit_minor_units: borrowing_limit(agg.total_volume),
            apr_bps: apr_bps(credit_score),
            repayment_period_days: schedule.period_days,
            repayment_count: schedule.installments,
        };

        Ok(ScoreReport { breakdown, decision })
    }
}

#[inline]
fn capped(points: u128, cap: u128) -> u16 {
    points.min(cap) as u16
}

/// Freshness points for the most recent payout
///
/// A missing payout timestamp, or one at or after the snapshot, earns full marks.
pub fn freshness_score(snapshot_timestamp: u64, freshest_payout: u64) -> u16 {
    if freshest_payout == 0 || snapshot_timestamp <= freshest_payout {
        return FRESHNESS_MAX as u16;
    }

    let days_stale = (snapshot_timestamp - freshest_payout) / SECONDS_PER_DAY;
    if days_stale >= STALE_AFTER_DAYS {
        return 0;
    }

    let decay = days_stale as u128 * FRESHNESS_MAX / STALE_AFTER_DAYS as u128;
    (FRESHNESS_MAX - decay) as u16
}

/// 40% of total volume, saturating at `u64::MAX`
pub fn borrowing_limit(total_volume: u128) -> MinorUnits {
    let limit = total_volume.saturating_mul(BORROWING_LIMIT_PERCENT) / 100;
    u64::try_from(limit).unwrap_or(u64::MAX)
}

/// `max(500, 2500 - score * 1500 / 1000)`
pub fn apr_bps(credit_score: CreditScore) -> BasisPoints {
    let score = credit_score.min(MAX_CREDIT_SCORE) as u32;
    let discount = score * APR_SPREAD_BPS / MAX_CREDIT_SCORE as u32;
    BASE_APR_BPS.saturating_sub(discount).max(MIN_APR_BPS)
}

/// Installment plan by score tier
pub fn repayment_schedule(credit_score: CreditScore) -> RepaymentSchedule {
    if credit_score >= PRIME_SCORE {
        RepaymentSchedule::monthly(6)
    } else if credit_score >= STANDARD_SCORE {
        RepaymentSchedule::monthly(4)
    } else {
        RepaymentSchedule::monthly(3)
    }
}
