//! Fixed-point money and ratio helpers
//!
//! Amounts are 6-decimal USDC minor units; ratios are basis points. All
//! arithmetic is integer with truncating division.

use crate::{BPS_DENOMINATOR, MINOR_UNITS_PER_USDC};

/// Amount in USDC minor units (1 USDC = 1_000_000)
pub type MinorUnits = u64;

/// Ratio in basis points (10_000 = 100%)
pub type BasisPoints = u32;

/// Credit score, 0-1000
pub type CreditScore = u16;

/// Ledger loan identifier
pub type LoanId = u64;

/// `amount * bps / 10_000`, truncated, saturating at `u64::MAX`
pub fn apply_bps(amount: MinorUnits, bps: BasisPoints) -> MinorUnits {
    let scaled = amount as u128 * bps as u128 / BPS_DENOMINATOR as u128;
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

/// Render minor units as a 6-decimal USDC string
pub fn format_usdc(amount: MinorUnits) -> String {
    format!(
        "{}.{:06}",
        amount / MINOR_UNITS_PER_USDC,
        amount % MINOR_UNITS_PER_USDC
    )
}

/// Whole USDC units, truncated
#[inline]
pub fn whole_usdc(amount: u128) -> u128 {
    amount / MINOR_UNITS_PER_USDC as u128
}
