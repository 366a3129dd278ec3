//! # Loan Arithmetic
//!
//! Interest and collateral-ratio math in integer minor units. Every function
//! returns `None` on overflow instead of wrapping.

use shared_types::{Amount, BasisPoints, BPS_DENOMINATOR};

/// Interest owed on `principal`, rounded down.
pub fn interest(principal: Amount, rate: BasisPoints) -> Option<Amount> {
    rate.apply_floor(principal)
}

/// Principal plus interest. Rounding loss is strictly below one minor unit.
pub fn repay_amount(principal: Amount, rate: BasisPoints) -> Option<Amount> {
    principal.checked_add(interest(principal, rate)?)
}

/// `collateral / principal < ratio`, compared without division.
///
/// `None` only when `principal * ratio` overflows.
pub fn is_under_collateralized(
    principal: Amount,
    collateral: Amount,
    ratio: BasisPoints,
) -> Option<bool> {
    let required = principal.checked_mul(u128::from(ratio.get()))?;
    Some(match collateral.checked_mul(BPS_DENOMINATOR) {
        Some(scaled) => scaled < required,
        // Collateral this large covers any representable requirement.
        None => false,
    })
}

/// Smallest collateral accepted for `principal`.
pub fn minimum_collateral(principal: Amount, ratio: BasisPoints) -> Option<Amount> {
    let required = principal.checked_mul(u128::from(ratio.get()))?;
    Some(required.div_ceil(BPS_DENOMINATOR))
}
