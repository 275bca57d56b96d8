use crate::types::Amount;

/// `apr` is a whole percentage and the year has 365 days.
const RATE_DENOMINATOR: Amount = 100 * 365;

/// Principal plus interest owed on settlement:
/// `amount + floor(amount * (apr / 100) * (days / 365))`.
///
/// The interest term is evaluated as a single integer division of
/// `amount * apr * days` by `36_500`, so no intermediate rounding happens and
/// the result is the exact floor of the rational value. Returns `None` when the
/// product does not fit in a `u128`.
pub fn compute_yield(amount: Amount, apr: u32, duration_days: u32) -> Option<Amount> {
    let interest = amount
        .checked_mul(Amount::from(apr))?
        .checked_mul(Amount::from(duration_days))?
        / RATE_DENOMINATOR;

    amount.checked_add(interest)
}

/// Term length in seconds for a loan of `duration_days`
pub fn term_seconds(duration_days: u32, seconds_per_day: u64) -> u64 {
    u64::from(duration_days).saturating_mul(seconds_per_day)
}
