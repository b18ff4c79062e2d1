//! Purse sizing and per-place payouts. All money is integer cents.
use std::collections::BTreeMap;

use crate::constants::{
    BASIS_POINTS, PAYOUT_CHAMPIONSHIP_BP, PAYOUT_ELITE_BP, PAYOUT_LOWER_BP, PAYOUT_MID_BP,
    PAYOUT_STAKES_BP, PURSE_MIN_MULTIPLIER, PURSE_PER_FURLONG, PURSE_REFERENCE_FURLONGS,
};
use crate::numbers::{clamp_finite, i64_to_f64, round_f64_to_i64, usize_to_u8};
use crate::race::{PayoutTier, RaceClass};

/// Percentage table for a tier, in basis points per place.
#[must_use]
pub const fn payout_table(tier: PayoutTier) -> &'static [i64] {
    match tier {
        PayoutTier::Lower => &PAYOUT_LOWER_BP,
        PayoutTier::Mid => &PAYOUT_MID_BP,
        PayoutTier::Stakes => &PAYOUT_STAKES_BP,
        PayoutTier::Elite => &PAYOUT_ELITE_BP,
        PayoutTier::Championship => &PAYOUT_CHAMPIONSHIP_BP,
    }
}

/// Number of places that earn money in `class`.
#[must_use]
pub const fn paid_places(class: RaceClass) -> usize {
    payout_table(class.tier()).len()
}

/// Distance scaling around the 10f reference, never below half the base.
#[must_use]
pub fn purse_multiplier(furlongs: f64) -> f64 {
    let raw = (furlongs - PURSE_REFERENCE_FURLONGS).mul_add(PURSE_PER_FURLONG, 1.0);
    clamp_finite(raw, PURSE_MIN_MULTIPLIER, f64::MAX, 1.0)
}

#[must_use]
pub fn calculate_total_purse(class: RaceClass, furlongs: f64) -> i64 {
    round_f64_to_i64(i64_to_f64(class.base_purse_cents()) * purse_multiplier(furlongs))
}

/// Payout for a 1-based `place`; zero for place ≤ 0 or beyond the paid places.
#[must_use]
pub fn calculate_payout(class: RaceClass, purse: i64, place: i32) -> i64 {
    let Ok(slot) = usize::try_from(place) else {
        return 0;
    };
    let Some(share) = slot
        .checked_sub(1)
        .and_then(|index| payout_table(class.tier()).get(index))
    else {
        return 0;
    };
    let cents = i128::from(purse.max(0)) * i128::from(*share) / i128::from(BASIS_POINTS);
    i64::try_from(cents).unwrap_or(i64::MAX)
}

/// Every paid place mapped to its payout.
#[must_use]
pub fn calculate_all_payouts(class: RaceClass, purse: i64) -> BTreeMap<u8, i64> {
    (1..=paid_places(class))
        .map(|place| {
            let place = usize_to_u8(place);
            (place, calculate_payout(class, purse, i32::from(place)))
        })
        .collect()
}

/// `$1,234.56` style rendering for reports.
#[must_use]
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let dollars = (abs / 100).to_string();
    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (index, digit) in dollars.chars().enumerate() {
        if index > 0 && (dollars.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{sign}${grouped}.{:02}", abs % 100)
}
