#![deny(warnings)]

//! Economic helpers for the clicker economy.
//!
//! This crate provides the small amount of arithmetic the simulation needs:
//! - Geometric cost growth with flooring (integer prices)
//! - Linear production over an elapsed interval
//! - Rate-per-second summation over owned producers
//! - Payback and time-to-afford estimates used by the purchase advisor

use thiserror::Error;

/// Errors produced by economic helpers.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// Growth factors must be finite and at least 1.
    #[error("invalid cost growth factor: {0}")]
    InvalidGrowth(f64),
}

/// Check that a cost growth factor is usable: finite and `>= 1`.
pub fn validate_growth(growth: f64) -> Result<(), EconError> {
    if !growth.is_finite() || growth < 1.0 {
        return Err(EconError::InvalidGrowth(growth));
    }
    Ok(())
}

/// Next price after one purchase: `floor(cost * growth)`.
///
/// When `growth > 1` the result is strictly greater than `cost` (small prices
/// that would floor back to themselves are bumped by one), saturating at
/// `u64::MAX`. A factor of 1 or less leaves the price unchanged.
///
/// Example:
/// assert_eq!(grow_cost(500, 1.5), 750);
/// assert_eq!(grow_cost(1, 1.5), 2);
pub fn grow_cost(cost: u64, growth: f64) -> u64 {
    if !growth.is_finite() || growth <= 1.0 {
        return cost;
    }
    let next = (cost as f64 * growth).floor();
    let next = if next >= u64::MAX as f64 {
        u64::MAX
    } else {
        next as u64
    };
    next.max(cost.saturating_add(1))
}

/// Amount produced at a constant `rate` over `dt` seconds.
///
/// Negative or non-finite inputs produce nothing.
pub fn production(rate: f64, dt: f64) -> f64 {
    if !(rate.is_finite() && dt.is_finite()) || rate <= 0.0 || dt <= 0.0 {
        return 0.0;
    }
    let amount = rate * dt;
    if amount.is_finite() {
        amount
    } else {
        f64::MAX
    }
}

/// Rate per second from `(count, rate_per_unit)` pairs plus a flat bonus.
///
/// Example:
/// let parts = [(3, 1.0), (2, 5.0)];
/// assert_eq!(total_rate(parts, 10.0), 23.0);
pub fn total_rate<I>(parts: I, flat_bonus: f64) -> f64
where
    I: IntoIterator<Item = (u64, f64)>,
{
    let produced: f64 = parts
        .into_iter()
        .map(|(count, rate)| count as f64 * rate.max(0.0))
        .sum();
    (produced + flat_bonus.max(0.0)).max(0.0)
}

/// Seconds until a purchase adding `added_rate` pays back its `cost`.
/// Returns `None` when the purchase adds no rate.
pub fn payback_secs(cost: u64, added_rate: f64) -> Option<f64> {
    if !added_rate.is_finite() || added_rate <= 0.0 {
        return None;
    }
    Some(cost as f64 / added_rate)
}

/// Seconds of passive production needed before `cost` becomes affordable.
///
/// Zero when already affordable; `None` when the balance never grows.
pub fn secs_until_affordable(cost: u64, balance: f64, rate: f64) -> Option<f64> {
    let missing = cost as f64 - balance;
    if missing <= 0.0 {
        return Some(0.0);
    }
    if !rate.is_finite() || rate <= 0.0 {
        return None;
    }
    Some(missing / rate)
}
