//! Decimal arithmetic layer.
//!
//! Thin, checked wrapper around `rust_decimal::Decimal` plus the two
//! transcendental functions the LMSR needs. `ln` and `exp` are evaluated
//! with range reduction and a Taylor series, then rounded half-away-from-zero
//! to a configurable number of places so every client produces the same
//! digits.

use std::cmp::Ordering;

use rust_decimal::prelude::*;
use rust_decimal::RoundingStrategy;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::{DomainError, Result};

/// Decimal places used when rounding probabilities for display.
pub const PROBABILITY_DECIMAL_PLACES: u32 = 4;

/// Default fractional digits kept by `ln` and `exp`.
pub const DEFAULT_TRANSCENDENTAL_PLACES: u32 = 24;

/// Maximum scale representable by `Decimal`.
pub const MAX_TRANSCENDENTAL_PLACES: u32 = 28;

/// Below this argument `exp` is smaller than the finest representable step.
const EXP_UNDERFLOW_BOUND: Decimal = dec!(-64);

/// Above this argument `exp` no longer fits in 96 bits of mantissa.
const EXP_OVERFLOW_BOUND: Decimal = dec!(64);

/// Euler's number to 28 places.
const E: Decimal = dec!(2.7182818284590452353602874714);

/// ln(2) to 28 places.
const LN_2: Decimal = dec!(0.6931471805599453094172321215);

const MAX_SERIES_TERMS: u32 = 120;

const ROUNDING: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

/// Precision settings shared by every computation in one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MathContext {
    /// Fractional digits kept by `ln` and `exp`.
    transcendental_places: u32,
    /// Fractional digits used by `round_display`.
    display_places: u32,
}

impl MathContext {
    /// Creates a context. Transcendental places are capped at 28.
    pub fn new(transcendental_places: u32, display_places: u32) -> Self {
        Self {
            transcendental_places: transcendental_places.min(MAX_TRANSCENDENTAL_PLACES),
            display_places: display_places.min(MAX_TRANSCENDENTAL_PLACES),
        }
    }

    pub fn transcendental_places(&self) -> u32 {
        self.transcendental_places
    }

    pub fn display_places(&self) -> u32 {
        self.display_places
    }

    pub fn add(&self, a: Decimal, b: Decimal) -> Result<Decimal> {
        a.checked_add(b)
            .ok_or_else(|| DomainError::Overflow("add").into())
    }

    pub fn sub(&self, a: Decimal, b: Decimal) -> Result<Decimal> {
        a.checked_sub(b)
            .ok_or_else(|| DomainError::Overflow("sub").into())
    }

    pub fn mul(&self, a: Decimal, b: Decimal) -> Result<Decimal> {
        a.checked_mul(b)
            .ok_or_else(|| DomainError::Overflow("mul").into())
    }

    /// Divides `a` by `b`, rejecting a zero divisor.
    pub fn div(&self, a: Decimal, b: Decimal) -> Result<Decimal> {
        if b.is_zero() {
            return Err(DomainError::DivisionByZero.into());
        }
        a.checked_div(b)
            .ok_or_else(|| DomainError::Overflow("div").into())
    }

    pub fn neg(&self, a: Decimal) -> Decimal {
        -a
    }

    pub fn abs(&self, a: Decimal) -> Decimal {
        a.abs()
    }

    pub fn compare(&self, a: Decimal, b: Decimal) -> Ordering {
        a.cmp(&b)
    }

    /// Rounds half-away-from-zero to `places` fractional digits.
    pub fn round_to(&self, a: Decimal, places: u32) -> Decimal {
        a.round_dp_with_strategy(places, ROUNDING)
    }

    /// Rounds to the configured display precision.
    pub fn round_display(&self, a: Decimal) -> Decimal {
        self.round_to(a, self.display_places)
    }

    /// Sums `values` left to right with overflow checking.
    ///
    /// Callers pass values in ascending position order; that order is part
    /// of the reproducibility contract.
    pub fn sum<I>(&self, values: I) -> Result<Decimal>
    where
        I: IntoIterator<Item = Decimal>,
    {
        values
            .into_iter()
            .try_fold(Decimal::ZERO, |acc, v| self.add(acc, v))
    }

    /// Natural logarithm.
    ///
    /// Reduces `x = m * 2^k` with `m` in `[1, 2)`, then evaluates
    /// `ln(m) = 2 * atanh((m - 1) / (m + 1))`.
    pub fn ln(&self, x: Decimal) -> Result<Decimal> {
        if x <= Decimal::ZERO {
            return Err(DomainError::NonPositiveLogarithm(x).into());
        }
        if x == Decimal::ONE {
            return Ok(Decimal::ZERO);
        }

        let two = dec!(2);
        let mut m = x;
        let mut k: i64 = 0;
        while m >= two {
            m = self.div(m, two)?;
            k += 1;
        }
        while m < Decimal::ONE {
            m = self.mul(m, two)?;
            k -= 1;
        }

        let y = self.div(m - Decimal::ONE, m + Decimal::ONE)?;
        let y_squared = self.mul(y, y)?;
        let mut power = y;
        let mut series = Decimal::ZERO;
        for n in 0..MAX_SERIES_TERMS {
            let term = self.div(power, Decimal::from(2 * n + 1))?;
            if term.is_zero() {
                break;
            }
            series = self.add(series, term)?;
            power = self.mul(power, y_squared)?;
        }

        let reduced = self.mul(Decimal::from(k), LN_2)?;
        let result = self.add(self.mul(two, series)?, reduced)?;
        Ok(self.round_to(result, self.transcendental_places))
    }

    /// Exponential function.
    ///
    /// Arguments below -64 underflow to exactly zero; arguments above 64
    /// are rejected as overflow.
    pub fn exp(&self, x: Decimal) -> Result<Decimal> {
        if x.is_zero() {
            return Ok(Decimal::ONE);
        }
        if x < EXP_UNDERFLOW_BOUND {
            return Ok(Decimal::ZERO);
        }
        if x > EXP_OVERFLOW_BOUND {
            return Err(DomainError::Overflow("exp").into());
        }

        let magnitude = x.abs();
        let whole = magnitude.trunc();
        let fraction = magnitude - whole;
        let whole = whole.to_u32().ok_or(DomainError::Overflow("exp"))?;

        let value = self.mul(self.pow_e(whole)?, self.exp_series(fraction)?)?;
        let value = if x.is_sign_negative() {
            self.div(Decimal::ONE, value)?
        } else {
            value
        };
        Ok(self.round_to(value, self.transcendental_places))
    }

    /// `exp(x_i − max_j x_j)` for every exponent.
    ///
    /// The largest result is exactly one, so fixed-place rounding can only
    /// drop weights that are negligible next to it. An empty slice yields
    /// an empty vector.
    pub fn exp_shifted(&self, exponents: &[Decimal]) -> Result<Vec<Decimal>> {
        let Some(&shift) = exponents.iter().max() else {
            return Ok(Vec::new());
        };
        exponents
            .iter()
            .map(|&x| self.exp(self.sub(x, shift)?))
            .collect()
    }

    /// `e^n` by repeated squaring.
    fn pow_e(&self, mut n: u32) -> Result<Decimal> {
        let mut result = Decimal::ONE;
        let mut base = E;
        while n > 0 {
            if n & 1 == 1 {
                result = self.mul(result, base)?;
            }
            n >>= 1;
            if n > 0 {
                base = self.mul(base, base)?;
            }
        }
        Ok(result)
    }

    /// Taylor series for `e^f`, `0 <= f < 1`.
    fn exp_series(&self, f: Decimal) -> Result<Decimal> {
        let mut sum = Decimal::ONE;
        let mut term = Decimal::ONE;
        for k in 1..MAX_SERIES_TERMS {
            term = self.div(self.mul(term, f)?, Decimal::from(k))?;
            if term.is_zero() {
                break;
            }
            sum = self.add(sum, term)?;
        }
        Ok(sum)
    }
}

impl Default for MathContext {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSCENDENTAL_PLACES, PROBABILITY_DECIMAL_PLACES)
    }
}
