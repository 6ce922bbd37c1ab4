use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Sub},
};

use crate::EngineError;

/// Largest amount accepted from a decimal input, in major units.
///
/// Keeps `major * 100` well inside the range where `f64` represents every
/// integer exactly.
const MAX_MAJOR: f64 = 1_000_000_000_000.0;

/// Money amount represented as **integer cents** (minor units).
///
/// Use this type for **all** monetary values in the engine (record amounts,
/// totals, balances) to avoid floating-point drift. Amounts cross the HTTP
/// boundary as decimal numbers and are converted exactly once, on the way in
/// with [`MoneyCents::try_from_major`] and on the way out with
/// [`MoneyCents::to_major`].
///
/// # Examples
///
/// ```rust
/// use engine::MoneyCents;
///
/// let amount = MoneyCents::new(12_34);
/// assert_eq!(amount.cents(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// assert_eq!(MoneyCents::try_from_major(0.01).unwrap().cents(), 1);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct MoneyCents(i64);

impl MoneyCents {
    pub const ZERO: MoneyCents = MoneyCents(0);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Converts a decimal amount in major units, rounding to the nearest cent.
    ///
    /// Rejects NaN, infinities and magnitudes that do not fit.
    pub fn try_from_major(value: f64) -> Result<Self, EngineError> {
        if !value.is_finite() {
            return Err(EngineError::InvalidAmount(
                "amount must be a finite number".to_string(),
            ));
        }
        if value.abs() > MAX_MAJOR {
            return Err(EngineError::InvalidAmount("amount too large".to_string()));
        }
        Ok(Self((value * 100.0).round() as i64))
    }

    /// Returns the amount in major units.
    #[must_use]
    pub fn to_major(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / 100;
        let cents = abs % 100;
        write!(f, "{sign}{units}.{cents:02}")
    }
}

impl From<i64> for MoneyCents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<MoneyCents> for i64 {
    fn from(value: MoneyCents) -> Self {
        value.0
    }
}

impl Add for MoneyCents {
    type Output = MoneyCents;

    fn add(self, rhs: MoneyCents) -> Self::Output {
        MoneyCents(self.0 + rhs.0)
    }
}

impl AddAssign for MoneyCents {
    fn add_assign(&mut self, rhs: MoneyCents) {
        self.0 += rhs.0;
    }
}

impl Sub for MoneyCents {
    type Output = MoneyCents;

    fn sub(self, rhs: MoneyCents) -> Self::Output {
        MoneyCents(self.0 - rhs.0)
    }
}

impl Sum for MoneyCents {
    fn sum<I: Iterator<Item = MoneyCents>>(iter: I) -> Self {
        iter.fold(MoneyCents::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_two_decimals() {
        assert_eq!(MoneyCents::new(0).to_string(), "0.00");
        assert_eq!(MoneyCents::new(1).to_string(), "0.01");
        assert_eq!(MoneyCents::new(10).to_string(), "0.10");
        assert_eq!(MoneyCents::new(1050).to_string(), "10.50");
        assert_eq!(MoneyCents::new(-1050).to_string(), "-10.50");
    }

    #[test]
    fn from_major_rounds_to_cents() {
        assert_eq!(MoneyCents::try_from_major(0.01).unwrap().cents(), 1);
        assert_eq!(MoneyCents::try_from_major(50.0).unwrap().cents(), 5000);
        assert_eq!(MoneyCents::try_from_major(19.999).unwrap().cents(), 2000);
        assert_eq!(MoneyCents::try_from_major(0.001).unwrap().cents(), 0);
        assert_eq!(MoneyCents::try_from_major(-3.5).unwrap().cents(), -350);
    }

    #[test]
    fn from_major_rejects_non_finite() {
        assert!(MoneyCents::try_from_major(f64::NAN).is_err());
        assert!(MoneyCents::try_from_major(f64::INFINITY).is_err());
        assert!(MoneyCents::try_from_major(1e15).is_err());
    }

    #[test]
    fn sum_and_sub() {
        let total: MoneyCents = [100, 250, 5].into_iter().map(MoneyCents::new).sum();
        assert_eq!(total, MoneyCents::new(355));
        assert_eq!((total - MoneyCents::new(400)).to_major(), -0.45);
    }
}
