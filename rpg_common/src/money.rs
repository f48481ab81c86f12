use std::{fmt::Display, iter::Sum, ops::Add};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// The only currency the gateway settles in.
pub const CURRENCY_CODE: &str = "KES";

//--------------------------------------       Money         ---------------------------------------------------------
/// An amount in the smallest unit that the payment network settles in. M-Pesa only moves whole shillings, so one
/// unit is one shilling.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as an amount of money: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value).map(Self).map_err(|_| MoneyConversionError(format!("{value} is too large")))
    }
}

impl TryFrom<f64> for Money {
    type Error = MoneyConversionError;

    /// Gateways report amounts as JSON numbers, which may carry a zero fractional part (`500.0`). Anything with a
    /// real fractional part, or outside the `i64` range, is rejected.
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(MoneyConversionError(format!("{value} is not a whole number of units")));
        }
        if value > i64::MAX as f64 || value < i64::MIN as f64 {
            return Err(MoneyConversionError(format!("{value} is out of range")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(value as i64))
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{CURRENCY_CODE} {}", self.0)
    }
}

impl Money {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// `max(self - other, 0)`
    pub fn saturating_remainder(self, other: Money) -> Money {
        Money((self.0 - other.0).max(0))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic() {
        let mut a = Money::from(500);
        a += Money::from(250);
        assert_eq!(a, Money::from(750));
        a -= Money::from(50);
        assert_eq!(a.value(), 700);
        assert_eq!(-a, Money::from(-700));
        let total: Money = [1, 2, 3].into_iter().map(Money::from).sum();
        assert_eq!(total, Money::from(6));
    }

    #[test]
    fn remainder_never_goes_negative() {
        assert_eq!(Money::from(1000).saturating_remainder(Money::from(400)), Money::from(600));
        assert_eq!(Money::from(1000).saturating_remainder(Money::from(1500)), Money::from(0));
    }

    #[test]
    fn from_json_numbers() {
        assert_eq!(Money::try_from(500.0).unwrap(), Money::from(500));
        assert!(Money::try_from(10.5).is_err());
        assert!(Money::try_from(f64::NAN).is_err());
        assert!(Money::try_from(u64::MAX).is_err());
        assert_eq!(Money::try_from(42u64).unwrap(), Money::from(42));
    }

    #[test]
    fn display_and_serde() {
        assert_eq!(Money::from(1500).to_string(), "KES 1500");
        assert_eq!(serde_json::to_string(&Money::from(12)).unwrap(), "12");
        let m: Money = serde_json::from_str("99").unwrap();
        assert_eq!(m, Money::from(99));
    }
}
