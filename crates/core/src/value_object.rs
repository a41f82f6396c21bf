//! Value objects: equality by value, not identity.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" a
/// value object, create a new one with the new values.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// Monetary amount in the smallest currency unit (cents).
///
/// Serialized as a decimal string with two fractional digits (`"19.99"`),
/// which is how amounts travel in event data between contexts.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Money(u64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    pub fn cents(&self) -> u64 {
        self.0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Apply a percentage discount (0..=100), rounding the discount down.
    pub fn discounted_by(self, percent: u8) -> Result<Money, DomainError> {
        if percent > 100 {
            return Err(DomainError::validation(format!(
                "discount must be between 0 and 100, got {percent}"
            )));
        }
        let discount = u128::from(self.0) * u128::from(percent) / 100;
        // discount <= self.0, so it fits back into u64
        let discount = u64::try_from(discount).unwrap_or(self.0);
        Ok(Money(self.0 - discount))
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Money {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::validation(format!("invalid amount: {s:?}"));
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() || frac.len() > 2 {
            return Err(invalid());
        }
        if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let whole: u64 = whole.parse().map_err(|_| invalid())?;
        let frac: u64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().map_err(|_| invalid())? * 10,
            _ => frac.parse().map_err(|_| invalid())?,
        };
        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .map(Money)
            .ok_or_else(invalid)
    }
}

impl From<Money> for String {
    fn from(value: Money) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Money {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn displays_two_fraction_digits() {
        assert_eq!(Money::from_cents(1999).to_string(), "19.99");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn parses_decimal_strings() {
        assert_eq!("19.99".parse::<Money>().unwrap(), Money::from_cents(1999));
        assert_eq!("3.5".parse::<Money>().unwrap(), Money::from_cents(350));
        assert_eq!("7".parse::<Money>().unwrap(), Money::from_cents(700));
    }

    #[test]
    fn rejects_malformed_amounts() {
        for bad in ["", ".5", "1.234", "-1.00", "abc", "1.x"] {
            assert!(bad.parse::<Money>().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn discount_is_rounded_down() {
        // 10% of 9.99 is 0.999; the discount is rounded down to 0.99.
        let m = Money::from_cents(999).discounted_by(10).unwrap();
        assert_eq!(m, Money::from_cents(900));
        assert!(Money::from_cents(100).discounted_by(101).is_err());
    }

    #[test]
    fn discount_of_the_largest_amount_does_not_overflow() {
        let max = Money::from_cents(u64::MAX);
        assert_eq!(max.discounted_by(0).unwrap(), max);
        assert_eq!(max.discounted_by(100).unwrap(), Money::ZERO);
        let huge: Money = "100000000000000000.00".parse().unwrap();
        assert_eq!(
            huge.discounted_by(2).unwrap(),
            Money::from_cents(9_800_000_000_000_000_000)
        );
    }

    #[test]
    fn addition_reports_overflow() {
        assert_eq!(Money::from_cents(u64::MAX).checked_add(Money::from_cents(1)), None);
        assert_eq!(
            Money::from_cents(1).checked_add(Money::from_cents(2)),
            Some(Money::from_cents(3))
        );
    }

    proptest! {
        #[test]
        fn display_then_parse_is_identity(cents in 0u64..10_000_000_000u64) {
            let m = Money::from_cents(cents);
            prop_assert_eq!(m.to_string().parse::<Money>().unwrap(), m);
        }
    }
}
