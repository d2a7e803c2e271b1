//! Denominated amounts
//!
//! Balances are unsigned integers in the smallest unit of a denomination.
//! All arithmetic is checked; nothing wraps.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::TypeError;

/// Block height as reported by the consensus layer.
pub type BlockHeight = i64;

/// Raw amount in the smallest unit.
pub type Amount = u64;

/// An amount of a single denomination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: Amount,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: Amount) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    pub fn is_positive(&self) -> bool {
        self.amount > 0
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    pub fn same_denom_as(&self, other: &Coin) -> bool {
        self.denom == other.denom
    }

    /// Sum of two coins of the same denomination.
    pub fn checked_add(&self, other: &Coin) -> Result<Coin, TypeError> {
        self.check_denom(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(TypeError::Overflow)?;
        Ok(Coin::new(self.denom.clone(), amount))
    }

    /// Difference of two coins of the same denomination.
    pub fn checked_sub(&self, other: &Coin) -> Result<Coin, TypeError> {
        self.check_denom(other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or(TypeError::Underflow)?;
        Ok(Coin::new(self.denom.clone(), amount))
    }

    fn check_denom(&self, other: &Coin) -> Result<(), TypeError> {
        if !self.same_denom_as(other) {
            return Err(TypeError::DenomMismatch {
                left: self.denom.clone(),
                right: other.denom.clone(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Parses `<amount><denom>`, e.g. `100stake`.
impl FromStr for Coin {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| TypeError::InvalidCoin(s.to_string()))?;
        let (amount, denom) = s.split_at(split);
        if amount.is_empty() || !denom.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(TypeError::InvalidCoin(s.to_string()));
        }
        let amount = amount
            .parse::<Amount>()
            .map_err(|_| TypeError::InvalidCoin(s.to_string()))?;
        Ok(Coin::new(denom, amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_display_and_parse() {
        let coin = Coin::new("stake", 100);
        assert_eq!(coin.to_string(), "100stake");
        assert_eq!("100stake".parse::<Coin>().unwrap(), coin);
    }

    #[test]
    fn test_coin_parse_rejects_garbage() {
        assert!("stake".parse::<Coin>().is_err());
        assert!("100".parse::<Coin>().is_err());
        assert!("10 stake".parse::<Coin>().is_err());
    }

    #[test]
    fn test_checked_add_same_denom() {
        let a = Coin::new("stake", 30);
        let b = Coin::new("stake", 30);
        assert_eq!(a.checked_add(&b).unwrap(), Coin::new("stake", 60));
    }

    #[test]
    fn test_checked_add_denom_mismatch() {
        let a = Coin::new("stake", 1);
        let b = Coin::new("atom", 1);
        assert!(matches!(
            a.checked_add(&b),
            Err(TypeError::DenomMismatch { .. })
        ));
    }

    #[test]
    fn test_checked_arithmetic_bounds() {
        let max = Coin::new("stake", u64::MAX);
        assert_eq!(
            max.checked_add(&Coin::new("stake", 1)),
            Err(TypeError::Overflow)
        );
        assert_eq!(
            Coin::new("stake", 1).checked_sub(&Coin::new("stake", 2)),
            Err(TypeError::Underflow)
        );
    }

    #[test]
    fn test_positive() {
        assert!(Coin::new("stake", 1).is_positive());
        assert!(Coin::new("stake", 0).is_zero());
    }
}
