use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

//--------------------------------------     Shillings       ---------------------------------------------------------
/// An amount of whole Kenyan shillings. Mobile-money transfers are denominated in whole shillings, so there is no
/// sub-unit to track.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Shillings(i64);

op!(binary Shillings, Add, add);
op!(binary Shillings, Sub, sub);
op!(inplace Shillings, AddAssign, add_assign);
op!(inplace Shillings, SubAssign, sub_assign);
op!(unary Shillings, Neg, neg);

impl Mul<i64> for Shillings {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Shillings {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in shillings: {0}")]
pub struct ShillingsConversionError(String);

impl From<i64> for Shillings {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Shillings {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Shillings {}

impl TryFrom<u64> for Shillings {
    type Error = ShillingsConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(ShillingsConversionError(format!("Value {} is too large to convert to Shillings", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Shillings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KSh {}", self.0)
    }
}

impl Shillings {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}
