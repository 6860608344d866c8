use std::{cmp, fmt, iter, ops};

use serde::{Deserialize, Serialize};

use crate::{round_to_nearest, trim_f64};

/// Meters on the ground plane. Negative values are fine; offsets and lane positions are signed.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Distance(f64);

// Always finite, so the ordering is total.
impl Eq for Distance {}

#[allow(clippy::derive_ord_xor_partial_ord)]
impl Ord for Distance {
    fn cmp(&self, other: &Distance) -> cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Distance {
    pub const ZERO: Distance = Distance(0.0);

    pub fn meters(value: f64) -> Distance {
        assert!(value.is_finite(), "Distance of {} meters", value);
        Distance(trim_f64(value))
    }

    /// For constants. The value isn't checked or trimmed.
    pub const fn const_meters(value: f64) -> Distance {
        Distance(value)
    }

    pub fn inner_meters(self) -> f64 {
        self.0
    }

    pub fn abs(self) -> Distance {
        Distance(self.0.abs())
    }

    pub fn max(self, other: Distance) -> Distance {
        cmp::max(self, other)
    }

    pub fn min(self, other: Distance) -> Distance {
        cmp::min(self, other)
    }

    /// Snaps to a multiple of `step`, like offsets being kept to the centimeter.
    pub fn round_to(self, step: Distance) -> Distance {
        Distance::meters(round_to_nearest(self.0, step.0))
    }

    /// `self / other`, or 0 when `other` is zero.
    pub fn safe_percent(self, other: Distance) -> f64 {
        if other == Distance::ZERO {
            0.0
        } else {
            self.0 / other.0
        }
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}m", self.0)
    }
}

impl ops::Add for Distance {
    type Output = Distance;

    fn add(self, other: Distance) -> Distance {
        Distance::meters(self.0 + other.0)
    }
}

impl ops::AddAssign for Distance {
    fn add_assign(&mut self, other: Distance) {
        *self = *self + other;
    }
}

impl ops::Sub for Distance {
    type Output = Distance;

    fn sub(self, other: Distance) -> Distance {
        Distance::meters(self.0 - other.0)
    }
}

impl ops::Neg for Distance {
    type Output = Distance;

    fn neg(self) -> Distance {
        Distance(-self.0)
    }
}

impl ops::Mul<f64> for Distance {
    type Output = Distance;

    fn mul(self, scalar: f64) -> Distance {
        Distance::meters(self.0 * scalar)
    }
}

impl ops::Mul<Distance> for f64 {
    type Output = Distance;

    fn mul(self, other: Distance) -> Distance {
        other * self
    }
}

impl ops::Div<Distance> for Distance {
    type Output = f64;

    fn div(self, other: Distance) -> f64 {
        assert!(other != Distance::ZERO, "Can't divide {} by zero", self);
        self.0 / other.0
    }
}

impl ops::Div<f64> for Distance {
    type Output = Distance;

    fn div(self, scalar: f64) -> Distance {
        assert!(scalar != 0.0, "Can't divide {} by zero", self);
        Distance::meters(self.0 / scalar)
    }
}

impl iter::Sum for Distance {
    fn sum<I: Iterator<Item = Distance>>(iter: I) -> Distance {
        iter.fold(Distance::ZERO, |sum, x| sum + x)
    }
}
