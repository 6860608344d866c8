use std::{f64, fmt};

use serde::{Deserialize, Serialize};

use crate::Pt2D;

/// An angle, stored in radians.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Angle(f64);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);

    pub fn new_rads(rads: f64) -> Angle {
        Angle(rads)
    }

    pub fn degrees(degs: f64) -> Angle {
        Angle(degs.to_radians())
    }

    /// The direction of the vector (dx, dy). None if the vector is too small to have one.
    pub fn from_vector(dx: f64, dy: f64) -> Option<Angle> {
        if dx.hypot(dy) < f64::EPSILON {
            return None;
        }
        Some(Angle(dy.atan2(dx)))
    }

    /// The direction halfway between all of the given directions, found by summing unit vectors.
    /// None if they cancel out (or there are none).
    pub fn average(angles: &[Angle]) -> Option<Angle> {
        let (mut dx, mut dy) = (0.0, 0.0);
        for a in angles {
            let (sin, cos) = a.0.sin_cos();
            dx += cos;
            dy += sin;
        }
        Angle::from_vector(dx, dy)
    }

    pub fn opposite(self) -> Angle {
        Angle(self.0 + f64::consts::PI)
    }

    pub fn rotate_degs(self, degrees: f64) -> Angle {
        Angle(self.0 + degrees.to_radians())
    }

    /// The unit vector pointing this way.
    pub fn unit_vector(self) -> Pt2D {
        let (sin, cos) = self.0.sin_cos();
        Pt2D::new(cos, sin)
    }

    pub fn normalized_radians(self) -> f64 {
        if self.0 < 0.0 {
            (self.0 % (2.0 * f64::consts::PI)) + (2.0 * f64::consts::PI)
        } else {
            self.0 % (2.0 * f64::consts::PI)
        }
    }

    pub fn normalized_degrees(self) -> f64 {
        self.normalized_radians().to_degrees()
    }

    /// The unsigned angle between two directions, in [0, 180] degrees.
    pub fn shortest_angle_between(self, other: Angle) -> f64 {
        let diff = (self.normalized_degrees() - other.normalized_degrees()).abs();
        if diff > 180.0 {
            360.0 - diff
        } else {
            diff
        }
    }

    /// True if the two angles are within the given number of degrees of each other.
    pub fn approx_eq(self, other: Angle, within_degrees: f64) -> bool {
        self.shortest_angle_between(other) < within_degrees
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Angle({} degrees)", self.normalized_degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortest_angle_wraps_around() {
        let a = Angle::degrees(350.0);
        let b = Angle::degrees(10.0);
        assert!((a.shortest_angle_between(b) - 20.0).abs() < 1e-9);
        assert!((Angle::degrees(0.0).shortest_angle_between(Angle::degrees(180.0)) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn average_of_opposites_is_undefined() {
        assert!(Angle::average(&[Angle::degrees(0.0), Angle::degrees(180.0)]).is_none());
        let avg = Angle::average(&[Angle::degrees(80.0), Angle::degrees(100.0)]).unwrap();
        assert!(avg.approx_eq(Angle::degrees(90.0), 1e-6));
    }
}
