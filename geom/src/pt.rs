use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Angle, Distance, Line, EPSILON_DIST};

/// This represents world-space in meters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pt2D {
    x: f64,
    y: f64,
}

impl Pt2D {
    pub fn new(x: f64, y: f64) -> Pt2D {
        if !x.is_finite() || !y.is_finite() {
            panic!("Bad Pt2D {}, {}", x, y);
        }

        Pt2D { x, y }
    }

    pub fn zero() -> Pt2D {
        Pt2D::new(0.0, 0.0)
    }

    pub fn x(self) -> f64 {
        self.x
    }

    pub fn y(self) -> f64 {
        self.y
    }

    /// Interprets the point as a vector and returns its length.
    pub fn magnitude(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Interprets the point as a vector and scales it to unit length. The zero vector stays zero.
    pub fn normalized(self) -> Pt2D {
        let len = self.magnitude();
        if len < f64::EPSILON {
            return Pt2D::zero();
        }
        Pt2D::new(self.x / len, self.y / len)
    }

    pub fn dot(self, other: Pt2D) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Negative distances project the opposite way.
    pub fn project_away(self, dist: Distance, theta: Angle) -> Pt2D {
        let (sin, cos) = theta.normalized_radians().sin_cos();
        let d = dist.inner_meters();
        Pt2D::new(self.x + d * cos, self.y + d * sin)
    }

    pub fn offset(self, dx: f64, dy: f64) -> Pt2D {
        Pt2D::new(self.x + dx, self.y + dy)
    }

    /// Linear interpolation towards `other`; `t` is clamped to [0, 1].
    pub fn lerp(self, other: Pt2D, t: f64) -> Pt2D {
        let t = t.max(0.0).min(1.0);
        Pt2D::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    /// None if the points are the same.
    pub fn angle_to(self, to: Pt2D) -> Option<Angle> {
        Angle::from_vector(to.x - self.x, to.y - self.y)
    }

    pub fn dist_to(self, to: Pt2D) -> Distance {
        Distance::meters((to.x - self.x).hypot(to.y - self.y))
    }

    pub fn approx_eq(self, other: Pt2D, threshold: Distance) -> bool {
        self.dist_to(other) <= threshold
    }

    pub fn center(pts: &[Pt2D]) -> Pt2D {
        let mut x = 0.0;
        let mut y = 0.0;
        for pt in pts {
            x += pt.x;
            y += pt.y;
        }
        let len = pts.len().max(1) as f64;
        Pt2D::new(x / len, y / len)
    }

    /// The line from this point to `to`, unless they're too close together.
    pub fn line_to(self, to: Pt2D) -> Option<Line> {
        if self.approx_eq(to, EPSILON_DIST) {
            return None;
        }
        Some(Line::must_new(self, to))
    }
}

impl std::ops::Add for Pt2D {
    type Output = Pt2D;

    fn add(self, other: Pt2D) -> Pt2D {
        Pt2D::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Pt2D {
    type Output = Pt2D;

    fn sub(self, other: Pt2D) -> Pt2D {
        Pt2D::new(self.x - other.x, self.y - other.y)
    }
}

impl std::ops::Mul<f64> for Pt2D {
    type Output = Pt2D;

    fn mul(self, scalar: f64) -> Pt2D {
        Pt2D::new(self.x * scalar, self.y * scalar)
    }
}

impl std::ops::Neg for Pt2D {
    type Output = Pt2D;

    fn neg(self) -> Pt2D {
        Pt2D::new(-self.x, -self.y)
    }
}

impl fmt::Display for Pt2D {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Pt2D({0}, {1})", self.x, self.y)
    }
}

impl From<Pt2D> for geo::Coordinate<f64> {
    fn from(pt: Pt2D) -> Self {
        geo::Coordinate { x: pt.x, y: pt.y }
    }
}

impl From<Pt2D> for geo::Point<f64> {
    fn from(pt: Pt2D) -> Self {
        geo::Point::new(pt.x, pt.y)
    }
}
