use std::fmt;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::{Angle, Distance, Pt2D, EPSILON_DIST};

/// A line segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line(Pt2D, Pt2D);

/// Where two lines, extended infinitely, cross. `t1` and `t2` are fractions of each line's
/// length; values outside [0, 1] are off the segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InfiniteHit {
    pub pt: Pt2D,
    pub t1: f64,
    pub t2: f64,
}

impl Line {
    /// Creates a line segment between two points, which must not be the same.
    pub fn new(pt1: Pt2D, pt2: Pt2D) -> Result<Line> {
        if pt1.dist_to(pt2) <= EPSILON_DIST {
            bail!("Line from {:?} to {:?} too small", pt1, pt2);
        }
        Ok(Line(pt1, pt2))
    }

    /// Equivalent to `Line::new(pt1, pt2).unwrap()`. Use this to effectively document an
    /// assertion at the call-site.
    pub fn must_new(pt1: Pt2D, pt2: Pt2D) -> Line {
        Line::new(pt1, pt2).unwrap()
    }

    pub fn pt1(&self) -> Pt2D {
        self.0
    }

    pub fn pt2(&self) -> Pt2D {
        self.1
    }

    pub fn points(&self) -> Vec<Pt2D> {
        vec![self.0, self.1]
    }

    pub fn length(&self) -> Distance {
        self.pt1().dist_to(self.pt2())
    }

    pub fn angle(&self) -> Angle {
        // Construction guarantees the points differ
        self.pt1()
            .angle_to(self.pt2())
            .unwrap_or(Angle::ZERO)
    }

    pub fn reversed(&self) -> Line {
        Line(self.pt2(), self.pt1())
    }

    pub fn middle(&self) -> Pt2D {
        self.percent_along(0.5)
    }

    /// Unbounded: percentages outside [0, 1] extend the line.
    pub fn percent_along(&self, percent: f64) -> Pt2D {
        Pt2D::new(
            self.pt1().x() + percent * (self.pt2().x() - self.pt1().x()),
            self.pt1().y() + percent * (self.pt2().y() - self.pt1().y()),
        )
    }

    pub fn dist_along(&self, dist: Distance) -> Option<Pt2D> {
        let len = self.length();
        if dist < Distance::ZERO || dist > len + EPSILON_DIST {
            return None;
        }
        Some(self.percent_along(dist / len))
    }

    /// Treats both lines as infinite. None if they're parallel.
    pub fn intersection_infinite(&self, other: &Line) -> Option<InfiniteHit> {
        let d1 = self.pt2() - self.pt1();
        let d2 = other.pt2() - other.pt1();
        let denom = d1.x() * d2.y() - d1.y() * d2.x();
        if denom.abs() < 1e-12 {
            return None;
        }
        let delta = other.pt1() - self.pt1();
        let t1 = (delta.x() * d2.y() - delta.y() * d2.x()) / denom;
        let t2 = (delta.x() * d1.y() - delta.y() * d1.x()) / denom;
        Some(InfiniteHit {
            pt: self.percent_along(t1),
            t1,
            t2,
        })
    }

    /// Where the two segments cross, along with the fraction along each.
    pub fn intersection(&self, other: &Line) -> Option<InfiniteHit> {
        let hit = self.intersection_infinite(other)?;
        if (0.0..=1.0).contains(&hit.t1) && (0.0..=1.0).contains(&hit.t2) {
            Some(hit)
        } else {
            None
        }
    }

    /// Shifts the line perpendicularly; positive widths go to the right of the line's direction.
    pub fn shift_right(&self, width: Distance) -> Line {
        let angle = self.angle().rotate_degs(-90.0);
        Line(
            self.pt1().project_away(width, angle),
            self.pt2().project_away(width, angle),
        )
    }

    /// The closest point on the segment to `pt`.
    pub fn project_pt(&self, pt: Pt2D) -> Pt2D {
        let dir = self.pt2() - self.pt1();
        let len_sq = dir.dot(dir);
        let t = ((pt - self.pt1()).dot(dir) / len_sq).max(0.0).min(1.0);
        self.percent_along(t)
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Line::new(")?;
        writeln!(f, "  Pt2D::new({}, {}),", self.0.x(), self.0.y())?;
        writeln!(f, "  Pt2D::new({}, {}),", self.1.x(), self.1.y())?;
        write!(f, ")")
    }
}
