use std::fmt;

use anyhow::{bail, Result};
use geo::{Area, Contains};
use serde::{Deserialize, Serialize};

use crate::{Distance, Pt2D, EPSILON_DIST};

/// A simple polygon without holes. The first point isn't repeated at the end.
#[derive(PartialEq, Serialize, Deserialize, Clone, Debug)]
pub struct Polygon {
    points: Vec<Pt2D>,
}

impl Polygon {
    pub fn new(mut points: Vec<Pt2D>) -> Result<Polygon> {
        points.dedup_by(|a, b| a.approx_eq(*b, EPSILON_DIST));
        if points.len() >= 2 && points[0].approx_eq(*points.last().unwrap(), EPSILON_DIST) {
            points.pop();
        }
        if points.len() < 3 {
            bail!("Polygon needs at least 3 distinct points, got {}", points.len());
        }
        Ok(Polygon { points })
    }

    pub fn points(&self) -> &Vec<Pt2D> {
        &self.points
    }

    /// The points with the first repeated at the end.
    pub fn closed_ring(&self) -> Vec<Pt2D> {
        let mut pts = self.points.clone();
        pts.push(pts[0]);
        pts
    }

    pub fn area(&self) -> f64 {
        self.to_geo().unsigned_area()
    }

    pub fn perimeter(&self) -> Distance {
        self.closed_ring()
            .windows(2)
            .map(|pair| pair[0].dist_to(pair[1]))
            .sum()
    }

    /// Does this polygon contain the point in its interior?
    pub fn contains_pt(&self, pt: Pt2D) -> bool {
        self.to_geo().contains(&geo::Point::from(pt))
    }

    pub fn center(&self) -> Pt2D {
        Pt2D::center(&self.points)
    }

    fn to_geo(&self) -> geo::Polygon<f64> {
        geo::Polygon::new(
            geo::LineString::from(
                self.closed_ring()
                    .into_iter()
                    .map(geo::Coordinate::from)
                    .collect::<Vec<_>>(),
            ),
            Vec::new(),
        )
    }
}

impl fmt::Display for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Polygon with {} points", self.points.len())?;
        for pt in &self.points {
            writeln!(f, "  {}", pt)?;
        }
        Ok(())
    }
}
