use std::fmt;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::{Angle, Distance, Line, Pt2D, EPSILON_DIST};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolyLine {
    pts: Vec<Pt2D>,
}

impl PolyLine {
    pub fn new(pts: Vec<Pt2D>) -> Result<PolyLine> {
        if pts.len() < 2 {
            bail!("Need at least two points for a PolyLine");
        }
        if pts
            .windows(2)
            .any(|pair| pair[0].approx_eq(pair[1], EPSILON_DIST))
        {
            bail!("PolyLine has ~dupe adjacent pts");
        }
        Ok(PolyLine { pts })
    }

    pub fn must_new(pts: Vec<Pt2D>) -> PolyLine {
        PolyLine::new(pts).unwrap()
    }

    /// Like `new`, but removes adjacent duplicate points first.
    pub fn deduping_new(mut pts: Vec<Pt2D>) -> Result<PolyLine> {
        pts.dedup_by(|a, b| a.approx_eq(*b, EPSILON_DIST));
        PolyLine::new(pts)
    }

    pub fn points(&self) -> &Vec<Pt2D> {
        &self.pts
    }

    pub fn into_points(self) -> Vec<Pt2D> {
        self.pts
    }

    pub fn first_pt(&self) -> Pt2D {
        self.pts[0]
    }

    pub fn last_pt(&self) -> Pt2D {
        *self.pts.last().unwrap()
    }

    pub fn lines(&self) -> impl Iterator<Item = Line> + '_ {
        self.pts
            .windows(2)
            .map(|pair| Line::must_new(pair[0], pair[1]))
    }

    pub fn first_line(&self) -> Line {
        Line::must_new(self.pts[0], self.pts[1])
    }

    pub fn last_line(&self) -> Line {
        Line::must_new(self.pts[self.pts.len() - 2], self.pts[self.pts.len() - 1])
    }

    pub fn length(&self) -> Distance {
        self.lines().map(|l| l.length()).sum()
    }

    pub fn reversed(&self) -> PolyLine {
        let mut pts = self.pts.clone();
        pts.reverse();
        PolyLine { pts }
    }

    /// The point `dist` along the polyline and the direction there. None if `dist` is off either
    /// end.
    pub fn dist_along(&self, dist: Distance) -> Option<(Pt2D, Angle)> {
        if dist < Distance::ZERO {
            return None;
        }
        let mut so_far = Distance::ZERO;
        for l in self.lines() {
            let len = l.length();
            if dist <= so_far + len {
                let pt = l.dist_along(dist - so_far).unwrap_or_else(|| l.pt2());
                return Some((pt, l.angle()));
            }
            so_far += len;
        }
        if dist <= so_far + EPSILON_DIST {
            let last = self.last_line();
            return Some((last.pt2(), last.angle()));
        }
        None
    }

    /// Every point shifted perpendicular to the polyline; positive distances go right. Sharp
    /// bends aren't mitered.
    pub fn shift_right(&self, width: Distance) -> PolyLine {
        let mut pts = Vec::new();
        for (idx, pt) in self.pts.iter().enumerate() {
            let before = idx.checked_sub(1).map(|i| self.pts[i]).unwrap_or(*pt);
            let after = self.pts.get(idx + 1).cloned().unwrap_or(*pt);
            let dir = before.angle_to(after).unwrap_or(Angle::ZERO);
            pts.push(pt.project_away(width, dir.rotate_degs(-90.0)));
        }
        PolyLine { pts }
    }

    /// Every place the two polylines cross, with the distance along each.
    pub fn intersections(&self, other: &PolyLine) -> Vec<(Pt2D, Distance, Distance)> {
        let mut hits = Vec::new();
        let mut dist1 = Distance::ZERO;
        for l1 in self.lines() {
            let mut dist2 = Distance::ZERO;
            for l2 in other.lines() {
                if let Some(hit) = l1.intersection(&l2) {
                    hits.push((
                        hit.pt,
                        dist1 + l1.length() * hit.t1,
                        dist2 + l2.length() * hit.t2,
                    ));
                }
                dist2 += l2.length();
            }
            dist1 += l1.length();
        }
        hits
    }

    /// The closest point on the polyline to `pt`, along with how far along it is.
    pub fn project_pt(&self, pt: Pt2D) -> (Pt2D, Distance) {
        let mut best: Option<(Pt2D, Distance, Distance)> = None;
        let mut so_far = Distance::ZERO;
        for l in self.lines() {
            let projected = l.project_pt(pt);
            let dist = projected.dist_to(pt);
            if best.map(|(_, _, d)| dist < d).unwrap_or(true) {
                best = Some((projected, so_far + l.pt1().dist_to(projected), dist));
            }
            so_far += l.length();
        }
        let (projected, along, _) = best.unwrap();
        (projected, along)
    }
}

impl fmt::Display for PolyLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "PolyLine::new(vec![")?;
        for pt in &self.pts {
            writeln!(f, "  Pt2D::new({}, {}),", pt.x(), pt.y())?;
        }
        write!(f, "])")
    }
}
