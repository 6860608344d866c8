use serde::{Deserialize, Serialize};

use crate::{Angle, Distance, Line, PolyLine, Pt2D, EPSILON_DIST};

// How many straight pieces approximate a curve when intersecting or measuring it
const FLATTEN_STEPS: usize = 32;

/// A cubic Bézier curve. Straight trajectories are represented with evenly spaced control points,
/// so the curve parameter is proportional to distance along them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bezier {
    pub a: Pt2D,
    pub b: Pt2D,
    pub c: Pt2D,
    pub d: Pt2D,
}

impl Bezier {
    pub fn straight(a: Pt2D, d: Pt2D) -> Bezier {
        Bezier {
            a,
            b: a.lerp(d, 1.0 / 3.0),
            c: a.lerp(d, 2.0 / 3.0),
            d,
        }
    }

    /// Leaves `start` heading along `start_dir` and arrives at `end` as if coming from
    /// `end_dir`. Both control points sit a third of the chord away from their endpoint.
    pub fn smooth(start: Pt2D, start_dir: Angle, end: Pt2D, end_dir: Angle) -> Bezier {
        let third = start.dist_to(end) / 3.0;
        if third <= EPSILON_DIST {
            return Bezier::straight(start, end);
        }
        Bezier {
            a: start,
            b: start.project_away(third, start_dir),
            c: end.project_away(third, end_dir),
            d: end,
        }
    }

    pub fn position(&self, t: f64) -> Pt2D {
        let t = t.max(0.0).min(1.0);
        let mt = 1.0 - t;
        self.a * (mt * mt * mt)
            + self.b * (3.0 * mt * mt * t)
            + self.c * (3.0 * mt * t * t)
            + self.d * (t * t * t)
    }

    /// The direction of travel at `t`. Falls back to the chord when the derivative vanishes.
    pub fn tangent(&self, t: f64) -> Angle {
        let t = t.max(0.0).min(1.0);
        let mt = 1.0 - t;
        let deriv = (self.b - self.a) * (3.0 * mt * mt)
            + (self.c - self.b) * (6.0 * mt * t)
            + (self.d - self.c) * (3.0 * t * t);
        Angle::from_vector(deriv.x(), deriv.y())
            .or_else(|| self.a.angle_to(self.d))
            .unwrap_or(Angle::ZERO)
    }

    /// The piece of the curve between `t0` and `t1`, which may be given in either order. The
    /// result runs from `t0` to `t1`.
    pub fn cut(&self, t0: f64, t1: f64) -> Bezier {
        let (lo, hi) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
        let lo = lo.max(0.0).min(1.0);
        let hi = hi.max(0.0).min(1.0);
        let (_, right) = self.split(lo);
        let inner_t = if lo >= 1.0 { 0.0 } else { (hi - lo) / (1.0 - lo) };
        let (piece, _) = right.split(inner_t);
        if t0 <= t1 {
            piece
        } else {
            piece.reversed()
        }
    }

    /// de Casteljau subdivision at `t`.
    pub fn split(&self, t: f64) -> (Bezier, Bezier) {
        let ab = self.a.lerp(self.b, t);
        let bc = self.b.lerp(self.c, t);
        let cd = self.c.lerp(self.d, t);
        let abc = ab.lerp(bc, t);
        let bcd = bc.lerp(cd, t);
        let mid = abc.lerp(bcd, t);
        (
            Bezier {
                a: self.a,
                b: ab,
                c: abc,
                d: mid,
            },
            Bezier {
                a: mid,
                b: bcd,
                c: cd,
                d: self.d,
            },
        )
    }

    pub fn reversed(&self) -> Bezier {
        Bezier {
            a: self.d,
            b: self.c,
            c: self.b,
            d: self.a,
        }
    }

    /// Evenly spaced samples of the curve, each paired with its parameter.
    pub fn samples(&self) -> Vec<(Pt2D, f64)> {
        (0..=FLATTEN_STEPS)
            .map(|i| {
                let t = (i as f64) / (FLATTEN_STEPS as f64);
                (self.position(t), t)
            })
            .collect()
    }

    /// None if the curve collapses onto a single point.
    pub fn to_polyline(&self) -> Option<PolyLine> {
        PolyLine::deduping_new(self.samples().into_iter().map(|(pt, _)| pt).collect()).ok()
    }

    pub fn length(&self) -> Distance {
        self.samples()
            .windows(2)
            .map(|pair| pair[0].0.dist_to(pair[1].0))
            .sum()
    }

    /// Every place where the two curves cross, as (t on self, t on other, position).
    pub fn intersections(&self, other: &Bezier) -> Vec<(f64, f64, Pt2D)> {
        let mine = self.samples();
        let theirs = other.samples();
        let mut hits: Vec<(f64, f64, Pt2D)> = Vec::new();
        for p1 in mine.windows(2) {
            let l1 = match Line::new(p1[0].0, p1[1].0) {
                Ok(l) => l,
                Err(_) => continue,
            };
            for p2 in theirs.windows(2) {
                let l2 = match Line::new(p2[0].0, p2[1].0) {
                    Ok(l) => l,
                    Err(_) => continue,
                };
                if let Some(hit) = l1.intersection(&l2) {
                    // Crossings exactly on a sample show up on both neighboring pieces
                    if hits
                        .iter()
                        .any(|(_, _, pt)| pt.approx_eq(hit.pt, EPSILON_DIST * 10.0))
                    {
                        continue;
                    }
                    hits.push((
                        p1[0].1 + (p1[1].1 - p1[0].1) * hit.t1,
                        p2[0].1 + (p2[1].1 - p2[0].1) * hit.t2,
                        hit.pt,
                    ));
                }
            }
        }
        hits
    }

    /// Every place where the curve crosses a segment, as (t on curve, t on line, position).
    pub fn intersections_with_line(&self, line: &Line) -> Vec<(f64, f64, Pt2D)> {
        self.intersections(&Bezier::straight(line.pt1(), line.pt2()))
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;

    use super::*;

    fn random_pt(rng: &mut XorShiftRng) -> Pt2D {
        Pt2D::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0))
    }

    #[test]
    fn straight_curves_are_linear() {
        let b = Bezier::straight(Pt2D::new(0.0, 0.0), Pt2D::new(9.0, 0.0));
        assert!(b.position(1.0 / 3.0).approx_eq(Pt2D::new(3.0, 0.0), EPSILON_DIST));
        assert!((b.length().inner_meters() - 9.0).abs() < 1e-6);
        assert!(b.tangent(0.5).approx_eq(Angle::degrees(0.0), 1e-6));
    }

    #[test]
    fn cut_keeps_orientation() {
        let b = Bezier::straight(Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 0.0));
        let piece = b.cut(0.2, 0.6);
        assert!(piece.a.approx_eq(Pt2D::new(2.0, 0.0), EPSILON_DIST));
        assert!(piece.d.approx_eq(Pt2D::new(6.0, 0.0), EPSILON_DIST));
        let backwards = b.cut(0.6, 0.2);
        assert!(backwards.a.approx_eq(Pt2D::new(6.0, 0.0), EPSILON_DIST));
    }

    #[test]
    fn crossing_curves() {
        let horiz = Bezier::straight(Pt2D::new(-10.0, 0.0), Pt2D::new(10.0, 0.0));
        let curve = Bezier::smooth(
            Pt2D::new(0.0, -10.0),
            Angle::degrees(90.0),
            Pt2D::new(0.0, 10.0),
            Angle::degrees(-90.0),
        );
        let hits = horiz.intersections(&curve);
        assert_eq!(hits.len(), 1);
        let (t1, t2, pt) = hits[0];
        assert!((t1 - 0.5).abs() < 1e-6);
        assert!((t2 - 0.5).abs() < 1e-6);
        assert!(pt.approx_eq(Pt2D::new(0.0, 0.0), Distance::meters(0.001)));
    }

    #[test]
    fn pieces_meet_the_curve() {
        let mut rng = XorShiftRng::seed_from_u64(42);
        for _ in 0..100 {
            let b = Bezier {
                a: random_pt(&mut rng),
                b: random_pt(&mut rng),
                c: random_pt(&mut rng),
                d: random_pt(&mut rng),
            };
            let t0 = rng.gen_range(0.0..1.0);
            let t1 = rng.gen_range(0.0..1.0);
            let piece = b.cut(t0, t1);
            let threshold = Distance::meters(0.001);
            assert!(piece.a.approx_eq(b.position(t0), threshold));
            assert!(piece.d.approx_eq(b.position(t1), threshold));
            // Subdividing only reparametrizes
            assert!(piece
                .position(0.5)
                .approx_eq(b.position((t0 + t1) / 2.0), threshold));
        }
    }
}
