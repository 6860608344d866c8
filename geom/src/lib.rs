//! Planar geometry for intersection markings. Everything lives on the ground plane, measured in
//! meters; elevation isn't tracked.

mod angle;
mod bezier;
mod distance;
mod line;
mod polygon;
mod polyline;
mod pt;

pub use crate::angle::Angle;
pub use crate::bezier::Bezier;
pub use crate::distance::Distance;
pub use crate::line::{InfiniteHit, Line};
pub use crate::polygon::Polygon;
pub use crate::polyline::PolyLine;
pub use crate::pt::Pt2D;

// About 0.1 mm. Anything closer is treated as the same place.
pub const EPSILON_DIST: Distance = Distance::const_meters(0.0001);

/// Reduce the precision of an f64. This helps ensure serialization is idempotent (everything is
/// exactly the same before and after saving/loading). Ideally we'd use some kind of proper
/// fixed-precision type instead of f64.
pub fn trim_f64(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Rounds to the nearest multiple of `step`.
pub(crate) fn round_to_nearest(x: f64, step: f64) -> f64 {
    (x / step).round() * step
}
