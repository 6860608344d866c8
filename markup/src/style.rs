//! How lines and fillers are painted, and the dashes that painting produces.

use serde::{Deserialize, Serialize};

use geom::{Angle, Bezier, Distance, Line, PolyLine, Polygon, Pt2D};

use crate::LineType;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    pub const YELLOW: Color = Color::rgba(255, 204, 0, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Color {
        Color { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Color {
        Color::rgba(136, 136, 136, 224)
    }
}

/// Styles are only interchangeable within one kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StyleKind {
    RegularLine,
    StopLine,
    Crosswalk,
    Filler,
}

impl StyleKind {
    pub fn for_line(line_type: LineType) -> StyleKind {
        match line_type {
            LineType::Regular | LineType::Normal => StyleKind::RegularLine,
            LineType::Stop => StyleKind::StopLine,
            LineType::Crosswalk => StyleKind::Crosswalk,
        }
    }
}

/// One painted rectangle, centered on the segment from `start` to `end`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MarkupDash {
    pub start: Pt2D,
    pub end: Pt2D,
    pub angle: Angle,
    pub width: Distance,
    pub color: Color,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LineStyle {
    Solid {
        color: Color,
        width: Distance,
    },
    Dashed {
        color: Color,
        width: Distance,
        dash_length: Distance,
        space_length: Distance,
    },
    DoubleSolid {
        color: Color,
        width: Distance,
        /// From the center to each of the two lines
        offset: Distance,
    },
    DoubleDashed {
        color: Color,
        width: Distance,
        dash_length: Distance,
        space_length: Distance,
        offset: Distance,
    },
    /// Solid on the left, dashed on the right
    SolidAndDashed {
        color: Color,
        width: Distance,
        dash_length: Distance,
        space_length: Distance,
        offset: Distance,
    },
    StopSolid {
        color: Color,
        width: Distance,
    },
    StopDashed {
        color: Color,
        width: Distance,
        dash_length: Distance,
        space_length: Distance,
    },
    /// Stripes running into the road, `width` deep
    Zebra {
        color: Color,
        width: Distance,
        dash_length: Distance,
        space_length: Distance,
        offset_before: Distance,
        offset_after: Distance,
    },
    /// Marks a crosswalk that's already painted by the road itself. Only used to cut other
    /// lines.
    ExistentCrosswalk {
        width: Distance,
    },
}

const DEFAULT_WIDTH: Distance = Distance::const_meters(0.15);
const DEFAULT_DASH: Distance = Distance::const_meters(1.5);
const DEFAULT_SPACE: Distance = Distance::const_meters(1.5);
pub(crate) const DEFAULT_DOUBLE_OFFSET: Distance = Distance::const_meters(0.15);
const DEFAULT_STOP_WIDTH: Distance = Distance::const_meters(0.3);
const DEFAULT_CROSSWALK_WIDTH: Distance = Distance::const_meters(2.0);
/// Repeating patterns (dashes, zebra stripes, filler stripes) never repeat more often than this.
const MIN_PERIOD: Distance = Distance::const_meters(0.01);

impl LineStyle {
    pub fn default_for(line_type: LineType) -> LineStyle {
        match StyleKind::for_line(line_type) {
            StyleKind::StopLine => LineStyle::StopSolid {
                color: Color::default(),
                width: DEFAULT_STOP_WIDTH,
            },
            StyleKind::Crosswalk => LineStyle::Zebra {
                color: Color::default(),
                width: DEFAULT_CROSSWALK_WIDTH,
                dash_length: Distance::meters(0.4),
                space_length: Distance::meters(0.6),
                offset_before: Distance::meters(0.3),
                offset_after: Distance::meters(0.3),
            },
            _ => LineStyle::Dashed {
                color: Color::default(),
                width: DEFAULT_WIDTH,
                dash_length: DEFAULT_DASH,
                space_length: DEFAULT_SPACE,
            },
        }
    }

    pub fn kind(&self) -> StyleKind {
        match self {
            LineStyle::Solid { .. }
            | LineStyle::Dashed { .. }
            | LineStyle::DoubleSolid { .. }
            | LineStyle::DoubleDashed { .. }
            | LineStyle::SolidAndDashed { .. } => StyleKind::RegularLine,
            LineStyle::StopSolid { .. } | LineStyle::StopDashed { .. } => StyleKind::StopLine,
            LineStyle::Zebra { .. } | LineStyle::ExistentCrosswalk { .. } => StyleKind::Crosswalk,
        }
    }

    pub fn fits(&self, line_type: LineType) -> bool {
        self.kind() == StyleKind::for_line(line_type)
    }

    pub fn color(&self) -> Option<Color> {
        match self {
            LineStyle::Solid { color, .. }
            | LineStyle::Dashed { color, .. }
            | LineStyle::DoubleSolid { color, .. }
            | LineStyle::DoubleDashed { color, .. }
            | LineStyle::SolidAndDashed { color, .. }
            | LineStyle::StopSolid { color, .. }
            | LineStyle::StopDashed { color, .. }
            | LineStyle::Zebra { color, .. } => Some(*color),
            LineStyle::ExistentCrosswalk { .. } => None,
        }
    }

    /// How much room the painted line takes across the road. Crosswalks use this to cut lines
    /// running through them.
    pub fn total_width(&self) -> Distance {
        match self {
            LineStyle::DoubleSolid { width, offset, .. }
            | LineStyle::DoubleDashed { width, offset, .. }
            | LineStyle::SolidAndDashed { width, offset, .. } => *offset * 2.0 + *width,
            LineStyle::Solid { width, .. }
            | LineStyle::Dashed { width, .. }
            | LineStyle::StopSolid { width, .. }
            | LineStyle::StopDashed { width, .. }
            | LineStyle::Zebra { width, .. }
            | LineStyle::ExistentCrosswalk { width } => *width,
        }
    }

    pub fn dashes(&self, trajectory: &Bezier) -> Vec<MarkupDash> {
        let pl = match trajectory.to_polyline() {
            Some(pl) => pl,
            None => return Vec::new(),
        };
        match self {
            LineStyle::Solid { color, width } | LineStyle::StopSolid { color, width } => {
                solid(&pl, *width, *color)
            }
            LineStyle::Dashed {
                color,
                width,
                dash_length,
                space_length,
            }
            | LineStyle::StopDashed {
                color,
                width,
                dash_length,
                space_length,
            } => dashed(&pl, *dash_length, *space_length, *width, *color),
            LineStyle::DoubleSolid {
                color,
                width,
                offset,
            } => {
                let mut result = solid(&pl.shift_right(-*offset), *width, *color);
                result.extend(solid(&pl.shift_right(*offset), *width, *color));
                result
            }
            LineStyle::DoubleDashed {
                color,
                width,
                dash_length,
                space_length,
                offset,
            } => {
                let mut result = dashed(
                    &pl.shift_right(-*offset),
                    *dash_length,
                    *space_length,
                    *width,
                    *color,
                );
                result.extend(dashed(
                    &pl.shift_right(*offset),
                    *dash_length,
                    *space_length,
                    *width,
                    *color,
                ));
                result
            }
            LineStyle::SolidAndDashed {
                color,
                width,
                dash_length,
                space_length,
                offset,
            } => {
                let mut result = solid(&pl.shift_right(-*offset), *width, *color);
                result.extend(dashed(
                    &pl.shift_right(*offset),
                    *dash_length,
                    *space_length,
                    *width,
                    *color,
                ));
                result
            }
            LineStyle::Zebra {
                color,
                width,
                dash_length,
                space_length,
                offset_before,
                offset_after,
            } => zebra(
                &pl,
                *width,
                *dash_length,
                *space_length,
                *offset_before,
                *offset_after,
                *color,
            ),
            LineStyle::ExistentCrosswalk { .. } => Vec::new(),
        }
    }
}

fn dash(start: Pt2D, end: Pt2D, width: Distance, color: Color) -> Option<MarkupDash> {
    let angle = start.angle_to(end)?;
    Some(MarkupDash {
        start,
        end,
        angle,
        width,
        color,
    })
}

fn solid(pl: &PolyLine, width: Distance, color: Color) -> Vec<MarkupDash> {
    pl.lines()
        .filter_map(|l| dash(l.pt1(), l.pt2(), width, color))
        .collect()
}

fn dashed(
    pl: &PolyLine,
    dash_length: Distance,
    space_length: Distance,
    width: Distance,
    color: Color,
) -> Vec<MarkupDash> {
    let mut result = Vec::new();
    let period = dash_length + space_length;
    if period <= Distance::ZERO {
        return result;
    }
    let period = period.max(MIN_PERIOD);
    let len = pl.length();
    let mut dist = Distance::ZERO;
    while dist < len {
        let end = (dist + dash_length).min(len);
        if let (Some((pt1, _)), Some((pt2, _))) = (pl.dist_along(dist), pl.dist_along(end)) {
            result.extend(dash(pt1, pt2, width, color));
        }
        dist += period;
    }
    result
}

fn zebra(
    pl: &PolyLine,
    depth: Distance,
    dash_length: Distance,
    space_length: Distance,
    offset_before: Distance,
    offset_after: Distance,
    color: Color,
) -> Vec<MarkupDash> {
    let mut result = Vec::new();
    let period = dash_length + space_length;
    if period <= Distance::ZERO {
        return result;
    }
    let period = period.max(MIN_PERIOD);
    let len = pl.length() - offset_after;
    let mut dist = offset_before + dash_length / 2.0;
    while dist + dash_length / 2.0 <= len {
        if let Some((center, angle)) = pl.dist_along(dist) {
            // The stripe runs across the crosswalk line, into the intersection
            let across = angle.rotate_degs(90.0);
            let start = center.project_away(-depth / 2.0, across);
            let end = center.project_away(depth / 2.0, across);
            result.extend(dash(start, end, dash_length, color));
        }
        dist += period;
    }
    result
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FillerStyle {
    /// Parallel stripes
    Stripe {
        color: Color,
        width: Distance,
        step: Distance,
        /// Degrees
        angle: f64,
    },
    /// Stripes in two perpendicular directions
    Grid {
        color: Color,
        width: Distance,
        step: Distance,
        angle: f64,
    },
    /// The whole area is painted
    Solid { color: Color },
}

impl Default for FillerStyle {
    fn default() -> FillerStyle {
        FillerStyle::Stripe {
            color: Color::default(),
            width: Distance::meters(0.5),
            step: Distance::meters(3.0),
            angle: 45.0,
        }
    }
}

impl FillerStyle {
    pub fn color(&self) -> Color {
        match self {
            FillerStyle::Stripe { color, .. }
            | FillerStyle::Grid { color, .. }
            | FillerStyle::Solid { color } => *color,
        }
    }

    /// The stripes covering the area. Solid fillers paint the polygon itself and have none.
    pub fn dashes(&self, polygon: &Polygon) -> Vec<MarkupDash> {
        match self {
            FillerStyle::Stripe {
                color,
                width,
                step,
                angle,
            } => stripes(polygon, Angle::degrees(*angle), *step, *width, *color),
            FillerStyle::Grid {
                color,
                width,
                step,
                angle,
            } => {
                let mut result = stripes(polygon, Angle::degrees(*angle), *step, *width, *color);
                result.extend(stripes(
                    polygon,
                    Angle::degrees(*angle + 90.0),
                    *step,
                    *width,
                    *color,
                ));
                result
            }
            FillerStyle::Solid { .. } => Vec::new(),
        }
    }
}

/// Parallel lines in direction `angle`, spaced `step` apart, clipped to the polygon.
fn stripes(
    polygon: &Polygon,
    angle: Angle,
    step: Distance,
    width: Distance,
    color: Color,
) -> Vec<MarkupDash> {
    let mut result = Vec::new();
    if step <= Distance::ZERO {
        return result;
    }
    let center = polygon.center();
    let across = angle.rotate_degs(90.0).unit_vector();
    let along = angle.unit_vector();
    let ring = polygon.closed_ring();
    let edges: Vec<Line> = ring
        .windows(2)
        .filter_map(|pair| Line::new(pair[0], pair[1]).ok())
        .collect();

    let projections: Vec<f64> = ring.iter().map(|pt| (*pt - center).dot(across)).collect();
    let reach: f64 = ring
        .iter()
        .map(|pt| (*pt - center).magnitude())
        .fold(0.0, f64::max)
        + 1.0;
    let min = projections.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = projections.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let step = step.max(MIN_PERIOD).inner_meters();
    let mut s = min + step / 2.0;
    while s < max {
        let base = center + across * s;
        let scan = Line::new(base + along * (-reach), base + along * reach);
        if let Ok(scan) = scan {
            let mut hits: Vec<f64> = edges
                .iter()
                .filter_map(|edge| scan.intersection(edge))
                .map(|hit| hit.t1)
                .collect();
            hits.sort_by(|a, b| a.total_cmp(b));
            hits.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
            for pair in hits.chunks(2) {
                if let [t1, t2] = pair {
                    result.extend(dash(
                        scan.percent_along(*t1),
                        scan.percent_along(*t2),
                        width,
                        color,
                    ));
                }
            }
        }
        s += step;
    }
    result
}
