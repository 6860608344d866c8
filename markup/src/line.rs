use std::fmt;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use geom::{Bezier, Distance, Line, Pt2D};

use crate::{LineStyle, Markup, MarkupDash, MarkupPoint, MarkupPointPair, PointID, StyleKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LineType {
    /// Between points on different enters
    Regular,
    /// Across one enter, between two of its enter points
    Stop,
    /// From an enter point straight across the intersection
    Normal,
    /// Across one enter, between two of its crosswalk points
    Crosswalk,
}

/// Where one part of a line begins or ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinePartEdge {
    Start,
    End,
    /// Where this line crosses another one
    Intersect(MarkupPointPair),
    /// Where this line crosses one side of a crosswalk's painted band. The outer side is the one
    /// farther from the node's center.
    CrosswalkBorder {
        crosswalk: MarkupPointPair,
        outer: bool,
    },
}

impl LinePartEdge {
    /// The other line this edge depends on, if any.
    pub fn depends_on(&self) -> Option<MarkupPointPair> {
        match self {
            LinePartEdge::Start | LinePartEdge::End => None,
            LinePartEdge::Intersect(pair) => Some(*pair),
            LinePartEdge::CrosswalkBorder { crosswalk, .. } => Some(*crosswalk),
        }
    }

    /// The parameter along `line`'s trajectory. None if the edge doesn't exist anymore.
    pub fn t(&self, line: &MarkupLine, markup: &Markup) -> Option<f64> {
        match self {
            LinePartEdge::Start => Some(0.0),
            LinePartEdge::End => Some(1.0),
            LinePartEdge::Intersect(other) => markup
                .intersection(line.pair, *other)
                .map(|hit| hit.first_t),
            LinePartEdge::CrosswalkBorder { crosswalk, outer } => {
                let crosswalk = markup.get_line(*crosswalk)?;
                let border = crosswalk.crosswalk_border(*outer, markup.position())?;
                line.trajectory
                    .intersections_with_line(&border)
                    .into_iter()
                    .map(|(t, _, _)| t)
                    .next()
            }
        }
    }
}

impl fmt::Display for LinePartEdge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LinePartEdge::Start => write!(f, "start"),
            LinePartEdge::End => write!(f, "end"),
            LinePartEdge::Intersect(pair) => write!(f, "crossing with {}", pair),
            LinePartEdge::CrosswalkBorder { crosswalk, outer } => write!(
                f,
                "{} border of crosswalk {}",
                if *outer { "outer" } else { "inner" },
                crosswalk
            ),
        }
    }
}

/// One styled stretch of a line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkupLineRule {
    pub from: LinePartEdge,
    pub to: LinePartEdge,
    pub style: LineStyle,
}

#[derive(Clone, Debug)]
pub struct MarkupLine {
    pub pair: MarkupPointPair,
    pub line_type: LineType,
    pub trajectory: Bezier,
    rules: Vec<MarkupLineRule>,
}

impl MarkupLine {
    /// `start` and `end` must be the pair's first and second points.
    pub(crate) fn new(
        pair: MarkupPointPair,
        start: &MarkupPoint,
        end: &MarkupPoint,
        style: Option<LineStyle>,
    ) -> Result<MarkupLine> {
        let line_type = pair.line_type();
        let style = style.unwrap_or_else(|| LineStyle::default_for(line_type));
        if !style.fits(line_type) {
            bail!(
                "A {:?} style can't be used for the {:?} line {}",
                style.kind(),
                line_type,
                pair
            );
        }
        Ok(MarkupLine {
            pair,
            line_type,
            trajectory: trajectory(line_type, start, end),
            rules: vec![MarkupLineRule {
                from: LinePartEdge::Start,
                to: LinePartEdge::End,
                style,
            }],
        })
    }

    pub fn start(&self) -> PointID {
        self.pair.first()
    }

    pub fn end(&self) -> PointID {
        self.pair.second()
    }

    pub fn contains_point(&self, pt: PointID) -> bool {
        self.pair.contains(pt)
    }

    pub fn rules(&self) -> &Vec<MarkupLineRule> {
        &self.rules
    }

    /// Only regular lines can be split into several styled parts; the others always have exactly
    /// one rule.
    pub fn add_rule(&mut self, rule: MarkupLineRule) -> Result<()> {
        if self.line_type != LineType::Regular {
            bail!("{:?} line {} can't have more rules", self.line_type, self.pair);
        }
        if rule.style.kind() != StyleKind::RegularLine {
            bail!("{:?} style doesn't fit regular line {}", rule.style.kind(), self.pair);
        }
        for edge in [rule.from, rule.to] {
            if edge.depends_on() == Some(self.pair) {
                bail!("{} can't be cut by itself", self.pair);
            }
        }
        self.rules.push(rule);
        Ok(())
    }

    pub fn remove_rule(&mut self, idx: usize) -> Result<MarkupLineRule> {
        if idx >= self.rules.len() {
            bail!("{} has no rule {}", self.pair, idx);
        }
        if self.rules.len() == 1 {
            bail!("{} needs at least one rule", self.pair);
        }
        Ok(self.rules.remove(idx))
    }

    pub fn set_style(&mut self, idx: usize, style: LineStyle) -> Result<()> {
        if !style.fits(self.line_type) {
            bail!("{:?} style doesn't fit {:?} line {}", style.kind(), self.line_type, self.pair);
        }
        match self.rules.get_mut(idx) {
            Some(rule) => {
                rule.style = style;
                Ok(())
            }
            None => bail!("{} has no rule {}", self.pair, idx),
        }
    }

    /// Drops rules that start or end on `other`. A line left without rules gets its default one
    /// back.
    pub(crate) fn forget_line(&mut self, other: MarkupPointPair) {
        self.rules.retain(|rule| {
            rule.from.depends_on() != Some(other) && rule.to.depends_on() != Some(other)
        });
        if self.rules.is_empty() {
            self.rules.push(MarkupLineRule {
                from: LinePartEdge::Start,
                to: LinePartEdge::End,
                style: LineStyle::default_for(self.line_type),
            });
        }
    }

    pub(crate) fn set_rules(&mut self, rules: Vec<MarkupLineRule>) {
        if !rules.is_empty() {
            self.rules = rules;
        }
    }

    pub(crate) fn update_trajectory(&mut self, start: &MarkupPoint, end: &MarkupPoint) {
        self.trajectory = trajectory(self.line_type, start, end);
    }

    /// The painted parts of the line. Rules whose edges can't be found are skipped.
    pub fn dashes(&self, markup: &Markup) -> Vec<MarkupDash> {
        let mut result = Vec::new();
        for rule in &self.rules {
            match (rule.from.t(self, markup), rule.to.t(self, markup)) {
                (Some(t1), Some(t2)) if (t1 - t2).abs() > 1e-6 => {
                    result.extend(rule.style.dashes(&self.trajectory.cut(t1, t2)));
                }
                _ => {
                    debug!("Skipping rule {} to {} of {}", rule.from, rule.to, self.pair);
                }
            }
        }
        result
    }

    /// One side of a crosswalk's painted band. None for other line types.
    pub fn crosswalk_border(&self, outer: bool, node_center: Pt2D) -> Option<Line> {
        if self.line_type != LineType::Crosswalk {
            return None;
        }
        let center = Line::new(self.trajectory.a, self.trajectory.d).ok()?;
        let half = self
            .rules
            .iter()
            .map(|rule| rule.style.total_width())
            .max()
            .unwrap_or(Distance::ZERO)
            / 2.0;
        let right = center.shift_right(half);
        let left = center.shift_right(-half);
        let right_is_outer =
            right.middle().dist_to(node_center) >= left.middle().dist_to(node_center);
        Some(if outer == right_is_outer { right } else { left })
    }
}

fn trajectory(line_type: LineType, start: &MarkupPoint, end: &MarkupPoint) -> Bezier {
    match line_type {
        LineType::Regular => {
            Bezier::smooth(start.position, start.direction, end.position, end.direction)
        }
        LineType::Stop | LineType::Normal | LineType::Crosswalk => {
            Bezier::straight(start.position, end.position)
        }
    }
}

/// Where two lines cross.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MarkupLinesIntersect {
    pub first: MarkupPointPair,
    pub second: MarkupPointPair,
    /// Along the first line's trajectory
    pub first_t: f64,
    pub second_t: f64,
    pub position: Pt2D,
}

impl MarkupLinesIntersect {
    /// The same crossing, seen from the second line.
    pub fn flipped(&self) -> MarkupLinesIntersect {
        MarkupLinesIntersect {
            first: self.second,
            second: self.first,
            first_t: self.second_t,
            second_t: self.first_t,
            position: self.position,
        }
    }

    /// Lines meeting at a shared point don't count as crossing there.
    pub(crate) fn calculate(a: &MarkupLine, b: &MarkupLine) -> Option<MarkupLinesIntersect> {
        let shared: Vec<Pt2D> = [a.trajectory.a, a.trajectory.d]
            .into_iter()
            .filter(|pt| {
                [b.trajectory.a, b.trajectory.d]
                    .iter()
                    .any(|other| other.approx_eq(*pt, Distance::meters(0.01)))
            })
            .collect();
        a.trajectory
            .intersections(&b.trajectory)
            .into_iter()
            .find(|(_, _, pt)| {
                !shared
                    .iter()
                    .any(|s| s.approx_eq(*pt, Distance::meters(0.01)))
            })
            .map(|(first_t, second_t, position)| MarkupLinesIntersect {
                first: a.pair,
                second: b.pair,
                first_t,
                second_t,
                position,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LocationType, PointType, SegmentID};
    use geom::Angle;

    fn point(enter: u16, num: u8, point_type: PointType, pos: Pt2D, dir: f64) -> MarkupPoint {
        MarkupPoint {
            id: PointID::new(SegmentID(enter), num, point_type),
            location: LocationType::Between,
            source_line: 0,
            offset: Distance::ZERO,
            position: pos,
            direction: Angle::degrees(dir),
        }
    }

    #[test]
    fn regular_lines_leave_along_point_directions() {
        let a = point(1, 1, PointType::Enter, Pt2D::new(-10.0, 0.0), 0.0);
        let b = point(2, 1, PointType::Enter, Pt2D::new(0.0, 10.0), -90.0);
        let pair = MarkupPointPair::new(a.id, b.id).unwrap();
        let line = MarkupLine::new(pair, &a, &b, None).unwrap();
        assert_eq!(line.line_type, LineType::Regular);
        assert!(line.trajectory.tangent(0.0).approx_eq(Angle::degrees(0.0), 1.0));
        assert!(line.trajectory.tangent(1.0).approx_eq(Angle::degrees(90.0), 1.0));
        assert_eq!(line.rules().len(), 1);
    }

    #[test]
    fn styles_must_match() {
        let a = point(1, 1, PointType::Enter, Pt2D::new(0.0, 0.0), 90.0);
        let b = point(1, 3, PointType::Enter, Pt2D::new(6.0, 0.0), 90.0);
        let pair = MarkupPointPair::new(a.id, b.id).unwrap();
        let regular = LineStyle::default_for(LineType::Regular);
        assert!(MarkupLine::new(pair, &a, &b, Some(regular.clone())).is_err());

        let mut stop = MarkupLine::new(pair, &a, &b, None).unwrap();
        assert_eq!(stop.line_type, LineType::Stop);
        let rule = MarkupLineRule {
            from: LinePartEdge::Start,
            to: LinePartEdge::End,
            style: regular,
        };
        assert!(stop.add_rule(rule).is_err());
        assert!(stop.remove_rule(0).is_err());
    }

    #[test]
    fn shared_endpoints_dont_cross() {
        let a = point(1, 1, PointType::Enter, Pt2D::new(-10.0, 0.0), 0.0);
        let b = point(2, 1, PointType::Enter, Pt2D::new(10.0, 0.0), 180.0);
        let c = point(3, 1, PointType::Enter, Pt2D::new(0.0, 10.0), -90.0);
        let d = point(4, 1, PointType::Enter, Pt2D::new(0.0, -10.0), 90.0);
        let ab = MarkupLine::new(MarkupPointPair::new(a.id, b.id).unwrap(), &a, &b, None).unwrap();
        let cd = MarkupLine::new(MarkupPointPair::new(c.id, d.id).unwrap(), &c, &d, None).unwrap();
        let ac = MarkupLine::new(MarkupPointPair::new(a.id, c.id).unwrap(), &a, &c, None).unwrap();

        let hit = MarkupLinesIntersect::calculate(&ab, &cd).unwrap();
        assert!(hit.position.approx_eq(Pt2D::new(0.0, 0.0), Distance::meters(0.01)));
        assert!((hit.first_t - 0.5).abs() < 0.01);
        assert_eq!(hit.flipped().first, cd.pair);

        assert!(MarkupLinesIntersect::calculate(&ab, &ac).is_none());
    }
}
