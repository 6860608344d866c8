//! Fillers paint an area bounded by lines, the crossings between them, and enter borders.

use std::fmt;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use geom::{Bezier, Polygon, Pt2D};

use crate::{FillerStyle, Markup, MarkupDash, MarkupPointPair, PointID, PointType};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FillerVertex {
    Point(PointID),
    /// Where two lines cross. The smaller pair comes first.
    Intersect(MarkupPointPair, MarkupPointPair),
}

impl FillerVertex {
    pub fn intersect(a: MarkupPointPair, b: MarkupPointPair) -> FillerVertex {
        if a < b {
            FillerVertex::Intersect(a, b)
        } else {
            FillerVertex::Intersect(b, a)
        }
    }

    pub fn position(&self, markup: &Markup) -> Option<Pt2D> {
        match self {
            FillerVertex::Point(pt) => markup.get_point(*pt).map(|p| p.position),
            FillerVertex::Intersect(a, b) => markup.intersection(*a, *b).map(|hit| hit.position),
        }
    }

    /// Every existing line passing through this vertex.
    fn lines(&self, markup: &Markup) -> Vec<MarkupPointPair> {
        match self {
            FillerVertex::Point(pt) => markup.lines_with_point(*pt),
            FillerVertex::Intersect(a, b) => vec![*a, *b],
        }
    }

    /// Where this vertex sits along `line`.
    fn t_on(&self, line: MarkupPointPair, markup: &Markup) -> Option<f64> {
        match self {
            FillerVertex::Point(pt) => {
                if line.first() == *pt {
                    Some(0.0)
                } else if line.second() == *pt {
                    Some(1.0)
                } else {
                    None
                }
            }
            FillerVertex::Intersect(_, _) => {
                let other = self.lines(markup).into_iter().find(|l| *l != line)?;
                markup.intersection(line, other).map(|hit| hit.first_t)
            }
        }
    }

    fn depends_on(&self, line: MarkupPointPair) -> bool {
        match self {
            FillerVertex::Point(_) => false,
            FillerVertex::Intersect(a, b) => *a == line || *b == line,
        }
    }
}

impl fmt::Display for FillerVertex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FillerVertex::Point(pt) => write!(f, "{}", pt),
            FillerVertex::Intersect(a, b) => write!(f, "crossing of {} and {}", a, b),
        }
    }
}

/// How two neighboring vertices of a filler are joined.
#[derive(Clone, Copy, Debug, PartialEq)]
enum FillerEdge {
    Line(MarkupPointPair),
    /// Straight along an enter, between two of its neighboring points
    EnterBorder,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkupFiller {
    vertices: Vec<FillerVertex>,
    pub style: FillerStyle,
    closed: bool,
}

impl MarkupFiller {
    pub fn new(style: FillerStyle) -> MarkupFiller {
        MarkupFiller {
            vertices: Vec::new(),
            style,
            closed: false,
        }
    }

    pub(crate) fn from_vertices(vertices: Vec<FillerVertex>, style: FillerStyle) -> MarkupFiller {
        MarkupFiller {
            closed: vertices.len() >= 3,
            vertices,
            style,
        }
    }

    pub fn vertices(&self) -> &Vec<FillerVertex> {
        &self.vertices
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn first(&self) -> Option<FillerVertex> {
        self.vertices.first().cloned()
    }

    pub fn last(&self) -> Option<FillerVertex> {
        self.vertices.last().cloned()
    }

    /// Adds a vertex. Returns true once the filler is closed by coming back to the first vertex.
    pub fn add(&mut self, vertex: FillerVertex) -> bool {
        if self.closed {
            return true;
        }
        if self.vertices.len() >= 3 && Some(vertex) == self.first() {
            self.closed = true;
            return true;
        }
        self.vertices.push(vertex);
        false
    }

    /// Takes back the last vertex. A closed filler is reopened instead, handing back the vertex
    /// that closed it.
    pub fn remove(&mut self) -> Option<FillerVertex> {
        if self.closed {
            self.closed = false;
            return self.first();
        }
        self.vertices.pop()
    }

    /// Vertices that can come after the last one. An empty filler can start at any enter point or
    /// crossing.
    pub fn next_candidates(&self, markup: &Markup) -> Vec<FillerVertex> {
        let last = match self.last() {
            Some(v) => v,
            None => {
                let mut result: Vec<FillerVertex> = markup
                    .enters()
                    .flat_map(|e| e.points())
                    .map(|pt| FillerVertex::Point(pt.id))
                    .collect();
                result.extend(
                    markup
                        .all_intersections()
                        .map(|hit| FillerVertex::intersect(hit.first, hit.second)),
                );
                return result;
            }
        };
        let mut result = Vec::new();
        for line in last.lines(markup) {
            let t = match last.t_on(line, markup) {
                Some(t) => t,
                None => continue,
            };
            let (before, after) = neighbors_along(line, t, markup);
            result.extend(before);
            result.extend(after);
        }
        if let FillerVertex::Point(pt) = last {
            if pt.point_type == PointType::Enter {
                for num in [pt.num.checked_sub(1), pt.num.checked_add(1)] {
                    let id = match num {
                        Some(num) => PointID::new(pt.enter, num, PointType::Enter),
                        None => continue,
                    };
                    if markup.get_point(id).is_some() {
                        result.push(FillerVertex::Point(id));
                    }
                }
            }
        }

        let first = self.first();
        let can_close = self.vertices.len() >= 3;
        result.sort();
        result.dedup();
        result.retain(|v| {
            if Some(*v) == first {
                can_close
            } else {
                !self.vertices.contains(v)
            }
        });
        result
    }

    fn edge(&self, from: FillerVertex, to: FillerVertex, markup: &Markup) -> Option<FillerEdge> {
        let to_lines = to.lines(markup);
        if let Some(line) = from.lines(markup).into_iter().find(|l| to_lines.contains(l)) {
            return Some(FillerEdge::Line(line));
        }
        match (from, to) {
            (FillerVertex::Point(a), FillerVertex::Point(b))
                if a.enter == b.enter
                    && a.point_type == PointType::Enter
                    && b.point_type == PointType::Enter =>
            {
                Some(FillerEdge::EnterBorder)
            }
            _ => None,
        }
    }

    /// Consecutive vertex pairs, wrapping around to the first one.
    fn edges(&self) -> impl Iterator<Item = (FillerVertex, FillerVertex)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Whether removing `line` breaks this filler.
    pub(crate) fn uses_line(&self, line: MarkupPointPair, markup: &Markup) -> bool {
        if self.vertices.iter().any(|v| v.depends_on(line)) {
            return true;
        }
        self.edges()
            .any(|(a, b)| self.edge(a, b, markup) == Some(FillerEdge::Line(line)))
    }

    /// The outline, following the lines between vertices. None if the filler isn't closed or
    /// something it relies on is gone.
    pub fn polygon(&self, markup: &Markup) -> Option<Polygon> {
        if !self.closed {
            return None;
        }
        let mut pts = Vec::new();
        for (from, to) in self.edges() {
            let curve = match self.edge(from, to, markup)? {
                FillerEdge::Line(line) => {
                    let t1 = from.t_on(line, markup)?;
                    let t2 = to.t_on(line, markup)?;
                    markup.get_line(line)?.trajectory.cut(t1, t2)
                }
                FillerEdge::EnterBorder => {
                    Bezier::straight(from.position(markup)?, to.position(markup)?)
                }
            };
            let samples = curve.samples();
            pts.extend(samples[..samples.len() - 1].iter().map(|(pt, _)| *pt));
        }
        Polygon::new(pts).ok()
    }

    pub fn dashes(&self, markup: &Markup) -> Result<Vec<MarkupDash>> {
        match self.polygon(markup) {
            Some(polygon) => Ok(self.style.dashes(&polygon)),
            None => bail!("Filler {} can't be built", self),
        }
    }
}

impl fmt::Display for MarkupFiller {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let names: Vec<String> = self.vertices.iter().map(|v| v.to_string()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// The nearest vertices on `line` before and after `t`.
fn neighbors_along(
    line: MarkupPointPair,
    t: f64,
    markup: &Markup,
) -> (Option<FillerVertex>, Option<FillerVertex>) {
    let mut along: Vec<(f64, FillerVertex)> = vec![
        (0.0, FillerVertex::Point(line.first())),
        (1.0, FillerVertex::Point(line.second())),
    ];
    for hit in markup.intersections_of(line) {
        along.push((hit.first_t, FillerVertex::intersect(line, hit.second)));
    }

    let mut before: Option<(f64, FillerVertex)> = None;
    let mut after: Option<(f64, FillerVertex)> = None;
    for (other_t, v) in along {
        if other_t < t - 1e-6 && before.map(|(b, _)| other_t > b).unwrap_or(true) {
            before = Some((other_t, v));
        }
        if other_t > t + 1e-6 && after.map(|(a, _)| other_t < a).unwrap_or(true) {
            after = Some((other_t, v));
        }
    }
    (before.map(|(_, v)| v), after.map(|(_, v)| v))
}
