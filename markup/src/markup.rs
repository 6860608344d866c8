use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Result};

use abstutil::wraparound_get;
use geom::{Angle, Distance, Line, Polygon, Pt2D};

use crate::{
    Enter, LineStyle, MarkupDash, MarkupData, MarkupFiller, MarkupLine, MarkupLinesIntersect,
    MarkupPoint, MarkupPointPair, Network, NodeID, ObjectsMap, PointID, PointType, SegmentID,
};

/// All the markings at one node.
#[derive(Clone, Debug)]
pub struct Markup {
    pub id: NodeID,
    position: Pt2D,
    half_width: Distance,
    /// Sorted by absolute angle
    enters: Vec<Enter>,
    lines: BTreeMap<MarkupPointPair, MarkupLine>,
    fillers: Vec<MarkupFiller>,
    /// Keyed with the smaller pair first
    intersections: BTreeMap<(MarkupPointPair, MarkupPointPair), MarkupLinesIntersect>,
}

impl Markup {
    pub fn new(net: &Network, id: NodeID) -> Result<Markup> {
        let node = net.get_n(id)?;
        let mut markup = Markup {
            id,
            position: node.position,
            half_width: node.half_width,
            enters: Vec::new(),
            lines: BTreeMap::new(),
            fillers: Vec::new(),
            intersections: BTreeMap::new(),
        };
        markup.update(net)?;
        Ok(markup)
    }

    pub fn position(&self) -> Pt2D {
        self.position
    }

    pub fn half_width(&self) -> Distance {
        self.half_width
    }

    /// Recomputes everything from the current road geometry. Point offsets survive for every
    /// number that still exists; lines that can't be resolved anymore are dropped.
    pub fn update(&mut self, net: &Network) -> Result<()> {
        let node = net.get_n(self.id)?;
        self.position = node.position;
        self.half_width = node.half_width;

        let mut old: BTreeMap<SegmentID, Enter> =
            self.enters.drain(..).map(|e| (e.id, e)).collect();
        let mut enters = Vec::new();
        for s in &node.segments {
            let enter = match old.remove(s) {
                Some(mut enter) => {
                    enter.update(net)?;
                    enter
                }
                None => Enter::new(net, self.id, *s)?,
            };
            enters.push(enter);
        }
        for id in old.keys() {
            debug!("{} no longer touches {}", id, self.id);
        }
        enters.sort_by(|a, b| {
            a.absolute_angle
                .normalized_degrees()
                .partial_cmp(&b.absolute_angle.normalized_degrees())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        self.enters = enters;
        self.refresh();
        Ok(())
    }

    /// After points move, puts normal points, line trajectories and crossings in sync.
    fn refresh(&mut self) {
        let border = self.contour_lines();
        let half_width = self.half_width;
        for enter in &mut self.enters {
            enter.update_normals(&border, half_width);
        }

        let mut lost = Vec::new();
        let pairs: Vec<MarkupPointPair> = self.lines.keys().cloned().collect();
        for pair in pairs {
            let ends = match (self.get_point(pair.first()), self.get_point(pair.second())) {
                (Some(a), Some(b)) => Some((a.clone(), b.clone())),
                _ => None,
            };
            match ends {
                Some((a, b)) => {
                    if let Some(line) = self.lines.get_mut(&pair) {
                        line.update_trajectory(&a, &b);
                    }
                }
                None => lost.push(pair),
            }
        }
        for pair in lost {
            warn!("Line {} at {} lost its points; removing it", pair, self.id);
            self.remove_line(pair);
        }
        self.recalculate_intersections();
    }

    fn recalculate_intersections(&mut self) {
        self.intersections.clear();
        let lines: Vec<&MarkupLine> = self.lines.values().collect();
        for (i, a) in lines.iter().enumerate() {
            for b in &lines[i + 1..] {
                if let Some(hit) = MarkupLinesIntersect::calculate(a, b) {
                    self.intersections.insert((a.pair, b.pair), hit);
                }
            }
        }
    }

    pub fn enters(&self) -> impl Iterator<Item = &Enter> {
        self.enters.iter()
    }

    pub fn enter_count(&self) -> usize {
        self.enters.len()
    }

    pub fn get_enter(&self, id: SegmentID) -> Option<&Enter> {
        self.enters.iter().find(|e| e.id == id)
    }

    fn enter_idx(&self, id: SegmentID) -> Result<usize> {
        self.enters
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| anyhow!("{} has no enter {}", self.id, id))
    }

    /// The neighboring enter counter-clockwise, wrapping around.
    pub fn next_enter(&self, id: SegmentID) -> Result<&Enter> {
        let idx = self.enter_idx(id)?;
        Ok(wraparound_get(&self.enters, idx as isize + 1))
    }

    pub fn prev_enter(&self, id: SegmentID) -> Result<&Enter> {
        let idx = self.enter_idx(id)?;
        Ok(wraparound_get(&self.enters, idx as isize - 1))
    }

    /// Every enter's side points, ordered around the node, tagged with their enter.
    fn contour_points(&self) -> Vec<(Pt2D, SegmentID)> {
        let mut pts: Vec<(f64, Pt2D, SegmentID)> = Vec::new();
        for enter in &self.enters {
            if let Some((first, last)) = enter.side_points() {
                for pt in [first, last] {
                    let angle = self
                        .position
                        .angle_to(pt)
                        .unwrap_or(Angle::ZERO)
                        .normalized_degrees();
                    pts.push((angle, pt, enter.id));
                }
            }
        }
        pts.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        pts.into_iter().map(|(_, pt, id)| (pt, id)).collect()
    }

    fn contour_lines(&self) -> Vec<Line> {
        let pts = self.contour_points();
        if pts.len() < 2 {
            return Vec::new();
        }
        (0..pts.len())
            .filter_map(|i| {
                let (next, _) = wraparound_get(&pts, i as isize + 1);
                Line::new(pts[i].0, *next).ok()
            })
            .collect()
    }

    /// The outline of the area between the enters. None with fewer than two enters that have
    /// drive lanes.
    pub fn contour(&self) -> Option<Polygon> {
        Polygon::new(self.contour_points().into_iter().map(|(pt, _)| pt).collect()).ok()
    }

    /// The curb between two neighboring enters.
    pub fn borders_line(&self, enter: SegmentID, neighbor: SegmentID) -> Option<Line> {
        let pts = self.contour_points();
        for i in 0..pts.len() {
            let (pt1, id1) = pts[i];
            let (pt2, id2) = *wraparound_get(&pts, i as isize + 1);
            if (id1, id2) == (enter, neighbor) || (id1, id2) == (neighbor, enter) {
                return Line::new(pt1, pt2).ok();
            }
        }
        None
    }

    pub fn get_point(&self, id: PointID) -> Option<&MarkupPoint> {
        self.get_enter(id.enter)?.get_point(id.num, id.point_type)
    }

    pub fn points(&self) -> impl Iterator<Item = &MarkupPoint> {
        self.enters
            .iter()
            .flat_map(|e| e.points().chain(e.crosswalks()).chain(e.normals()))
    }

    /// Moves one point along its enter. Lines attached to it follow.
    pub fn set_point_offset(&mut self, id: PointID, offset: Distance) -> Result<()> {
        let idx = self.enter_idx(id.enter)?;
        self.enters[idx].set_offset(id.num, id.point_type, offset)?;
        self.refresh();
        Ok(())
    }

    /// Moves many points at once. Points that don't exist are skipped.
    pub(crate) fn set_offsets(&mut self, offsets: Vec<(PointID, Distance)>) {
        for (id, offset) in offsets {
            let result = self
                .enter_idx(id.enter)
                .and_then(|idx| self.enters[idx].set_offset(id.num, id.point_type, offset));
            if let Err(err) = result {
                warn!("Can't move {}: {:#}", id, err);
            }
        }
        self.refresh();
    }

    /// Moves a point to line up with the cursor, returning its new offset.
    pub fn drag_point(&mut self, id: PointID, cursor: Pt2D) -> Result<Distance> {
        let point = self
            .get_point(id)
            .ok_or_else(|| anyhow!("{} has no {}", self.id, id))?;
        if point.point_type() == PointType::Normal {
            bail!("{} can't be dragged", id);
        }
        let enter = self
            .get_enter(id.enter)
            .ok_or_else(|| anyhow!("{} has no enter {}", self.id, id.enter))?;
        let offset = enter.drag_offset(point, cursor);
        self.set_point_offset(id, offset)?;
        Ok(offset)
    }

    pub fn reset_offsets(&mut self) {
        for enter in &mut self.enters {
            enter.reset_offsets();
        }
        self.refresh();
    }

    pub fn lines(&self) -> impl Iterator<Item = &MarkupLine> {
        self.lines.values()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn get_line(&self, pair: MarkupPointPair) -> Option<&MarkupLine> {
        self.lines.get(&pair)
    }

    pub fn get_line_mut(&mut self, pair: MarkupPointPair) -> Option<&mut MarkupLine> {
        self.lines.get_mut(&pair)
    }

    pub fn exist_connection(&self, pair: MarkupPointPair) -> bool {
        self.lines.contains_key(&pair)
    }

    pub fn lines_with_point(&self, pt: PointID) -> Vec<MarkupPointPair> {
        self.lines
            .keys()
            .filter(|pair| pair.contains(pt))
            .cloned()
            .collect()
    }

    /// Removes the line if it exists, otherwise creates it. Returns the new line.
    pub fn toggle_connection(
        &mut self,
        pair: MarkupPointPair,
        style: Option<LineStyle>,
    ) -> Result<Option<&MarkupLine>> {
        if self.exist_connection(pair) {
            self.remove_line(pair);
            return Ok(None);
        }
        self.add_line(pair, style)?;
        Ok(self.lines.get(&pair))
    }

    pub(crate) fn add_line(&mut self, pair: MarkupPointPair, style: Option<LineStyle>) -> Result<()> {
        let start = self
            .get_point(pair.first())
            .ok_or_else(|| anyhow!("{} has no {}", self.id, pair.first()))?;
        let end = self
            .get_point(pair.second())
            .ok_or_else(|| anyhow!("{} has no {}", self.id, pair.second()))?;
        let line = MarkupLine::new(pair, start, end, style)?;
        debug!("Adding {:?} line {} at {}", line.line_type, pair, self.id);
        self.lines.insert(pair, line);
        self.recalculate_intersections();
        Ok(())
    }

    /// Also removes fillers bounded by the line and rules of other lines that were cut by it.
    pub fn remove_line(&mut self, pair: MarkupPointPair) -> Option<MarkupLine> {
        if !self.lines.contains_key(&pair) {
            return None;
        }
        let before = self.fillers.len();
        let fillers = std::mem::take(&mut self.fillers);
        let kept: Vec<MarkupFiller> = fillers
            .into_iter()
            .filter(|f| !f.uses_line(pair, self))
            .collect();
        self.fillers = kept;
        if self.fillers.len() != before {
            debug!(
                "Removing {} with {} also removed {} fillers",
                pair,
                self.id,
                before - self.fillers.len()
            );
        }

        let line = self.lines.remove(&pair);
        for other in self.lines.values_mut() {
            other.forget_line(pair);
        }
        self.recalculate_intersections();
        line
    }

    pub fn fillers(&self) -> &Vec<MarkupFiller> {
        &self.fillers
    }

    pub fn add_filler(&mut self, filler: MarkupFiller) -> Result<()> {
        if !filler.is_closed() {
            bail!("Filler {} isn't closed", filler);
        }
        if filler.polygon(self).is_none() {
            bail!("Filler {} doesn't outline an area at {}", filler, self.id);
        }
        self.fillers.push(filler);
        Ok(())
    }

    pub fn remove_filler(&mut self, idx: usize) -> Result<MarkupFiller> {
        if idx >= self.fillers.len() {
            bail!("{} has no filler {}", self.id, idx);
        }
        Ok(self.fillers.remove(idx))
    }

    pub fn clear(&mut self) {
        info!("Clearing all markings at {}", self.id);
        self.lines.clear();
        self.fillers.clear();
        self.intersections.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.fillers.is_empty()
    }

    /// Where two lines cross, seen from `a`.
    pub fn intersection(
        &self,
        a: MarkupPointPair,
        b: MarkupPointPair,
    ) -> Option<MarkupLinesIntersect> {
        if a < b {
            self.intersections.get(&(a, b)).cloned()
        } else {
            self.intersections.get(&(b, a)).map(|hit| hit.flipped())
        }
    }

    /// Every crossing along `line`, seen from it.
    pub fn intersections_of(&self, line: MarkupPointPair) -> Vec<MarkupLinesIntersect> {
        self.intersections
            .values()
            .filter_map(|hit| {
                if hit.first == line {
                    Some(*hit)
                } else if hit.second == line {
                    Some(hit.flipped())
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn all_intersections(&self) -> impl Iterator<Item = &MarkupLinesIntersect> {
        self.intersections.values()
    }

    /// Everything painted at this node.
    pub fn dashes(&self) -> Vec<MarkupDash> {
        let mut result = Vec::new();
        for line in self.lines.values() {
            result.extend(line.dashes(self));
        }
        for filler in &self.fillers {
            match filler.dashes(self) {
                Ok(dashes) => result.extend(dashes),
                Err(err) => warn!("{}: {:#}", self.id, err),
            }
        }
        result
    }
}

/// Every node's markings.
#[derive(Default)]
pub struct MarkupManager {
    markups: BTreeMap<NodeID, Markup>,
}

impl MarkupManager {
    pub fn new() -> MarkupManager {
        MarkupManager::default()
    }

    /// The node's markings, created empty the first time.
    pub fn get(&mut self, net: &Network, node: NodeID) -> Result<&mut Markup> {
        if !self.markups.contains_key(&node) {
            let markup = Markup::new(net, node)?;
            self.markups.insert(node, markup);
        }
        self.markups
            .get_mut(&node)
            .ok_or_else(|| anyhow!("{} vanished", node))
    }

    pub fn try_get(&self, node: NodeID) -> Option<&Markup> {
        self.markups.get(&node)
    }

    pub fn try_get_mut(&mut self, node: NodeID) -> Option<&mut Markup> {
        self.markups.get_mut(&node)
    }

    pub fn remove(&mut self, node: NodeID) -> Option<Markup> {
        self.markups.remove(&node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeID> {
        self.markups.keys()
    }

    /// Brings one node's markings up to date with the road. Markings at a node that can't be
    /// built anymore are dropped.
    pub fn update_node(&mut self, net: &Network, node: NodeID) {
        if let Some(markup) = self.markups.get_mut(&node) {
            if let Err(err) = markup.update(net) {
                warn!("Dropping markings at {}: {:#}", node, err);
                self.markups.remove(&node);
            }
        }
    }

    pub fn update_all(&mut self, net: &Network) {
        let nodes: Vec<NodeID> = self.markups.keys().cloned().collect();
        for node in nodes {
            self.update_node(net, node);
        }
    }

    pub fn to_data(&self) -> Vec<MarkupData> {
        self.markups
            .values()
            .filter(|m| !m.is_empty())
            .map(|m| m.to_data())
            .collect()
    }

    /// Replaces everything with saved markings. Nodes that don't exist anymore are skipped.
    pub fn from_data(&mut self, net: &Network, data: Vec<MarkupData>) {
        self.markups.clear();
        for d in data {
            let node = d.node;
            match Markup::from_data(net, node, &d, &ObjectsMap::default()) {
                Ok(markup) => {
                    self.markups.insert(node, markup);
                }
                Err(err) => warn!("Skipping saved markings at {}: {:#}", node, err),
            }
        }
        info!("Loaded markings at {} nodes", self.markups.len());
    }

    pub fn save(&self, path: &str) -> Result<()> {
        abstutil::write_json(path, &self.to_data())
    }

    pub fn load(&mut self, net: &Network, path: &str) -> Result<()> {
        let data: Vec<MarkupData> = abstutil::read_json(path)?;
        self.from_data(net, data);
        Ok(())
    }
}
