//! What gets saved about a node's markings, and how saved markings are put back, possibly on a
//! different node or mirrored.

use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use geom::Distance;

use crate::{
    EnterData, FillerStyle, FillerVertex, LinePartEdge, Markup, MarkupFiller, MarkupLineRule,
    MarkupPointPair, Network, NodeID, PointID, PointType, SegmentID,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkupData {
    pub node: NodeID,
    pub enters: Vec<EnterData>,
    /// Only points that were moved
    pub points: Vec<PointData>,
    pub lines: Vec<LineData>,
    pub fillers: Vec<FillerData>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointData {
    pub id: PointID,
    pub offset: Distance,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineData {
    pub pair: MarkupPointPair,
    pub rules: Vec<MarkupLineRule>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FillerData {
    pub vertices: Vec<FillerVertex>,
    pub style: FillerStyle,
}

/// Translates saved markings onto the roads they're pasted onto. Segments that aren't mapped
/// keep their IDs.
#[derive(Clone, Debug, Default)]
pub struct ObjectsMap {
    pub is_mirror: bool,
    segments: BTreeMap<SegmentID, SegmentID>,
    /// Target enters whose point order is reversed, with how many points they have
    mirror_enters: BTreeMap<SegmentID, u8>,
}

impl ObjectsMap {
    pub fn new(is_mirror: bool) -> ObjectsMap {
        ObjectsMap {
            is_mirror,
            ..Default::default()
        }
    }

    pub fn add_segment(&mut self, source: SegmentID, target: SegmentID) {
        self.segments.insert(source, target);
    }

    /// `points` is the target enter's point count.
    pub fn add_mirror_enter(&mut self, target: SegmentID, points: usize) {
        self.mirror_enters.insert(target, points.min(usize::from(u8::MAX)) as u8);
    }

    pub fn segment(&self, id: SegmentID) -> SegmentID {
        self.segments.get(&id).cloned().unwrap_or(id)
    }

    fn is_mirrored(&self, target: SegmentID) -> bool {
        self.is_mirror && self.mirror_enters.contains_key(&target)
    }

    pub fn point(&self, id: PointID) -> PointID {
        let enter = self.segment(id.enter);
        let num = match self.mirror_enters.get(&enter) {
            Some(count) if self.is_mirror && id.num <= *count => *count + 1 - id.num,
            _ => id.num,
        };
        PointID::new(enter, num, id.point_type)
    }

    pub fn pair(&self, pair: MarkupPointPair) -> Option<MarkupPointPair> {
        MarkupPointPair::new(self.point(pair.first()), self.point(pair.second()))
    }

    fn edge(&self, edge: LinePartEdge) -> Option<LinePartEdge> {
        Some(match edge {
            LinePartEdge::Start | LinePartEdge::End => edge,
            LinePartEdge::Intersect(pair) => LinePartEdge::Intersect(self.pair(pair)?),
            LinePartEdge::CrosswalkBorder { crosswalk, outer } => LinePartEdge::CrosswalkBorder {
                crosswalk: self.pair(crosswalk)?,
                outer,
            },
        })
    }

    /// Start and end swap when the pair's order flips.
    fn rule(&self, pair: MarkupPointPair, rule: &MarkupLineRule) -> Option<MarkupLineRule> {
        let flipped = self.pair(pair)?.first() != self.point(pair.first());
        let swap = |edge: LinePartEdge| match edge {
            LinePartEdge::Start if flipped => LinePartEdge::End,
            LinePartEdge::End if flipped => LinePartEdge::Start,
            _ => edge,
        };
        Some(MarkupLineRule {
            from: swap(self.edge(rule.from)?),
            to: swap(self.edge(rule.to)?),
            style: rule.style.clone(),
        })
    }

    fn vertex(&self, vertex: FillerVertex) -> Option<FillerVertex> {
        Some(match vertex {
            FillerVertex::Point(pt) => FillerVertex::Point(self.point(pt)),
            FillerVertex::Intersect(a, b) => FillerVertex::intersect(self.pair(a)?, self.pair(b)?),
        })
    }
}

impl Markup {
    pub fn to_data(&self) -> MarkupData {
        let mut points = Vec::new();
        for enter in self.enters() {
            for pt in enter.points().chain(enter.crosswalks()) {
                if pt.offset != Distance::ZERO {
                    points.push(PointData {
                        id: pt.id,
                        offset: pt.offset,
                    });
                }
            }
        }
        MarkupData {
            node: self.id,
            enters: self.enters().map(|e| e.to_data()).collect(),
            points,
            lines: self
                .lines()
                .map(|l| LineData {
                    pair: l.pair,
                    rules: l.rules().clone(),
                })
                .collect(),
            fillers: self
                .fillers()
                .iter()
                .map(|f| FillerData {
                    vertices: f.vertices().clone(),
                    style: f.style.clone(),
                })
                .collect(),
        }
    }

    /// Builds markings at `node` from saved ones.
    pub fn from_data(
        net: &Network,
        node: NodeID,
        data: &MarkupData,
        map: &ObjectsMap,
    ) -> Result<Markup> {
        let mut markup = Markup::new(net, node)?;
        markup.load_data(data, map);
        Ok(markup)
    }

    /// Replaces the markings here with saved ones. Anything that doesn't fit the current roads
    /// is skipped.
    pub fn load_data(&mut self, data: &MarkupData, map: &ObjectsMap) {
        self.clear();
        for saved in &data.enters {
            let id = map.segment(saved.id);
            match self.get_enter(id) {
                Some(enter) if enter.point_count() != saved.points => warn!(
                    "{} had {} points when saved, but has {} now",
                    id,
                    saved.points,
                    enter.point_count()
                ),
                Some(_) => {}
                None => warn!("Saved markings mention {}, which isn't at {}", id, self.id),
            }
        }

        let mut offsets = Vec::new();
        for pt in &data.points {
            if pt.id.point_type == PointType::Normal {
                continue;
            }
            let id = map.point(pt.id);
            let offset = if map.is_mirrored(id.enter) {
                -pt.offset
            } else {
                pt.offset
            };
            offsets.push((id, offset));
        }
        self.set_offsets(offsets);

        for line in &data.lines {
            let pair = match map.pair(line.pair) {
                Some(pair) => pair,
                None => continue,
            };
            let first_style = line
                .rules
                .first()
                .map(|r| r.style.clone())
                .filter(|s| s.fits(pair.line_type()));
            if let Err(err) = self.add_line(pair, first_style) {
                warn!("Skipping saved line {}: {:#}", pair, err);
                continue;
            }
            let rules: Vec<MarkupLineRule> = line
                .rules
                .iter()
                .filter_map(|r| map.rule(line.pair, r))
                .filter(|r| r.style.fits(pair.line_type()))
                .collect();
            if let Some(l) = self.get_line_mut(pair) {
                l.set_rules(rules);
            }
        }

        for filler in &data.fillers {
            let vertices: Option<Vec<FillerVertex>> =
                filler.vertices.iter().map(|v| map.vertex(*v)).collect();
            let vertices = match vertices {
                Some(v) => v,
                None => continue,
            };
            if let Err(err) = self.add_filler(MarkupFiller::from_vertices(
                vertices,
                filler.style.clone(),
            )) {
                warn!("Skipping saved filler: {:#}", err);
            }
        }
    }
}
