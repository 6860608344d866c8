//! The road network that markings are laid out on. This is a read-only snapshot of whatever
//! produced the roads; markings never modify it.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use abstutil::{contains_duplicates, deserialize_btreemap, serialize_btreemap};
use geom::{Angle, Distance, PolyLine, Pt2D};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeID(pub u16);

impl fmt::Display for NodeID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Node #{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentID(pub u16);

impl fmt::Display for SegmentID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Segment #{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LaneID(pub u32);

impl fmt::Display for LaneID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Lane #{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LaneType {
    Driving,
    Bus,
    Biking,
    Tram,
    Parking,
    Sidewalk,
    Median,
}

impl LaneType {
    /// Lanes that vehicles travel along. Only these get marking points.
    pub fn is_drive(self) -> bool {
        matches!(
            self,
            LaneType::Driving | LaneType::Bus | LaneType::Biking | LaneType::Tram
        )
    }
}

/// Which end of a segment touches a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SegmentEnd {
    Start,
    End,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Lane {
    pub id: LaneID,
    pub lane_type: LaneType,
    /// Signed offset of the lane's center from the segment's center. Positive values are to the
    /// right, looking from the segment's start to its end.
    pub position: Distance,
    /// Sometimes negative in the source data; only the magnitude matters.
    pub width: Distance,
    /// Runs from the segment's start to its end.
    pub center: PolyLine,
}

impl Lane {
    pub fn half_width(&self) -> Distance {
        self.width.abs() / 2.0
    }

    pub fn endpoint(&self, end: SegmentEnd) -> Pt2D {
        match end {
            SegmentEnd::Start => self.center.first_pt(),
            SegmentEnd::End => self.center.last_pt(),
        }
    }

    /// The direction of travel from the segment's start towards its end, measured at one end.
    pub fn direction(&self, end: SegmentEnd) -> Angle {
        match end {
            SegmentEnd::Start => self.center.first_line().angle(),
            SegmentEnd::End => self.center.last_line().angle(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentID,
    pub start_node: NodeID,
    pub end_node: NodeID,
    /// The lane order is flipped relative to the segment's direction.
    pub invert: bool,
    /// Directions of the segment's edge where it meets each node, in degrees.
    pub corner_angle_start: f64,
    pub corner_angle_end: f64,
    /// Half of the full width, including pavement on both sides.
    pub half_width: Distance,
    pub pavement_width: Distance,
    pub lanes: Vec<Lane>,
}

impl Segment {
    pub fn side_of(&self, node: NodeID) -> Option<SegmentEnd> {
        if self.start_node == node {
            Some(SegmentEnd::Start)
        } else if self.end_node == node {
            Some(SegmentEnd::End)
        } else {
            None
        }
    }

    pub fn corner_angle_degrees(&self, end: SegmentEnd) -> f64 {
        match end {
            SegmentEnd::Start => self.corner_angle_start,
            SegmentEnd::End => self.corner_angle_end,
        }
    }

    /// All lanes, ordered by their position from left to right.
    pub fn sorted_lanes(&self) -> Vec<&Lane> {
        let mut lanes: Vec<&Lane> = self.lanes.iter().collect();
        lanes.sort_by_key(|l| l.position);
        lanes
    }

    pub fn drive_lanes(&self) -> Vec<&Lane> {
        self.sorted_lanes()
            .into_iter()
            .filter(|l| l.lane_type.is_drive())
            .collect()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeID,
    pub position: Pt2D,
    pub half_width: Distance,
    pub segments: Vec<SegmentID>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Network {
    #[serde(
        serialize_with = "serialize_btreemap",
        deserialize_with = "deserialize_btreemap"
    )]
    pub nodes: BTreeMap<NodeID, Node>,
    #[serde(
        serialize_with = "serialize_btreemap",
        deserialize_with = "deserialize_btreemap"
    )]
    pub segments: BTreeMap<SegmentID, Segment>,
}

impl Network {
    pub fn load(path: &str) -> Result<Network> {
        let net: Network = abstutil::read_json(path)?;
        net.validate()?;
        Ok(net)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        abstutil::write_json(path, self)
    }

    pub fn get_n(&self, id: NodeID) -> Result<&Node> {
        self.nodes
            .get(&id)
            .ok_or_else(|| anyhow!("{} doesn't exist", id))
    }

    pub fn get_s(&self, id: SegmentID) -> Result<&Segment> {
        self.segments
            .get(&id)
            .ok_or_else(|| anyhow!("{} doesn't exist", id))
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes.insert(node.id, node);
    }

    /// Adds a segment and registers it with both of its nodes.
    pub fn add_segment(&mut self, segment: Segment) {
        for n in [segment.start_node, segment.end_node] {
            if let Some(node) = self.nodes.get_mut(&n) {
                if !node.segments.contains(&segment.id) {
                    node.segments.push(segment.id);
                }
            }
        }
        self.segments.insert(segment.id, segment);
    }

    /// Every segment must connect known nodes, and nodes must only list segments touching them.
    /// Lane center lines need at least two distinct points.
    pub fn validate(&self) -> Result<()> {
        for s in self.segments.values() {
            self.get_n(s.start_node)?;
            self.get_n(s.end_node)?;
            for lane in &s.lanes {
                PolyLine::new(lane.center.points().clone()).with_context(|| {
                    format!("{} of {} has a broken center line", lane.id, s.id)
                })?;
            }
        }
        for n in self.nodes.values() {
            if contains_duplicates(&n.segments) {
                return Err(anyhow!("{} lists a segment twice", n.id));
            }
            for s in &n.segments {
                if self.get_s(*s)?.side_of(n.id).is_none() {
                    return Err(anyhow!("{} lists {}, which doesn't touch it", n.id, s));
                }
            }
        }
        Ok(())
    }
}
