//! Generates small road networks, for trying out markings without a real map.

use geom::{Angle, Distance, PolyLine, Pt2D};

use crate::{Lane, LaneID, LaneType, Network, Node, NodeID, Segment, SegmentID};

const ARM_LENGTH: Distance = Distance::const_meters(50.0);
const SIDEWALK_WIDTH: Distance = Distance::const_meters(2.0);
const NODE_HALF_WIDTH: Distance = Distance::const_meters(12.0);

/// Describes one segment leaving a node in a straight line.
pub struct ArmSpec {
    pub id: SegmentID,
    pub node: NodeID,
    pub far_node: NodeID,
    /// Where the lanes begin, at the edge of the node
    pub from: Pt2D,
    pub angle: Angle,
    /// Lane types and widths, from left to right looking away from the node
    pub lanes: Vec<(LaneType, Distance)>,
    /// Space between the edges of neighboring drive lanes
    pub gap: Distance,
    /// How far the lane ends are rotated from being perpendicular to the segment
    pub skew_degrees: f64,
    pub pavement_width: Distance,
}

impl ArmSpec {
    pub fn build(&self) -> Segment {
        let gaps = self
            .lanes
            .windows(2)
            .filter(|pair| pair[0].0.is_drive() && pair[1].0.is_drive())
            .count();
        let total =
            self.lanes.iter().map(|(_, w)| *w).sum::<Distance>() + self.gap * (gaps as f64);
        let right = self.angle.rotate_degs(-90.0);
        let skew = self.skew_degrees.to_radians().tan();

        let mut lanes = Vec::new();
        let mut left_edge = -total / 2.0;
        for (idx, (lt, width)) in self.lanes.iter().enumerate() {
            let position = left_edge + *width / 2.0;
            let start = self
                .from
                .project_away(position, right)
                .project_away(position * skew, self.angle);
            let end = start.project_away(ARM_LENGTH, self.angle);
            lanes.push(Lane {
                id: LaneID(u32::from(self.id.0) * 100 + idx as u32),
                lane_type: *lt,
                position,
                width: *width,
                center: PolyLine::must_new(vec![start, end]),
            });
            left_edge += *width;
            if lt.is_drive()
                && self
                    .lanes
                    .get(idx + 1)
                    .map(|(next, _)| next.is_drive())
                    .unwrap_or(false)
            {
                left_edge += self.gap;
            }
        }

        let corner = self.angle.normalized_degrees() + 90.0 + self.skew_degrees;
        Segment {
            id: self.id,
            start_node: self.node,
            end_node: self.far_node,
            invert: false,
            corner_angle_start: corner,
            corner_angle_end: corner,
            half_width: total / 2.0,
            pavement_width: self.pavement_width,
            lanes,
        }
    }
}

/// A node at the origin with `arms` evenly spaced segments leaving it. Each segment has
/// `drive_lanes` lanes of the given width separated by `gap`, with a sidewalk on both sides.
pub fn crossroads(arms: usize, drive_lanes: usize, lane_width: Distance, gap: Distance) -> Network {
    let mut net = Network::default();
    let center = NodeID(0);
    net.add_node(Node {
        id: center,
        position: Pt2D::zero(),
        half_width: NODE_HALF_WIDTH,
        segments: Vec::new(),
    });

    for idx in 0..arms {
        let angle = Angle::degrees(360.0 / (arms as f64) * (idx as f64));
        let far_node = NodeID(idx as u16 + 1);
        net.add_node(Node {
            id: far_node,
            position: Pt2D::zero().project_away(NODE_HALF_WIDTH + ARM_LENGTH, angle),
            half_width: NODE_HALF_WIDTH,
            segments: Vec::new(),
        });

        let mut lanes = vec![(LaneType::Sidewalk, SIDEWALK_WIDTH)];
        for _ in 0..drive_lanes {
            lanes.push((LaneType::Driving, lane_width));
        }
        lanes.push((LaneType::Sidewalk, SIDEWALK_WIDTH));

        let segment = ArmSpec {
            id: SegmentID(idx as u16),
            node: center,
            far_node,
            from: Pt2D::zero().project_away(NODE_HALF_WIDTH, angle),
            angle,
            lanes,
            gap,
            skew_degrees: 0.0,
            pavement_width: SIDEWALK_WIDTH,
        }
        .build();
        net.add_segment(segment);
    }
    net
}
