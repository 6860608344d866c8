//! An enter is one segment's side of an intersection. Its marking points are laid out along the
//! edge where the segment's lanes meet the node.

use std::collections::BTreeMap;
use std::f64::consts::FRAC_PI_2;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use geom::{Angle, Distance, Line, Pt2D};

use crate::{
    LaneID, LocationType, MarkupPoint, Network, NodeID, PointID, PointType, SegmentEnd,
    SegmentID,
};

/// How far crosswalk points sit back from the enter's edge, into the intersection.
pub const CROSSWALK_SHIFT: Distance = Distance::const_meters(4.0);

// Below this, the corner is treated as perpendicular to the lanes
const MIN_CORNER_SINE: f64 = 1e-3;
/// Offsets are kept to the centimeter.
const OFFSET_STEP: Distance = Distance::const_meters(0.01);

/// A snapshot of one drive lane, taken at the end touching the node.
#[derive(Clone, Debug)]
pub struct DriveLane {
    pub id: LaneID,
    pub position: Distance,
    pub half_width: Distance,
    /// The lane's center at the node
    pub endpoint: Pt2D,
    /// The lane's direction from the segment's start to its end, at the node
    pub direction: Angle,
    lane_invert: bool,
}

impl DriveLane {
    pub fn left_side_pos(&self) -> Distance {
        if self.lane_invert {
            self.position - self.half_width
        } else {
            self.position + self.half_width
        }
    }

    pub fn right_side_pos(&self) -> Distance {
        if self.lane_invert {
            self.position + self.half_width
        } else {
            self.position - self.half_width
        }
    }
}

/// The space between two neighboring drive lanes, or outside the first or last one. Each of
/// these produces one or two enter points.
#[derive(Clone, Debug)]
pub struct SegmentMarkupLine {
    left: Option<DriveLane>,
    right: Option<DriveLane>,
}

impl SegmentMarkupLine {
    pub fn is_left_edge(&self) -> bool {
        self.left.is_none()
    }

    pub fn is_right_edge(&self) -> bool {
        self.right.is_none()
    }

    pub fn is_edge(&self) -> bool {
        self.is_left_edge() ^ self.is_right_edge()
    }

    /// Distance between the two lanes' centers
    pub fn center_delta(&self) -> Distance {
        match (&self.left, &self.right) {
            (Some(left), Some(right)) => (right.position - left.position).abs(),
            _ => Distance::ZERO,
        }
    }

    /// Distance between the lanes' facing sides
    pub fn side_delta(&self) -> Distance {
        match (&self.left, &self.right) {
            (Some(left), Some(right)) => (right.left_side_pos() - left.right_side_pos()).abs(),
            _ => Distance::ZERO,
        }
    }

    /// Lanes far enough apart get a point on each lane's side instead of one in the middle.
    pub fn need_split(&self) -> bool {
        match (&self.left, &self.right) {
            (Some(left), Some(right)) => {
                self.side_delta() >= (right.half_width + left.half_width) / 2.0
            }
            _ => false,
        }
    }

    pub fn locations(&self) -> Vec<LocationType> {
        if self.is_edge() {
            if self.is_right_edge() {
                vec![LocationType::RightEdge]
            } else {
                vec![LocationType::LeftEdge]
            }
        } else if self.need_split() {
            vec![LocationType::RightEdge, LocationType::LeftEdge]
        } else {
            vec![LocationType::Between]
        }
    }

    fn position_and_direction(
        &self,
        location: LocationType,
        offset: Distance,
        frame: &Frame,
    ) -> Option<(Pt2D, Angle)> {
        match location {
            LocationType::Between => {
                let (left, right) = (self.left.as_ref()?, self.right.as_ref()?);
                let direction = Angle::average(&[right.direction, left.direction])
                    .map(|dir| frame.toward_node(dir))
                    .unwrap_or(frame.fallback_direction);
                let part = (right.half_width + self.side_delta() / 2.0)
                    .safe_percent(self.center_delta());
                let position = right
                    .endpoint
                    .lerp(left.endpoint, part)
                    .project_away(offset / frame.sine, frame.corner_dir);
                Some((position, direction))
            }
            LocationType::LeftEdge | LocationType::RightEdge => {
                let (lane, shift) = if location == LocationType::LeftEdge {
                    let lane = self.right.as_ref()?;
                    (lane, -lane.half_width)
                } else {
                    let lane = self.left.as_ref()?;
                    (lane, lane.half_width)
                };
                let position = lane
                    .endpoint
                    .project_away((shift + offset) / frame.sine, frame.corner_dir);
                Some((position, frame.toward_node(lane.direction)))
            }
        }
    }
}

/// The pieces of an enter's geometry that points are laid out in.
struct Frame {
    corner_dir: Angle,
    sine: f64,
    is_start_side: bool,
    fallback_direction: Angle,
}

impl Frame {
    fn toward_node(&self, lane_dir: Angle) -> Angle {
        if self.is_start_side {
            lane_dir.opposite()
        } else {
            lane_dir
        }
    }
}

#[derive(Clone, Debug)]
pub struct Enter {
    pub id: SegmentID,
    pub node: NodeID,
    pub side: SegmentEnd,
    pub is_lane_invert: bool,
    /// The segment's corner angle at this side, flipped to match the lane order
    pub absolute_angle: Angle,
    /// Along the enter's edge, from the first point towards the last
    pub corner_dir: Angle,
    /// Into the intersection, averaged over the drive lanes. None without drive lanes.
    pub normal_dir: Option<Angle>,
    /// The angle between the corner and normal directions, in radians within [0, pi / 2]
    pub corner_and_normal_angle: f64,
    pub road_half_width: Distance,
    /// Where the segment's center meets the node. None without drive lanes.
    pub position: Option<Pt2D>,

    drive_lanes: Vec<DriveLane>,
    lines: Vec<SegmentMarkupLine>,
    points: BTreeMap<u8, MarkupPoint>,
    crosswalks: BTreeMap<u8, MarkupPoint>,
    normals: BTreeMap<u8, MarkupPoint>,
}

impl Enter {
    pub fn new(net: &Network, node: NodeID, id: SegmentID) -> Result<Enter> {
        let mut enter = Enter {
            id,
            node,
            side: SegmentEnd::Start,
            is_lane_invert: false,
            absolute_angle: Angle::ZERO,
            corner_dir: Angle::ZERO,
            normal_dir: None,
            corner_and_normal_angle: FRAC_PI_2,
            road_half_width: Distance::ZERO,
            position: None,
            drive_lanes: Vec::new(),
            lines: Vec::new(),
            points: BTreeMap::new(),
            crosswalks: BTreeMap::new(),
            normals: BTreeMap::new(),
        };
        enter.update(net)?;
        Ok(enter)
    }

    /// Recomputes everything from the current road geometry. Point numbers and offsets are
    /// kept for every number that still exists.
    pub fn update(&mut self, net: &Network) -> Result<()> {
        let segment = net.get_s(self.id)?;
        self.side = segment
            .side_of(self.node)
            .ok_or_else(|| anyhow!("{} doesn't touch {}", self.id, self.node))?;
        let is_start_side = self.side == SegmentEnd::Start;
        self.is_lane_invert = is_start_side ^ segment.invert;

        let mut drive_lanes: Vec<DriveLane> = segment
            .drive_lanes()
            .into_iter()
            .map(|lane| DriveLane {
                id: lane.id,
                position: lane.position,
                half_width: lane.half_width(),
                endpoint: lane.endpoint(self.side),
                direction: lane.direction(self.side),
                lane_invert: self.is_lane_invert,
            })
            .collect();
        if !self.is_lane_invert {
            drive_lanes.reverse();
        }
        self.drive_lanes = drive_lanes;

        self.lines = if self.drive_lanes.is_empty() {
            Vec::new()
        } else {
            (0..=self.drive_lanes.len())
                .map(|idx| SegmentMarkupLine {
                    left: idx
                        .checked_sub(1)
                        .and_then(|i| self.drive_lanes.get(i))
                        .cloned(),
                    right: self.drive_lanes.get(idx).cloned(),
                })
                .collect()
        };

        self.calculate_corner(segment.corner_angle_degrees(self.side));
        self.calculate_position(segment.half_width, segment.pavement_width);
        self.update_points();
        Ok(())
    }

    fn calculate_corner(&mut self, corner_angle_degrees: f64) {
        let mut degrees = corner_angle_degrees;
        if self.is_lane_invert {
            degrees = if degrees >= 180.0 {
                degrees - 180.0
            } else {
                degrees + 180.0
            };
        }
        self.absolute_angle = Angle::degrees(degrees);

        self.corner_dir = if self.drive_lanes.len() <= 1 {
            self.absolute_angle
        } else {
            let first = self.drive_lanes[0].endpoint;
            let last = self.drive_lanes[self.drive_lanes.len() - 1].endpoint;
            first.angle_to(last).unwrap_or(self.absolute_angle)
        };

        let dirs: Vec<Angle> = self.drive_lanes.iter().map(|l| l.direction).collect();
        self.normal_dir = Angle::average(&dirs).map(|dir| {
            if self.side == SegmentEnd::Start {
                dir.opposite()
            } else {
                dir
            }
        });

        self.corner_and_normal_angle = match self.normal_dir {
            Some(normal) => {
                let angle = normal.shortest_angle_between(self.corner_dir);
                let folded = if angle > 90.0 { 180.0 - angle } else { angle };
                folded.to_radians()
            }
            None => FRAC_PI_2,
        };
        if self.corner_and_normal_angle.sin() < MIN_CORNER_SINE {
            warn!(
                "{} at {} has a degenerate corner; treating it as perpendicular",
                self.id, self.node
            );
        }
    }

    fn calculate_position(&mut self, half_width: Distance, pavement_width: Distance) {
        let first = match self.drive_lanes.first() {
            Some(lane) => lane,
            None => {
                self.position = None;
                self.road_half_width = Distance::ZERO;
                return;
            }
        };
        let sine = self.sine();
        self.road_half_width = (half_width - pavement_width) / sine;
        let toward_center = if self.is_lane_invert {
            self.corner_dir.opposite()
        } else {
            self.corner_dir
        };
        self.position = Some(
            first
                .endpoint
                .project_away(first.position / sine, toward_center),
        );
    }

    /// The sine of the corner/normal angle, used to turn distances measured perpendicular to
    /// the lanes into distances along a skewed corner.
    pub fn sine(&self) -> f64 {
        let sine = self.corner_and_normal_angle.sin();
        if sine < MIN_CORNER_SINE {
            1.0
        } else {
            sine
        }
    }

    fn frame(&self) -> Frame {
        Frame {
            corner_dir: self.corner_dir,
            sine: self.sine(),
            is_start_side: self.side == SegmentEnd::Start,
            fallback_direction: self.normal_dir.unwrap_or(self.corner_dir.rotate_degs(90.0)),
        }
    }

    /// Lays the points out again, keeping offsets for numbers that still exist.
    pub fn update_points(&mut self) {
        let frame = self.frame();
        let mut points = BTreeMap::new();
        let mut crosswalks = BTreeMap::new();
        let mut num: u8 = 0;
        'lines: for (idx, line) in self.lines.iter().enumerate() {
            for location in line.locations() {
                num = match num.checked_add(1) {
                    Some(num) => num,
                    None => {
                        warn!(
                            "{} at {} has too many points; dropping the rest",
                            self.id, self.node
                        );
                        break 'lines;
                    }
                };
                let offset = self
                    .points
                    .get(&num)
                    .map(|old| old.offset)
                    .unwrap_or(Distance::ZERO);
                let crosswalk_offset = self
                    .crosswalks
                    .get(&num)
                    .map(|old| old.offset)
                    .unwrap_or(Distance::ZERO);

                let (position, direction) = match line.position_and_direction(location, offset, &frame) {
                    Some(pair) => pair,
                    None => continue,
                };
                let point = MarkupPoint {
                    id: PointID::new(self.id, num, PointType::Enter),
                    location,
                    source_line: idx,
                    offset,
                    position,
                    direction,
                };
                crosswalks.insert(num, self.crosswalk_point(&point, crosswalk_offset));
                points.insert(num, point);
            }
        }
        self.points = points;
        self.crosswalks = crosswalks;
        // Normal points depend on the whole intersection; the markup fills them in
        self.normals
            .retain(|num, _| self.points.contains_key(num));
    }

    fn crosswalk_point(&self, source: &MarkupPoint, offset: Distance) -> MarkupPoint {
        let position = source
            .position
            .project_away(CROSSWALK_SHIFT, source.direction)
            .project_away(offset / self.sine(), self.corner_dir);
        MarkupPoint {
            id: source.id.with_type(PointType::Crosswalk),
            location: source.location,
            source_line: source.source_line,
            offset,
            position,
            direction: self.corner_dir,
        }
    }

    /// Places each normal point where the ray from its enter point leaves the intersection.
    /// `border` is every edge of the intersection's outline.
    pub(crate) fn update_normals(&mut self, border: &[Line], node_half_width: Distance) {
        let mut normals = BTreeMap::new();
        for (num, point) in &self.points {
            let far = point
                .position
                .project_away(node_half_width * 4.0 + Distance::meters(100.0), point.direction);
            let position = Line::new(point.position, far)
                .ok()
                .and_then(|ray| {
                    border
                        .iter()
                        .filter_map(|edge| ray.intersection(edge))
                        .map(|hit| hit.pt)
                        .filter(|pt| pt.dist_to(point.position) > Distance::meters(0.5))
                        .min_by_key(|pt| pt.dist_to(point.position))
                })
                .unwrap_or_else(|| {
                    point
                        .position
                        .project_away(node_half_width * 2.0, point.direction)
                });
            normals.insert(
                *num,
                MarkupPoint {
                    id: point.id.with_type(PointType::Normal),
                    location: point.location,
                    source_line: point.source_line,
                    offset: Distance::ZERO,
                    position,
                    direction: point.direction.opposite(),
                },
            );
        }
        self.normals = normals;
    }

    pub fn drive_lanes(&self) -> &Vec<DriveLane> {
        &self.drive_lanes
    }

    pub fn markup_lines(&self) -> &Vec<SegmentMarkupLine> {
        &self.lines
    }

    pub fn points(&self) -> impl Iterator<Item = &MarkupPoint> {
        self.points.values()
    }

    pub fn crosswalks(&self) -> impl Iterator<Item = &MarkupPoint> {
        self.crosswalks.values()
    }

    pub fn normals(&self) -> impl Iterator<Item = &MarkupPoint> {
        self.normals.values()
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn crosswalk_count(&self) -> usize {
        self.crosswalks.len()
    }

    pub fn normal_count(&self) -> usize {
        self.normals.len()
    }

    pub fn first_point(&self) -> Option<&MarkupPoint> {
        self.points.values().next()
    }

    pub fn last_point(&self) -> Option<&MarkupPoint> {
        self.points.values().next_back()
    }

    pub fn is_first(&self, num: u8) -> bool {
        num == 1
    }

    pub fn is_last(&self, num: u8) -> bool {
        usize::from(num) == self.points.len()
    }

    pub fn get_point(&self, num: u8, point_type: PointType) -> Option<&MarkupPoint> {
        match point_type {
            PointType::Enter => self.points.get(&num),
            PointType::Crosswalk => self.crosswalks.get(&num),
            PointType::Normal => self.normals.get(&num),
        }
    }

    /// Where the drivable part of the road meets the node, from the first point's side to the
    /// last. None without drive lanes.
    pub fn side_points(&self) -> Option<(Pt2D, Pt2D)> {
        let pos = self.position?;
        Some((
            pos.project_away(-self.road_half_width, self.corner_dir),
            pos.project_away(self.road_half_width, self.corner_dir),
        ))
    }

    pub fn side_line(&self) -> Option<Line> {
        let (first, last) = self.side_points()?;
        Line::new(first, last).ok()
    }

    /// Changes one point's offset. Crosswalk points move independently of their enter point;
    /// normal points can't be moved.
    pub fn set_offset(&mut self, num: u8, point_type: PointType, offset: Distance) -> Result<()> {
        let offset = offset.round_to(OFFSET_STEP);
        let target = match point_type {
            PointType::Enter => self.points.get_mut(&num),
            PointType::Crosswalk => self.crosswalks.get_mut(&num),
            PointType::Normal => {
                return Err(anyhow!("Normal points of {} can't be moved", self.id));
            }
        };
        let point = target.ok_or_else(|| anyhow!("{} has no point {}", self.id, num))?;
        point.offset = offset;
        self.update_points();
        Ok(())
    }

    pub fn reset_offsets(&mut self) {
        for point in self.points.values_mut() {
            point.offset = Distance::ZERO;
        }
        for point in self.crosswalks.values_mut() {
            point.offset = Distance::ZERO;
        }
        self.update_points();
    }

    /// The offset a point would need so that it lines up with `cursor`, sliding along the
    /// enter's edge.
    pub fn drag_offset(&self, point: &MarkupPoint, cursor: Pt2D) -> Distance {
        let along = Line::new(
            point.position,
            point.position.project_away(Distance::meters(1.0), self.corner_dir),
        );
        let across = Line::new(
            cursor,
            cursor.project_away(Distance::meters(1.0), self.corner_dir.rotate_degs(90.0)),
        );
        let change = match (along, across) {
            (Ok(along), Ok(across)) => along
                .intersection_infinite(&across)
                .map(|hit| hit.t1)
                .unwrap_or(0.0),
            _ => 0.0,
        };
        (point.offset + Distance::meters(change * self.sine())).round_to(OFFSET_STEP)
    }

    pub fn to_data(&self) -> EnterData {
        EnterData {
            id: self.id,
            points: self.point_count(),
            angle: self.absolute_angle.normalized_degrees(),
        }
    }
}

/// What gets saved about an enter, to check that a saved markup still matches the road.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnterData {
    pub id: SegmentID,
    pub points: usize,
    /// Degrees
    pub angle: f64,
}
