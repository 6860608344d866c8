use std::fmt;

use enumset::EnumSetType;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use geom::{Angle, Distance, Pt2D};

use crate::SegmentID;

#[derive(Debug, Serialize, Deserialize, PartialOrd, Ord, EnumSetType)]
pub enum PointType {
    /// On the enter's edge, where lanes meet the intersection
    Enter,
    /// Set back from the enter's edge, where crosswalks run
    Crosswalk,
    /// On the far side of the intersection, straight ahead of an enter point
    Normal,
}

impl PointType {
    fn encode(self) -> u32 {
        match self {
            PointType::Enter => 1,
            PointType::Crosswalk => 2,
            PointType::Normal => 4,
        }
    }

    fn decode(x: u32) -> Option<PointType> {
        match x {
            1 => Some(PointType::Enter),
            2 => Some(PointType::Crosswalk),
            4 => Some(PointType::Normal),
            _ => None,
        }
    }
}

/// Where an enter point sits relative to the lanes around it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationType {
    /// The left side of the lane to the right, or the outer left edge
    LeftEdge,
    /// The right side of the lane to the left, or the outer right edge
    RightEdge,
    /// Halfway between two lanes that're close together
    Between,
}

/// A point is identified by its enter, its number along that enter (starting at 1), and its
/// type. Numbers stay the same as long as the enter's lanes do, so saved lines keep resolving.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PointID {
    pub enter: SegmentID,
    pub num: u8,
    pub point_type: PointType,
}

impl PointID {
    pub fn new(enter: SegmentID, num: u8, point_type: PointType) -> PointID {
        PointID {
            enter,
            num,
            point_type,
        }
    }

    /// The same position along the enter, but a different kind of point.
    pub fn with_type(self, point_type: PointType) -> PointID {
        PointID::new(self.enter, self.num, point_type)
    }

    pub fn encode_u32(self) -> u32 {
        // 16 bits for the segment, then 8 for the number, then the type
        (u32::from(self.enter.0) << 16) | (u32::from(self.num) << 8) | self.point_type.encode()
    }

    pub fn decode_u32(x: u32) -> Option<PointID> {
        let point_type = PointType::decode(x & 0xff)?;
        Some(PointID {
            enter: SegmentID((x >> 16) as u16),
            num: ((x >> 8) & 0xff) as u8,
            point_type,
        })
    }
}

impl fmt::Display for PointID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?} point {} of {}", self.point_type, self.num, self.enter)
    }
}

impl Serialize for PointID {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.encode_u32().serialize(s)
    }
}

impl<'de> Deserialize<'de> for PointID {
    fn deserialize<D>(d: D) -> Result<PointID, D::Error>
    where
        D: Deserializer<'de>,
    {
        let x = <u32>::deserialize(d)?;
        PointID::decode_u32(x)
            .ok_or_else(|| serde::de::Error::custom(format!("{} isn't a valid PointID", x)))
    }
}

/// A place where lines can start or end. Recomputed whenever the road geometry changes; only
/// the ID and the user's offset are ever saved.
#[derive(Clone, Debug, Serialize)]
pub struct MarkupPoint {
    pub id: PointID,
    pub location: LocationType,
    /// Index of the gap between lanes that produced this point
    pub(crate) source_line: usize,
    /// User adjustment along the enter's edge, measured perpendicular to the lanes
    pub offset: Distance,
    pub position: Pt2D,
    /// Points into the intersection for enter points
    pub direction: Angle,
}

impl MarkupPoint {
    pub fn num(&self) -> u8 {
        self.id.num
    }

    pub fn point_type(&self) -> PointType {
        self.id.point_type
    }

    pub fn enter(&self) -> SegmentID {
        self.id.enter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_id_encoding() {
        let id = PointID::new(SegmentID(1234), 7, PointType::Crosswalk);
        assert_eq!(Some(id), PointID::decode_u32(id.encode_u32()));
        assert!(PointID::decode_u32(0x0001_0203).is_none());
    }

    #[test]
    fn ordering_groups_by_enter_then_number() {
        let a = PointID::new(SegmentID(1), 3, PointType::Enter);
        let b = PointID::new(SegmentID(1), 4, PointType::Enter);
        let c = PointID::new(SegmentID(2), 1, PointType::Enter);
        assert!(a < b && b < c);
    }
}
