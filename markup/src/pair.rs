use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{LineType, PointID, PointType};

/// Two distinct points that a line connects. The order doesn't matter; `first` is always the
/// smaller ID, so the same connection always gets the same key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkupPointPair {
    first: PointID,
    second: PointID,
}

impl MarkupPointPair {
    /// None if both points are the same.
    pub fn new(a: PointID, b: PointID) -> Option<MarkupPointPair> {
        if a == b {
            return None;
        }
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        Some(MarkupPointPair { first, second })
    }

    pub fn first(&self) -> PointID {
        self.first
    }

    pub fn second(&self) -> PointID {
        self.second
    }

    pub fn contains(&self, pt: PointID) -> bool {
        self.first == pt || self.second == pt
    }

    pub fn other(&self, pt: PointID) -> Option<PointID> {
        if self.first == pt {
            Some(self.second)
        } else if self.second == pt {
            Some(self.first)
        } else {
            None
        }
    }

    pub fn is_same_enter(&self) -> bool {
        self.first.enter == self.second.enter
    }

    fn both(&self, point_type: PointType) -> bool {
        self.first.point_type == point_type && self.second.point_type == point_type
    }

    pub fn is_stop_line(&self) -> bool {
        self.is_same_enter() && self.both(PointType::Enter)
    }

    pub fn is_crosswalk(&self) -> bool {
        self.is_same_enter() && self.both(PointType::Crosswalk)
    }

    pub fn is_normal(&self) -> bool {
        self.first.point_type == PointType::Normal || self.second.point_type == PointType::Normal
    }

    pub fn line_type(&self) -> LineType {
        if self.is_normal() {
            LineType::Normal
        } else if self.is_stop_line() {
            LineType::Stop
        } else if self.is_crosswalk() {
            LineType::Crosswalk
        } else {
            LineType::Regular
        }
    }
}

impl fmt::Display for MarkupPointPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.first.enter.0, self.first.num, self.second.enter.0, self.second.num
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SegmentID;

    fn pt(enter: u16, num: u8, point_type: PointType) -> PointID {
        PointID::new(SegmentID(enter), num, point_type)
    }

    #[test]
    fn classification() {
        let stop = MarkupPointPair::new(pt(1, 3, PointType::Enter), pt(1, 1, PointType::Enter))
            .unwrap();
        assert_eq!(stop.first().num, 1);
        assert_eq!(stop.line_type(), LineType::Stop);

        let crosswalk = MarkupPointPair::new(
            pt(1, 1, PointType::Crosswalk),
            pt(1, 4, PointType::Crosswalk),
        )
        .unwrap();
        assert_eq!(crosswalk.line_type(), LineType::Crosswalk);

        let normal =
            MarkupPointPair::new(pt(1, 2, PointType::Enter), pt(1, 2, PointType::Normal)).unwrap();
        assert_eq!(normal.line_type(), LineType::Normal);

        let regular =
            MarkupPointPair::new(pt(1, 2, PointType::Enter), pt(2, 2, PointType::Enter)).unwrap();
        assert_eq!(regular.line_type(), LineType::Regular);
        assert_eq!(regular.other(pt(2, 2, PointType::Enter)), Some(pt(1, 2, PointType::Enter)));
        assert_eq!(regular.other(pt(3, 2, PointType::Enter)), None);
    }

    #[test]
    fn same_point_is_no_pair() {
        assert!(MarkupPointPair::new(pt(1, 1, PointType::Enter), pt(1, 1, PointType::Enter))
            .is_none());
    }
}
