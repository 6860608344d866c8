use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Error, Result};

use markup::{MarkupPointPair, PointID, PointType, SegmentID};

/// A point written as `segment:num`, with an optional suffix: `c` for the crosswalk point or `n`
/// for the normal point. `12:3c` is the third crosswalk point of segment 12.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointArg(pub PointID);

impl FromStr for PointArg {
    type Err = Error;

    fn from_str(s: &str) -> Result<PointArg> {
        let (segment, rest) = s
            .split_once(':')
            .ok_or_else(|| anyhow!("{} should look like segment:num", s))?;
        let (num, point_type) = if let Some(num) = rest.strip_suffix('c') {
            (num, PointType::Crosswalk)
        } else if let Some(num) = rest.strip_suffix('n') {
            (num, PointType::Normal)
        } else {
            (rest, PointType::Enter)
        };
        let segment: u16 = segment
            .parse()
            .with_context(|| format!("bad segment in {}", s))?;
        let num: u8 = num.parse().with_context(|| format!("bad number in {}", s))?;
        if num == 0 {
            bail!("Point numbers start at 1, not {}", s);
        }
        Ok(PointArg(PointID::new(SegmentID(segment), num, point_type)))
    }
}

/// Two points joined by `-`, like `1:2-3:2`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PairArg(pub MarkupPointPair);

impl FromStr for PairArg {
    type Err = Error;

    fn from_str(s: &str) -> Result<PairArg> {
        let (a, b) = s
            .split_once('-')
            .ok_or_else(|| anyhow!("{} should look like 1:2-3:2", s))?;
        let a: PointArg = a.parse()?;
        let b: PointArg = b.parse()?;
        MarkupPointPair::new(a.0, b.0)
            .map(PairArg)
            .ok_or_else(|| anyhow!("{} connects a point to itself", s))
    }
}

/// A segment mapping written as `from=to`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentMapArg(pub SegmentID, pub SegmentID);

impl FromStr for SegmentMapArg {
    type Err = Error;

    fn from_str(s: &str) -> Result<SegmentMapArg> {
        let (a, b) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("{} should look like from=to", s))?;
        Ok(SegmentMapArg(
            SegmentID(a.parse().with_context(|| format!("bad segment in {}", s))?),
            SegmentID(b.parse().with_context(|| format!("bad segment in {}", s))?),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsing_points() {
        assert_eq!(
            "12:3c".parse::<PointArg>().unwrap().0,
            PointID::new(SegmentID(12), 3, PointType::Crosswalk)
        );
        assert_eq!(
            "4:1".parse::<PointArg>().unwrap().0.point_type,
            PointType::Enter
        );
        assert!("4:0".parse::<PointArg>().is_err());
        assert!("4".parse::<PointArg>().is_err());
        assert!("4:1-4:1".parse::<PairArg>().is_err());
        assert_eq!(
            "3=7".parse::<SegmentMapArg>().unwrap(),
            SegmentMapArg(SegmentID(3), SegmentID(7))
        );
    }
}
