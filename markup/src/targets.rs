//! Which points a line can be drawn to.

use enumset::EnumSet;

use geom::{Distance, Pt2D};

use crate::{Enter, LineType, Markup, PointID, PointType};

/// The cursor has to be at least this far from a selected enter point to offer its normal point.
const NORMAL_GESTURE_DIST: Distance = Distance::const_meters(5.0);
/// ... and pulled back at least this many degrees from the point's direction.
const NORMAL_GESTURE_DEGREES: f64 = 160.0;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Allow {
    No,
    Yes,
    /// An endpoint of an existing stop line or crosswalk
    Boundary,
}

/// Every point of the requested types that a line from `selected` could end at. With nothing
/// selected, these are the points a line could start from.
pub fn targets(
    markup: &Markup,
    point_types: EnumSet<PointType>,
    selected: Option<PointID>,
) -> Vec<PointID> {
    let mut result = Vec::new();
    for enter in markup.enters() {
        if point_types.contains(PointType::Enter) {
            enter_targets(markup, enter, selected, &mut result);
        }
        if point_types.contains(PointType::Crosswalk) {
            crosswalk_targets(markup, enter, selected, &mut result);
        }
    }
    result
}

fn enter_targets(
    markup: &Markup,
    enter: &Enter,
    selected: Option<PointID>,
    result: &mut Vec<PointID>,
) {
    let selected = match selected {
        Some(pt) if pt.enter == enter.id => pt,
        _ => {
            result.extend(enter.points().map(|pt| pt.id));
            return;
        }
    };

    let mut allow = vec![Allow::Yes; enter.point_count()];
    let selected_idx = usize::from(selected.num) - 1;
    let mut left_idx = selected_idx;
    let mut right_idx = selected_idx;

    for line in markup.lines() {
        if line.line_type != LineType::Stop || line.start().enter != enter.id {
            continue;
        }
        let from = usize::from(line.start().num.min(line.end().num)) - 1;
        let to = usize::from(line.start().num.max(line.end().num)) - 1;
        // Inside a stop line, nothing else on this enter can be reached
        if from < selected_idx && selected_idx < to {
            return;
        }
        block_interior(&mut allow, from, to);

        if let Some(other) = line.pair.other(selected) {
            let other_idx = usize::from(other.num) - 1;
            if other_idx < selected_idx {
                left_idx = other_idx;
            } else if other_idx > selected_idx {
                right_idx = other_idx;
            }
        }
    }

    block_beyond(&mut allow, selected_idx, left_idx, right_idx);
    result.extend(
        enter
            .points()
            .filter(|pt| allow.get(usize::from(pt.num()) - 1) != Some(&Allow::No))
            .map(|pt| pt.id),
    );
}

fn crosswalk_targets(
    markup: &Markup,
    enter: &Enter,
    selected: Option<PointID>,
    result: &mut Vec<PointID>,
) {
    let selected = match selected {
        Some(pt) if pt.enter != enter.id => return,
        Some(pt) => Some(pt),
        None => None,
    };

    let crosswalks: Vec<PointID> = enter.crosswalks().map(|pt| pt.id).collect();
    let index_of = |pt: PointID| crosswalks.iter().position(|c| *c == pt);
    let mut allow = vec![Allow::Yes; crosswalks.len()];
    let selected_idx = selected.and_then(index_of);
    let mut left_idx = selected_idx.unwrap_or(0);
    let mut right_idx = selected_idx.unwrap_or(0);

    for line in markup.lines() {
        if line.line_type != LineType::Crosswalk || line.start().enter != enter.id {
            continue;
        }
        let (a, b) = match (index_of(line.start()), index_of(line.end())) {
            (Some(a), Some(b)) => (a, b),
            _ => continue,
        };
        block_interior(&mut allow, a.min(b), a.max(b));

        if let (Some(selected), Some(selected_idx)) = (selected, selected_idx) {
            if let Some(other_idx) = line.pair.other(selected).and_then(index_of) {
                if other_idx < selected_idx {
                    left_idx = other_idx;
                } else if other_idx > selected_idx {
                    right_idx = other_idx;
                }
            }
        }
    }

    if let Some(selected_idx) = selected_idx {
        block_beyond(&mut allow, selected_idx, left_idx, right_idx);
    }
    result.extend(
        crosswalks
            .into_iter()
            .zip(allow)
            .filter(|(_, allow)| *allow != Allow::No)
            .map(|(pt, _)| pt),
    );
}

fn block_interior(allow: &mut [Allow], from: usize, to: usize) {
    if to >= allow.len() {
        return;
    }
    allow[from] = Allow::Boundary;
    allow[to] = Allow::Boundary;
    for x in allow.iter_mut().take(to).skip(from + 1) {
        *x = Allow::No;
    }
}

/// Lines from the selected point can't jump over the nearest boundary on either side. If the
/// selected point already shares a line with a point on one side, that point is the limit.
fn block_beyond(allow: &mut [Allow], selected_idx: usize, left_idx: usize, right_idx: usize) {
    let left = if left_idx == selected_idx {
        find_boundary(allow, selected_idx, -1)
    } else {
        left_idx as isize
    };
    let right = if right_idx == selected_idx {
        find_boundary(allow, selected_idx, 1)
    } else {
        right_idx as isize
    };
    block_from(allow, left, -1);
    block_from(allow, right, 1);
    if let Some(x) = allow.get_mut(selected_idx) {
        *x = Allow::No;
    }
}

/// Steps from `idx` in direction `sign` until hitting a boundary or running off the end.
fn find_boundary(allow: &[Allow], idx: usize, sign: isize) -> isize {
    let mut idx = idx as isize;
    loop {
        idx += sign;
        if idx < 0 || idx >= allow.len() as isize || allow[idx as usize] == Allow::Boundary {
            return idx;
        }
    }
}

/// Blocks everything strictly past `idx` in direction `sign`.
fn block_from(allow: &mut [Allow], idx: isize, sign: isize) {
    let mut idx = idx + sign;
    while idx >= 0 && idx < allow.len() as isize {
        allow[idx as usize] = Allow::No;
        idx += sign;
    }
}

/// Pulling the cursor back behind a selected enter point, far enough, picks the point's normal
/// point across the intersection.
pub fn normal_target(markup: &Markup, selected: PointID, cursor: Pt2D) -> Option<PointID> {
    if selected.point_type != PointType::Enter {
        return None;
    }
    let point = markup.get_point(selected)?;
    if point.position.dist_to(cursor) < NORMAL_GESTURE_DIST {
        return None;
    }
    let toward_cursor = point.position.angle_to(cursor)?;
    if point.direction.shortest_angle_between(toward_cursor) < NORMAL_GESTURE_DEGREES {
        return None;
    }
    markup
        .get_point(selected.with_type(PointType::Normal))
        .map(|pt| pt.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed(allow: &[Allow]) -> Vec<usize> {
        allow
            .iter()
            .enumerate()
            .filter(|(_, a)| **a != Allow::No)
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn stop_lines_fence_off_ranges() {
        // Points 0..6, with a stop line from 1 to 3
        let mut allow = vec![Allow::Yes; 7];
        block_interior(&mut allow, 1, 3);
        assert_eq!(allowed(&allow), vec![0, 1, 3, 4, 5, 6]);

        // Selecting 5 can reach back to the stop line's end, but not past it
        let mut from_five = allow.clone();
        block_beyond(&mut from_five, 5, 5, 5);
        assert_eq!(allowed(&from_five), vec![3, 4, 6]);

        // Selecting 1, the stop line's start, is limited by its other end
        let mut from_one = allow;
        block_beyond(&mut from_one, 1, 1, 3);
        assert_eq!(allowed(&from_one), vec![0, 3]);
    }
}
