use enumset::EnumSet;

use geom::{Distance, Pt2D};
use markup::synthetic::crossroads;
use markup::targets::{normal_target, targets};
use markup::{
    FillerStyle, FillerVertex, LinePartEdge, LineStyle, LineType, Markup, MarkupDash,
    MarkupFiller, MarkupLineRule, MarkupManager, MarkupPointPair, MarkupTool, Mode, Modifiers,
    Network, NodeID, ObjectsMap, PointID, PointType, SegmentID, Settings, ToolEvent,
    ToolResponse,
};

fn pt(enter: u16, num: u8) -> PointID {
    PointID::new(SegmentID(enter), num, PointType::Enter)
}

fn pair(a: PointID, b: PointID) -> MarkupPointPair {
    MarkupPointPair::new(a, b).unwrap()
}

fn close(a: Pt2D, b: Pt2D) -> bool {
    a.approx_eq(b, Distance::meters(0.01))
}

/// Four arms with two 3m lanes each. Looking from the node, the east arm's points run north to
/// south: 1 at (12, 3), 2 at (12, 0), 3 at (12, -3). The west arm's run the other way.
fn four_way() -> (Network, Markup) {
    let net = crossroads(4, 2, Distance::meters(3.0), Distance::ZERO);
    let markup = Markup::new(&net, NodeID(0)).unwrap();
    (net, markup)
}

/// Two straight lines across the node from east to west, at y = 3 and y = 0.
fn two_lanes_across(markup: &mut Markup) -> (MarkupPointPair, MarkupPointPair) {
    let top = pair(pt(0, 1), pt(2, 3));
    let middle = pair(pt(0, 2), pt(2, 2));
    markup.toggle_connection(top, None).unwrap();
    markup.toggle_connection(middle, None).unwrap();
    (top, middle)
}

#[test]
fn toggling_connections() {
    let (_, mut markup) = four_way();
    let across = pair(pt(0, 1), pt(2, 3));
    let line = markup.toggle_connection(across, None).unwrap().unwrap();
    assert_eq!(line.line_type, LineType::Regular);
    assert_eq!(line.rules().len(), 1);
    assert!(close(line.trajectory.position(0.5), Pt2D::new(0.0, 3.0)));
    assert!(markup.exist_connection(across));

    assert!(markup.toggle_connection(across, None).unwrap().is_none());
    assert!(!markup.exist_connection(across));
    assert!(markup.is_empty());

    // Stop lines don't take regular styles
    let stop = pair(pt(0, 1), pt(0, 3));
    let regular_style = LineStyle::default_for(LineType::Regular);
    assert!(markup.toggle_connection(stop, Some(regular_style)).is_err());
    assert!(!markup.exist_connection(stop));
    let line = markup.toggle_connection(stop, None).unwrap().unwrap();
    assert_eq!(line.line_type, LineType::Stop);
}

#[test]
fn crossings_cut_rules() {
    let (_, mut markup) = four_way();
    let (top, middle) = two_lanes_across(&mut markup);
    // North to south through the center
    let vertical = pair(pt(1, 2), pt(3, 2));
    markup.toggle_connection(vertical, None).unwrap();

    assert_eq!(markup.all_intersections().count(), 2);
    assert!(markup.intersection(top, middle).is_none());
    let hit = markup.intersection(top, vertical).unwrap();
    assert!(close(hit.position, Pt2D::new(0.0, 3.0)));
    assert!((hit.first_t - 0.5).abs() < 0.01);
    let seen_from_vertical = markup.intersection(vertical, top).unwrap();
    assert_eq!(seen_from_vertical.first, vertical);
    assert!((seen_from_vertical.first_t - 0.375).abs() < 0.01);
    assert_eq!(markup.intersections_of(vertical).len(), 2);

    let dashed = LineStyle::Dashed {
        color: Default::default(),
        width: Distance::meters(0.15),
        dash_length: Distance::meters(1.0),
        space_length: Distance::meters(1.0),
    };
    markup
        .get_line_mut(top)
        .unwrap()
        .add_rule(MarkupLineRule {
            from: LinePartEdge::Start,
            to: LinePartEdge::Intersect(vertical),
            style: dashed.clone(),
        })
        .unwrap();
    // A line can't be cut by itself
    assert!(markup
        .get_line_mut(top)
        .unwrap()
        .add_rule(MarkupLineRule {
            from: LinePartEdge::Start,
            to: LinePartEdge::Intersect(top),
            style: dashed.clone(),
        })
        .is_err());
    // Stop lines keep their single rule
    let stop = pair(pt(1, 1), pt(1, 3));
    markup.toggle_connection(stop, None).unwrap();
    assert!(markup
        .get_line_mut(stop)
        .unwrap()
        .add_rule(MarkupLineRule {
            from: LinePartEdge::Start,
            to: LinePartEdge::End,
            style: LineStyle::default_for(LineType::Stop),
        })
        .is_err());

    let line = markup.get_line(top).unwrap();
    assert_eq!(line.rules().len(), 2);
    assert!(!line.dashes(&markup).is_empty());

    // Removing the crossing line drops the rule that depended on it
    markup.remove_line(vertical);
    assert_eq!(markup.get_line(top).unwrap().rules().len(), 1);
    assert_eq!(markup.all_intersections().count(), 0);
}

/// No dash runs through the band between `lo` and `hi` on the y axis.
fn clear_of_band(dashes: &[MarkupDash], lo: f64, hi: f64) -> bool {
    dashes.iter().all(|d| {
        let (a, b) = (d.start.y(), d.end.y());
        (a <= lo + 0.01 && b <= lo + 0.01) || (a >= hi - 0.01 && b >= hi - 0.01)
    })
}

#[test]
fn crosswalks_cut_crossing_lines() {
    let (net, mut markup) = four_way();
    // Crosswalk points on the north arm sit at y = 8, and the zebra is 2m wide
    let crosswalk = pair(
        PointID::new(SegmentID(1), 1, PointType::Crosswalk),
        PointID::new(SegmentID(1), 3, PointType::Crosswalk),
    );
    markup.toggle_connection(crosswalk, None).unwrap();
    // From (0, 12) straight south to (0, -12)
    let vertical = pair(pt(1, 2), pt(3, 2));
    markup.toggle_connection(vertical, None).unwrap();

    let solid = LineStyle::Solid {
        color: Default::default(),
        width: Distance::meters(0.15),
    };
    {
        let line = markup.get_line_mut(vertical).unwrap();
        line.add_rule(MarkupLineRule {
            from: LinePartEdge::Start,
            to: LinePartEdge::CrosswalkBorder {
                crosswalk,
                outer: true,
            },
            style: solid.clone(),
        })
        .unwrap();
        line.add_rule(MarkupLineRule {
            from: LinePartEdge::CrosswalkBorder {
                crosswalk,
                outer: false,
            },
            to: LinePartEdge::End,
            style: solid.clone(),
        })
        .unwrap();
        // Drop the full-length default
        line.remove_rule(0).unwrap();
    }

    let line = markup.get_line(vertical).unwrap();
    let outer = LinePartEdge::CrosswalkBorder {
        crosswalk,
        outer: true,
    };
    assert!((outer.t(line, &markup).unwrap() - 0.125).abs() < 0.01);
    let dashes = line.dashes(&markup);
    assert!(!dashes.is_empty());
    assert!(clear_of_band(&dashes, 7.0, 9.0));
    assert!(dashes.iter().any(|d| close(d.start, Pt2D::new(0.0, 12.0))));
    assert!(dashes.iter().any(|d| close(d.end, Pt2D::new(0.0, -12.0))));

    // Pasted onto the other arm, the cut follows the crosswalk
    let mut map = ObjectsMap::new(false);
    map.add_segment(SegmentID(1), SegmentID(3));
    map.add_segment(SegmentID(3), SegmentID(1));
    let pasted = Markup::from_data(&net, NodeID(0), &markup.to_data(), &map).unwrap();
    let moved = pair(
        PointID::new(SegmentID(3), 1, PointType::Crosswalk),
        PointID::new(SegmentID(3), 3, PointType::Crosswalk),
    );
    assert!(pasted.exist_connection(moved));
    let line = pasted.get_line(vertical).unwrap();
    assert_eq!(line.rules().len(), 2);
    assert!(line
        .rules()
        .iter()
        .all(|rule| rule.from.depends_on() == Some(moved) || rule.to.depends_on() == Some(moved)));
    let dashes = line.dashes(&pasted);
    assert!(!dashes.is_empty());
    assert!(clear_of_band(&dashes, -9.0, -7.0));

    // Without the crosswalk, the line is painted end to end again
    markup.remove_line(crosswalk);
    let line = markup.get_line(vertical).unwrap();
    assert_eq!(
        line.rules(),
        &vec![MarkupLineRule {
            from: LinePartEdge::Start,
            to: LinePartEdge::End,
            style: LineStyle::default_for(LineType::Regular),
        }]
    );
}

#[test]
fn stop_lines_limit_targets() {
    let net = crossroads(4, 3, Distance::meters(3.0), Distance::ZERO);
    let mut markup = Markup::new(&net, NodeID(0)).unwrap();
    assert_eq!(markup.get_enter(SegmentID(0)).unwrap().point_count(), 4);
    let enter_only = EnumSet::only(PointType::Enter);

    let everything = targets(&markup, PointType::Enter | PointType::Crosswalk, None);
    assert_eq!(everything.len(), 32);

    markup
        .toggle_connection(pair(pt(0, 1), pt(0, 3)), None)
        .unwrap();
    let on_enter = |targets: Vec<PointID>| -> Vec<PointID> {
        targets
            .into_iter()
            .filter(|id| id.enter == SegmentID(0))
            .collect()
    };

    // Strictly inside the stop line, nothing else on the enter is reachable
    let from_inside = targets(&markup, enter_only, Some(pt(0, 2)));
    assert_eq!(from_inside.len(), 12);
    assert!(on_enter(from_inside).is_empty());

    // From beyond it, only up to its nearest end
    let from_outside = targets(&markup, enter_only, Some(pt(0, 4)));
    assert_eq!(on_enter(from_outside), vec![pt(0, 3)]);

    // From its start, limited by its other end
    let from_start = targets(&markup, enter_only, Some(pt(0, 1)));
    assert_eq!(on_enter(from_start), vec![pt(0, 3)]);

    // Other enters aren't affected
    let elsewhere = targets(&markup, enter_only, Some(pt(1, 2)));
    assert_eq!(elsewhere.len(), 4 * 4 - 1);
}

#[test]
fn crosswalks_stay_on_their_enter() {
    let (_, mut markup) = four_way();
    let crosswalk = |num| PointID::new(SegmentID(1), num, PointType::Crosswalk);
    let found = targets(&markup, EnumSet::only(PointType::Crosswalk), Some(crosswalk(1)));
    assert_eq!(found, vec![crosswalk(2), crosswalk(3)]);

    let line = markup
        .toggle_connection(pair(crosswalk(1), crosswalk(3)), None)
        .unwrap()
        .unwrap();
    assert_eq!(line.line_type, LineType::Crosswalk);
    let outer = line.crosswalk_border(true, Pt2D::zero()).unwrap();
    let inner = line.crosswalk_border(false, Pt2D::zero()).unwrap();
    assert!(outer.middle().dist_to(Pt2D::zero()) > inner.middle().dist_to(Pt2D::zero()));

    // From one end, only the other end is left
    let found = targets(&markup, EnumSet::only(PointType::Crosswalk), Some(crosswalk(3)));
    assert_eq!(found, vec![crosswalk(1)]);
}

#[test]
fn pulling_back_picks_the_normal_point() {
    let (_, markup) = four_way();
    let selected = pt(0, 2);
    assert_eq!(
        normal_target(&markup, selected, Pt2D::new(20.0, 0.0)),
        Some(selected.with_type(PointType::Normal))
    );
    // Not far enough
    assert_eq!(normal_target(&markup, selected, Pt2D::new(14.0, 0.0)), None);
    // Off to the side
    assert_eq!(normal_target(&markup, selected, Pt2D::new(12.0, 10.0)), None);
    // Only enter points have normals
    assert_eq!(
        normal_target(
            &markup,
            selected.with_type(PointType::Crosswalk),
            Pt2D::new(20.0, 0.0)
        ),
        None
    );
}

#[test]
fn filler_between_two_lines() {
    let (_, mut markup) = four_way();
    let (top, middle) = two_lanes_across(&mut markup);

    let mut filler = MarkupFiller::new(FillerStyle::default());
    assert_eq!(filler.next_candidates(&markup).len(), 4 * 3);

    let path = [pt(0, 1), pt(2, 3), pt(2, 2), pt(0, 2)];
    let expected_next = [
        vec![pt(0, 2), pt(2, 3)],
        vec![pt(2, 2)],
        vec![pt(0, 2), pt(2, 1)],
        vec![pt(0, 1), pt(0, 3)],
    ];
    for (vertex, expected) in path.iter().zip(expected_next) {
        assert!(!filler.add(FillerVertex::Point(*vertex)));
        let mut next: Vec<PointID> = filler
            .next_candidates(&markup)
            .into_iter()
            .map(|v| match v {
                FillerVertex::Point(pt) => pt,
                FillerVertex::Intersect(_, _) => panic!("no crossings here"),
            })
            .collect();
        next.sort();
        assert_eq!(next, expected, "after {}", vertex);
    }
    assert!(filler.add(FillerVertex::Point(pt(0, 1))));
    assert!(filler.is_closed());

    let polygon = filler.polygon(&markup).unwrap();
    assert!((polygon.area() - 72.0).abs() < 0.1);
    assert!(polygon.contains_pt(Pt2D::new(0.0, 1.5)));
    markup.add_filler(filler).unwrap();
    assert!(!markup.dashes().is_empty());

    // The bottom line bounds the filler
    markup.remove_line(middle);
    assert!(markup.fillers().is_empty());
    assert!(markup.exist_connection(top));
}

#[test]
fn filler_through_crossings() {
    let (_, mut markup) = four_way();
    let (top, middle) = two_lanes_across(&mut markup);
    let vertical = pair(pt(1, 2), pt(3, 2));
    markup.toggle_connection(vertical, None).unwrap();
    let upper = FillerVertex::intersect(top, vertical);
    let lower = FillerVertex::intersect(vertical, middle);

    let mut filler = MarkupFiller::new(FillerStyle::Solid {
        color: Default::default(),
    });
    assert_eq!(filler.next_candidates(&markup).len(), 4 * 3 + 2);
    filler.add(FillerVertex::Point(pt(0, 1)));
    assert!(filler.next_candidates(&markup).contains(&upper));
    filler.add(upper);
    let next = filler.next_candidates(&markup);
    assert!(next.contains(&lower));
    assert!(next.contains(&FillerVertex::Point(pt(1, 2))));
    assert!(next.contains(&FillerVertex::Point(pt(2, 3))));
    filler.add(lower);
    filler.add(FillerVertex::Point(pt(0, 2)));
    // Can't close yet through a vertex that isn't the first
    assert!(!filler.add(FillerVertex::Point(pt(0, 3))));
    assert_eq!(filler.remove(), Some(FillerVertex::Point(pt(0, 3))));
    assert!(filler.add(FillerVertex::Point(pt(0, 1))));

    let polygon = filler.polygon(&markup).unwrap();
    assert!((polygon.area() - 36.0).abs() < 0.1);
    markup.add_filler(filler).unwrap();

    // The filler's corners depend on the vertical line
    markup.remove_line(vertical);
    assert!(markup.fillers().is_empty());
}

#[test]
fn open_fillers_are_rejected() {
    let (_, mut markup) = four_way();
    two_lanes_across(&mut markup);
    let mut filler = MarkupFiller::new(FillerStyle::default());
    filler.add(FillerVertex::Point(pt(0, 1)));
    filler.add(FillerVertex::Point(pt(2, 3)));
    assert!(markup.add_filler(filler).is_err());
    assert!(markup.fillers().is_empty());
}

fn click(
    tool: &mut MarkupTool,
    net: &Network,
    mgr: &mut MarkupManager,
    at: Pt2D,
) -> ToolResponse {
    tool.handle(net, mgr, ToolEvent::MouseMove(at)).unwrap();
    tool.handle(net, mgr, ToolEvent::PrimaryClick(Modifiers::default()))
        .unwrap()
}

#[test]
fn editing_session() {
    let net = crossroads(4, 2, Distance::meters(3.0), Distance::ZERO);
    let mut mgr = MarkupManager::new();
    let mut tool = MarkupTool::new(Settings::default());
    let node = NodeID(0);

    // Clicking on nothing does nothing
    assert_eq!(
        click(&mut tool, &net, &mut mgr, Pt2D::new(30.0, 30.0)),
        ToolResponse::Nothing
    );
    assert_eq!(
        click(&mut tool, &net, &mut mgr, Pt2D::new(1.0, 1.0)),
        ToolResponse::NodeSelected(node)
    );
    assert_eq!(tool.mode(), Mode::ConnectLine);
    assert_eq!(tool.targets().len(), 4 * 3 * 2);

    assert_eq!(
        click(&mut tool, &net, &mut mgr, Pt2D::new(12.2, 3.0)),
        ToolResponse::PointSelected(pt(0, 1))
    );
    let across = pair(pt(0, 1), pt(2, 3));
    assert_eq!(
        click(&mut tool, &net, &mut mgr, Pt2D::new(-12.0, 2.6)),
        ToolResponse::LineToggled {
            pair: across,
            exists: true
        }
    );
    assert_eq!(tool.selected_point(), None);
    assert_eq!(mgr.try_get(node).unwrap().line_count(), 1);

    // Holding shift picks a solid line
    click(&mut tool, &net, &mut mgr, Pt2D::new(12.0, 0.0));
    tool.handle(&net, &mut mgr, ToolEvent::MouseMove(Pt2D::new(-12.0, 0.0)))
        .unwrap();
    let shift = Modifiers {
        shift: true,
        ctrl: false,
    };
    tool.handle(&net, &mut mgr, ToolEvent::PrimaryClick(shift))
        .unwrap();
    let middle = pair(pt(0, 2), pt(2, 2));
    let style = &mgr.try_get(node).unwrap().get_line(middle).unwrap().rules()[0].style;
    assert!(matches!(style, LineStyle::Solid { .. }));

    // Selecting a point and backing out
    click(&mut tool, &net, &mut mgr, Pt2D::new(12.0, -3.0));
    assert_eq!(tool.selected_point(), Some(pt(0, 3)));
    assert_eq!(
        tool.handle(&net, &mut mgr, ToolEvent::SecondaryClick).unwrap(),
        ToolResponse::PointUnselected
    );

    // Filling the area between the two lines
    assert_eq!(
        tool.handle(&net, &mut mgr, ToolEvent::StartFiller).unwrap(),
        ToolResponse::FillerStarted
    );
    assert_eq!(tool.mode(), Mode::SelectFiller);
    for at in [
        Pt2D::new(12.0, 3.0),
        Pt2D::new(-12.0, 3.0),
        Pt2D::new(-12.0, 0.0),
    ] {
        assert_eq!(
            click(&mut tool, &net, &mut mgr, at),
            ToolResponse::FillerChanged
        );
    }
    // Taking back the last vertex
    assert_eq!(
        tool.handle(&net, &mut mgr, ToolEvent::SecondaryClick).unwrap(),
        ToolResponse::FillerChanged
    );
    assert_eq!(tool.temp_filler().unwrap().vertices().len(), 2);
    click(&mut tool, &net, &mut mgr, Pt2D::new(-12.0, 0.0));
    click(&mut tool, &net, &mut mgr, Pt2D::new(12.0, 0.0));
    assert_eq!(
        click(&mut tool, &net, &mut mgr, Pt2D::new(12.0, 3.0)),
        ToolResponse::FillerAdded
    );
    assert_eq!(tool.mode(), Mode::ConnectLine);
    assert_eq!(mgr.try_get(node).unwrap().fillers().len(), 1);

    // Dragging a point with ctrl held
    tool.handle(&net, &mut mgr, ToolEvent::MouseMove(Pt2D::new(12.0, -3.0)))
        .unwrap();
    let ctrl = Modifiers {
        shift: false,
        ctrl: true,
    };
    assert_eq!(
        tool.handle(&net, &mut mgr, ToolEvent::MouseDown(ctrl)).unwrap(),
        ToolResponse::DragStarted(pt(0, 3))
    );
    assert_eq!(
        tool.handle(&net, &mut mgr, ToolEvent::MouseMove(Pt2D::new(12.0, -4.0)))
            .unwrap(),
        ToolResponse::OffsetChanged {
            point: pt(0, 3),
            offset: Distance::meters(1.0)
        }
    );
    tool.handle(&net, &mut mgr, ToolEvent::PrimaryClick(ctrl))
        .unwrap();
    assert_eq!(tool.mode(), Mode::ConnectLine);
    let moved = mgr.try_get(node).unwrap().get_point(pt(0, 3)).unwrap();
    assert!(close(moved.position, Pt2D::new(12.0, -4.0)));

    // Deleting everything needs confirmation
    assert_eq!(
        tool.handle(&net, &mut mgr, ToolEvent::DeleteAll).unwrap(),
        ToolResponse::ConfirmDeleteAll(node)
    );
    assert_eq!(
        tool.handle(&net, &mut mgr, ToolEvent::Confirm).unwrap(),
        ToolResponse::Cleared(node)
    );
    assert!(mgr.try_get(node).unwrap().is_empty());
    assert_eq!(
        tool.handle(&net, &mut mgr, ToolEvent::Confirm).unwrap(),
        ToolResponse::Nothing
    );

    assert_eq!(
        tool.handle(&net, &mut mgr, ToolEvent::SecondaryClick).unwrap(),
        ToolResponse::NodeUnselected
    );
    assert_eq!(
        tool.handle(&net, &mut mgr, ToolEvent::SecondaryClick).unwrap(),
        ToolResponse::Exit
    );
}

#[test]
fn delete_without_warnings() {
    let net = crossroads(3, 1, Distance::meters(3.5), Distance::ZERO);
    let mut mgr = MarkupManager::new();
    let mut tool = MarkupTool::new(Settings {
        delete_warnings: false,
        ..Default::default()
    });
    click(&mut tool, &net, &mut mgr, Pt2D::zero());
    assert_eq!(
        tool.handle(&net, &mut mgr, ToolEvent::DeleteAll).unwrap(),
        ToolResponse::Cleared(NodeID(0))
    );
}
