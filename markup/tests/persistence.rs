use geom::{Distance, Pt2D};
use markup::synthetic::crossroads;
use markup::{
    FillerStyle, FillerVertex, LineData, LinePartEdge, LineStyle, LineType, Markup, MarkupData,
    MarkupFiller, MarkupLineRule, MarkupManager, MarkupPointPair, Network, NodeID, ObjectsMap,
    PointID, PointType, SegmentID,
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

/// Two lines across the node from east to west, the area between them filled, and the
/// northmost east point nudged south.
fn marked_up(net: &Network, mgr: &mut MarkupManager) {
    let markup = mgr.get(net, NodeID(0)).unwrap();
    markup.toggle_connection(pair(pt(0, 1), pt(2, 3)), None).unwrap();
    markup.toggle_connection(pair(pt(0, 2), pt(2, 2)), None).unwrap();
    markup
        .toggle_connection(pair(pt(1, 1), pt(1, 3)), None)
        .unwrap();
    let mut filler = MarkupFiller::new(FillerStyle::default());
    for v in [pt(0, 1), pt(2, 3), pt(2, 2), pt(0, 2), pt(0, 1)] {
        filler.add(FillerVertex::Point(v));
    }
    markup.add_filler(filler).unwrap();
    markup
        .set_point_offset(pt(0, 1), Distance::meters(0.5))
        .unwrap();
}

#[test]
fn saved_markings_come_back() {
    let net = crossroads(4, 2, Distance::meters(3.0), Distance::ZERO);
    let mut mgr = MarkupManager::new();
    marked_up(&net, &mut mgr);
    // Untouched nodes aren't saved
    mgr.get(&net, NodeID(1)).unwrap();

    let saved = mgr.to_data();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].points.len(), 1);
    assert_eq!(saved[0].lines.len(), 3);
    assert_eq!(saved[0].fillers.len(), 1);

    let raw = abstutil::to_json(&saved);
    let loaded: Vec<MarkupData> = abstutil::from_json(raw.as_bytes()).unwrap();
    let mut copy = MarkupManager::new();
    copy.from_data(&net, loaded);
    assert_eq!(copy.to_data(), saved);

    let markup = copy.try_get(NodeID(0)).unwrap();
    assert!(close(
        markup.get_point(pt(0, 1)).unwrap().position,
        Pt2D::new(12.0, 2.5)
    ));
    assert_eq!(
        markup
            .get_line(pair(pt(1, 1), pt(1, 3)))
            .unwrap()
            .line_type,
        LineType::Stop
    );
}

#[test]
fn loading_skips_what_doesnt_fit() {
    let net = crossroads(4, 2, Distance::meters(3.0), Distance::ZERO);
    let mut mgr = MarkupManager::new();
    marked_up(&net, &mut mgr);
    let mut saved = mgr.to_data();

    // A line to a segment that isn't here, and one to a point that doesn't exist
    for (a, b) in [(pt(0, 3), pt(9, 1)), (pt(0, 3), pt(1, 7))] {
        saved[0].lines.push(LineData {
            pair: pair(a, b),
            rules: Vec::new(),
        });
    }
    // A style that doesn't fit falls back to the default
    saved[0].lines.push(LineData {
        pair: pair(pt(3, 1), pt(3, 3)),
        rules: vec![MarkupLineRule {
            from: LinePartEdge::Start,
            to: LinePartEdge::End,
            style: LineStyle::default_for(LineType::Regular),
        }],
    });
    // Markings for a node that doesn't exist
    let mut ghost = saved[0].clone();
    ghost.node = NodeID(42);
    saved.push(ghost);

    let mut copy = MarkupManager::new();
    copy.from_data(&net, saved);
    assert_eq!(copy.nodes().count(), 1);
    let markup = copy.try_get(NodeID(0)).unwrap();
    assert_eq!(markup.line_count(), 4);
    let stop = markup.get_line(pair(pt(3, 1), pt(3, 3))).unwrap();
    assert_eq!(stop.rules()[0].style, LineStyle::default_for(LineType::Stop));
    assert_eq!(markup.fillers().len(), 1);
}

#[test]
fn pasting_mirrored() {
    let net = crossroads(4, 2, Distance::meters(3.0), Distance::ZERO);
    let mut mgr = MarkupManager::new();
    marked_up(&net, &mut mgr);
    let source = mgr.try_get(NodeID(0)).unwrap().to_data();

    // Reflect across the x axis: north and south swap, and every enter's points count from the
    // other side
    let mut map = ObjectsMap::new(true);
    map.add_segment(SegmentID(1), SegmentID(3));
    map.add_segment(SegmentID(3), SegmentID(1));
    for id in 0..4 {
        map.add_mirror_enter(SegmentID(id), 3);
    }
    let mirrored = Markup::from_data(&net, NodeID(0), &source, &map).unwrap();

    assert!(mirrored.exist_connection(pair(pt(0, 3), pt(2, 1))));
    assert!(mirrored.exist_connection(pair(pt(0, 2), pt(2, 2))));
    assert!(mirrored.exist_connection(pair(pt(3, 1), pt(3, 3))));
    assert_eq!(mirrored.line_count(), 3);
    assert_eq!(mirrored.fillers().len(), 1);
    assert!(close(
        mirrored.get_point(pt(0, 3)).unwrap().position,
        Pt2D::new(12.0, -2.5)
    ));
    let filler = mirrored.fillers()[0].polygon(&mirrored).unwrap();
    assert!(filler.contains_pt(Pt2D::new(0.0, -1.0)));
    assert!(!filler.contains_pt(Pt2D::new(0.0, 1.0)));

    // Without mirroring, the same map only moves things between segments
    let mut plain = ObjectsMap::new(false);
    plain.add_segment(SegmentID(1), SegmentID(3));
    let pasted = Markup::from_data(&net, NodeID(0), &source, &plain).unwrap();
    assert!(pasted.exist_connection(pair(pt(0, 1), pt(2, 3))));
    assert!(pasted.exist_connection(pair(pt(3, 1), pt(3, 3))));
    assert!(close(
        pasted.get_point(pt(0, 1)).unwrap().position,
        Pt2D::new(12.0, 2.5)
    ));
}

#[test]
fn road_changes_drop_lost_lines() {
    let mut net = crossroads(4, 2, Distance::meters(3.0), Distance::ZERO);
    let mut mgr = MarkupManager::new();
    marked_up(&net, &mut mgr);
    {
        let markup = mgr.get(&net, NodeID(0)).unwrap();
        markup
            .toggle_connection(pair(pt(0, 3), pt(2, 1)), None)
            .unwrap();
        assert_eq!(markup.line_count(), 4);
    }

    // The east arm loses a lane, so it only has two points left
    net.segments
        .get_mut(&SegmentID(0))
        .unwrap()
        .lanes
        .remove(2);
    mgr.update_node(&net, NodeID(0));

    let markup = mgr.try_get(NodeID(0)).unwrap();
    assert_eq!(markup.get_enter(SegmentID(0)).unwrap().point_count(), 2);
    assert!(markup.get_point(pt(0, 3)).is_none());
    assert!(!markup.exist_connection(pair(pt(0, 3), pt(2, 1))));
    assert_eq!(markup.line_count(), 3);
    // The first point kept its offset
    assert_eq!(
        markup.get_point(pt(0, 1)).unwrap().offset,
        Distance::meters(0.5)
    );

    // Markings at a node that can't be laid out anymore are dropped
    net.nodes.get_mut(&NodeID(0)).unwrap().segments.push(SegmentID(77));
    mgr.update_all(&net);
    assert!(mgr.try_get(NodeID(0)).is_none());
}
