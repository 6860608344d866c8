use anyhow::{anyhow, Result};

use markup::{MarkupManager, Network, NodeID, ObjectsMap};

use crate::point_arg::SegmentMapArg;

/// Copies the markings at one node onto another. Segments of the source are translated with
/// `segments`; when mirroring, the target enters' points are numbered from the other side.
pub fn run(
    net: &Network,
    mgr: &mut MarkupManager,
    from: NodeID,
    to: NodeID,
    mirror: bool,
    segments: Vec<SegmentMapArg>,
) -> Result<()> {
    let data = mgr
        .try_get(from)
        .ok_or_else(|| anyhow!("{} has no markings to copy", from))?
        .to_data();

    let target = mgr.get(net, to)?;
    let mut map = ObjectsMap::new(mirror);
    for SegmentMapArg(source, dest) in segments {
        map.add_segment(source, dest);
        if mirror {
            match target.get_enter(dest) {
                Some(enter) => map.add_mirror_enter(dest, enter.point_count()),
                None => warn!("{} doesn't touch {}", dest, to),
            }
        }
    }
    target.load_data(&data, &map);
    info!(
        "{} {} lines and {} fillers from {} to {}",
        if mirror { "Mirrored" } else { "Pasted" },
        target.line_count(),
        target.fillers().len(),
        from,
        to
    );
    Ok(())
}
