//! Lays out, edits and renders intersection markings on a road network stored as JSON.

#[macro_use]
extern crate log;

mod paste;
mod point_arg;

use std::path::Path;

use anyhow::{bail, Result};
use serde::Serialize;
use structopt::StructOpt;

use geom::{Distance, Pt2D};
use markup::{
    synthetic, targets, Enter, MarkupDash, MarkupManager, MarkupPoint, Network, NodeID,
    PointType, SegmentID, Settings,
};

use crate::point_arg::{PairArg, PointArg, SegmentMapArg};

#[derive(StructOpt)]
#[structopt(name = "markup-cli", about = "Intersection markings from the command line")]
struct Args {
    /// Preferences; missing files mean defaults
    #[structopt(long, default_value = "settings.json")]
    settings: String,
    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(StructOpt)]
enum Command {
    /// Generates a network with one node at the origin and straight segments leaving it
    Synthetic {
        #[structopt(long, default_value = "4")]
        arms: usize,
        /// Drive lanes per segment
        #[structopt(long, default_value = "2")]
        lanes: usize,
        /// Meters
        #[structopt(long, default_value = "3")]
        lane_width: f64,
        /// Space between neighboring drive lanes, in meters
        #[structopt(long, default_value = "0")]
        gap: f64,
        #[structopt(long)]
        output: String,
    },
    /// Prints where every marking point at a node goes
    Layout {
        #[structopt(long)]
        network: String,
        #[structopt(long)]
        node: u16,
    },
    /// Lists the points a line could start from, or end at if `from` is given
    Targets {
        #[structopt(long)]
        network: String,
        #[structopt(long)]
        markings: String,
        #[structopt(long)]
        node: u16,
        /// Like 12:3, 12:3c or 12:3n
        #[structopt(long)]
        from: Option<PointArg>,
    },
    /// Adds lines that don't exist yet and removes the ones that do
    Connect {
        #[structopt(long)]
        network: String,
        #[structopt(long)]
        markings: String,
        #[structopt(long)]
        node: u16,
        /// Like 1:2-3:2
        #[structopt()]
        pairs: Vec<PairArg>,
    },
    /// Moves a point along its enter
    Offset {
        #[structopt(long)]
        network: String,
        #[structopt(long)]
        markings: String,
        #[structopt(long)]
        node: u16,
        #[structopt(long)]
        point: PointArg,
        /// Meters, measured across the lanes
        #[structopt(long, allow_hyphen_values = true)]
        meters: f64,
    },
    /// Prints every painted dash as JSON
    Render {
        #[structopt(long)]
        network: String,
        #[structopt(long)]
        markings: String,
        /// Only nodes within the render distance of this x,y are drawn
        #[structopt(long)]
        camera: Option<String>,
    },
    /// Copies the markings at one node onto another
    Paste {
        #[structopt(long)]
        network: String,
        #[structopt(long)]
        markings: String,
        #[structopt(long)]
        from: u16,
        #[structopt(long)]
        to: u16,
        #[structopt(long)]
        mirror: bool,
        /// Like 3=7: segment 3 at the source is segment 7 at the target
        #[structopt(long = "map")]
        segments: Vec<SegmentMapArg>,
    },
}

fn main() -> Result<()> {
    abstutil::logger::setup();
    let args = Args::from_args();
    let settings = Settings::load(&args.settings);

    match args.cmd {
        Command::Synthetic {
            arms,
            lanes,
            lane_width,
            gap,
            output,
        } => {
            if arms < 2 {
                bail!("A node needs at least 2 segments, not {}", arms);
            }
            let net = synthetic::crossroads(
                arms,
                lanes,
                Distance::meters(lane_width),
                Distance::meters(gap),
            );
            net.save(&output)?;
        }
        Command::Layout { network, node } => {
            let net = Network::load(&network)?;
            let mut mgr = MarkupManager::new();
            let markup = mgr.get(&net, NodeID(node))?;
            let enters: Vec<EnterLayout> = markup.enters().map(EnterLayout::new).collect();
            println!("{}", abstutil::to_json(&enters));
        }
        Command::Targets {
            network,
            markings,
            node,
            from,
        } => {
            let net = Network::load(&network)?;
            let mut mgr = load_markings(&net, &markings)?;
            let markup = mgr.get(&net, NodeID(node))?;
            let point_types = match from {
                Some(PointArg(pt)) => enumset::EnumSet::only(pt.point_type),
                None => PointType::Enter | PointType::Crosswalk,
            };
            for pt in targets::targets(markup, point_types, from.map(|p| p.0)) {
                println!("{}", pt);
            }
        }
        Command::Connect {
            network,
            markings,
            node,
            pairs,
        } => {
            let net = Network::load(&network)?;
            let mut mgr = load_markings(&net, &markings)?;
            let markup = mgr.get(&net, NodeID(node))?;
            for PairArg(pair) in pairs {
                match markup.toggle_connection(pair, None)? {
                    Some(line) => info!("Added {:?} line {}", line.line_type, pair),
                    None => info!("Removed line {}", pair),
                }
            }
            mgr.save(&markings)?;
        }
        Command::Offset {
            network,
            markings,
            node,
            point,
            meters,
        } => {
            let net = Network::load(&network)?;
            let mut mgr = load_markings(&net, &markings)?;
            mgr.get(&net, NodeID(node))?
                .set_point_offset(point.0, Distance::meters(meters))?;
            mgr.save(&markings)?;
        }
        Command::Render {
            network,
            markings,
            camera,
        } => {
            let net = Network::load(&network)?;
            let mgr = load_markings(&net, &markings)?;
            let camera = camera.map(|c| parse_pt(&c)).transpose()?;
            let mut dashes: Vec<MarkupDash> = Vec::new();
            for node in mgr.nodes() {
                let markup = match mgr.try_get(*node) {
                    Some(m) => m,
                    None => continue,
                };
                if let Some(camera) = camera {
                    if markup.position().dist_to(camera) > settings.render_distance {
                        continue;
                    }
                }
                dashes.extend(markup.dashes());
            }
            println!("{}", abstutil::to_json(&dashes));
        }
        Command::Paste {
            network,
            markings,
            from,
            to,
            mirror,
            segments,
        } => {
            let net = Network::load(&network)?;
            let mut mgr = load_markings(&net, &markings)?;
            paste::run(&net, &mut mgr, NodeID(from), NodeID(to), mirror, segments)?;
            mgr.save(&markings)?;
        }
    }
    Ok(())
}

fn load_markings(net: &Network, path: &str) -> Result<MarkupManager> {
    let mut mgr = MarkupManager::new();
    if Path::new(path).exists() {
        mgr.load(net, path)?;
    }
    Ok(mgr)
}

fn parse_pt(s: &str) -> Result<Pt2D> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 2 {
        bail!("{} should look like x,y", s);
    }
    let x: f64 = parts[0].trim().parse()?;
    let y: f64 = parts[1].trim().parse()?;
    if !x.is_finite() || !y.is_finite() {
        bail!("{} isn't a place", s);
    }
    Ok(Pt2D::new(x, y))
}

#[derive(Serialize)]
struct EnterLayout<'a> {
    id: SegmentID,
    /// Degrees
    absolute_angle: f64,
    /// Degrees
    corner_dir: f64,
    road_half_width: Distance,
    position: Option<Pt2D>,
    points: Vec<&'a MarkupPoint>,
    crosswalks: Vec<&'a MarkupPoint>,
    normals: Vec<&'a MarkupPoint>,
}

impl<'a> EnterLayout<'a> {
    fn new(enter: &'a Enter) -> EnterLayout<'a> {
        EnterLayout {
            id: enter.id,
            absolute_angle: enter.absolute_angle.normalized_degrees(),
            corner_dir: enter.corner_dir.normalized_degrees(),
            road_half_width: enter.road_half_width,
            position: enter.position,
            points: enter.points().collect(),
            crosswalks: enter.crosswalks().collect(),
            normals: enter.normals().collect(),
        }
    }
}
