//! Road markings at intersections: points laid out where lanes meet a node, lines connecting
//! them, and filled areas bounded by those lines.
//!
//! Everything is computed from a [`Network`] snapshot of the roads. Whenever the roads change,
//! [`Markup::update`] lays the points out again; saved lines keep resolving because points are
//! identified by their enter and number, not their position.

#[macro_use]
extern crate log;

mod data;
mod enter;
mod filler;
mod line;
mod markup;
mod network;
mod pair;
mod point;
mod settings;
mod style;
pub mod synthetic;
pub mod targets;
mod templates;
mod tool;

pub use crate::data::{FillerData, LineData, MarkupData, ObjectsMap, PointData};
pub use crate::enter::{DriveLane, Enter, EnterData, SegmentMarkupLine, CROSSWALK_SHIFT};
pub use crate::filler::{FillerVertex, MarkupFiller};
pub use crate::line::{LinePartEdge, LineType, MarkupLine, MarkupLineRule, MarkupLinesIntersect};
pub use crate::markup::{Markup, MarkupManager};
pub use crate::network::{
    Lane, LaneID, LaneType, Network, Node, NodeID, Segment, SegmentEnd, SegmentID,
};
pub use crate::pair::MarkupPointPair;
pub use crate::point::{LocationType, MarkupPoint, PointID, PointType};
pub use crate::settings::Settings;
pub use crate::style::{Color, FillerStyle, LineStyle, MarkupDash, StyleKind};
pub use crate::templates::{StyleTemplate, TemplateManager, TemplateStyle};
pub use crate::tool::{MarkupTool, Mode, Modifiers, ToolEvent, ToolResponse};
