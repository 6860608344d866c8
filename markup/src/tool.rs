//! An editing session: which node is being edited, what's selected and hovered, and how mouse
//! and keyboard input changes the markings.

use enumset::EnumSet;

use anyhow::{anyhow, Result};

use geom::{Distance, Pt2D};

use crate::style::DEFAULT_DOUBLE_OFFSET;
use crate::targets::{normal_target, targets};
use crate::{
    Color, FillerStyle, FillerVertex, LineStyle, LineType, Markup, MarkupFiller, MarkupManager,
    MarkupPointPair, Network, NodeID, PointID, PointType, Settings,
};

/// Points and filler vertices react to the cursor within this distance.
const HOVER_RADIUS: Distance = Distance::const_meters(1.0);
const MIN_NODE_RADIUS: Distance = Distance::const_meters(6.0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    SelectNode,
    ConnectLine,
    DragPoint,
    SelectFiller,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ToolEvent {
    /// The cursor moved to a place on the ground
    MouseMove(Pt2D),
    /// The primary button went down. Together with ctrl, this starts dragging a point.
    MouseDown(Modifiers),
    /// The primary button was released
    PrimaryClick(Modifiers),
    SecondaryClick,
    StartFiller,
    DeleteAll,
    /// The user agreed to a deletion that needed confirmation
    Confirm,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ToolResponse {
    Nothing,
    NodeSelected(NodeID),
    NodeUnselected,
    PointSelected(PointID),
    PointUnselected,
    LineToggled {
        pair: MarkupPointPair,
        exists: bool,
    },
    DragStarted(PointID),
    OffsetChanged {
        point: PointID,
        offset: Distance,
    },
    FillerStarted,
    FillerChanged,
    FillerAdded,
    FillerCancelled,
    /// Deleting everything has to be confirmed first
    ConfirmDeleteAll(NodeID),
    Cleared(NodeID),
    Exit,
}

pub struct MarkupTool {
    pub settings: Settings,
    mode: Mode,
    cursor: Option<Pt2D>,

    hover_node: Option<NodeID>,
    selected_node: Option<NodeID>,

    hover_point: Option<PointID>,
    selected_point: Option<PointID>,
    drag_point: Option<PointID>,
    targets: Vec<PointID>,

    temp_filler: Option<MarkupFiller>,
    filler_candidates: Vec<FillerVertex>,
    hover_vertex: Option<FillerVertex>,

    pending_delete: bool,
}

impl MarkupTool {
    pub fn new(settings: Settings) -> MarkupTool {
        MarkupTool {
            settings,
            mode: Mode::SelectNode,
            cursor: None,
            hover_node: None,
            selected_node: None,
            hover_point: None,
            selected_point: None,
            drag_point: None,
            targets: Vec::new(),
            temp_filler: None,
            filler_candidates: Vec::new(),
            hover_vertex: None,
            pending_delete: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn selected_node(&self) -> Option<NodeID> {
        self.selected_node
    }

    pub fn hover_node(&self) -> Option<NodeID> {
        self.hover_node
    }

    pub fn selected_point(&self) -> Option<PointID> {
        self.selected_point
    }

    pub fn hover_point(&self) -> Option<PointID> {
        self.hover_point
    }

    pub fn targets(&self) -> &Vec<PointID> {
        &self.targets
    }

    pub fn temp_filler(&self) -> Option<&MarkupFiller> {
        self.temp_filler.as_ref()
    }

    pub fn filler_candidates(&self) -> &Vec<FillerVertex> {
        &self.filler_candidates
    }

    pub fn handle(
        &mut self,
        net: &Network,
        mgr: &mut MarkupManager,
        event: ToolEvent,
    ) -> Result<ToolResponse> {
        debug!("{:?} in {:?}", event, self.mode);
        if event != ToolEvent::Confirm {
            self.pending_delete = false;
        }
        match event {
            ToolEvent::MouseMove(cursor) => self.on_mouse_move(net, mgr, cursor),
            ToolEvent::MouseDown(mods) => Ok(self.on_mouse_down(mods)),
            ToolEvent::PrimaryClick(mods) => self.on_primary_click(net, mgr, mods),
            ToolEvent::SecondaryClick => self.on_secondary_click(mgr),
            ToolEvent::StartFiller => self.on_start_filler(mgr),
            ToolEvent::DeleteAll => self.on_delete_all(mgr),
            ToolEvent::Confirm => Ok(self.on_confirm(mgr)),
        }
    }

    fn markup<'a>(&self, mgr: &'a MarkupManager) -> Result<&'a Markup> {
        let node = self
            .selected_node
            .ok_or_else(|| anyhow!("No node is selected"))?;
        mgr.try_get(node)
            .ok_or_else(|| anyhow!("{} has no markings", node))
    }

    fn markup_mut<'a>(&self, mgr: &'a mut MarkupManager) -> Result<&'a mut Markup> {
        let node = self
            .selected_node
            .ok_or_else(|| anyhow!("No node is selected"))?;
        mgr.try_get_mut(node)
            .ok_or_else(|| anyhow!("{} has no markings", node))
    }

    fn on_mouse_move(
        &mut self,
        net: &Network,
        mgr: &mut MarkupManager,
        cursor: Pt2D,
    ) -> Result<ToolResponse> {
        self.cursor = Some(cursor);
        match self.mode {
            Mode::SelectNode => {
                self.hover_node = net
                    .nodes
                    .values()
                    .filter(|n| {
                        n.position.dist_to(cursor) <= (n.half_width * 2.0).max(MIN_NODE_RADIUS) / 2.0
                    })
                    .min_by_key(|n| n.position.dist_to(cursor))
                    .map(|n| n.id);
            }
            Mode::ConnectLine => {
                let markup = self.markup(mgr)?;
                self.hover_point = self
                    .targets
                    .iter()
                    .filter_map(|id| markup.get_point(*id))
                    .filter(|pt| pt.position.dist_to(cursor) <= HOVER_RADIUS)
                    .min_by_key(|pt| pt.position.dist_to(cursor))
                    .map(|pt| pt.id)
                    .or_else(|| {
                        self.selected_point
                            .and_then(|selected| normal_target(markup, selected, cursor))
                    });
            }
            Mode::DragPoint => {
                if let Some(point) = self.drag_point {
                    let offset = self.markup_mut(mgr)?.drag_point(point, cursor)?;
                    return Ok(ToolResponse::OffsetChanged { point, offset });
                }
            }
            Mode::SelectFiller => {
                let markup = self.markup(mgr)?;
                self.hover_vertex = self
                    .filler_candidates
                    .iter()
                    .filter_map(|v| Some((*v, v.position(markup)?)))
                    .filter(|(_, pos)| pos.dist_to(cursor) <= HOVER_RADIUS)
                    .min_by_key(|(_, pos)| pos.dist_to(cursor))
                    .map(|(v, _)| v);
            }
        }
        Ok(ToolResponse::Nothing)
    }

    fn on_mouse_down(&mut self, mods: Modifiers) -> ToolResponse {
        if self.mode == Mode::ConnectLine && self.selected_point.is_none() && mods.ctrl {
            if let Some(point) = self.hover_point {
                if point.point_type != PointType::Normal {
                    self.mode = Mode::DragPoint;
                    self.drag_point = Some(point);
                    return ToolResponse::DragStarted(point);
                }
            }
        }
        ToolResponse::Nothing
    }

    fn on_primary_click(
        &mut self,
        net: &Network,
        mgr: &mut MarkupManager,
        mods: Modifiers,
    ) -> Result<ToolResponse> {
        match self.mode {
            Mode::SelectNode => {
                let node = match self.hover_node {
                    Some(node) => node,
                    None => return Ok(ToolResponse::Nothing),
                };
                mgr.get(net, node)?;
                self.selected_node = Some(node);
                self.mode = Mode::ConnectLine;
                self.set_targets(mgr, None)?;
                info!("Editing markings at {}", node);
                Ok(ToolResponse::NodeSelected(node))
            }
            Mode::ConnectLine => {
                let hover = match self.hover_point {
                    Some(pt) => pt,
                    None => return Ok(ToolResponse::Nothing),
                };
                match self.selected_point {
                    None => {
                        self.selected_point = Some(hover);
                        self.set_targets(mgr, Some(hover))?;
                        Ok(ToolResponse::PointSelected(hover))
                    }
                    Some(selected) => {
                        let pair = match MarkupPointPair::new(selected, hover) {
                            Some(pair) => pair,
                            None => return Ok(ToolResponse::Nothing),
                        };
                        let style = style_for(pair.line_type(), mods);
                        let exists = self
                            .markup_mut(mgr)?
                            .toggle_connection(pair, Some(style))?
                            .is_some();
                        self.selected_point = None;
                        self.hover_point = None;
                        self.set_targets(mgr, None)?;
                        Ok(ToolResponse::LineToggled { pair, exists })
                    }
                }
            }
            Mode::DragPoint => {
                self.mode = Mode::ConnectLine;
                self.drag_point = None;
                Ok(ToolResponse::Nothing)
            }
            Mode::SelectFiller => {
                let vertex = match self.hover_vertex {
                    Some(v) => v,
                    None => return Ok(ToolResponse::Nothing),
                };
                let mut filler = match self.temp_filler.take() {
                    Some(f) => f,
                    None => return Ok(ToolResponse::Nothing),
                };
                if filler.add(vertex) {
                    if let Err(err) = self.markup_mut(mgr)?.add_filler(filler.clone()) {
                        // Stay in the filler, so the last vertex can be taken back
                        filler.remove();
                        self.temp_filler = Some(filler);
                        return Err(err);
                    }
                    self.leave_filler_mode();
                    return Ok(ToolResponse::FillerAdded);
                }
                self.filler_candidates = filler.next_candidates(self.markup(mgr)?);
                self.temp_filler = Some(filler);
                self.hover_vertex = None;
                Ok(ToolResponse::FillerChanged)
            }
        }
    }

    fn on_secondary_click(&mut self, mgr: &mut MarkupManager) -> Result<ToolResponse> {
        match self.mode {
            Mode::SelectFiller => {
                let empty = self
                    .temp_filler
                    .as_ref()
                    .map(|f| f.vertices().is_empty())
                    .unwrap_or(true);
                if empty {
                    self.leave_filler_mode();
                    return Ok(ToolResponse::FillerCancelled);
                }
                if let Some(mut filler) = self.temp_filler.take() {
                    filler.remove();
                    self.filler_candidates = filler.next_candidates(self.markup(mgr)?);
                    self.temp_filler = Some(filler);
                }
                Ok(ToolResponse::FillerChanged)
            }
            Mode::ConnectLine if self.selected_point.is_some() => {
                self.selected_point = None;
                self.set_targets(mgr, None)?;
                Ok(ToolResponse::PointUnselected)
            }
            Mode::ConnectLine => {
                self.mode = Mode::SelectNode;
                self.selected_node = None;
                self.hover_point = None;
                self.targets.clear();
                Ok(ToolResponse::NodeUnselected)
            }
            Mode::DragPoint => Ok(ToolResponse::Nothing),
            Mode::SelectNode => Ok(ToolResponse::Exit),
        }
    }

    fn on_start_filler(&mut self, mgr: &mut MarkupManager) -> Result<ToolResponse> {
        if self.mode != Mode::ConnectLine || self.selected_point.is_some() {
            return Ok(ToolResponse::Nothing);
        }
        let filler = MarkupFiller::new(FillerStyle::default());
        self.filler_candidates = filler.next_candidates(self.markup(mgr)?);
        self.temp_filler = Some(filler);
        self.hover_vertex = None;
        self.mode = Mode::SelectFiller;
        Ok(ToolResponse::FillerStarted)
    }

    fn leave_filler_mode(&mut self) {
        self.mode = Mode::ConnectLine;
        self.temp_filler = None;
        self.filler_candidates.clear();
        self.hover_vertex = None;
    }

    fn on_delete_all(&mut self, mgr: &mut MarkupManager) -> Result<ToolResponse> {
        if self.mode != Mode::ConnectLine || self.selected_point.is_some() {
            return Ok(ToolResponse::Nothing);
        }
        let node = match self.selected_node {
            Some(node) => node,
            None => return Ok(ToolResponse::Nothing),
        };
        if self.settings.delete_warnings {
            self.pending_delete = true;
            return Ok(ToolResponse::ConfirmDeleteAll(node));
        }
        self.markup_mut(mgr)?.clear();
        Ok(ToolResponse::Cleared(node))
    }

    fn on_confirm(&mut self, mgr: &mut MarkupManager) -> ToolResponse {
        if !self.pending_delete {
            return ToolResponse::Nothing;
        }
        self.pending_delete = false;
        match self.selected_node {
            Some(node) => match mgr.try_get_mut(node) {
                Some(markup) => {
                    markup.clear();
                    ToolResponse::Cleared(node)
                }
                None => ToolResponse::Nothing,
            },
            None => ToolResponse::Nothing,
        }
    }

    fn set_targets(&mut self, mgr: &MarkupManager, selected: Option<PointID>) -> Result<()> {
        let point_types = match selected {
            Some(pt) => EnumSet::only(pt.point_type),
            None => PointType::Enter | PointType::Crosswalk,
        };
        self.targets = targets(self.markup(mgr)?, point_types, selected);
        Ok(())
    }
}

/// Modifier keys held while connecting two points pick the style.
fn style_for(line_type: LineType, mods: Modifiers) -> LineStyle {
    let color = Color::default();
    let width = Distance::meters(0.15);
    match (line_type, mods.shift, mods.ctrl) {
        (LineType::Regular | LineType::Normal, true, false) => LineStyle::Solid { color, width },
        (LineType::Regular | LineType::Normal, false, true) => LineStyle::DoubleSolid {
            color,
            width,
            offset: DEFAULT_DOUBLE_OFFSET,
        },
        (LineType::Regular | LineType::Normal, true, true) => LineStyle::SolidAndDashed {
            color,
            width,
            dash_length: Distance::meters(1.5),
            space_length: Distance::meters(1.5),
            offset: DEFAULT_DOUBLE_OFFSET,
        },
        (LineType::Stop, true, _) => LineStyle::StopDashed {
            color,
            width: Distance::meters(0.3),
            dash_length: Distance::meters(0.6),
            space_length: Distance::meters(0.6),
        },
        (LineType::Crosswalk, true, _) => LineStyle::ExistentCrosswalk {
            width: Distance::meters(2.0),
        },
        _ => LineStyle::default_for(line_type),
    }
}
