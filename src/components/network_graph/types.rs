use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Style block for a node definition. Unset fields fall back to the
/// component defaults at draw time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeStyle {
	pub background: Option<String>,
	pub border: Option<String>,
	pub fill: Option<String>,
	pub stroke: Option<String>,
	pub font: Option<String>,
	pub font_color: Option<String>,
	pub inner_label_color: Option<String>,
	pub line_width: Option<f64>,
	pub opacity: Option<f64>,
	pub size: Option<f64>,
}

/// Externally supplied node description. Extra attributes are kept as-is for
/// custom drawing functions.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeDefinition {
	pub id: String,
	pub label: Option<String>,
	pub inner_label: Option<String>,
	pub image: Option<String>,
	pub shape: Option<String>,
	pub size: Option<f64>,
	pub mass: Option<f64>,
	pub fixed: Option<bool>,
	pub x: Option<f64>,
	pub y: Option<f64>,
	pub style: Option<NodeStyle>,
	#[serde(flatten)]
	pub extra: HashMap<String, serde_json::Value>,
}

/// Edge stroke color: a single color, or stops for a linear gradient drawn
/// from the start node to the end node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EdgeColor {
	Single(String),
	Gradient(Vec<String>),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeStyle {
	pub color: Option<EdgeColor>,
	pub line_width: Option<f64>,
	pub font: Option<String>,
	pub font_color: Option<String>,
}

/// Externally supplied edge description. `from`/`to` name node ids.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeDefinition {
	pub id: String,
	pub from: String,
	pub to: String,
	pub label: Option<String>,
	pub size: Option<f64>,
	pub style: Option<EdgeStyle>,
}

/// Shape style. The color aliases mirror the ways callers historically spell
/// fill and stroke; resolution order is handled at draw time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeStyle {
	pub line_width: Option<f64>,
	pub border: Option<String>,
	pub stroke_color: Option<String>,
	pub stroke: Option<String>,
	pub line: Option<String>,
	pub background: Option<String>,
	pub fill_color: Option<String>,
	pub fill: Option<String>,
}

impl ShapeStyle {
	pub fn resolved_fill(&self) -> Option<&str> {
		self.background
			.as_deref()
			.or(self.fill_color.as_deref())
			.or(self.fill.as_deref())
	}

	pub fn resolved_stroke(&self) -> Option<&str> {
		self.border
			.as_deref()
			.or(self.stroke_color.as_deref())
			.or(self.stroke.as_deref())
			.or(self.line.as_deref())
	}
}

/// Free-form background decoration. Not part of the graph identity space;
/// the shape list is replaced wholesale on every update.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeDefinition {
	pub id: String,
	pub shape: String,
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
	pub size: Option<f64>,
	pub scale: Option<f64>,
	pub visible: Option<bool>,
	pub image_id: Option<String>,
	pub map_image_id: Option<String>,
	pub no_edit: bool,
	pub no_click: bool,
	pub bounds_ignore: bool,
	pub style: Option<ShapeStyle>,
	#[serde(flatten)]
	pub extra: HashMap<String, serde_json::Value>,
}

/// A declarative graph snapshot. Definitions are shared by `Arc` so the
/// store can detect updates by pointer identity rather than deep equality.
#[derive(Clone, Debug, Default)]
pub struct GraphData {
	pub nodes: Vec<Arc<NodeDefinition>>,
	pub edges: Vec<Arc<EdgeDefinition>>,
}

/// Graph + shapes payload handed to the should-run-layout predicate.
#[derive(Clone, Debug, Default)]
pub struct GraphPayload {
	pub graph: GraphData,
	pub shapes: Vec<Arc<ShapeDefinition>>,
}

/// Canvas size in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
	pub width: f64,
	pub height: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillStyle {
	Default,
	Bullet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineStyle {
	Curved,
	Straight,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeOptions {
	pub show_labels: bool,
	pub default_size: f64,
	pub node_fill_style: FillStyle,
}

impl Default for NodeOptions {
	fn default() -> Self {
		Self {
			show_labels: true,
			default_size: 30.0,
			node_fill_style: FillStyle::Default,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeOptions {
	pub show_labels: bool,
	pub arrowheads: bool,
	pub line_style: LineStyle,
	/// Where along the edge the arrowhead sits, 0.0 at the start node.
	pub arrow_placement_ratio: f64,
}

impl Default for EdgeOptions {
	fn default() -> Self {
		Self {
			show_labels: true,
			arrowheads: true,
			line_style: LineStyle::Curved,
			arrow_placement_ratio: 0.5,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Padding {
	pub horizontal: f64,
	pub vertical: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CameraOptions {
	pub fit_all_padding: Padding,
}

impl Default for CameraOptions {
	fn default() -> Self {
		Self {
			fit_all_padding: Padding {
				horizontal: 60.0,
				vertical: 60.0,
			},
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutOptions {
	pub fit_on_update: bool,
	pub extra: HashMap<String, serde_json::Value>,
}

impl Default for LayoutOptions {
	fn default() -> Self {
		Self {
			fit_on_update: true,
			extra: HashMap::new(),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct HoverOptions {
	pub width: f64,
	pub height: f64,
	pub delay_ms: f64,
}

impl Default for HoverOptions {
	fn default() -> Self {
		Self {
			width: 200.0,
			height: 150.0,
			delay_ms: 750.0,
		}
	}
}

/// Graph and shape interaction are mutually exclusive; graph interaction
/// wins when both are set.
#[derive(Clone, Debug, PartialEq)]
pub struct InteractionOptions {
	pub allow_graph_interaction: bool,
	pub allow_shape_interaction: bool,
}

impl Default for InteractionOptions {
	fn default() -> Self {
		Self {
			allow_graph_interaction: true,
			allow_shape_interaction: false,
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NetworkOptions {
	pub nodes: NodeOptions,
	pub edges: EdgeOptions,
	pub camera: CameraOptions,
	pub layout: LayoutOptions,
	pub hover: HoverOptions,
	pub interaction: InteractionOptions,
	pub show_muted_overlay: bool,
	pub cover_color: Option<String>,
}

/// Semantic events produced by the interaction state machine, forwarded to
/// the caller's mouse callback.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphEvent {
	NodeClick { id: String },
	EdgeClick { id: String },
	BackgroundClick,
	ShapeClick { id: String },
	NodeDoubleClick { id: String },
	EdgeDoubleClick { id: String },
	/// Fired on release of a shape drag/resize with the edited shape values.
	ShapeUpdate { shapes: Vec<ShapeDefinition> },
	/// Fired once on release of a node drag that actually moved.
	NodesDragged { ids: Vec<String> },
}
