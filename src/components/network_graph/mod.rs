mod camera;
mod component;
mod geometry;
mod graph;
mod interaction;
mod layout;
mod render;
mod state;
mod types;

pub use camera::{key_action_for, Camera, CameraTarget, KeyAction};
pub use component::{MouseEventCallback, NetworkGraphCanvas, NetworkHandle, ReadyCallback};
pub use geometry::{Bounds, Point};
pub use graph::{Edge, GraphStore, Node, Shape};
pub use interaction::{
	ActiveHover, Action, Handle, HoverTarget, InteractionState, PointerInput, PointerKind,
};
pub use layout::{ForceLayouter, HierarchyLayouter, LayoutJob, LayoutRun, Layouter};
pub use render::{ImageElement, ImageEntry, ImageTable, NodeDrawFn, ShapeDrawFn};
pub use state::{FrameThrottle, NetworkState, ShouldRunLayout};
pub use types::{
	CameraOptions, EdgeColor, EdgeDefinition, EdgeOptions, EdgeStyle, FillStyle, GraphData,
	GraphEvent, GraphPayload, HoverOptions, InteractionOptions, LayoutOptions, LineStyle,
	NetworkOptions, NodeDefinition, NodeOptions, NodeStyle, Padding, ShapeDefinition,
	ShapeStyle, Viewport,
};
