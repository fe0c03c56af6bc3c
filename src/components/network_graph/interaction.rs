//! Interprets raw pointer/keyboard input into semantic actions and applies
//! them to the graph store and camera.
//!
//! One discrete action is active at a time: idle, pan, node drag, edge
//! selection, shape drag or handle drag. Graph interaction and shape
//! interaction are configuration-exclusive modes; graph mode wins when both
//! are enabled.

use super::camera::{content_bounds, Camera, ZOOM_STEP_DELTA};
use super::geometry::{self, Point};
use super::graph::{GraphStore, Shape};
use super::types::{GraphEvent, NetworkOptions, Viewport};

/// Distance from the viewport border that starts edge-autopanning while
/// dragging nodes.
pub const SCREEN_PAN_MARGIN: f64 = 35.0;
/// Resize handle size in screen pixels; divided by the zoom so grab targets
/// keep a constant on-screen size.
pub const HANDLE_OFFSET: f64 = 8.0;
/// Floor for shape width/height during a handle resize.
pub const MIN_SHAPE_SIZE: f64 = 10.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Action {
	#[default]
	Idle,
	Pan,
	Drag,
	EdgeDown,
	ShapeDrag,
	HandleDrag,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
	Down,
	Move,
	Up,
	Leave,
	DoubleClick,
}

/// A pointer event translated to canvas coordinates.
#[derive(Clone, Copy, Debug)]
pub struct PointerInput {
	pub kind: PointerKind,
	/// Canvas-relative position in screen pixels.
	pub screen: Point,
	/// Raw pointer movement in screen pixels.
	pub movement: Point,
	/// Ctrl/meta/shift held.
	pub modifier: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HoverTarget {
	Node(String),
	Edge(String),
}

/// A hover popup currently on display.
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveHover {
	pub target: HoverTarget,
	pub popup_pos: Point,
}

#[derive(Clone, Debug)]
struct PendingHover {
	target: HoverTarget,
	popup_pos: Point,
	deadline_ms: f64,
}

/// The eight shape resize handles: corners plus edge midpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handle {
	TopLeft,
	TopCenter,
	TopRight,
	BottomLeft,
	BottomCenter,
	BottomRight,
	MidLeft,
	MidRight,
}

/// World-space boxes for a shape's resize handles at the current zoom.
pub fn handle_boxes(shape: &Shape, scale: f64) -> [(Handle, Point, f64); 8] {
	let handle_size = HANDLE_OFFSET / scale;
	let offset = handle_size * 0.5;
	let c = shape.x + shape.width / 2.0 - offset;
	let m = shape.y + shape.height / 2.0 - offset;
	let l = shape.x - handle_size * 2.0 + offset;
	let r = shape.x + shape.width + offset;
	let t = shape.y - handle_size - offset;
	let b = shape.y + shape.height + offset;
	[
		(Handle::TopLeft, Point::new(l, t), handle_size),
		(Handle::TopCenter, Point::new(c, t), handle_size),
		(Handle::TopRight, Point::new(r, t), handle_size),
		(Handle::BottomLeft, Point::new(l, b), handle_size),
		(Handle::BottomCenter, Point::new(c, b), handle_size),
		(Handle::BottomRight, Point::new(r, b), handle_size),
		(Handle::MidLeft, Point::new(l, m), handle_size),
		(Handle::MidRight, Point::new(r, m), handle_size),
	]
}

/// The handle under a world position, if any.
pub fn handle_at(shape: &Shape, pos: Point, scale: f64) -> Option<Handle> {
	handle_boxes(shape, scale)
		.into_iter()
		.find(|(_, origin, size)| geometry::point_in_rect(*origin, *size, *size, pos))
		.map(|(h, _, _)| h)
}

/// Resize a shape by dragging one handle. Corner handles adjust both
/// dimensions (and shift the origin on the top/left sides), midpoint
/// handles adjust one. `constrain` squares the result to the smaller side.
pub fn resize_by_handle(shape: &mut Shape, handle: Handle, delta: Point, constrain: bool) {
	let (mut x, mut y, mut w, mut h) = (shape.x, shape.y, shape.width, shape.height);
	match handle {
		Handle::TopLeft => {
			w -= delta.x;
			x += delta.x;
			h -= delta.y;
			y += delta.y;
		}
		Handle::BottomLeft => {
			w -= delta.x;
			x += delta.x;
			h += delta.y;
		}
		Handle::MidLeft => {
			w -= delta.x;
			x += delta.x;
		}
		Handle::TopRight => {
			w += delta.x;
			h -= delta.y;
			y += delta.y;
		}
		Handle::BottomRight => {
			w += delta.x;
			h += delta.y;
		}
		Handle::MidRight => {
			w += delta.x;
		}
		Handle::BottomCenter => {
			h += delta.y;
		}
		Handle::TopCenter => {
			h -= delta.y;
			y += delta.y;
		}
	}
	w = w.max(MIN_SHAPE_SIZE);
	h = h.max(MIN_SHAPE_SIZE);
	if constrain {
		let side = w.min(h);
		w = side;
		h = side;
	}
	shape.x = x;
	shape.y = y;
	shape.width = w;
	shape.height = h;
}

/// Per-frame autopan vector while the pointer sits inside the viewport
/// border margin, or None in the interior.
pub fn screen_edge_pan(viewport: Viewport, screen: Point) -> Option<Point> {
	let d = SCREEN_PAN_MARGIN;
	let mut pan = Point::ZERO;
	if screen.x < d {
		pan.x = d - screen.x;
	} else if screen.x > viewport.width - d {
		pan.x = -(d - (viewport.width - screen.x));
	}
	if screen.y < d {
		pan.y = d - screen.y;
	} else if screen.y > viewport.height - d {
		pan.y = -(d - (viewport.height - screen.y));
	}
	(pan.x != 0.0 || pan.y != 0.0).then_some(pan)
}

/// Popup placement: flip left/above when the anchor is in the right/bottom
/// half of the screen so the popup stays on the canvas.
pub fn hover_popup_position(
	anchor: Point,
	viewport: Viewport,
	scale: f64,
	options: &NetworkOptions,
) -> Point {
	let node_offset = options.nodes.default_size * scale / 2.0;
	let x = if anchor.x > viewport.width * 0.5 {
		anchor.x - options.hover.width
	} else {
		anchor.x
	};
	let y = if anchor.y > viewport.height * 0.5 {
		anchor.y - options.hover.height - node_offset
	} else {
		anchor.y + node_offset
	};
	Point::new(x, y)
}

#[derive(Debug, Default)]
pub struct InteractionState {
	pub action: Action,
	/// Nodes being dragged; the last-added node drives delta computation.
	/// Non-empty only while `action == Drag`.
	pub dragged: Vec<String>,
	/// Multi-select accumulation; survives drag release.
	pub selection: Vec<String>,
	/// Whether the pointer moved while the current action was active.
	/// Distinguishes clicks from drags.
	pub mouse_moved: bool,
	/// Shape currently selected for editing, by id.
	pub shape: Option<String>,
	pub handle: Option<Handle>,
	/// Entity under the cursor right now (undebounced highlight).
	pub rollover: Option<HoverTarget>,
	/// Debounced hover popup currently showing.
	pub hover: Option<ActiveHover>,
	pending_hover: Option<PendingHover>,
}

impl InteractionState {
	/// Route a pointer event through the configured interaction mode.
	pub fn pointer_event(
		&mut self,
		input: PointerInput,
		store: &mut GraphStore,
		camera: &mut Camera,
		options: &NetworkOptions,
		viewport: Viewport,
		now_ms: f64,
	) -> Vec<GraphEvent> {
		if options.interaction.allow_graph_interaction {
			self.graph_pointer(input, store, camera, options, viewport, now_ms)
		} else if options.interaction.allow_shape_interaction {
			self.shape_pointer(input, store, camera, options)
		} else {
			Vec::new()
		}
	}

	/// Advance time-based interaction state. Returns true when the hover
	/// popup fired this tick.
	pub fn tick(&mut self, now_ms: f64) -> bool {
		if let Some(pending) = &self.pending_hover {
			if now_ms >= pending.deadline_ms {
				self.hover = Some(ActiveHover {
					target: pending.target.clone(),
					popup_pos: pending.popup_pos,
				});
				self.pending_hover = None;
				return true;
			}
		}
		false
	}

	/// Cancel the popup and any pending debounce.
	pub fn clear_hover(&mut self) {
		self.pending_hover = None;
		self.hover = None;
	}

	fn rollover_node_id(&self) -> Option<&str> {
		match &self.rollover {
			Some(HoverTarget::Node(id)) => Some(id),
			_ => None,
		}
	}

	fn release(&mut self, camera: &mut Camera) {
		self.dragged.clear();
		self.mouse_moved = false;
		self.action = Action::Idle;
		camera.frame_pan = None;
	}

	fn graph_pointer(
		&mut self,
		input: PointerInput,
		store: &mut GraphStore,
		camera: &mut Camera,
		options: &NetworkOptions,
		viewport: Viewport,
		now_ms: f64,
	) -> Vec<GraphEvent> {
		let pos = camera.world_from_screen(input.screen);
		match input.kind {
			PointerKind::Down => {
				let mut events = Vec::new();
				let node_id = store
					.node_at(pos, &options.nodes, self.rollover_node_id())
					.map(|n| n.id.clone());
				if let Some(id) = node_id {
					events.push(GraphEvent::NodeClick { id: id.clone() });
					let mut set = if input.modifier {
						self.selection.clone()
					} else {
						Vec::new()
					};
					// Re-adding an already-selected node moves it to the
					// end, so the delta driver is the node under the cursor.
					set.retain(|d| *d != id);
					set.push(id);
					self.selection = set.clone();
					self.dragged = set;
					self.action = Action::Drag;
				} else if let Some(edge) = store.edge_at(pos, &options.edges) {
					events.push(GraphEvent::EdgeClick {
						id: edge.id.clone(),
					});
					self.action = Action::EdgeDown;
				} else {
					self.action = Action::Pan;
				}
				self.clear_hover();
				events
			}
			PointerKind::Move => {
				match self.action {
					Action::Drag if !self.dragged.is_empty() => {
						let driver = self.dragged.last().expect("drag set is non-empty");
						let Some(node) = store.nodes.get(driver) else {
							// Driver vanished in a reconcile mid-drag.
							return Vec::new();
						};
						let delta = pos - node.position;
						for id in &self.dragged {
							if let Some(node) = store.nodes.get_mut(id) {
								node.position += delta;
								node.fixed = true;
							}
						}
						self.mouse_moved = true;
						camera.frame_pan = screen_edge_pan(viewport, input.screen);
					}
					Action::Pan => {
						camera.pan_by(input.movement);
						self.mouse_moved = true;
					}
					_ => {
						self.update_hover(pos, store, camera, options, viewport, now_ms);
					}
				}
				Vec::new()
			}
			PointerKind::Up => {
				let mut events = Vec::new();
				if self.dragged.is_empty()
					&& !self.mouse_moved
					&& self.action != Action::EdgeDown
				{
					events.push(GraphEvent::BackgroundClick);
				}
				if !self.dragged.is_empty() && self.mouse_moved {
					events.push(GraphEvent::NodesDragged {
						ids: self.dragged.clone(),
					});
				}
				self.release(camera);
				events
			}
			PointerKind::Leave => {
				self.release(camera);
				Vec::new()
			}
			PointerKind::DoubleClick => {
				if let Some(node) = store.node_at(pos, &options.nodes, self.rollover_node_id()) {
					return vec![GraphEvent::NodeDoubleClick {
						id: node.id.clone(),
					}];
				}
				if let Some(edge) = store.edge_at(pos, &options.edges) {
					return vec![GraphEvent::EdgeDoubleClick {
						id: edge.id.clone(),
					}];
				}
				// Empty space: animated zoom-in centered on the click.
				let bounds = content_bounds(store);
				camera.destination = Some(camera.zoom_target(
					input.screen,
					-ZOOM_STEP_DELTA,
					viewport,
					bounds,
					options.nodes.default_size,
				));
				Vec::new()
			}
		}
	}

	fn update_hover(
		&mut self,
		pos: Point,
		store: &GraphStore,
		camera: &Camera,
		options: &NetworkOptions,
		viewport: Viewport,
		now_ms: f64,
	) {
		if let Some(node) = store.node_at(pos, &options.nodes, self.rollover_node_id()) {
			let target = HoverTarget::Node(node.id.clone());
			let anchor = camera.screen_from_world(node.position);
			self.rollover = Some(target.clone());
			self.maybe_schedule_hover(target, anchor, camera, options, viewport, now_ms);
		} else if let Some(edge) = store.edge_at(pos, &options.edges) {
			let target = HoverTarget::Edge(edge.id.clone());
			let anchor = camera.screen_from_world(pos);
			self.rollover = Some(target.clone());
			self.maybe_schedule_hover(target, anchor, camera, options, viewport, now_ms);
		} else {
			self.pending_hover = None;
			self.rollover = None;
		}
	}

	// The debounce restarts on every qualifying move, so the popup appears
	// only after the pointer rests on the target for the full delay.
	fn maybe_schedule_hover(
		&mut self,
		target: HoverTarget,
		anchor: Point,
		camera: &Camera,
		options: &NetworkOptions,
		viewport: Viewport,
		now_ms: f64,
	) {
		if self.hover.as_ref().map(|h| &h.target) == Some(&target) {
			return;
		}
		self.pending_hover = Some(PendingHover {
			popup_pos: hover_popup_position(anchor, viewport, camera.scale, options),
			target,
			deadline_ms: now_ms + options.hover.delay_ms,
		});
	}

	fn current_shape_index(&self, store: &GraphStore) -> Option<usize> {
		let id = self.shape.as_deref()?;
		store.shapes.iter().position(|s| s.id() == id)
	}

	fn shape_pointer(
		&mut self,
		input: PointerInput,
		store: &mut GraphStore,
		camera: &mut Camera,
		options: &NetworkOptions,
	) -> Vec<GraphEvent> {
		let pos = camera.world_from_screen(input.screen);
		match input.kind {
			PointerKind::Down => {
				// A selected shape exposes its handles first.
				if let Some(index) = self.current_shape_index(store) {
					if let Some(handle) = handle_at(&store.shapes[index], pos, camera.scale) {
						self.handle = Some(handle);
						self.action = Action::HandleDrag;
						return Vec::new();
					}
				}
				if let Some(index) = store.shape_at(pos) {
					let id = store.shapes[index].id().to_string();
					store.raise_shape(index);
					self.shape = Some(id.clone());
					self.action = Action::ShapeDrag;
					vec![GraphEvent::ShapeClick { id }]
				} else {
					self.action = Action::Pan;
					vec![GraphEvent::BackgroundClick]
				}
			}
			PointerKind::Move => {
				match self.action {
					Action::Pan => {
						camera.pan_by(input.movement);
						self.mouse_moved = true;
					}
					Action::ShapeDrag => {
						let scale = camera.scale;
						if let Some(index) = self.current_shape_index(store) {
							let shape = &mut store.shapes[index];
							if !shape.definition.no_edit {
								shape.x += input.movement.x / scale;
								shape.y += input.movement.y / scale;
								self.mouse_moved = true;
							}
						}
					}
					Action::HandleDrag => {
						let scale = camera.scale;
						if let (Some(index), Some(handle)) =
							(self.current_shape_index(store), self.handle)
						{
							let shape = &mut store.shapes[index];
							if !shape.definition.no_edit {
								resize_by_handle(
									shape,
									handle,
									Point::new(
										input.movement.x / scale,
										input.movement.y / scale,
									),
									input.modifier,
								);
								self.mouse_moved = true;
							}
						}
					}
					_ => {}
				}
				Vec::new()
			}
			PointerKind::Up => {
				let mut events = Vec::new();
				let edited = matches!(self.action, Action::ShapeDrag | Action::HandleDrag);
				if edited && self.mouse_moved && self.shape.is_some() {
					events.push(GraphEvent::ShapeUpdate {
						shapes: store.shapes.iter().map(Shape::to_definition).collect(),
					});
				}
				self.action = Action::Idle;
				self.handle = None;
				self.mouse_moved = false;
				camera.frame_pan = None;
				events
			}
			PointerKind::Leave | PointerKind::DoubleClick => Vec::new(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::network_graph::types::{
		EdgeDefinition, GraphData, LineStyle, NodeDefinition, NodeOptions, ShapeDefinition,
	};
	use std::sync::Arc;

	fn viewport() -> Viewport {
		Viewport {
			width: 500.0,
			height: 400.0,
		}
	}

	fn store_with_nodes(nodes: &[(&str, f64, f64)]) -> GraphStore {
		let mut store = GraphStore::default();
		let data = GraphData {
			nodes: nodes
				.iter()
				.map(|(id, x, y)| {
					Arc::new(NodeDefinition {
						id: id.to_string(),
						x: Some(*x),
						y: Some(*y),
						..Default::default()
					})
				})
				.collect(),
			edges: vec![],
		};
		store.reconcile(&data, &NodeOptions::default());
		store
	}

	fn input(kind: PointerKind, x: f64, y: f64) -> PointerInput {
		PointerInput {
			kind,
			screen: Point::new(x, y),
			movement: Point::ZERO,
			modifier: false,
		}
	}

	fn moved(x: f64, y: f64, dx: f64, dy: f64) -> PointerInput {
		PointerInput {
			kind: PointerKind::Move,
			screen: Point::new(x, y),
			movement: Point::new(dx, dy),
			modifier: false,
		}
	}

	#[test]
	fn node_drag_moves_pins_and_reports_once() {
		let mut store = store_with_nodes(&[("a", 100.0, 100.0)]);
		let mut camera = Camera::default();
		let mut ism = InteractionState::default();
		let opts = NetworkOptions::default();

		let events = ism.pointer_event(
			input(PointerKind::Down, 100.0, 100.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			0.0,
		);
		assert_eq!(events, vec![GraphEvent::NodeClick { id: "a".into() }]);
		assert_eq!(ism.action, Action::Drag);

		ism.pointer_event(
			moved(130.0, 110.0, 30.0, 10.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			0.0,
		);
		let node = &store.nodes["a"];
		assert_eq!(node.position, Point::new(130.0, 110.0));
		assert!(node.fixed);

		let events = ism.pointer_event(
			input(PointerKind::Up, 130.0, 110.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			0.0,
		);
		assert_eq!(
			events,
			vec![GraphEvent::NodesDragged {
				ids: vec!["a".into()]
			}]
		);
		// Invariant: the drag set empties on release.
		assert!(ism.dragged.is_empty());
		assert_eq!(ism.action, Action::Idle);
	}

	#[test]
	fn stationary_node_click_reports_no_drag() {
		let mut store = store_with_nodes(&[("a", 100.0, 100.0)]);
		let mut camera = Camera::default();
		let mut ism = InteractionState::default();
		let opts = NetworkOptions::default();

		ism.pointer_event(
			input(PointerKind::Down, 100.0, 100.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			0.0,
		);
		let events = ism.pointer_event(
			input(PointerKind::Up, 100.0, 100.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			0.0,
		);
		assert!(events.is_empty());
	}

	#[test]
	fn multi_select_drags_the_whole_selection() {
		let mut store = store_with_nodes(&[("a", 100.0, 100.0), ("b", 300.0, 100.0)]);
		let mut camera = Camera::default();
		let mut ism = InteractionState::default();
		let opts = NetworkOptions::default();

		ism.pointer_event(
			input(PointerKind::Down, 100.0, 100.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			0.0,
		);
		ism.pointer_event(
			input(PointerKind::Up, 100.0, 100.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			0.0,
		);

		let mut down_b = input(PointerKind::Down, 300.0, 100.0);
		down_b.modifier = true;
		ism.pointer_event(down_b, &mut store, &mut camera, &opts, viewport(), 0.0);
		assert_eq!(ism.dragged, vec!["a".to_string(), "b".to_string()]);

		// Delta driver is b (under the cursor); both nodes shift together.
		ism.pointer_event(
			moved(320.0, 120.0, 20.0, 20.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			0.0,
		);
		assert_eq!(store.nodes["a"].position, Point::new(120.0, 120.0));
		assert_eq!(store.nodes["b"].position, Point::new(320.0, 120.0));
	}

	#[test]
	fn pan_shifts_screen_space_one_to_one() {
		let mut store = store_with_nodes(&[]);
		let mut camera = Camera {
			scale: 2.0,
			..Default::default()
		};
		let mut ism = InteractionState::default();
		let opts = NetworkOptions::default();

		ism.pointer_event(
			input(PointerKind::Down, 10.0, 10.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			0.0,
		);
		assert_eq!(ism.action, Action::Pan);
		ism.pointer_event(
			moved(25.0, 4.0, 15.0, -6.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			0.0,
		);
		// Unscaled: panning is a raw pixel shift even at 2x zoom.
		assert_eq!(camera.pan, Point::new(15.0, -6.0));

		let events = ism.pointer_event(
			input(PointerKind::Up, 25.0, 4.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			0.0,
		);
		assert!(events.is_empty());
	}

	#[test]
	fn empty_click_is_a_background_click() {
		let mut store = store_with_nodes(&[("a", 100.0, 100.0)]);
		let mut camera = Camera::default();
		let mut ism = InteractionState::default();
		let opts = NetworkOptions::default();

		ism.pointer_event(
			input(PointerKind::Down, 400.0, 300.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			0.0,
		);
		let events = ism.pointer_event(
			input(PointerKind::Up, 400.0, 300.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			0.0,
		);
		assert_eq!(events, vec![GraphEvent::BackgroundClick]);
	}

	#[test]
	fn edge_click_suppresses_background_click() {
		let mut store = store_with_nodes(&[("a", 0.0, 0.0), ("b", 200.0, 0.0)]);
		let mut opts = NetworkOptions::default();
		opts.edges.line_style = LineStyle::Straight;
		let data = GraphData {
			nodes: vec![
				store.nodes["a"].definition.clone(),
				store.nodes["b"].definition.clone(),
			],
			edges: vec![Arc::new(EdgeDefinition {
				id: "e".into(),
				from: "a".into(),
				to: "b".into(),
				..Default::default()
			})],
		};
		store.reconcile(&data, &opts.nodes);

		let mut camera = Camera::default();
		let mut ism = InteractionState::default();
		let events = ism.pointer_event(
			input(PointerKind::Down, 100.0, 3.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			0.0,
		);
		assert_eq!(events, vec![GraphEvent::EdgeClick { id: "e".into() }]);
		assert_eq!(ism.action, Action::EdgeDown);

		let events = ism.pointer_event(
			input(PointerKind::Up, 100.0, 3.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			0.0,
		);
		assert!(events.is_empty());
	}

	#[test]
	fn hover_debounce_fires_once_after_rest() {
		let mut store = store_with_nodes(&[("a", 100.0, 100.0), ("b", 300.0, 300.0)]);
		let mut camera = Camera::default();
		let mut ism = InteractionState::default();
		let opts = NetworkOptions::default();

		ism.pointer_event(
			moved(100.0, 100.0, 0.0, 0.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			1000.0,
		);
		assert_eq!(ism.rollover, Some(HoverTarget::Node("a".into())));
		assert!(!ism.tick(1500.0), "popup must not fire before the delay");

		// Moving to a second node restarts the debounce.
		ism.pointer_event(
			moved(300.0, 300.0, 0.0, 0.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			1600.0,
		);
		assert!(!ism.tick(1900.0));
		assert!(ism.tick(2400.0));
		assert_eq!(
			ism.hover.as_ref().map(|h| &h.target),
			Some(&HoverTarget::Node("b".into()))
		);
		assert!(!ism.tick(2500.0), "popup fires exactly once");

		// Empty space cancels immediately.
		ism.pointer_event(
			moved(450.0, 50.0, 0.0, 0.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			2600.0,
		);
		assert!(ism.rollover.is_none());
	}

	#[test]
	fn dragging_near_the_border_emits_autopan() {
		let mut store = store_with_nodes(&[("a", 100.0, 100.0)]);
		let mut camera = Camera::default();
		let mut ism = InteractionState::default();
		let opts = NetworkOptions::default();

		ism.pointer_event(
			input(PointerKind::Down, 100.0, 100.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			0.0,
		);
		ism.pointer_event(
			moved(10.0, 100.0, -90.0, 0.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			0.0,
		);
		let fp = camera.frame_pan.expect("pointer inside the margin");
		assert_eq!(fp, Point::new(25.0, 0.0));

		ism.pointer_event(
			input(PointerKind::Up, 10.0, 100.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			0.0,
		);
		assert!(camera.frame_pan.is_none());
	}

	#[test]
	fn double_click_on_empty_space_zooms_in_animated() {
		let mut store = store_with_nodes(&[("a", 100.0, 100.0)]);
		let mut camera = Camera::default();
		let mut ism = InteractionState::default();
		let opts = NetworkOptions::default();

		ism.pointer_event(
			input(PointerKind::DoubleClick, 400.0, 300.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			0.0,
		);
		let dest = camera.destination.expect("zoom destination set");
		assert!(dest.scale > camera.scale);
	}

	fn shape_store() -> GraphStore {
		let mut store = GraphStore::default();
		store.set_shapes(&[Arc::new(ShapeDefinition {
			id: "s1".into(),
			x: 100.0,
			y: 100.0,
			width: 80.0,
			height: 60.0,
			..Default::default()
		})]);
		store
	}

	fn shape_opts() -> NetworkOptions {
		let mut opts = NetworkOptions::default();
		opts.interaction.allow_graph_interaction = false;
		opts.interaction.allow_shape_interaction = true;
		opts
	}

	#[test]
	fn shape_click_selects_raises_and_drags() {
		let mut store = shape_store();
		let mut camera = Camera {
			scale: 2.0,
			..Default::default()
		};
		let mut ism = InteractionState::default();
		let opts = shape_opts();

		// World (120, 120) is screen (240, 240) at 2x.
		let events = ism.pointer_event(
			input(PointerKind::Down, 240.0, 240.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			0.0,
		);
		assert_eq!(events, vec![GraphEvent::ShapeClick { id: "s1".into() }]);
		assert_eq!(ism.action, Action::ShapeDrag);

		ism.pointer_event(
			moved(260.0, 250.0, 20.0, 10.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			0.0,
		);
		// Screen movement lands in world units.
		assert_eq!(store.shapes[0].x, 110.0);
		assert_eq!(store.shapes[0].y, 105.0);

		let events = ism.pointer_event(
			input(PointerKind::Up, 260.0, 250.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			0.0,
		);
		match &events[..] {
			[GraphEvent::ShapeUpdate { shapes }] => {
				assert_eq!(shapes[0].x, 110.0);
			}
			other => panic!("expected a shape update, got {other:?}"),
		}
		// Selection survives release so handles stay grabbable.
		assert_eq!(ism.shape.as_deref(), Some("s1"));
	}

	#[test]
	fn handle_resize_bottom_right_grows_both_dimensions() {
		let mut store = shape_store();
		let mut camera = Camera::default();
		let mut ism = InteractionState::default();
		let opts = shape_opts();

		ism.shape = Some("s1".into());
		// Bottom-right handle box sits just outside (180, 160).
		let events = ism.pointer_event(
			input(PointerKind::Down, 185.0, 165.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			0.0,
		);
		assert!(events.is_empty());
		assert_eq!(ism.action, Action::HandleDrag);
		assert_eq!(ism.handle, Some(Handle::BottomRight));

		ism.pointer_event(
			moved(205.0, 180.0, 20.0, 15.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			0.0,
		);
		let s = &store.shapes[0];
		assert_eq!((s.x, s.y), (100.0, 100.0));
		assert_eq!((s.width, s.height), (100.0, 75.0));
	}

	#[test]
	fn handle_resize_top_left_shifts_origin() {
		let mut shape = shape_store().shapes[0].clone();
		resize_by_handle(&mut shape, Handle::TopLeft, Point::new(10.0, 5.0), false);
		assert_eq!((shape.x, shape.y), (110.0, 105.0));
		assert_eq!((shape.width, shape.height), (70.0, 55.0));
	}

	#[test]
	fn resize_clamps_to_minimum_and_constrains_square() {
		let mut shape = shape_store().shapes[0].clone();
		resize_by_handle(&mut shape, Handle::MidRight, Point::new(-200.0, 0.0), false);
		assert_eq!(shape.width, MIN_SHAPE_SIZE);

		let mut shape = shape_store().shapes[0].clone();
		resize_by_handle(&mut shape, Handle::BottomRight, Point::new(40.0, 0.0), true);
		assert_eq!(shape.width, shape.height);
		assert_eq!(shape.width, 60.0);
	}

	#[test]
	fn handle_boxes_scale_inverse_to_zoom() {
		let shape = shape_store().shapes[0].clone();
		let at_1x = handle_boxes(&shape, 1.0);
		let at_4x = handle_boxes(&shape, 4.0);
		assert_eq!(at_1x[0].2, HANDLE_OFFSET);
		assert_eq!(at_4x[0].2, HANDLE_OFFSET / 4.0);
	}

	#[test]
	fn no_edit_shape_refuses_drag() {
		let mut store = GraphStore::default();
		store.set_shapes(&[Arc::new(ShapeDefinition {
			id: "locked".into(),
			x: 0.0,
			y: 0.0,
			width: 50.0,
			height: 50.0,
			no_edit: true,
			..Default::default()
		})]);
		let mut camera = Camera::default();
		let mut ism = InteractionState::default();
		let opts = shape_opts();

		ism.pointer_event(
			input(PointerKind::Down, 25.0, 25.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			0.0,
		);
		ism.pointer_event(
			moved(45.0, 25.0, 20.0, 0.0),
			&mut store,
			&mut camera,
			&opts,
			viewport(),
			0.0,
		);
		assert_eq!(store.shapes[0].x, 0.0);
	}
}
