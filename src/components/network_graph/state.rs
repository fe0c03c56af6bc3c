//! Frame-driven orchestration: one `NetworkState` owns the graph store,
//! camera and interaction machine, applies external input changes once per
//! change and time-based updates once per tick, and tells the frame loop
//! when a redraw is actually needed.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use super::camera::{content_bounds, key_action_for, Camera, CameraTarget, KeyAction};
use super::geometry::Point;
use super::graph::GraphStore;
use super::interaction::{Action, InteractionState, PointerInput};
use super::layout::{ForceLayouter, LayoutJob, LayoutRun, Layouter};
use super::types::{
	GraphData, GraphEvent, GraphPayload, NetworkOptions, ShapeDefinition, Viewport,
};

/// Minimum interval between executed frames. The callback re-arms faster;
/// draws are simply skipped until this budget has elapsed.
pub const MS_PER_RENDER: f64 = 30.0;

/// Predicate deciding whether an external update should re-run layout even
/// without structural graph changes.
pub type ShouldRunLayout = Rc<dyn Fn(&GraphPayload, &GraphPayload) -> bool>;

/// Frame budget gate for the continuously re-armed frame callback.
#[derive(Debug, Default)]
pub struct FrameThrottle {
	last_frame: Option<f64>,
}

impl FrameThrottle {
	/// True when enough time has passed since the last executed frame (the
	/// first frame always runs). Advances the frame clock on success.
	pub fn should_run(&mut self, elapsed_ms: f64) -> bool {
		if let Some(last) = self.last_frame {
			if elapsed_ms - last < MS_PER_RENDER {
				return false;
			}
		}
		self.last_frame = Some(elapsed_ms);
		true
	}
}

pub struct NetworkState {
	pub store: GraphStore,
	pub camera: Camera,
	pub interaction: InteractionState,
	pub options: NetworkOptions,
	pub viewport: Viewport,
	key_action: Option<KeyAction>,
	layouter: Rc<dyn Layouter>,
	layout_run: Option<Box<dyn LayoutRun>>,
	fit_when_layout_done: bool,
	should_run_layout: Option<ShouldRunLayout>,
	last_payload: GraphPayload,
	node_animating: bool,
	dirty: bool,
}

impl NetworkState {
	pub fn new(options: NetworkOptions, viewport: Viewport) -> Self {
		Self {
			store: GraphStore::default(),
			camera: Camera::default(),
			interaction: InteractionState::default(),
			options,
			viewport,
			key_action: None,
			layouter: Rc::new(ForceLayouter::default()),
			layout_run: None,
			fit_when_layout_done: false,
			should_run_layout: None,
			last_payload: GraphPayload::default(),
			node_animating: false,
			dirty: true,
		}
	}

	pub fn set_should_run_layout(&mut self, predicate: Option<ShouldRunLayout>) {
		self.should_run_layout = predicate;
	}

	/// Reconcile an external graph/shape snapshot. Layout re-runs when the
	/// store changed structurally or the caller's predicate asks for it.
	pub fn set_graph(&mut self, graph: &GraphData, shapes: &[Arc<ShapeDefinition>]) {
		let next = GraphPayload {
			graph: graph.clone(),
			shapes: shapes.to_vec(),
		};
		let predicate = self
			.should_run_layout
			.as_ref()
			.map(|f| f(&self.last_payload, &next))
			.unwrap_or(false);
		let structurally_dirty = self.store.reconcile(graph, &self.options.nodes);
		self.store.set_shapes(shapes);
		self.last_payload = next;
		self.dirty = true;
		if structurally_dirty || predicate {
			self.run_layout();
		}
	}

	/// Swap options; a by-value change of the layout options re-runs layout.
	pub fn set_options(&mut self, options: NetworkOptions) {
		let layout_changed = options.layout != self.options.layout;
		self.options = options;
		self.dirty = true;
		if layout_changed {
			self.run_layout();
		}
	}

	/// Install the initial layout function without triggering a pass.
	pub fn install_layouter(&mut self, layouter: Rc<dyn Layouter>) {
		self.layouter = layouter;
	}

	/// Swap the layout function; a new function re-runs layout.
	pub fn set_layouter(&mut self, layouter: Rc<dyn Layouter>) {
		let same = std::ptr::eq(
			Rc::as_ptr(&self.layouter) as *const (),
			Rc::as_ptr(&layouter) as *const (),
		);
		if !same {
			self.layouter = layouter;
			self.run_layout();
		}
	}

	/// Cancel any running pass and start a fresh one.
	pub fn run_layout(&mut self) {
		if let Some(run) = self.layout_run.as_mut() {
			run.stop();
		}
		self.layout_run = None;

		let LayoutJob {
			run,
			fit_on_complete,
		} = self
			.layouter
			.start(&mut self.store, &self.options.layout, self.viewport);
		self.layout_run = run;
		if self.layout_run.is_none() {
			if fit_on_complete {
				self.fit();
			}
			self.fit_when_layout_done = false;
		} else {
			self.fit_when_layout_done = fit_on_complete;
		}
		self.dirty = true;
	}

	/// Animated fit of the current content bounds into the viewport.
	pub fn fit(&mut self) {
		let bounds = content_bounds(&self.store);
		self.camera.destination = Some(Camera::fit_target(
			bounds,
			self.viewport,
			self.options.camera.fit_all_padding,
			self.options.nodes.default_size,
		));
	}

	pub fn resize(&mut self, viewport: Viewport) {
		self.viewport = viewport;
		self.dirty = true;
	}

	/// Route one pointer event through the interaction machine.
	pub fn pointer(&mut self, input: PointerInput, now_ms: f64) -> Vec<GraphEvent> {
		let events = self.interaction.pointer_event(
			input,
			&mut self.store,
			&mut self.camera,
			&self.options,
			self.viewport,
			now_ms,
		);
		self.dirty = true;
		events
	}

	/// Immediate anchor-preserving wheel zoom.
	pub fn wheel_zoom(&mut self, screen: Point, delta_y: f64) {
		let bounds = content_bounds(&self.store);
		self.camera.zoom_at_point(
			screen,
			delta_y,
			self.viewport,
			bounds,
			self.options.nodes.default_size,
		);
		self.dirty = true;
	}

	/// Animated zoom step, as bound to the zoom buttons.
	pub fn zoom_step(&mut self, zoom_in: bool) {
		let bounds = content_bounds(&self.store);
		self.camera.zoom_step(
			zoom_in,
			self.viewport,
			bounds,
			self.options.nodes.default_size,
		);
		self.dirty = true;
	}

	/// Animated zoom centering the most recent selection.
	pub fn zoom_selection(&mut self) {
		let Some(pos) = self
			.interaction
			.selection
			.last()
			.and_then(|id| self.store.nodes.get(id))
			.map(|n| n.position)
		else {
			return;
		};
		self.camera.zoom_to_selection(pos, self.viewport);
		self.dirty = true;
	}

	/// Track held keyboard state; the action applies once per tick.
	pub fn key(&mut self, key: &str, pressed: bool) {
		self.key_action = if pressed { key_action_for(key) } else { None };
	}

	/// Everything that has to happen each frame before drawing.
	pub fn tick(&mut self, now_ms: f64) {
		if let Some(action) = self.key_action {
			let bounds = content_bounds(&self.store);
			self.camera.apply_key_action(
				action,
				self.viewport,
				bounds,
				self.options.nodes.default_size,
			);
			self.dirty = true;
		}

		if self.camera.destination.is_some() {
			self.camera.animate_step();
			self.dirty = true;
		}

		// Screen-edge autopan: shift the camera and counter-shift dragged
		// nodes so their world position keeps tracking the cursor.
		if let Some(frame_pan) = self.camera.frame_pan {
			self.camera.pan += frame_pan * self.camera.scale;
			for id in &self.interaction.dragged {
				if let Some(node) = self.store.nodes.get_mut(id) {
					node.position += frame_pan * -1.0;
				}
			}
			self.dirty = true;
		}

		if let Some(run) = self.layout_run.as_mut() {
			let more = run.step(&mut self.store);
			self.dirty = true;
			if !more {
				self.layout_run = None;
				if self.fit_when_layout_done {
					self.fit();
					self.fit_when_layout_done = false;
				}
			}
		}

		self.node_animating = false;
		for node in self.store.nodes.values_mut() {
			if node.destination.is_some() {
				node.animate_step();
				self.node_animating = true;
				self.dirty = true;
			}
		}

		if self.interaction.tick(now_ms) {
			self.dirty = true;
		}

		// Movement above may have invalidated cached curve geometry.
		self.store.refresh_edge_geometry();
	}

	/// Redraw gate: dirty state, an active interaction, a camera in flight,
	/// or any animation still running.
	pub fn needs_draw(&self) -> bool {
		self.dirty
			|| self.interaction.action != Action::Idle
			|| self.camera.destination.is_some()
			|| self.layout_run.is_some()
			|| self.node_animating
	}

	pub fn mark_drawn(&mut self) {
		self.dirty = false;
	}

	pub fn mark_dirty(&mut self) {
		self.dirty = true;
	}

	/// Imperative surface: current node positions by id.
	pub fn node_positions(&self) -> HashMap<String, Point> {
		self.store.node_positions()
	}

	/// Imperative surface: current camera pan/scale.
	pub fn camera_state(&self) -> CameraTarget {
		CameraTarget {
			pan: self.camera.pan,
			scale: self.camera.scale,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::network_graph::interaction::PointerKind;
	use crate::components::network_graph::types::{EdgeDefinition, NodeDefinition};
	use std::cell::Cell;

	fn viewport() -> Viewport {
		Viewport {
			width: 500.0,
			height: 400.0,
		}
	}

	fn sample_graph() -> GraphData {
		GraphData {
			nodes: vec![
				Arc::new(NodeDefinition {
					id: "a".into(),
					x: Some(100.0),
					y: Some(100.0),
					..Default::default()
				}),
				Arc::new(NodeDefinition {
					id: "b".into(),
					x: Some(200.0),
					y: Some(150.0),
					..Default::default()
				}),
			],
			edges: vec![Arc::new(EdgeDefinition {
				id: "e".into(),
				from: "a".into(),
				to: "b".into(),
				..Default::default()
			})],
		}
	}

	struct CountingLayouter {
		starts: Rc<Cell<usize>>,
	}

	impl Layouter for CountingLayouter {
		fn start(
			&self,
			_store: &mut GraphStore,
			_options: &crate::components::network_graph::types::LayoutOptions,
			_viewport: Viewport,
		) -> LayoutJob {
			self.starts.set(self.starts.get() + 1);
			LayoutJob {
				run: None,
				fit_on_complete: false,
			}
		}
	}

	fn counting_state() -> (NetworkState, Rc<Cell<usize>>) {
		let mut state = NetworkState::new(NetworkOptions::default(), viewport());
		let starts = Rc::new(Cell::new(0));
		state.layouter = Rc::new(CountingLayouter {
			starts: starts.clone(),
		});
		(state, starts)
	}

	#[test]
	fn identical_snapshot_runs_layout_once() {
		let (mut state, starts) = counting_state();
		let graph = sample_graph();
		state.set_graph(&graph, &[]);
		assert_eq!(starts.get(), 1);
		state.set_graph(&graph, &[]);
		assert_eq!(starts.get(), 1, "clean reconcile must not re-run layout");
	}

	#[test]
	fn predicate_forces_layout_without_structural_change() {
		let (mut state, starts) = counting_state();
		let graph = sample_graph();
		state.set_graph(&graph, &[]);
		state.set_should_run_layout(Some(Rc::new(|_prev, _next| true)));
		state.set_graph(&graph, &[]);
		assert_eq!(starts.get(), 2);
	}

	#[test]
	fn layout_option_value_change_reruns_layout() {
		let (mut state, starts) = counting_state();
		state.set_graph(&sample_graph(), &[]);
		assert_eq!(starts.get(), 1);

		let same = state.options.clone();
		state.set_options(same);
		assert_eq!(starts.get(), 1);

		let mut changed = state.options.clone();
		changed.layout.fit_on_update = false;
		state.set_options(changed);
		assert_eq!(starts.get(), 2);
	}

	#[test]
	fn swapping_the_layouter_reruns_swapping_back_does_not() {
		let (mut state, starts) = counting_state();
		state.set_graph(&sample_graph(), &[]);
		assert_eq!(starts.get(), 1);

		let other: Rc<dyn Layouter> = Rc::new(CountingLayouter {
			starts: starts.clone(),
		});
		state.set_layouter(other.clone());
		assert_eq!(starts.get(), 2);
		state.set_layouter(other);
		assert_eq!(starts.get(), 2);
	}

	#[test]
	fn frame_throttle_allows_at_most_one_draw_per_budget() {
		let mut throttle = FrameThrottle::default();
		assert!(throttle.should_run(0.0));
		assert!(!throttle.should_run(10.0));
		assert!(!throttle.should_run(29.0));
		assert!(throttle.should_run(31.0));
		assert!(!throttle.should_run(45.0));
	}

	#[test]
	fn idle_state_stops_requesting_draws() {
		let (mut state, _starts) = counting_state();
		state.set_graph(&sample_graph(), &[]);
		assert!(state.needs_draw());
		state.tick(0.0);
		state.mark_drawn();
		assert!(!state.needs_draw());
	}

	#[test]
	fn autopan_tick_keeps_dragged_node_on_screen_point() {
		let (mut state, _starts) = counting_state();
		state.set_graph(&sample_graph(), &[]);
		state.camera.scale = 1.5;

		// Grab node `a` and drag toward the left border.
		state.pointer(
			PointerInput {
				kind: PointerKind::Down,
				screen: state.camera.screen_from_world(Point::new(100.0, 100.0)),
				movement: Point::ZERO,
				modifier: false,
			},
			0.0,
		);
		state.pointer(
			PointerInput {
				kind: PointerKind::Move,
				screen: Point::new(10.0, 200.0),
				movement: Point::new(-50.0, 0.0),
				modifier: false,
			},
			0.0,
		);
		assert!(state.camera.frame_pan.is_some());

		let before = state
			.camera
			.screen_from_world(state.store.nodes["a"].position);
		state.tick(16.0);
		let after = state
			.camera
			.screen_from_world(state.store.nodes["a"].position);
		assert!((before.x - after.x).abs() < 1e-9);
		assert!((before.y - after.y).abs() < 1e-9);
	}

	#[test]
	fn fit_sets_an_animated_destination() {
		let (mut state, _starts) = counting_state();
		state.set_graph(&sample_graph(), &[]);
		state.fit();
		assert!(state.camera.destination.is_some());
		let scale_before = state.camera.scale;
		state.tick(0.0);
		assert_ne!(state.camera.scale, scale_before);
	}

	#[test]
	fn force_layout_completion_requests_fit() {
		let mut state = NetworkState::new(NetworkOptions::default(), viewport());
		state.layouter = Rc::new(crate::components::network_graph::layout::ForceLayouter {
			frames: 2,
			..Default::default()
		});
		state.set_graph(&sample_graph(), &[]);
		assert!(state.camera.destination.is_none());
		state.tick(0.0);
		state.tick(40.0);
		state.tick(80.0);
		assert!(
			state.camera.destination.is_some(),
			"fit fires when the run completes"
		);
	}
}
