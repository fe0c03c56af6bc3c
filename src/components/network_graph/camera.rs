//! Pan/scale state, anchor-preserving zoom, fit-to-bounds and the animated
//! destination transitions that move the camera between them.

use super::geometry::{round_to, Bounds, Point};
use super::graph::GraphStore;
use super::types::{Padding, Viewport};

pub const MIN_ZOOM: f64 = 0.6;
pub const MAX_ZOOM: f64 = 6.0;
pub const ZOOM_FACTOR: f64 = 0.002;
/// Synthetic wheel delta used for double-click and button zoom steps.
pub const ZOOM_STEP_DELTA: f64 = 150.0;
// Margin below the fit scale so a fitted graph can still zoom out a touch.
const MIN_ZOOM_MARGIN: f64 = 0.95;
// Fixed margin added on the min side of the content bounds.
const BOUNDS_MARGIN: f64 = 30.0;
const KEY_PAN_STEP: f64 = 20.0;
const KEY_ZOOM_DELTA: f64 = 50.0;
const EASE: f64 = 0.5;
const PAN_EPSILON: f64 = 0.5;
const SCALE_EPSILON: f64 = 0.001;

/// A pan/scale pair the camera can jump or animate to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraTarget {
	pub pan: Point,
	pub scale: f64,
}

/// Keyboard actions applied once per tick while the key is held.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KeyAction {
	PanUp,
	PanDown,
	PanLeft,
	PanRight,
	ZoomIn,
	ZoomOut,
	Preset(f64),
}

/// Map a `KeyboardEvent::key` value to a camera action.
pub fn key_action_for(key: &str) -> Option<KeyAction> {
	match key {
		"ArrowUp" => Some(KeyAction::PanUp),
		"ArrowDown" => Some(KeyAction::PanDown),
		"ArrowLeft" => Some(KeyAction::PanLeft),
		"ArrowRight" => Some(KeyAction::PanRight),
		"]" | "PageUp" => Some(KeyAction::ZoomIn),
		"[" | "PageDown" => Some(KeyAction::ZoomOut),
		"1" => Some(KeyAction::Preset(1.0)),
		"2" => Some(KeyAction::Preset(2.0)),
		"3" => Some(KeyAction::Preset(3.0)),
		"5" => Some(KeyAction::Preset(0.5)),
		_ => None,
	}
}

#[derive(Clone, Debug)]
pub struct Camera {
	/// Screen-space translation applied after scaling.
	pub pan: Point,
	/// Uniform world-to-screen zoom factor.
	pub scale: f64,
	/// Pending animated transition target.
	pub destination: Option<CameraTarget>,
	/// Screen-edge autopan vector applied every frame while dragging near
	/// the viewport border.
	pub frame_pan: Option<Point>,
}

impl Default for Camera {
	fn default() -> Self {
		Self {
			pan: Point::ZERO,
			scale: 1.0,
			destination: None,
			frame_pan: None,
		}
	}
}

impl Camera {
	pub fn world_from_screen(&self, screen: Point) -> Point {
		Point::new(
			(screen.x - self.pan.x) / self.scale,
			(screen.y - self.pan.y) / self.scale,
		)
	}

	pub fn screen_from_world(&self, world: Point) -> Point {
		world * self.scale + self.pan
	}

	/// Raw screen-pixel pan; drag-panning is a 1:1 affine shift.
	pub fn pan_by(&mut self, delta: Point) {
		self.pan += delta;
	}

	/// The zoom floor adapts to the content so a large graph can zoom out
	/// far enough to fit.
	pub fn effective_min_zoom(viewport: Viewport, bounds: Bounds, node_size: f64) -> f64 {
		f64::min(MIN_ZOOM, bounds_scale(viewport, bounds, node_size)) * MIN_ZOOM_MARGIN
	}

	/// Compute the pan/scale produced by a wheel movement anchored at a
	/// screen position: the world point under the cursor must land on the
	/// same pixel before and after.
	pub fn zoom_target(
		&self,
		screen_pos: Point,
		wheel_delta: f64,
		viewport: Viewport,
		bounds: Bounds,
		node_size: f64,
	) -> CameraTarget {
		let min_zoom = Self::effective_min_zoom(viewport, bounds, node_size);
		let new_scale = (self.scale - ZOOM_FACTOR * wheel_delta).clamp(min_zoom, MAX_ZOOM);

		// Cursor in pan-space (pan removed, scale kept), then the drift the
		// scale change would cause, subtracted back out of the pan.
		let pm = screen_pos - self.pan;
		let drift = Point::new(
			(pm.x * new_scale - pm.x * self.scale) / self.scale,
			(pm.y * new_scale - pm.y * self.scale) / self.scale,
		);
		CameraTarget {
			pan: self.pan - drift,
			scale: new_scale,
		}
	}

	/// Wheel zoom: applied immediately.
	pub fn zoom_at_point(
		&mut self,
		screen_pos: Point,
		wheel_delta: f64,
		viewport: Viewport,
		bounds: Bounds,
		node_size: f64,
	) {
		let target = self.zoom_target(screen_pos, wheel_delta, viewport, bounds, node_size);
		self.pan = target.pan;
		self.scale = target.scale;
	}

	/// Button/double-click zoom step: animated.
	pub fn zoom_step(
		&mut self,
		zoom_in: bool,
		viewport: Viewport,
		bounds: Bounds,
		node_size: f64,
	) {
		let delta = if zoom_in { -ZOOM_STEP_DELTA } else { ZOOM_STEP_DELTA };
		let center = Point::new(viewport.width / 2.0, viewport.height / 2.0);
		self.destination = Some(self.zoom_target(center, delta, viewport, bounds, node_size));
	}

	/// Animated transition centering one node on screen.
	pub fn zoom_to_selection(&mut self, node_pos: Point, viewport: Viewport) {
		let scale = f64::max(self.scale, 1.0);
		self.destination = Some(CameraTarget {
			pan: Point::new(
				viewport.width / 2.0 - node_pos.x * scale,
				viewport.height / 2.0 - node_pos.y * scale,
			),
			scale,
		});
	}

	/// Scale and pan that frame `bounds` in the viewport with the given
	/// padding, node size margin included. Returned as a target so callers
	/// can animate rather than jump.
	pub fn fit_target(
		bounds: Bounds,
		viewport: Viewport,
		padding: Padding,
		node_size: f64,
	) -> CameraTarget {
		let hf = (viewport.height - padding.vertical) / (bounds.height() + node_size * 2.0);
		let wf = (viewport.width - padding.horizontal) / (bounds.width() + node_size * 2.0);
		let scale = round_to(f64::min(hf, wf), 4);
		let x = viewport.width / 2.0 - (bounds.width() / 2.0 + bounds.min_x) * scale;
		let y = viewport.height / 2.0 - (bounds.height() / 2.0 + bounds.min_y) * scale;
		CameraTarget {
			pan: Point::new(round_to(x, 2), round_to(y, 2)),
			scale,
		}
	}

	/// One tick of the destination transition: close half the remaining
	/// distance, snap and clear once within epsilon. Returns true while a
	/// transition is still running.
	pub fn animate_step(&mut self) -> bool {
		let Some(dest) = self.destination else {
			return false;
		};
		self.pan += (dest.pan - self.pan) * EASE;
		self.scale += (dest.scale - self.scale) * EASE;
		let settled = (self.pan.x - dest.pan.x).abs() < PAN_EPSILON
			&& (self.pan.y - dest.pan.y).abs() < PAN_EPSILON
			&& (self.scale - dest.scale).abs() < SCALE_EPSILON;
		if settled {
			self.pan = dest.pan;
			self.scale = dest.scale;
			self.destination = None;
		}
		!settled
	}

	/// Apply a held keyboard action for this tick.
	pub fn apply_key_action(
		&mut self,
		action: KeyAction,
		viewport: Viewport,
		bounds: Bounds,
		node_size: f64,
	) {
		match action {
			KeyAction::PanUp => self.pan.y += KEY_PAN_STEP,
			KeyAction::PanDown => self.pan.y -= KEY_PAN_STEP,
			KeyAction::PanLeft => self.pan.x += KEY_PAN_STEP,
			KeyAction::PanRight => self.pan.x -= KEY_PAN_STEP,
			KeyAction::ZoomIn | KeyAction::ZoomOut => {
				let delta = if action == KeyAction::ZoomIn {
					-KEY_ZOOM_DELTA
				} else {
					KEY_ZOOM_DELTA
				};
				let center = Point::new(viewport.width / 2.0, viewport.height / 2.0);
				self.zoom_at_point(center, delta, viewport, bounds, node_size);
			}
			KeyAction::Preset(scale) => {
				// Keep the viewport center anchored through the transition.
				let center = Point::new(viewport.width / 2.0, viewport.height / 2.0);
				let world = self.world_from_screen(center);
				self.destination = Some(CameraTarget {
					pan: center - world * scale,
					scale,
				});
			}
		}
	}
}

/// Scale at which `bounds` (plus node margins) exactly fits the viewport.
pub fn bounds_scale(viewport: Viewport, bounds: Bounds, node_size: f64) -> f64 {
	let hf = viewport.height / (bounds.height() + node_size * 2.0);
	let wf = viewport.width / (bounds.width() + node_size * 2.0);
	f64::min(hf, wf)
}

/// Bounding box over all nodes and non-ignored shapes, with a size margin
/// on the max side and a fixed margin on the min side. Mid-flight nodes
/// count at their destination. An empty graph yields the default box.
pub fn content_bounds(store: &GraphStore) -> Bounds {
	let nodes = store.nodes.values().map(|n| {
		let p = n.destination.unwrap_or(n.position);
		(p, n.size, n.size)
	});
	let shapes = store
		.shapes
		.iter()
		.filter(|s| !s.definition.bounds_ignore)
		.map(|s| (Point::new(s.x, s.y), s.width, s.height));
	let mut entities = nodes.chain(shapes);

	let Some((first, fw, fh)) = entities.next() else {
		return Bounds::default();
	};
	let mut bounds = Bounds {
		min_x: first.x,
		min_y: first.y,
		max_x: first.x,
		max_y: first.y,
	};
	for (p, width, height) in std::iter::once((first, fw, fh)).chain(entities) {
		bounds.max_x = bounds.max_x.max(p.x + width);
		bounds.max_y = bounds.max_y.max(p.y + height);
		bounds.min_x = bounds.min_x.min(p.x - BOUNDS_MARGIN);
		bounds.min_y = bounds.min_y.min(p.y - BOUNDS_MARGIN);
	}
	bounds
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::network_graph::types::{GraphData, NodeDefinition, NodeOptions};
	use std::sync::Arc;

	fn wide_bounds() -> Bounds {
		Bounds {
			min_x: 0.0,
			min_y: 0.0,
			max_x: 1000.0,
			max_y: 1000.0,
		}
	}

	fn viewport() -> Viewport {
		Viewport {
			width: 500.0,
			height: 500.0,
		}
	}

	#[test]
	fn wheel_zoom_preserves_the_point_under_the_cursor() {
		let mut camera = Camera {
			pan: Point::new(40.0, -25.0),
			scale: 1.3,
			..Default::default()
		};
		let cursor = Point::new(123.0, 456.0);
		let before = camera.world_from_screen(cursor);
		camera.zoom_at_point(cursor, -300.0, viewport(), wide_bounds(), 30.0);
		let after = camera.world_from_screen(cursor);
		assert!((before.x - after.x).abs() < 1e-6);
		assert!((before.y - after.y).abs() < 1e-6);
		assert!(camera.scale > 1.3);
	}

	#[test]
	fn zoom_clamps_to_the_configured_ceiling() {
		let mut camera = Camera {
			scale: 5.9,
			..Default::default()
		};
		camera.zoom_at_point(Point::ZERO, -1000.0, viewport(), wide_bounds(), 30.0);
		assert_eq!(camera.scale, MAX_ZOOM);
	}

	#[test]
	fn zoom_floor_adapts_to_large_content() {
		// Content much larger than the viewport: the fit scale undercuts
		// the configured minimum, and the floor follows it (with margin).
		let bounds = Bounds {
			min_x: 0.0,
			min_y: 0.0,
			max_x: 10_000.0,
			max_y: 10_000.0,
		};
		let mut camera = Camera::default();
		camera.zoom_at_point(Point::ZERO, 100_000.0, viewport(), bounds, 30.0);
		let fit = bounds_scale(viewport(), bounds, 30.0);
		assert!((camera.scale - fit * 0.95).abs() < 1e-9);
		assert!(camera.scale < MIN_ZOOM);
	}

	#[test]
	fn fit_target_centers_and_scales() {
		let bounds = Bounds {
			min_x: 0.0,
			min_y: 0.0,
			max_x: 100.0,
			max_y: 100.0,
		};
		let padding = Padding {
			horizontal: 0.0,
			vertical: 0.0,
		};
		let target = Camera::fit_target(bounds, viewport(), padding, 30.0);
		assert!((target.scale - 500.0 / 160.0).abs() < 1e-4);

		// The bounds center must land on the viewport center.
		let camera = Camera {
			pan: target.pan,
			scale: target.scale,
			..Default::default()
		};
		let center = camera.screen_from_world(Point::new(50.0, 50.0));
		assert!((center.x - 250.0).abs() < 0.1);
		assert!((center.y - 250.0).abs() < 0.1);
	}

	#[test]
	fn animate_step_halves_in_and_clears() {
		let mut camera = Camera::default();
		camera.destination = Some(CameraTarget {
			pan: Point::new(100.0, 0.0),
			scale: 2.0,
		});
		assert!(camera.animate_step());
		assert!((camera.pan.x - 50.0).abs() < 1e-9);
		assert!((camera.scale - 1.5).abs() < 1e-9);

		let mut steps = 0;
		while camera.animate_step() {
			steps += 1;
			assert!(steps < 64, "transition failed to settle");
		}
		assert!(camera.destination.is_none());
		assert_eq!(camera.pan.x, 100.0);
		assert_eq!(camera.scale, 2.0);
	}

	#[test]
	fn preset_key_action_anchors_the_viewport_center() {
		let mut camera = Camera {
			pan: Point::new(30.0, 70.0),
			scale: 1.4,
			..Default::default()
		};
		let center = Point::new(250.0, 250.0);
		let world = camera.world_from_screen(center);
		camera.apply_key_action(KeyAction::Preset(2.0), viewport(), wide_bounds(), 30.0);
		while camera.animate_step() {}
		let after = camera.world_from_screen(center);
		assert!((world.x - after.x).abs() < 1e-6);
		assert!((world.y - after.y).abs() < 1e-6);
		assert_eq!(camera.scale, 2.0);
	}

	#[test]
	fn content_bounds_default_when_empty_and_margined_otherwise() {
		let store = store_with(&[]);
		assert_eq!(content_bounds(&store), Bounds::default());

		let store = store_with(&[("a", 10.0, 10.0)]);
		let b = content_bounds(&store);
		assert_eq!(b.min_x, -20.0);
		assert_eq!(b.max_x, 40.0);
		assert_eq!(b.min_y, -20.0);
		assert_eq!(b.max_y, 40.0);
	}

	fn store_with(nodes: &[(&str, f64, f64)]) -> GraphStore {
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
}
