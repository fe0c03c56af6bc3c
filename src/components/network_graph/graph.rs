//! Live graph model: id-indexed node/edge tables reconciled against the
//! externally supplied declarative snapshot.
//!
//! Entities are updated in place while their id stays present, so runtime
//! position and identity survive data refreshes. Edges hold node ids and
//! resolve endpoints through the table at render/hit-test time; a dangling
//! endpoint makes the edge unrenderable, never a crash.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::mem;
use std::sync::Arc;

use log::debug;

use super::geometry::{self, Point};
use super::types::{
	EdgeDefinition, EdgeOptions, GraphData, LineStyle, NodeDefinition, NodeOptions,
	ShapeDefinition,
};

/// World-units the rollover highlight grows a node by.
pub const ROLLOVER_SIZE_BONUS: f64 = 5.0;
/// Hit tolerance for edge hover/click, in world units.
pub const EDGE_HIT_TOLERANCE: f64 = 10.0;
/// Per-duplicate offset applied to parallel-edge control points.
const DUP_CURVE_STEP: f64 = 20.0;

pub struct Node {
	pub id: String,
	pub definition: Arc<NodeDefinition>,
	pub position: Point,
	pub size: f64,
	pub mass: f64,
	/// Pinned against layout. Dragging a node pins it.
	pub fixed: bool,
	/// In-progress animated relocation target.
	pub destination: Option<Point>,
}

impl Node {
	fn new(definition: Arc<NodeDefinition>, options: &NodeOptions) -> Self {
		let size = definition.size.unwrap_or(options.default_size);
		Self {
			id: definition.id.clone(),
			position: Point::new(definition.x.unwrap_or(0.0), definition.y.unwrap_or(0.0)),
			size,
			mass: definition.mass.unwrap_or(1.0),
			fixed: definition.fixed.unwrap_or(false),
			destination: None,
			definition,
		}
	}

	/// Swap in a fresh definition without disturbing runtime position.
	pub fn update(&mut self, definition: Arc<NodeDefinition>) {
		if definition.fixed == Some(false) {
			self.fixed = false;
		}
		self.definition = definition;
	}

	/// Effective drawn size; also the collision box. Style wins over the
	/// component default, which wins over the definition size.
	pub fn render_size(&self, options: &NodeOptions, hovering: bool) -> f64 {
		let base = self
			.definition
			.style
			.as_ref()
			.and_then(|s| s.size)
			.unwrap_or(options.default_size);
		base + if hovering { ROLLOVER_SIZE_BONUS } else { 0.0 }
	}

	/// Glide toward the destination by half the remaining distance.
	/// Returns true while the animation is still in flight.
	pub fn animate_step(&mut self) -> bool {
		let Some(dest) = self.destination else {
			return false;
		};
		if (self.position.x - dest.x).abs() > 1.0 || (self.position.y - dest.y).abs() > 1.0 {
			self.position += (dest - self.position) * 0.5;
			true
		} else {
			self.destination = None;
			false
		}
	}
}

pub struct Edge {
	pub id: String,
	pub definition: Arc<EdgeDefinition>,
	/// Start node id.
	pub from: String,
	/// End node id.
	pub to: String,
	/// Ordinal among edges sharing the same unordered endpoint pair.
	/// Recomputed on every reconcile pass.
	pub dup_index: usize,
	pub control: Point,
	pub label_pos: Point,
	pub label_angle: f64,
	// endpoint coordinates the cached label/control were computed for
	old_points: Option<(Point, Point)>,
}

impl Edge {
	fn new(definition: Arc<EdgeDefinition>, dup_index: usize) -> Self {
		Self {
			id: definition.id.clone(),
			from: definition.from.clone(),
			to: definition.to.clone(),
			dup_index,
			control: Point::ZERO,
			label_pos: Point::ZERO,
			label_angle: 0.0,
			old_points: None,
			definition,
		}
	}

	pub fn update(&mut self, definition: Arc<EdgeDefinition>) {
		if self.from != definition.from || self.to != definition.to {
			self.from = definition.from.clone();
			self.to = definition.to.clone();
			self.old_points = None;
		}
		self.definition = definition;
	}

	pub fn set_dup_index(&mut self, dup_index: usize) {
		if self.dup_index != dup_index {
			self.dup_index = dup_index;
			self.old_points = None;
		}
	}

	/// Control point fanning parallel edges apart by their duplicate index.
	pub fn control_point(&self, start: Point, end: Point) -> Point {
		let dn = self.dup_index as f64;
		let sign_x = if end.x > start.x { 1.0 } else { -1.0 };
		let sign_y = if end.y > start.y { 1.0 } else { -1.0 };
		Point::new(
			end.x + sign_x * dn * DUP_CURVE_STEP,
			start.y - sign_y * dn * DUP_CURVE_STEP,
		)
	}

	/// A straight line style still curves duplicates so they stay distinct.
	pub fn is_curved(&self, line_style: LineStyle) -> bool {
		line_style != LineStyle::Straight || self.dup_index > 0
	}

	/// Distance from a world point to this edge's drawn path.
	pub fn distance_from(&self, start: Point, end: Point, pt: Point, options: &EdgeOptions) -> f64 {
		if self.is_curved(options.line_style) {
			geometry::distance_to_quadratic(start, end, pt, self.control_point(start, end))
		} else {
			geometry::distance_to_segment(start, end, pt)
		}
	}

	/// Recompute cached control point and label placement if the endpoints
	/// moved since the last call.
	pub fn refresh_geometry(&mut self, start: Point, end: Point) {
		if self.old_points == Some((start, end)) {
			return;
		}
		self.old_points = Some((start, end));
		self.control = self.control_point(start, end);
		let t = geometry::biased_ratio(0.5, start, end);
		self.label_pos = geometry::quadratic_point(t, start, self.control, end);
		self.label_angle = geometry::quadratic_angle(t, start, self.control, end);
	}
}

/// Live shape entity: the definition plus editable geometry. The shape list
/// is replaced wholesale on every update; edits survive only while the
/// caller keeps handing back the identical definition.
#[derive(Clone)]
pub struct Shape {
	pub definition: Arc<ShapeDefinition>,
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl Shape {
	fn new(definition: Arc<ShapeDefinition>) -> Self {
		let fallback = definition.size.unwrap_or(0.0);
		let width = if definition.width > 0.0 { definition.width } else { fallback };
		let height = if definition.height > 0.0 { definition.height } else { fallback };
		Self {
			x: definition.x,
			y: definition.y,
			width,
			height,
			definition,
		}
	}

	pub fn id(&self) -> &str {
		&self.definition.id
	}

	pub fn visible(&self) -> bool {
		self.definition.visible != Some(false)
	}

	/// Snapshot the edited geometry back into a definition value, for the
	/// shape-update callback.
	pub fn to_definition(&self) -> ShapeDefinition {
		let mut def = (*self.definition).clone();
		def.x = self.x;
		def.y = self.y;
		def.width = self.width;
		def.height = self.height;
		def
	}
}

fn pair_key(a: &str, b: &str) -> String {
	if a <= b {
		format!("{a}-{b}")
	} else {
		format!("{b}-{a}")
	}
}

/// Canonical owner of live nodes, edges and shapes.
#[derive(Default)]
pub struct GraphStore {
	pub nodes: BTreeMap<String, Node>,
	pub edges: BTreeMap<String, Edge>,
	pub shapes: Vec<Shape>,
}

impl GraphStore {
	/// Bring the live tables in line with a snapshot. Returns true iff an
	/// entity was created or removed; in-place updates alone are clean.
	pub fn reconcile(&mut self, next: &GraphData, options: &NodeOptions) -> bool {
		let mut dirty = false;

		// Nodes first: edges resolve endpoints against this pass's table.
		for def in &next.nodes {
			match self.nodes.get_mut(&def.id) {
				None => {
					self.nodes.insert(def.id.clone(), Node::new(def.clone(), options));
					dirty = true;
				}
				Some(node) if !Arc::ptr_eq(&node.definition, def) => {
					node.update(def.clone());
				}
				Some(_) => {}
			}
		}
		let keep: HashSet<&str> = next.nodes.iter().map(|d| d.id.as_str()).collect();
		let before = self.nodes.len();
		self.nodes.retain(|id, _| keep.contains(id.as_str()));
		dirty |= self.nodes.len() != before;

		// Parallel-edge ordinals count every snapshot edge per unordered
		// endpoint pair, rebuilt from scratch each pass.
		let mut dup_counts: HashMap<String, usize> = HashMap::new();
		let mut dangling = 0usize;
		for def in &next.edges {
			let dup_index = {
				let slot = dup_counts
					.entry(pair_key(&def.from, &def.to))
					.and_modify(|c| *c += 1)
					.or_insert(0);
				*slot
			};
			if !self.nodes.contains_key(&def.from) || !self.nodes.contains_key(&def.to) {
				dangling += 1;
			}
			match self.edges.get_mut(&def.id) {
				None => {
					self.edges.insert(def.id.clone(), Edge::new(def.clone(), dup_index));
					dirty = true;
				}
				Some(edge) => {
					if !Arc::ptr_eq(&edge.definition, def) {
						edge.update(def.clone());
					}
					edge.set_dup_index(dup_index);
				}
			}
		}
		let keep: HashSet<&str> = next.edges.iter().map(|d| d.id.as_str()).collect();
		let before = self.edges.len();
		self.edges.retain(|id, _| keep.contains(id.as_str()));
		dirty |= self.edges.len() != before;

		if dangling > 0 {
			debug!("{dangling} edge(s) reference nodes missing from the snapshot and will not render");
		}

		dirty
	}

	/// Replace the shape list. Editable geometry carries over only for
	/// shapes whose definition is pointer-identical to an incoming one.
	pub fn set_shapes(&mut self, defs: &[Arc<ShapeDefinition>]) {
		let old = mem::take(&mut self.shapes);
		self.shapes = defs
			.iter()
			.map(|d| {
				old.iter()
					.find(|s| Arc::ptr_eq(&s.definition, d))
					.cloned()
					.unwrap_or_else(|| Shape::new(d.clone()))
			})
			.collect();
	}

	/// Resolve an edge's endpoint positions; None when either node is gone.
	pub fn endpoints(&self, edge: &Edge) -> Option<(Point, Point)> {
		Some((
			self.nodes.get(&edge.from)?.position,
			self.nodes.get(&edge.to)?.position,
		))
	}

	pub fn node_positions(&self) -> HashMap<String, Point> {
		self.nodes
			.values()
			.map(|n| (n.id.clone(), n.position))
			.collect()
	}

	/// Refresh every renderable edge's cached curve geometry.
	pub fn refresh_edge_geometry(&mut self) {
		let nodes = &self.nodes;
		for edge in self.edges.values_mut() {
			let (Some(start), Some(end)) = (nodes.get(&edge.from), nodes.get(&edge.to)) else {
				continue;
			};
			edge.refresh_geometry(start.position, end.position);
		}
	}

	/// The node under a world position. Among overlapping collision boxes
	/// the node nearest the cursor wins, so the result does not depend on
	/// table order.
	pub fn node_at(
		&self,
		pos: Point,
		options: &NodeOptions,
		rollover: Option<&str>,
	) -> Option<&Node> {
		self.nodes
			.values()
			.filter(|n| {
				let hovering = rollover == Some(n.id.as_str());
				geometry::point_in_node_box(n.position, n.render_size(options, hovering), pos)
			})
			.min_by(|a, b| {
				a.position
					.distance_to(pos)
					.total_cmp(&b.position.distance_to(pos))
			})
	}

	/// The nearest edge within hit tolerance of a world position.
	pub fn edge_at(&self, pos: Point, options: &EdgeOptions) -> Option<&Edge> {
		self.edges
			.values()
			.filter_map(|e| {
				let (start, end) = self.endpoints(e)?;
				let d = e.distance_from(start, end, pos, options);
				(d < EDGE_HIT_TOLERANCE).then_some((e, d))
			})
			.min_by(|a, b| a.1.total_cmp(&b.1))
			.map(|(e, _)| e)
	}

	/// Topmost clickable shape under a world position.
	pub fn shape_at(&self, pos: Point) -> Option<usize> {
		self.shapes.iter().enumerate().rev().find_map(|(i, s)| {
			if s.definition.no_click || (s.width <= 0.0 && s.height <= 0.0) {
				return None;
			}
			geometry::point_in_rect(Point::new(s.x, s.y), s.width, s.height, pos).then_some(i)
		})
	}

	/// Move a shape to the end of the draw order so it renders on top.
	pub fn raise_shape(&mut self, index: usize) {
		if index < self.shapes.len() {
			let shape = self.shapes.remove(index);
			self.shapes.push(shape);
		}
	}
}
