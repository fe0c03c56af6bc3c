//! Layered canvas drawing: shapes, edges, nodes and the edit overlay, each
//! cleared and redrawn under the same camera transform every executed
//! frame.
//!
//! Everything here reads state and issues draw calls; per-frame mutation
//! (destination glides, cache refreshes) happens in `state::tick` before
//! this runs. A draw call that cannot resolve its data (dangling edge,
//! missing image) skips silently so the frame always completes.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::rc::Rc;

use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement, SvgImageElement,
};

use super::camera::Camera;
use super::geometry::{self, Bounds, Point};
use super::graph::{Edge, Node, Shape};
use super::interaction::{handle_boxes, HoverTarget};
use super::state::NetworkState;
use super::types::{
	EdgeColor, FillStyle, NetworkOptions, NodeDefinition, ShapeDefinition, Viewport,
};

/// Custom node painter: context translated to the node's top-left corner.
pub type NodeDrawFn = Rc<dyn Fn(&CanvasRenderingContext2d, &NodeDefinition, f64)>;
/// Custom shape painter: context translated to the shape's top-left corner.
pub type ShapeDrawFn = Rc<dyn Fn(&CanvasRenderingContext2d, &ShapeDefinition, f64)>;

/// A pre-loaded drawable image.
pub enum ImageElement {
	Bitmap(HtmlImageElement),
	Vector(SvgImageElement),
	Canvas(HtmlCanvasElement),
}

/// Image table entry with placement metadata.
pub struct ImageEntry {
	pub element: ImageElement,
	pub scale: f64,
	pub offset_x: f64,
	pub offset_y: f64,
}

impl ImageEntry {
	pub fn new(element: ImageElement) -> Self {
		Self {
			element,
			scale: 1.0,
			offset_x: 0.0,
			offset_y: 0.0,
		}
	}
}

/// Id-keyed image resolution table.
pub type ImageTable = HashMap<String, ImageEntry>;

/// The stacked per-layer drawing contexts.
pub struct Layers {
	pub shapes: CanvasRenderingContext2d,
	pub edges: CanvasRenderingContext2d,
	pub nodes: CanvasRenderingContext2d,
	pub overlay: CanvasRenderingContext2d,
}

const CULL_MARGIN: f64 = 10.0;
const HOVER_EDGE_WIDTH: f64 = 4.0;
const LABEL_FONT: &str = "Lato, Arial";
const MAX_INNER_LABEL_CHARS: usize = 10;
const MIN_INNER_LABEL_CHARS: usize = 7;
const MAX_OUTER_LABEL_CHARS: usize = 35;
const MIN_OUTER_LABEL_CHARS: usize = 12;
const OUTER_LABEL_MIN_SCALE: f64 = 1.75;
const EDGE_LABEL_MIN_SCALE: f64 = 0.75;
const IMAGE_MIN_SCALE: f64 = 0.3;

const DEFAULT_NODE_FILL: &str = "#ffffff";
const DEFAULT_NODE_STROKE: &str = "#333333";
const DEFAULT_NODE_FONT_COLOR: &str = "#555555";
const DEFAULT_EDGE_COLOR: &str = "#777777";
const DEFAULT_SHAPE_FILL: &str = "#ffffff";
const DEFAULT_SHAPE_STROKE: &str = "#333333";
const DEFAULT_LINE_WIDTH: f64 = 2.0;

/// World-space box of the visible viewport plus the cull margin.
pub fn viewport_world_box(camera: &Camera, viewport: Viewport) -> Bounds {
	Bounds {
		min_x: (-CULL_MARGIN - camera.pan.x) / camera.scale,
		min_y: (-CULL_MARGIN - camera.pan.y) / camera.scale,
		max_x: (CULL_MARGIN + viewport.width - camera.pan.x) / camera.scale,
		max_y: (CULL_MARGIN + viewport.height - camera.pan.y) / camera.scale,
	}
}

/// Redraw all four layers.
pub fn draw_frame(
	state: &NetworkState,
	layers: &Layers,
	images: &ImageTable,
	node_fn: Option<&NodeDrawFn>,
	shape_fn: Option<&ShapeDrawFn>,
) {
	draw_shape_layer(&layers.shapes, state, images, shape_fn);
	draw_edge_layer(&layers.edges, state);
	draw_node_layer(&layers.nodes, state, images, node_fn);
	draw_overlay_layer(&layers.overlay, state);
}

fn begin_layer(ctx: &CanvasRenderingContext2d, camera: &Camera, viewport: Viewport) {
	ctx.save();
	ctx.clear_rect(0.0, 0.0, viewport.width, viewport.height);
	let _ = ctx.transform(
		camera.scale,
		0.0,
		0.0,
		camera.scale,
		camera.pan.x,
		camera.pan.y,
	);
}

fn truncated(text: &str, allowed: usize) -> String {
	if text.chars().count() > allowed {
		let cut: String = text.chars().take(allowed).collect();
		format!("{cut}\u{2026}")
	} else {
		text.to_string()
	}
}

fn fill_label(
	ctx: &CanvasRenderingContext2d,
	text: &str,
	color: &str,
	font_size: f64,
	allowed: usize,
) {
	ctx.set_fill_style_str(color);
	ctx.set_font(&format!("{font_size}px {LABEL_FONT}"));
	ctx.set_text_align("center");
	let _ = ctx.fill_text(&truncated(text, allowed), 0.0, 0.0);
}

// Size bucket driving label density and font compensation.
fn node_scale_coefficient(scale: f64) -> f64 {
	if scale > 1.5 {
		0.5
	} else if scale < 0.5 {
		2.0
	} else {
		1.0
	}
}

fn edge_scale_coefficient(scale: f64) -> f64 {
	if scale > 1.5 {
		0.5
	} else if scale < 0.75 {
		1.2
	} else {
		1.0
	}
}

// ---- shapes ---------------------------------------------------------------

fn draw_shape_layer(
	ctx: &CanvasRenderingContext2d,
	state: &NetworkState,
	images: &ImageTable,
	shape_fn: Option<&ShapeDrawFn>,
) {
	begin_layer(ctx, &state.camera, state.viewport);
	for shape in &state.store.shapes {
		if shape.visible() {
			draw_shape(ctx, shape, images, shape_fn);
		}
	}
	ctx.restore();
}

fn draw_shape(
	ctx: &CanvasRenderingContext2d,
	shape: &Shape,
	images: &ImageTable,
	shape_fn: Option<&ShapeDrawFn>,
) {
	let def = &shape.definition;
	let style = def.style.clone().unwrap_or_default();
	ctx.save();
	let _ = ctx.translate(shape.x, shape.y);
	ctx.set_line_width(style.line_width.unwrap_or(DEFAULT_LINE_WIDTH));
	ctx.set_fill_style_str(style.resolved_fill().unwrap_or(DEFAULT_SHAPE_FILL));
	ctx.set_stroke_style_str(style.resolved_stroke().unwrap_or(DEFAULT_SHAPE_STROKE));
	ctx.begin_path();

	if let Some(draw) = shape_fn {
		draw(ctx, def, shape.width.max(shape.height));
	} else {
		ctx.fill_rect(0.0, 0.0, shape.width, shape.height);
	}

	if !def.shape.is_empty() && def.shape != "image" {
		ctx.close_path();
		ctx.fill();
		ctx.stroke();
	} else if let Some(entry) = def
		.map_image_id
		.as_deref()
		.or(def.image_id.as_deref())
		.and_then(|id| images.get(id))
	{
		let sc = def.scale.unwrap_or(1.0) * entry.scale;
		draw_image_element(
			ctx,
			&entry.element,
			entry.offset_x,
			entry.offset_y,
			shape.width * sc,
			shape.height * sc,
		);
	}
	ctx.restore();
}

fn draw_image_element(
	ctx: &CanvasRenderingContext2d,
	element: &ImageElement,
	x: f64,
	y: f64,
	w: f64,
	h: f64,
) {
	let result = match element {
		ImageElement::Bitmap(img) => {
			ctx.draw_image_with_html_image_element_and_dw_and_dh(img, x, y, w, h)
		}
		ImageElement::Vector(img) => {
			ctx.draw_image_with_svg_image_element_and_dw_and_dh(img, x, y, w, h)
		}
		ImageElement::Canvas(canvas) => {
			ctx.draw_image_with_html_canvas_element_and_dw_and_dh(canvas, x, y, w, h)
		}
	};
	if result.is_err() {
		log::debug!("image draw failed; skipping");
	}
}

// ---- edges ----------------------------------------------------------------

fn draw_edge_layer(ctx: &CanvasRenderingContext2d, state: &NetworkState) {
	begin_layer(ctx, &state.camera, state.viewport);
	for edge in state.store.edges.values() {
		// Unresolvable endpoints: the edge simply does not render.
		let Some((start, end)) = state.store.endpoints(edge) else {
			continue;
		};
		draw_edge(ctx, state, edge, start, end);
	}
	ctx.restore();
}

fn set_edge_stroke(
	ctx: &CanvasRenderingContext2d,
	edge: &Edge,
	start: Point,
	end: Point,
) -> String {
	let color = edge.definition.style.as_ref().and_then(|s| s.color.clone());
	match color {
		Some(EdgeColor::Gradient(stops)) if !stops.is_empty() => {
			let gradient = ctx.create_linear_gradient(start.x, start.y, end.x, end.y);
			let last = (stops.len() - 1).max(1) as f32;
			for (i, stop) in stops.iter().enumerate() {
				let _ = gradient.add_color_stop(i as f32 / last, stop);
			}
			#[allow(deprecated)]
			{
				ctx.set_stroke_style(&gradient);
				ctx.set_fill_style(&gradient);
			}
			stops[0].clone()
		}
		Some(EdgeColor::Single(c)) => {
			ctx.set_stroke_style_str(&c);
			ctx.set_fill_style_str(&c);
			c
		}
		_ => {
			ctx.set_stroke_style_str(DEFAULT_EDGE_COLOR);
			ctx.set_fill_style_str(DEFAULT_EDGE_COLOR);
			DEFAULT_EDGE_COLOR.to_string()
		}
	}
}

fn draw_edge(
	ctx: &CanvasRenderingContext2d,
	state: &NetworkState,
	edge: &Edge,
	start: Point,
	end: Point,
) {
	// Coincident endpoints degenerate every curve computation to 0,0.
	if start == end {
		return;
	}
	let options = &state.options;
	let scale = state.camera.scale;
	let hovering = state.interaction.rollover == Some(HoverTarget::Edge(edge.id.clone()));
	let curved = edge.is_curved(options.edges.line_style);
	let cp = edge.control;

	let style_width = edge
		.definition
		.style
		.as_ref()
		.and_then(|s| s.line_width)
		.unwrap_or(DEFAULT_LINE_WIDTH);
	let line_width = if hovering {
		HOVER_EDGE_WIDTH / scale
	} else {
		style_width / scale
	};

	ctx.save();
	ctx.begin_path();
	ctx.move_to(start.x, start.y);
	ctx.set_line_width(line_width);
	let base_color = set_edge_stroke(ctx, edge, start, end);
	if curved {
		ctx.quadratic_curve_to(cp.x, cp.y, end.x, end.y);
	} else {
		ctx.line_to(end.x, end.y);
	}
	ctx.stroke();
	ctx.close_path();

	if let Some(label) = edge.definition.label.as_deref() {
		if options.edges.show_labels && scale > EDGE_LABEL_MIN_SCALE {
			draw_edge_label(ctx, edge, label, &base_color, start, end, scale, curved);
		}
	}
	ctx.restore();

	if options.edges.arrowheads {
		ctx.save();
		draw_arrowhead(ctx, edge, start, end, cp, curved, options);
		ctx.restore();
	}
}

#[allow(clippy::too_many_arguments)]
fn draw_edge_label(
	ctx: &CanvasRenderingContext2d,
	edge: &Edge,
	label: &str,
	base_color: &str,
	start: Point,
	end: Point,
	scale: f64,
	curved: bool,
) {
	ctx.begin_path();
	let coefficient = edge_scale_coefficient(scale);
	let sf = scale * coefficient;
	let font_size = if coefficient < 1.0 { 7.0 / sf } else { 11.0 / sf };

	if curved {
		let p = edge.label_pos;
		let angle = edge.label_angle;
		let _ = ctx.translate(
			p.x + if p.x > start.x { 5.0 } else { -5.0 },
			p.y + if p.y < start.y { 5.0 } else { -5.0 },
		);
		let _ = ctx.rotate(if p.x > start.x { angle } else { angle - PI });
	} else {
		let d = end - start;
		let _ = ctx.translate(end.x - d.x / 2.0, end.y - 10.0 - d.y / 2.0);
		let angle = f64::atan2(d.y, d.x);
		let _ = ctx.rotate(if d.x < 0.0 { angle - PI } else { angle });
	}

	let color = edge
		.definition
		.style
		.as_ref()
		.and_then(|s| s.font_color.clone())
		.unwrap_or_else(|| base_color.to_string());
	ctx.set_fill_style_str(&color);
	ctx.set_font(&format!("{font_size}px {LABEL_FONT}"));
	ctx.set_text_align("center");
	let _ = ctx.fill_text(label, 2.0, 1.0);
}

fn draw_arrowhead(
	ctx: &CanvasRenderingContext2d,
	edge: &Edge,
	start: Point,
	end: Point,
	cp: Point,
	curved: bool,
	options: &NetworkOptions,
) {
	let ratio = geometry::biased_ratio(options.edges.arrow_placement_ratio, start, end);
	let (point, angle) = if curved {
		(
			geometry::quadratic_point(ratio, start, cp, end),
			geometry::quadratic_angle(ratio, start, cp, end),
		)
	} else {
		let d = end - start;
		let point = Point::new(
			end.x - d.x * options.edges.arrow_placement_ratio,
			end.y - d.y * options.edges.arrow_placement_ratio,
		);
		// The midpoint doubles as a collinear control point, so the angle
		// math is shared with the curved case.
		(point, geometry::quadratic_angle(ratio, start, point, end))
	};

	ctx.begin_path();
	set_edge_stroke(ctx, edge, start, end);
	let _ = ctx.translate(point.x, point.y);
	let _ = ctx.rotate(angle);
	ctx.move_to(-3.0, 0.0);
	ctx.line_to(-3.0, -2.0);
	ctx.line_to(3.0, 0.0);
	ctx.line_to(-3.0, 2.0);
	ctx.line_to(-3.0, 0.0);
	ctx.stroke();
	ctx.fill();
	ctx.close_path();
}

// ---- nodes ----------------------------------------------------------------

fn draw_node_layer(
	ctx: &CanvasRenderingContext2d,
	state: &NetworkState,
	images: &ImageTable,
	node_fn: Option<&NodeDrawFn>,
) {
	begin_layer(ctx, &state.camera, state.viewport);
	let world_box = viewport_world_box(&state.camera, state.viewport);
	for node in state.store.nodes.values() {
		// Cull off-screen nodes, but never one mid-flight.
		if node.destination.is_none() && !world_box.contains(node.position) {
			continue;
		}
		draw_node(ctx, state, node, images, node_fn);
	}
	ctx.restore();
}

fn node_shape_path(
	ctx: &CanvasRenderingContext2d,
	node: &Node,
	size: f64,
	node_fn: Option<&NodeDrawFn>,
) {
	ctx.begin_path();
	if let Some(draw) = node_fn {
		draw(ctx, &node.definition, size);
	} else {
		let _ = ctx.arc(size / 2.0, size / 2.0, size / 2.0, 0.0, 2.0 * PI);
	}
	ctx.close_path();
	ctx.fill();
	ctx.stroke();
}

fn draw_node(
	ctx: &CanvasRenderingContext2d,
	state: &NetworkState,
	node: &Node,
	images: &ImageTable,
	node_fn: Option<&NodeDrawFn>,
) {
	let options = &state.options;
	let scale = state.camera.scale;
	let hovering = state.interaction.rollover == Some(HoverTarget::Node(node.id.clone()));
	let size = node.render_size(&options.nodes, hovering);
	let coefficient = node_scale_coefficient(scale);
	let style = node.definition.style.clone().unwrap_or_default();

	let fill = style
		.fill
		.as_deref()
		.or(style.background.as_deref())
		.unwrap_or(DEFAULT_NODE_FILL);
	let stroke = style
		.stroke
		.as_deref()
		.or(style.border.as_deref())
		.unwrap_or(DEFAULT_NODE_STROKE);
	let font_color = style.font_color.as_deref().unwrap_or(DEFAULT_NODE_FONT_COLOR);
	let inner_color = style.inner_label_color.as_deref().unwrap_or(font_color);
	let line_width = style.line_width.unwrap_or(DEFAULT_LINE_WIDTH) / scale;
	let opacity = style.opacity.unwrap_or(1.0);
	let bullet = options.nodes.node_fill_style == FillStyle::Bullet;

	ctx.save();
	// Top-left translation centers the drawing on the node position.
	let _ = ctx.translate(node.position.x - size / 2.0, node.position.y - size / 2.0);
	ctx.set_line_width(line_width);
	ctx.set_fill_style_str(if bullet { stroke } else { fill });
	ctx.set_stroke_style_str(stroke);
	node_shape_path(ctx, node, size, node_fn);

	if scale > IMAGE_MIN_SCALE && !bullet {
		draw_node_image(ctx, node, images, size);
	}

	let font_size = 6.0;

	// inner label, centered low in the shape
	ctx.save();
	let _ = ctx.translate(size * 0.5, size * 0.7 + font_size * 0.7);
	if let Some(label) = node.definition.inner_label.as_deref() {
		let allowed = if coefficient < 1.0 {
			MAX_INNER_LABEL_CHARS
		} else {
			MIN_INNER_LABEL_CHARS
		};
		fill_label(ctx, label, inner_color, font_size * 0.7, allowed);
	}
	ctx.restore();

	// outer label, below the shape, only when zoomed in far enough
	ctx.save();
	let _ = ctx.translate(size / 2.0, size + font_size);
	if let Some(label) = node.definition.label.as_deref() {
		if options.nodes.show_labels && scale > OUTER_LABEL_MIN_SCALE {
			let allowed = if coefficient < 1.0 {
				MAX_OUTER_LABEL_CHARS
			} else {
				MIN_OUTER_LABEL_CHARS
			};
			fill_label(ctx, label, font_color, font_size, allowed);
		}
	}
	ctx.restore();

	// opacity is simulated by repainting with the cover color
	if let Some(cover) = options.cover_color.as_deref() {
		if opacity != 1.0 {
			ctx.set_fill_style_str(cover);
			ctx.set_stroke_style_str(cover);
			node_shape_path(ctx, node, size, node_fn);
		}
	}

	ctx.restore();
}

fn draw_node_image(
	ctx: &CanvasRenderingContext2d,
	node: &Node,
	images: &ImageTable,
	size: f64,
) {
	let Some(entry) = node
		.definition
		.image
		.as_deref()
		.and_then(|id| images.get(id))
	else {
		return;
	};
	// Image covers half the node width, aspect ratio preserved, dropped in
	// 20% from the top.
	let image_size = (size / 2.0) * entry.scale;
	let ratio = match &entry.element {
		ImageElement::Bitmap(img) if img.width() > 0 => {
			((img.height() as f64 / img.width() as f64) * 100.0).round() / 100.0
		}
		ImageElement::Canvas(canvas) if canvas.width() > 0 => {
			((canvas.height() as f64 / canvas.width() as f64) * 100.0).round() / 100.0
		}
		_ => 1.0,
	};
	ctx.begin_path();
	draw_image_element(
		ctx,
		&entry.element,
		size / 2.0 - image_size / 2.0 + entry.offset_x,
		size * 0.2 + entry.offset_y,
		image_size,
		image_size * ratio,
	);
}

// ---- overlay --------------------------------------------------------------

fn draw_overlay_layer(ctx: &CanvasRenderingContext2d, state: &NetworkState) {
	ctx.save();
	ctx.clear_rect(0.0, 0.0, state.viewport.width, state.viewport.height);

	let editing = state.options.interaction.allow_shape_interaction
		&& !state.options.interaction.allow_graph_interaction;
	let selected = state
		.interaction
		.shape
		.as_deref()
		.and_then(|id| state.store.shapes.iter().find(|s| s.id() == id));
	let (Some(shape), true) = (selected, editing) else {
		ctx.restore();
		return;
	};

	// Screen-space wash mutes everything under the edit layer.
	if state.options.show_muted_overlay {
		ctx.set_fill_style_str("rgba(250, 250, 250, 0.3)");
		ctx.fill_rect(0.0, 0.0, state.viewport.width, state.viewport.height);
	}

	let camera = &state.camera;
	let _ = ctx.transform(
		camera.scale,
		0.0,
		0.0,
		camera.scale,
		camera.pan.x,
		camera.pan.y,
	);
	ctx.set_line_width(1.0 / camera.scale);
	ctx.set_fill_style_str("#ffffff");
	ctx.set_stroke_style_str("#333333");
	for (_, origin, size) in handle_boxes(shape, camera.scale) {
		ctx.fill_rect(origin.x, origin.y, size, size);
		ctx.stroke_rect(origin.x, origin.y, size, size);
	}
	ctx.restore();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn viewport_box_expands_by_margin_in_world_units() {
		let camera = Camera {
			pan: Point::new(50.0, -20.0),
			scale: 2.0,
			..Default::default()
		};
		let viewport = Viewport {
			width: 400.0,
			height: 300.0,
		};
		let b = viewport_world_box(&camera, viewport);
		assert_eq!(b.min_x, (-10.0 - 50.0) / 2.0);
		assert_eq!(b.max_x, (10.0 + 400.0 - 50.0) / 2.0);
		assert_eq!(b.min_y, (-10.0 + 20.0) / 2.0);
		assert_eq!(b.max_y, (10.0 + 300.0 + 20.0) / 2.0);
	}

	#[test]
	fn label_truncation_appends_ellipsis() {
		assert_eq!(truncated("short", 10), "short");
		assert_eq!(truncated("a-rather-long-label", 7), "a-rathe\u{2026}");
	}
}
