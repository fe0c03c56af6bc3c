//! Pure 2D geometry helpers shared by hit-testing, camera math and the
//! edge/label painters. No browser types here; everything is testable on
//! the host target.

use std::f64::consts::PI;
use std::ops::{Add, AddAssign, Mul, Sub};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn distance_to(self, other: Point) -> f64 {
		let (dx, dy) = (other.x - self.x, other.y - self.y);
		(dx * dx + dy * dy).sqrt()
	}
}

impl Add for Point {
	type Output = Point;
	fn add(self, rhs: Point) -> Point {
		Point::new(self.x + rhs.x, self.y + rhs.y)
	}
}

impl AddAssign for Point {
	fn add_assign(&mut self, rhs: Point) {
		self.x += rhs.x;
		self.y += rhs.y;
	}
}

impl Sub for Point {
	type Output = Point;
	fn sub(self, rhs: Point) -> Point {
		Point::new(self.x - rhs.x, self.y - rhs.y)
	}
}

impl Mul<f64> for Point {
	type Output = Point;
	fn mul(self, rhs: f64) -> Point {
		Point::new(self.x * rhs, self.y * rhs)
	}
}

/// Axis-aligned box in world coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	pub min_x: f64,
	pub min_y: f64,
	pub max_x: f64,
	pub max_y: f64,
}

impl Bounds {
	pub fn width(&self) -> f64 {
		self.max_x - self.min_x
	}

	pub fn height(&self) -> f64 {
		self.max_y - self.min_y
	}

	pub fn contains(&self, p: Point) -> bool {
		p.x > self.min_x && p.x < self.max_x && p.y > self.min_y && p.y < self.max_y
	}
}

impl Default for Bounds {
	// An empty graph still needs something to frame.
	fn default() -> Self {
		Self {
			min_x: 0.0,
			min_y: 0.0,
			max_x: 100.0,
			max_y: 100.0,
		}
	}
}

/// Point on the quadratic bezier (s, cp, e) at parameter `t`.
pub fn quadratic_point(t: f64, s: Point, cp: Point, e: Point) -> Point {
	let m = 1.0 - t;
	Point::new(
		m * m * s.x + 2.0 * m * t * cp.x + t * t * e.x,
		m * m * s.y + 2.0 * m * t * cp.y + t * t * e.y,
	)
}

/// Tangent angle of the quadratic bezier at `t`, in the orientation used by
/// the label and arrowhead painters.
pub fn quadratic_angle(t: f64, s: Point, cp: Point, e: Point) -> f64 {
	let dx = 2.0 * (1.0 - t) * (cp.x - s.x) + 2.0 * t * (e.x - cp.x);
	let dy = 2.0 * (1.0 - t) * (cp.y - s.y) + 2.0 * t * (e.y - cp.y);
	-f64::atan2(dx, dy) + 0.5 * PI
}

/// Bias a curve parameter away from 0.5 when the edge's axis aspect is
/// skewed, so labels sit on the visual middle of the arc rather than the
/// parametric one.
pub fn biased_ratio(t: f64, s: Point, e: Point) -> f64 {
	let mut t = t;
	let x_diff = (s.x - e.x).abs();
	let y_diff = (s.y - e.y).abs();
	let diff_ratio = x_diff / y_diff;
	if diff_ratio > 1.0 {
		let drift = f64::min(5.0, diff_ratio.sqrt()) / 5.0;
		t -= 0.15 * drift;
	} else if diff_ratio < 1.0 {
		let drift = 1.0 - diff_ratio.sqrt();
		t += 0.25 * drift;
	}
	t
}

/// Distance from `p` to the segment (a, b).
pub fn distance_to_segment(a: Point, b: Point, p: Point) -> f64 {
	let seg = b - a;
	let len_sq = seg.x * seg.x + seg.y * seg.y;
	if len_sq == 0.0 {
		return a.distance_to(p);
	}
	let t = ((p.x - a.x) * seg.x + (p.y - a.y) * seg.y) / len_sq;
	let t = t.clamp(0.0, 1.0);
	p.distance_to(Point::new(a.x + t * seg.x, a.y + t * seg.y))
}

/// Distance from `p` to the quadratic bezier (s, cp, e), approximated by
/// sampling the curve into short segments.
pub fn distance_to_quadratic(s: Point, e: Point, p: Point, cp: Point) -> f64 {
	let mut min_distance = f64::MAX;
	let mut last = s;
	for i in 1..10 {
		let t = 0.1 * i as f64;
		let sample = quadratic_point(t, s, cp, e);
		let distance = distance_to_segment(last, sample, p);
		min_distance = min_distance.min(distance);
		last = sample;
	}
	min_distance
}

/// Collision test against a node's square bounding box centered on `center`.
pub fn point_in_node_box(center: Point, size: f64, p: Point) -> bool {
	let offset = size / 2.0;
	p.x > center.x - offset
		&& p.x < center.x + offset
		&& p.y > center.y - offset
		&& p.y < center.y + offset
}

/// Collision test against a top-left anchored rectangle.
pub fn point_in_rect(origin: Point, width: f64, height: f64, p: Point) -> bool {
	p.x > origin.x && p.x < origin.x + width && p.y > origin.y && p.y < origin.y + height
}

/// Round to a fixed number of decimal places. Camera fit targets are
/// rounded so destination comparisons settle instead of oscillating.
pub fn round_to(v: f64, places: u32) -> f64 {
	let f = 10f64.powi(places as i32);
	(v * f).round() / f
}
