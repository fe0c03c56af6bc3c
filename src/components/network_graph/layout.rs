//! Pluggable layout: the narrow contract the core consumes, plus the two
//! built-in layouters (force-directed simulation and parent/child
//! hierarchy).
//!
//! Layouters never jump settled nodes: assignments go through each node's
//! `destination` so positions glide over the following frames.

use std::collections::HashMap;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};

use super::geometry::Point;
use super::graph::GraphStore;
use super::types::{LayoutOptions, Viewport};

/// A started layout pass.
pub struct LayoutJob {
	/// Incremental remainder, stepped once per frame until done.
	pub run: Option<Box<dyn LayoutRun>>,
	/// Ask the camera to fit the result once the pass completes.
	pub fit_on_complete: bool,
}

/// Incremental part of a layout pass.
pub trait LayoutRun {
	/// Advance one frame. Returns false once the pass has finished.
	fn step(&mut self, store: &mut GraphStore) -> bool;

	/// Cancel. Invoked before a new layout pass replaces this one.
	fn stop(&mut self) {}
}

/// The layout contract: mutate node positions/destinations for the current
/// graph, optionally returning an incremental run.
pub trait Layouter {
	fn start(
		&self,
		store: &mut GraphStore,
		options: &LayoutOptions,
		viewport: Viewport,
	) -> LayoutJob;
}

/// Force-directed layouter backed by the `force_graph` simulation.
pub struct ForceLayouter {
	pub force_charge: f32,
	pub force_spring: f32,
	pub force_max: f32,
	pub node_speed: f32,
	pub damping_factor: f32,
	/// Simulation frames to run before the pass completes.
	pub frames: usize,
}

impl Default for ForceLayouter {
	fn default() -> Self {
		Self {
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
			frames: 180,
		}
	}
}

impl Layouter for ForceLayouter {
	fn start(
		&self,
		store: &mut GraphStore,
		options: &LayoutOptions,
		viewport: Viewport,
	) -> LayoutJob {
		let mut sim = ForceGraph::<String, ()>::new(SimulationParameters {
			force_charge: self.force_charge,
			force_spring: self.force_spring,
			force_max: self.force_max,
			node_speed: self.node_speed,
			damping_factor: self.damping_factor,
		});

		// Seed unplaced nodes on a circle around the viewport center so the
		// simulation has something to untangle; placed nodes keep their
		// coordinates and pinned nodes anchor the simulation.
		let count = store.nodes.len().max(1);
		let center = Point::new(viewport.width / 2.0, viewport.height / 2.0);
		let mut id_to_idx: HashMap<String, DefaultNodeIdx> = HashMap::new();
		for (i, node) in store.nodes.values().enumerate() {
			let seeded = if node.position == Point::ZERO {
				let angle = (i as f64) * 2.0 * std::f64::consts::PI / count as f64;
				Point::new(
					center.x + 100.0 * angle.cos(),
					center.y + 100.0 * angle.sin(),
				)
			} else {
				node.position
			};
			let idx = sim.add_node(NodeData {
				x: seeded.x as f32,
				y: seeded.y as f32,
				mass: node.mass.max(1.0) as f32,
				is_anchor: node.fixed,
				user_data: node.id.clone(),
			});
			id_to_idx.insert(node.id.clone(), idx);
		}
		for edge in store.edges.values() {
			if let (Some(&src), Some(&tgt)) = (id_to_idx.get(&edge.from), id_to_idx.get(&edge.to))
			{
				sim.add_edge(src, tgt, EdgeData::default());
			}
		}

		LayoutJob {
			run: Some(Box::new(ForceRun {
				sim,
				remaining: self.frames,
			})),
			fit_on_complete: options.fit_on_update,
		}
	}
}

struct ForceRun {
	sim: ForceGraph<String, ()>,
	remaining: usize,
}

impl LayoutRun for ForceRun {
	fn step(&mut self, store: &mut GraphStore) -> bool {
		if self.remaining == 0 {
			return false;
		}
		self.remaining -= 1;
		self.sim.update(0.016);
		self.sim.visit_nodes(|sim_node| {
			if let Some(node) = store.nodes.get_mut(&sim_node.data.user_data) {
				if !node.fixed {
					node.position = Point::new(sim_node.x() as f64, sim_node.y() as f64);
				}
			}
		});
		self.remaining > 0
	}

	fn stop(&mut self) {
		self.remaining = 0;
	}
}

/// Parent/child hierarchy layouter: ranks nodes breadth-down from root
/// parents, orders each rank so subtrees stay grouped under their parent,
/// and spaces the grid to the viewport.
pub struct HierarchyLayouter {
	/// When false, edges are treated as bidirectional for parent discovery.
	pub directed: bool,
}

impl Default for HierarchyLayouter {
	fn default() -> Self {
		Self { directed: true }
	}
}

const X_SPACING: f64 = 100.0;

struct HierNode {
	id: String,
	mass: f64,
	rank: Option<usize>,
	order: f64,
	width: f64,
	parent: Option<usize>,
	children: Vec<usize>,
	is_parent: bool,
	is_child: bool,
}

impl HierarchyLayouter {
	fn crawl(&self, nodes: &mut Vec<HierNode>, edges: &[(usize, usize)], at: usize) {
		let nid = at;
		for &(from, to) in edges {
			let child = if from == nid && to != from {
				Some(to)
			} else if !self.directed && to == nid && to != from {
				Some(from)
			} else {
				None
			};
			if let Some(c) = child {
				if nodes[c].rank.is_none() && nodes[c].parent.is_none() && c != at {
					nodes[c].parent = Some(at);
					nodes[c].rank = Some(nodes[at].rank.unwrap_or(0) + 1);
					nodes[at].children.push(c);
				}
			}
		}
		let mut children = nodes[at].children.clone();
		children.sort_by(|&a, &b| nodes[a].mass.total_cmp(&nodes[b].mass));
		nodes[at].children = children.clone();
		for c in children {
			self.crawl(nodes, edges, c);
		}
		Self::subtree_width(nodes, at);
	}

	fn subtree_width(nodes: &mut Vec<HierNode>, at: usize) -> f64 {
		let children = nodes[at].children.clone();
		let w = if children.is_empty() {
			1.0
		} else {
			children
				.iter()
				.map(|&c| nodes[c].width)
				.sum::<f64>()
				.max(1.0)
		};
		nodes[at].width = w;
		w
	}

	fn order_ranks(nodes: &mut [HierNode], max_rank: usize) {
		for rank in 0..=max_rank {
			let mut members: Vec<usize> = (0..nodes.len())
				.filter(|&i| nodes[i].rank == Some(rank))
				.collect();
			// Group under parents; wider and heavier subtrees first.
			members.sort_by(|&a, &b| {
				let pa = nodes[a].parent.map(|p| nodes[p].order).unwrap_or(0.0);
				let pb = nodes[b].parent.map(|p| nodes[p].order).unwrap_or(0.0);
				pa.total_cmp(&pb)
					.then(nodes[b].width.total_cmp(&nodes[a].width))
					.then(nodes[b].mass.total_cmp(&nodes[a].mass))
			});

			let mut count = 0.0;
			let mut old_parent: Option<usize> = None;
			for &i in &members {
				if nodes[i].parent.is_some() && nodes[i].parent != old_parent {
					count = 0.0;
				}
				old_parent = nodes[i].parent;
				if nodes[i].order == 0.0 {
					count += if nodes[i].width == 1.0 {
						0.0
					} else {
						nodes[i].width / 2.0
					};
					let parent_base = nodes[i]
						.parent
						.map(|p| {
							let pw = nodes[p].width;
							nodes[p].order - if pw > 1.0 { pw / 2.0 } else { 0.0 }
						})
						.unwrap_or(0.0);
					nodes[i].order = parent_base + count;
					count += if nodes[i].width == 1.0 {
						1.0
					} else {
						nodes[i].width / 2.0
					};
				}
			}
		}

		// Collision pass: identical orders within a rank shift right, and
		// drag their subtrees along.
		for rank in 0..=max_rank {
			let mut members: Vec<usize> = (0..nodes.len())
				.filter(|&i| nodes[i].rank == Some(rank))
				.collect();
			members.sort_by(|&a, &b| nodes[a].order.total_cmp(&nodes[b].order));
			let mut old_order = f64::NEG_INFINITY;
			let mut shift = 0.0;
			for &i in &members {
				nodes[i].order += shift;
				if nodes[i].order == old_order {
					shift += 1.0;
					nodes[i].order += shift;
					let children = nodes[i].children.clone();
					for c in children {
						if nodes[c].rank > nodes[i].rank {
							nodes[c].order += shift;
						}
					}
				}
				old_order = nodes[i].order;
			}
		}
	}
}

impl Layouter for HierarchyLayouter {
	fn start(
		&self,
		store: &mut GraphStore,
		options: &LayoutOptions,
		viewport: Viewport,
	) -> LayoutJob {
		let ids: Vec<String> = store.nodes.keys().cloned().collect();
		let index_of: HashMap<&str, usize> = ids
			.iter()
			.enumerate()
			.map(|(i, id)| (id.as_str(), i))
			.collect();
		let mut nodes: Vec<HierNode> = ids
			.iter()
			.map(|id| {
				let n = &store.nodes[id];
				HierNode {
					id: id.clone(),
					mass: n.mass,
					rank: None,
					order: 0.0,
					width: 1.0,
					parent: None,
					children: Vec::new(),
					is_parent: false,
					is_child: false,
				}
			})
			.collect();

		let mut edges: Vec<(usize, usize)> = Vec::new();
		for edge in store.edges.values() {
			let (Some(&from), Some(&to)) = (
				index_of.get(edge.from.as_str()),
				index_of.get(edge.to.as_str()),
			) else {
				continue;
			};
			edges.push((from, to));
			nodes[from].is_parent = true;
			nodes[to].is_child = true;
		}

		// Roots: pure parents first, heavier first; then whatever is left
		// unranked (disconnected components, cycles).
		let mut root_order: Vec<usize> = (0..nodes.len()).collect();
		root_order.sort_by(|&a, &b| {
			let av = (nodes[a].is_parent && !nodes[a].is_child) as i32;
			let bv = (nodes[b].is_parent && !nodes[b].is_child) as i32;
			bv.cmp(&av).then(nodes[b].mass.total_cmp(&nodes[a].mass))
		});
		for root in root_order {
			if nodes[root].rank.is_none() {
				nodes[root].rank = Some(0);
				self.crawl(&mut nodes, &edges, root);
			}
		}

		let max_rank = nodes.iter().filter_map(|n| n.rank).max().unwrap_or(0);
		Self::order_ranks(&mut nodes, max_rank);

		// Space the grid: x fixed, y derived from the viewport aspect so
		// deep graphs stay legible, clamped to sane limits.
		let max_order = nodes.iter().map(|n| n.order).fold(0.0f64, f64::max);
		let layout_width = max_order.max(1.0);
		let layout_height = max_rank.max(1) as f64;
		let xs_raw = viewport.width.max(1.0) / layout_width;
		let ys_raw = viewport.height.max(1.0) / layout_height;
		let y_spacing = ((ys_raw * X_SPACING) / xs_raw).clamp(100.0, 500.0);

		for hier in &nodes {
			if let Some(node) = store.nodes.get_mut(&hier.id) {
				node.destination = Some(Point::new(
					hier.order * X_SPACING,
					hier.rank.unwrap_or(0) as f64 * y_spacing,
				));
			}
		}

		LayoutJob {
			run: None,
			fit_on_complete: options.fit_on_update,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::network_graph::types::{
		EdgeDefinition, GraphData, NodeDefinition, NodeOptions,
	};
	use std::sync::Arc;

	fn viewport() -> Viewport {
		Viewport {
			width: 800.0,
			height: 600.0,
		}
	}

	fn store_with(nodes: &[&str], edges: &[(&str, &str, &str)]) -> GraphStore {
		let mut store = GraphStore::default();
		let data = GraphData {
			nodes: nodes
				.iter()
				.map(|id| {
					Arc::new(NodeDefinition {
						id: id.to_string(),
						..Default::default()
					})
				})
				.collect(),
			edges: edges
				.iter()
				.map(|(id, from, to)| {
					Arc::new(EdgeDefinition {
						id: id.to_string(),
						from: from.to_string(),
						to: to.to_string(),
						..Default::default()
					})
				})
				.collect(),
		};
		store.reconcile(&data, &NodeOptions::default());
		store
	}

	#[test]
	fn force_layout_moves_free_nodes_and_respects_pins() {
		let mut store = store_with(
			&["a", "b", "c"],
			&[("e1", "a", "b"), ("e2", "b", "c")],
		);
		store.nodes.get_mut("c").unwrap().fixed = true;
		store.nodes.get_mut("c").unwrap().position = Point::new(77.0, 77.0);

		let layouter = ForceLayouter::default();
		let mut job = layouter.start(&mut store, &LayoutOptions::default(), viewport());
		let mut run = job.run.take().expect("force layout is incremental");

		for _ in 0..30 {
			run.step(&mut store);
		}
		let a = store.nodes["a"].position;
		let b = store.nodes["b"].position;
		assert_ne!(a, Point::ZERO);
		assert_ne!(a, b, "simulation separates connected nodes");
		assert_eq!(store.nodes["c"].position, Point::new(77.0, 77.0));
	}

	#[test]
	fn force_run_finishes_and_honors_stop() {
		let mut store = store_with(&["a", "b"], &[("e1", "a", "b")]);
		let layouter = ForceLayouter {
			frames: 3,
			..Default::default()
		};
		let mut job = layouter.start(&mut store, &LayoutOptions::default(), viewport());
		let mut run = job.run.take().unwrap();
		assert!(run.step(&mut store));
		assert!(run.step(&mut store));
		assert!(!run.step(&mut store));

		let mut job = layouter.start(&mut store, &LayoutOptions::default(), viewport());
		let mut run = job.run.take().unwrap();
		run.stop();
		assert!(!run.step(&mut store), "a stopped run does not keep going");
	}

	#[test]
	fn hierarchy_ranks_a_path_graph_in_depth_order() {
		let mut store = store_with(
			&["root", "mid", "leaf"],
			&[("e1", "root", "mid"), ("e2", "mid", "leaf")],
		);
		let layouter = HierarchyLayouter::default();
		let job = layouter.start(&mut store, &LayoutOptions::default(), viewport());
		assert!(job.run.is_none());
		assert!(job.fit_on_complete);

		let y = |id: &str| store.nodes[id].destination.unwrap().y;
		assert!(y("root") < y("mid"));
		assert!(y("mid") < y("leaf"));
	}

	#[test]
	fn hierarchy_separates_siblings() {
		let mut store = store_with(
			&["p", "c1", "c2", "c3"],
			&[("e1", "p", "c1"), ("e2", "p", "c2"), ("e3", "p", "c3")],
		);
		let layouter = HierarchyLayouter::default();
		layouter.start(&mut store, &LayoutOptions::default(), viewport());

		let xs: Vec<f64> = ["c1", "c2", "c3"]
			.iter()
			.map(|id| store.nodes[*id].destination.unwrap().x)
			.collect();
		assert!(xs[0] != xs[1] && xs[1] != xs[2] && xs[0] != xs[2]);
	}

	#[test]
	fn hierarchy_assignments_glide_not_jump() {
		let mut store = store_with(&["a", "b"], &[("e1", "a", "b")]);
		store.nodes.get_mut("a").unwrap().position = Point::new(5.0, 5.0);
		let layouter = HierarchyLayouter::default();
		layouter.start(&mut store, &LayoutOptions::default(), viewport());
		// Position untouched; only the destination is set.
		assert_eq!(store.nodes["a"].position, Point::new(5.0, 5.0));
		assert!(store.nodes["a"].destination.is_some());
	}
}
