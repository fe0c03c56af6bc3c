use std::rc::Rc;
use std::sync::Arc;

use leptos::prelude::*;
use log::info;

use crate::components::network_graph::{
	EdgeDefinition, GraphData, MouseEventCallback, NetworkGraphCanvas, NodeDefinition,
};

/// Generate sample graph data (random tree similar to the JS example).
fn generate_sample_data(n: usize) -> GraphData {
	let nodes: Vec<Arc<NodeDefinition>> = (0..n)
		.map(|i| {
			Arc::new(NodeDefinition {
				id: i.to_string(),
				label: if i < 10 {
					Some(format!("Node {}", i))
				} else {
					None
				},
				inner_label: Some(i.to_string()),
				..Default::default()
			})
		})
		.collect();

	let edges: Vec<Arc<EdgeDefinition>> = (1..n)
		.map(|i| {
			let target = (rand_simple(i) * (i as f64)) as usize;
			Arc::new(EdgeDefinition {
				id: format!("e{}", i),
				from: i.to_string(),
				to: target.to_string(),
				..Default::default()
			})
		})
		.collect();

	GraphData { nodes, edges }
}

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	// Create graph data signal
	let graph_data = Signal::derive(move || generate_sample_data(100));

	let on_mouse: MouseEventCallback = Rc::new(|event, _raw| {
		info!("graph event: {:?}", event);
	});
	// The view closure (an `ErrorBoundary` child) must be `Send`; the `Rc`
	// callback is not. `SendWrapper` bridges this in single-threaded CSR.
	let on_mouse = send_wrapper::SendWrapper::new(on_mouse);

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<NetworkGraphCanvas data=graph_data fullscreen=true on_mouse=(*on_mouse).clone() />
				<div class="graph-overlay">
					<h1>"Network Graph"</h1>
					<p class="subtitle">
						"Drag nodes to reposition. Scroll to zoom. Drag background to pan. Double-click empty space to zoom in."
					</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
