use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent, Window,
};

use super::camera::CameraTarget;
use super::geometry::Point;
use super::interaction::{PointerInput, PointerKind};
use super::layout::Layouter;
use super::render::{self, ImageTable, Layers, NodeDrawFn, ShapeDrawFn};
use super::state::{FrameThrottle, NetworkState, ShouldRunLayout};
use super::types::{GraphData, GraphEvent, NetworkOptions, ShapeDefinition, Viewport};

/// Mouse/keyboard callback: semantic event plus the raw browser event.
pub type MouseEventCallback = Rc<dyn Fn(GraphEvent, MouseEvent)>;
/// Receives the imperative handle once the component has mounted.
pub type ReadyCallback = Rc<dyn Fn(NetworkHandle)>;

/// Imperative surface handed to the caller on mount.
#[derive(Clone)]
pub struct NetworkHandle {
	state: Rc<RefCell<NetworkState>>,
}

impl NetworkHandle {
	/// Current node positions by id.
	pub fn positions(&self) -> HashMap<String, Point> {
		self.state.borrow().node_positions()
	}

	/// Current camera pan/scale.
	pub fn camera(&self) -> CameraTarget {
		self.state.borrow().camera_state()
	}

	/// Animated fit of the whole graph into the viewport.
	pub fn fit(&self) {
		self.state.borrow_mut().fit();
	}

	/// Animated zoom step, as bound to zoom buttons.
	pub fn zoom_step(&self, zoom_in: bool) {
		self.state.borrow_mut().zoom_step(zoom_in);
	}

	/// Animated zoom onto the most recent selection.
	pub fn zoom_selection(&self) {
		self.state.borrow_mut().zoom_selection();
	}
}

#[component]
pub fn NetworkGraphCanvas(
	#[prop(into)] data: Signal<GraphData>,
	#[prop(optional, into)] shapes: Option<Signal<Vec<Arc<ShapeDefinition>>>>,
	#[prop(optional, into)] options: Option<Signal<NetworkOptions>>,
	#[prop(optional, into)] images: Option<ImageTable>,
	#[prop(optional, into)] layouter: Option<Rc<dyn Layouter>>,
	#[prop(optional, into)] node_drawing_function: Option<NodeDrawFn>,
	#[prop(optional, into)] shape_drawing_function: Option<ShapeDrawFn>,
	#[prop(optional, into)] on_mouse: Option<MouseEventCallback>,
	#[prop(optional, into)] on_ready: Option<ReadyCallback>,
	#[prop(optional, into)] should_run_layouter: Option<ShouldRunLayout>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let shapes_ref = NodeRef::<leptos::html::Canvas>::new();
	let edges_ref = NodeRef::<leptos::html::Canvas>::new();
	let nodes_ref = NodeRef::<leptos::html::Canvas>::new();
	let overlay_ref = NodeRef::<leptos::html::Canvas>::new();

	let state = Rc::new(RefCell::new(NetworkState::new(
		NetworkOptions::default(),
		Viewport::default(),
	)));
	{
		let mut st = state.borrow_mut();
		if let Some(layouter) = layouter {
			st.install_layouter(layouter);
		}
		st.set_should_run_layout(should_run_layouter);
	}

	let images: Rc<ImageTable> = Rc::new(images.unwrap_or_default());
	let layers: Rc<RefCell<Option<Layers>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let anim_request = Rc::new(Cell::new(0i32));

	let context_of = |canvas: &HtmlCanvasElement| -> CanvasRenderingContext2d {
		canvas
			.get_context("2d")
			.unwrap()
			.unwrap()
			.dyn_into()
			.unwrap()
	};

	// Mount: size the canvas stack, build the layer contexts, hand out the
	// imperative handle and start the frame loop.
	let (state_init, layers_init, animate_init, resize_cb_init, anim_request_init) = (
		state.clone(),
		layers.clone(),
		animate.clone(),
		resize_cb.clone(),
		anim_request.clone(),
	);
	let (images_init, ndf_init, sdf_init) = (
		images.clone(),
		node_drawing_function.clone(),
		shape_drawing_function.clone(),
	);
	Effect::new(move |_| {
		let (Some(shapes_c), Some(edges_c), Some(nodes_c), Some(overlay_c)) = (
			shapes_ref.get(),
			edges_ref.get(),
			nodes_ref.get(),
			overlay_ref.get(),
		) else {
			return;
		};
		let stack: [HtmlCanvasElement; 4] = [
			shapes_c.into(),
			edges_c.into(),
			nodes_c.into(),
			overlay_c.into(),
		];
		let window: Window = web_sys::window().unwrap();

		let measure = {
			let parent = stack[0].parent_element();
			move |window: &Window| -> (f64, f64) {
				if fullscreen {
					(
						window.inner_width().unwrap().as_f64().unwrap(),
						window.inner_height().unwrap().as_f64().unwrap(),
					)
				} else {
					(
						width.unwrap_or_else(|| {
							parent
								.as_ref()
								.map(|p| p.client_width() as f64)
								.unwrap_or(800.0)
						}),
						height.unwrap_or_else(|| {
							parent
								.as_ref()
								.map(|p| p.client_height() as f64)
								.unwrap_or(600.0)
						}),
					)
				}
			}
		};

		let (w, h) = measure(&window);
		for canvas in &stack {
			canvas.set_width(w as u32);
			canvas.set_height(h as u32);
		}
		state_init.borrow_mut().resize(Viewport {
			width: w,
			height: h,
		});

		*layers_init.borrow_mut() = Some(Layers {
			shapes: context_of(&stack[0]),
			edges: context_of(&stack[1]),
			nodes: context_of(&stack[2]),
			overlay: context_of(&stack[3]),
		});

		if let Some(ready) = &on_ready {
			ready(NetworkHandle {
				state: state_init.clone(),
			});
		}

		if fullscreen {
			let (state_resize, stack_resize) = (state_init.clone(), stack.clone());
			let measure_resize = measure.clone();
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let win: Window = web_sys::window().unwrap();
				let (nw, nh) = measure_resize(&win);
				for canvas in &stack_resize {
					canvas.set_width(nw as u32);
					canvas.set_height(nh as u32);
				}
				state_resize.borrow_mut().resize(Viewport {
					width: nw,
					height: nh,
				});
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ = window
					.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		// The continuously re-armed frame callback: re-queue immediately,
		// then bail out cheaply until the frame budget has elapsed.
		let (state_anim, layers_anim, animate_inner, anim_request_anim) = (
			state_init.clone(),
			layers_init.clone(),
			animate_init.clone(),
			anim_request_init.clone(),
		);
		let (images_anim, ndf_anim, sdf_anim) =
			(images_init.clone(), ndf_init.clone(), sdf_init.clone());
		let mut throttle = FrameThrottle::default();
		*animate_init.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
			if let Some(ref cb) = *animate_inner.borrow() {
				if let Ok(id) = web_sys::window()
					.unwrap()
					.request_animation_frame(cb.as_ref().unchecked_ref())
				{
					anim_request_anim.set(id);
				}
			}
			if !throttle.should_run(timestamp) {
				return;
			}
			let mut st = state_anim.borrow_mut();
			st.tick(timestamp);
			if st.needs_draw() {
				if let Some(layers) = &*layers_anim.borrow() {
					render::draw_frame(
						&st,
						layers,
						&images_anim,
						ndf_anim.as_ref(),
						sdf_anim.as_ref(),
					);
				}
				st.mark_drawn();
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			if let Ok(id) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
				anim_request_init.set(id);
			}
		}
	});

	// Declarative inputs: reconcile whenever the graph or shape snapshot
	// changes.
	let state_data = state.clone();
	Effect::new(move |_| {
		let graph = data.get();
		let shape_defs = shapes.map(|s| s.get()).unwrap_or_default();
		state_data.borrow_mut().set_graph(&graph, &shape_defs);
	});

	if let Some(options) = options {
		let state_options = state.clone();
		Effect::new(move |_| {
			state_options.borrow_mut().set_options(options.get());
		});
	}

	// Unmount: stop the frame loop and the resize listener.
	// `on_cleanup` requires `Send + Sync`; the captured `Rc` state is not.
	// In single-threaded CSR, `SendWrapper` satisfies the bound without
	// changing behavior.
	let cleanup_data = send_wrapper::SendWrapper::new((
		state.clone(),
		animate.clone(),
		resize_cb.clone(),
		anim_request.clone(),
	));
	on_cleanup(move || {
		let (state_cleanup, animate_cleanup, resize_cleanup, anim_request_cleanup) =
			&*cleanup_data;
		if let Some(window) = web_sys::window() {
			let _ = window.cancel_animation_frame(anim_request_cleanup.get());
			if let Some(ref cb) = *resize_cleanup.borrow() {
				let _ = window
					.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}
		animate_cleanup.borrow_mut().take();
		state_cleanup.borrow_mut().interaction.clear_hover();
	});

	let dispatch: Rc<dyn Fn(PointerKind, MouseEvent)> = {
		let state = state.clone();
		Rc::new(move |kind: PointerKind, ev: MouseEvent| {
			let Some(canvas) = overlay_ref.get_untracked() else {
				return;
			};
			let canvas: HtmlCanvasElement = canvas.into();
			ev.prevent_default();
			let _ = canvas.focus();
			let rect = canvas.get_bounding_client_rect();
			let input = PointerInput {
				kind,
				screen: Point::new(
					ev.client_x() as f64 - rect.left(),
					ev.client_y() as f64 - rect.top(),
				),
				movement: Point::new(ev.movement_x() as f64, ev.movement_y() as f64),
				modifier: ev.ctrl_key() || ev.meta_key() || ev.shift_key(),
			};
			let events = state.borrow_mut().pointer(input, js_sys::Date::now());
			if let Some(cb) = &on_mouse {
				for event in events {
					cb(event, ev.clone());
				}
			}
		})
	};

	let on_mousedown = {
		let dispatch = dispatch.clone();
		move |ev: MouseEvent| dispatch(PointerKind::Down, ev)
	};
	let on_mousemove = {
		let dispatch = dispatch.clone();
		move |ev: MouseEvent| dispatch(PointerKind::Move, ev)
	};
	let on_mouseup = {
		let dispatch = dispatch.clone();
		move |ev: MouseEvent| dispatch(PointerKind::Up, ev)
	};
	let on_mouseleave = {
		let dispatch = dispatch.clone();
		move |ev: MouseEvent| dispatch(PointerKind::Leave, ev)
	};
	let on_dblclick = {
		let dispatch = dispatch.clone();
		move |ev: MouseEvent| dispatch(PointerKind::DoubleClick, ev)
	};

	let state_wheel = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		ev.stop_propagation();
		let Some(canvas) = overlay_ref.get_untracked() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let rect = canvas.get_bounding_client_rect();
		let screen = Point::new(
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		);
		state_wheel.borrow_mut().wheel_zoom(screen, ev.delta_y());
	};

	let state_keydown = state.clone();
	let on_keydown = move |ev: KeyboardEvent| {
		state_keydown.borrow_mut().key(&ev.key(), true);
	};
	let state_keyup = state.clone();
	let on_keyup = move |ev: KeyboardEvent| {
		state_keyup.borrow_mut().key(&ev.key(), false);
	};

	let layer_style = "display: block; position: absolute; top: 0; left: 0;";
	view! {
		<div
			class="network-graph-canvas"
			style="display: block; position: relative; width: 100%; height: 100%; overflow: hidden;"
		>
			<canvas node_ref=shapes_ref style=layer_style />
			<canvas node_ref=edges_ref style=layer_style />
			<canvas node_ref=nodes_ref style=layer_style />
			<canvas
				node_ref=overlay_ref
				tabindex="0"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:dblclick=on_dblclick
				on:wheel=on_wheel
				on:keydown=on_keydown
				on:keyup=on_keyup
				style="display: block; position: absolute; top: 0; left: 0; cursor: grab; outline: none;"
			/>
		</div>
	}
}
