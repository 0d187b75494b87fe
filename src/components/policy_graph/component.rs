use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, error};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::render;
use super::state::ViewState;
use crate::controller::{Activation, DetailSelection, PolicyExplorer, activate, resolve_search_target};
use crate::policy::{HttpTransport, ImageResolver, PolicyFetcher};

const FRAME_DT: f32 = 0.016;

fn viewport(window: &Window) -> (f64, f64) {
	let w = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0);
	let h = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0);
	(w, h)
}

fn canvas_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((ev.client_x() as f64 - rect.left(), ev.client_y() as f64 - rect.top()))
}

/// Full-window canvas rendering the policy graph.
///
/// Clicks drive the explorer, background drags pan and the wheel zooms.
/// Setting `search_target` reveals that node and reports it through
/// `on_detail`; bumping `fit_request` re-frames the visible graph.
#[component]
pub fn PolicyGraphCanvas(
	explorer: Rc<RefCell<PolicyExplorer>>,
	fetcher: Rc<PolicyFetcher<HttpTransport>>,
	resolver: ImageResolver,
	#[prop(into)] search_target: Signal<Option<String>>,
	#[prop(into)] fit_request: Signal<u32>,
	on_detail: Callback<DetailSelection>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Rc<RefCell<Option<ViewState>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (state_init, animate_init, resize_cb_init, explorer_init) =
		(state.clone(), animate.clone(), resize_cb.clone(), explorer.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = viewport(&window);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx: CanvasRenderingContext2d = match canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into().ok())
		{
			Some(ctx) => ctx,
			None => {
				error!("canvas 2d context unavailable");
				return;
			}
		};
		*state_init.borrow_mut() = Some(ViewState::new(w, h));
		explorer_init.borrow_mut().resize(w, h);

		let (state_resize, explorer_resize, canvas_resize) =
			(state_init.clone(), explorer_init.clone(), canvas.clone());
		*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
			let Some(win) = web_sys::window() else {
				return;
			};
			let (nw, nh) = viewport(&win);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			if let Some(ref mut s) = *state_resize.borrow_mut() {
				s.resize(nw, nh);
			}
			explorer_resize.borrow_mut().resize(nw, nh);
		}));
		if let Some(ref cb) = *resize_cb_init.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let (state_anim, explorer_anim, animate_inner, resolver) = (
			state_init.clone(),
			explorer_init.clone(),
			animate_init.clone(),
			resolver.clone(),
		);
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			let moved = explorer_anim.borrow_mut().tick(FRAME_DT);
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				let explorer = explorer_anim.borrow();
				s.tick(FRAME_DT);
				if s.wants_frame(explorer.revision()) || moved {
					if s.needs_fit {
						s.fit(explorer.graph());
					}
					render::render(s, explorer.graph(), &resolver, &ctx);
					s.settle(explorer.graph());
				}
			}
			if let Some(ref cb) = *animate_inner.borrow() {
				if let Some(win) = web_sys::window() {
					let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
				}
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_fit = state.clone();
	Effect::new(move |_| {
		fit_request.track();
		if let Some(ref mut s) = *state_fit.borrow_mut() {
			s.needs_fit = true;
		}
	});

	let (state_search, explorer_search, fetcher_search) = (state.clone(), explorer.clone(), fetcher.clone());
	Effect::new(move |_| {
		let Some(target) = search_target.get() else {
			return;
		};
		let (state, explorer, fetcher) = (state_search.clone(), explorer_search.clone(), fetcher_search.clone());
		spawn_local(async move {
			let Some(detail) = resolve_search_target(&explorer, &fetcher, &target).await else {
				return;
			};
			if let Some(s) = state.borrow_mut().as_mut() {
				s.focus_node(explorer.borrow().graph(), &target);
			}
			on_detail.run(detail);
		});
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.begin_pan(x, y);
		}
	};

	let (state_mm, explorer_mm) = (state.clone(), explorer.clone());
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			if s.pan.active {
				s.pan_to(x, y);
				return;
			}
			let mut explorer = explorer_mm.borrow_mut();
			let hovered = s.node_at(explorer.graph(), x, y).map(|n| n.id.clone());
			if s.set_hover(hovered.as_deref()) {
				explorer.hover(hovered.as_deref());
			}
		}
	};

	let (state_mu, explorer_mu, fetcher_mu) = (state.clone(), explorer.clone(), fetcher.clone());
	let on_mouseup = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		let clicked = {
			let mut view = state_mu.borrow_mut();
			let Some(s) = view.as_mut() else {
				return;
			};
			if !s.end_pan() {
				return;
			}
			s.node_at(explorer_mu.borrow().graph(), x, y).map(|n| n.id.clone())
		};
		let Some(id) = clicked else {
			explorer_mu.borrow_mut().clear_selection();
			return;
		};
		let (state, explorer, fetcher) = (state_mu.clone(), explorer_mu.clone(), fetcher_mu.clone());
		spawn_local(async move {
			let outcome = activate(&explorer, &fetcher, &id).await;
			debug!("activated {id}: {outcome:?}");
			match outcome {
				Activation::Expanded => {
					if let Some(s) = state.borrow_mut().as_mut() {
						s.focus_node(explorer.borrow().graph(), &id);
					}
				}
				Activation::Detail(detail) => on_detail.run(detail),
				_ => {}
			}
		});
	};

	let (state_ml, explorer_ml) = (state.clone(), explorer.clone());
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.end_pan();
			if s.set_hover(None) {
				explorer_ml.borrow_mut().hover(None);
			}
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			s.zoom_at(x, y, factor);
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="policy-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
