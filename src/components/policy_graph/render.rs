use std::collections::HashMap;
use std::f64::consts::PI;

use log::warn;
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use super::state::{ViewState, draw_order};
use crate::graph::{GraphNode, PolicyGraph};
use crate::layout::node_size;
use crate::policy::{Cover, ImageResolver, NodeKind};

const BACKGROUND: &str = "#1a1a2e";
const CARD_FILL: &str = "#24243e";
const COVER_FILL: &str = "#2f2f4f";
const ACCENT: &str = "255, 103, 31";
const CORNER: f64 = 16.0;
const CAPTION_HEIGHT: f64 = 96.0;
const CAPTION_PADDING: f64 = 14.0;
const DIMMED_ALPHA: f64 = 0.25;
const TITLE_LINES: usize = 3;

/// Browser images keyed by URL, loaded lazily on first draw.
#[derive(Default)]
pub struct ImageCache {
	images: HashMap<String, HtmlImageElement>,
}

impl ImageCache {
	/// The image for `url` once it has decoded; starts loading it otherwise.
	pub fn ready(&mut self, url: &str) -> Option<&HtmlImageElement> {
		if !self.images.contains_key(url) {
			match HtmlImageElement::new() {
				Ok(img) => {
					img.set_src(url);
					self.images.insert(url.to_string(), img);
				}
				Err(err) => {
					warn!("cannot create image for {url}: {err:?}");
					return None;
				}
			}
		}
		self.images
			.get(url)
			.filter(|img| img.complete() && img.natural_width() > 0)
	}

	/// Whether any requested image is still decoding.
	pub fn pending(&self) -> bool {
		self.images.values().any(|img| !img.complete())
	}
}

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

fn accent(alpha: f64) -> String {
	format!("rgba({ACCENT}, {alpha})")
}

pub fn render(state: &mut ViewState, graph: &PolicyGraph, resolver: &ImageResolver, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, graph, ctx);
	for node in draw_order(graph) {
		draw_card(state, node, resolver, ctx);
	}
	ctx.restore();
}

fn draw_edges(state: &ViewState, graph: &PolicyGraph, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let (line_width, dash, gap) = (1.5 / k, 8.0 / k, 4.0 / k);
	let dash_offset = -(state.flow_time * 30.0) % (dash + gap);
	let t = ease_out_cubic(state.hover.highlight_t);

	for edge in graph.edges().iter().filter(|e| !e.hidden) {
		let (Some(a), Some(b)) = (graph.node(&edge.source), graph.node(&edge.target)) else {
			continue;
		};
		let (alpha, width) = if edge.emphasized {
			(0.6 + 0.4 * t, line_width * (1.0 + 0.8 * t))
		} else if edge.faded {
			// A selection fades fully at once; hover fades eased.
			let t = if graph.selected().is_some() { 1.0 } else { t };
			(0.6 - 0.45 * t, line_width * (1.0 - 0.3 * t))
		} else {
			(0.6, line_width)
		};

		if edge.emphasized {
			ctx.set_stroke_style_str(&accent(alpha));
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(dash),
				&JsValue::from_f64(gap),
			));
			ctx.set_line_dash_offset(dash_offset);
		} else {
			ctx.set_stroke_style_str(&format!("rgba(100, 180, 255, {alpha})"));
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}
		ctx.set_line_width(width);
		ctx.begin_path();
		ctx.move_to(a.position.x, a.position.y);
		ctx.line_to(b.position.x, b.position.y);
		ctx.stroke();
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_card(state: &mut ViewState, node: &GraphNode, resolver: &ImageResolver, ctx: &CanvasRenderingContext2d) {
	let size = node_size(node);
	let (w, h) = (size.width, size.height);
	let (x, y) = (node.position.x - w / 2.0, node.position.y - h / 2.0);
	let hovered = state.hover.node.as_deref() == Some(node.id.as_str());
	let t = ease_out_cubic(state.hover.highlight_t);

	ctx.set_global_alpha(if node.dimmed { DIMMED_ALPHA } else { 1.0 });

	if node.highlighted {
		let glow = if hovered { 12.0 + 20.0 * t } else { 16.0 };
		ctx.set_shadow_color(&accent(0.7));
		ctx.set_shadow_blur(glow * state.transform.k);
	}
	rounded_rect(ctx, x, y, w, h, CORNER);
	ctx.set_fill_style_str(CARD_FILL);
	ctx.fill();
	ctx.set_shadow_blur(0.0);

	ctx.save();
	rounded_rect(ctx, x, y, w, h, CORNER);
	ctx.clip();
	draw_cover(state, node, resolver, ctx, (x, y, w, h - CAPTION_HEIGHT));
	ctx.restore();

	draw_caption(node, ctx, (x, y + h - CAPTION_HEIGHT, w, CAPTION_HEIGHT));

	rounded_rect(ctx, x, y, w, h, CORNER);
	if node.highlighted {
		ctx.set_stroke_style_str(&accent(if hovered { 0.6 + 0.4 * t } else { 1.0 }));
		ctx.set_line_width(4.0);
	} else {
		ctx.set_stroke_style_str("rgba(255, 255, 255, 0.15)");
		ctx.set_line_width(1.5);
	}
	ctx.stroke();

	if node.loading {
		draw_spinner(state.flow_time, ctx, node.position.x, y + (h - CAPTION_HEIGHT) / 2.0);
	}
	ctx.set_global_alpha(1.0);
}

fn draw_cover(
	state: &mut ViewState,
	node: &GraphNode,
	resolver: &ImageResolver,
	ctx: &CanvasRenderingContext2d,
	(x, y, w, h): (f64, f64, f64, f64),
) {
	ctx.set_fill_style_str(COVER_FILL);
	ctx.fill_rect(x, y, w, h);

	match resolver.cover(node.image.as_deref(), &node.child_preview_images) {
		Cover::Image(url) => {
			if !draw_image(state, ctx, &url, (x, y, w, h)) {
				draw_image(state, ctx, resolver.placeholder(), (x, y, w, h));
			}
		}
		Cover::Mosaic(urls) => {
			let (tw, th) = (w / 2.0, h / 2.0);
			for (i, url) in urls.iter().enumerate() {
				let (col, row) = ((i % 2) as f64, (i / 2) as f64);
				draw_image(state, ctx, url, (x + col * tw, y + row * th, tw, th));
			}
		}
		Cover::Placeholder(url) => {
			draw_image(state, ctx, &url, (x, y, w, h));
		}
	}
}

/// Draws an image scaled to cover the box, cropping the overflow.
fn draw_image(state: &mut ViewState, ctx: &CanvasRenderingContext2d, url: &str, (dx, dy, dw, dh): (f64, f64, f64, f64)) -> bool {
	let Some(img) = state.images.ready(url) else {
		return false;
	};
	let (iw, ih) = (img.natural_width() as f64, img.natural_height() as f64);
	let scale = (dw / iw).max(dh / ih);
	let (sw, sh) = (dw / scale, dh / scale);
	let _ = ctx.draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
		img,
		(iw - sw) / 2.0,
		(ih - sh) / 2.0,
		sw,
		sh,
		dx,
		dy,
		dw,
		dh,
	);
	true
}

fn draw_caption(node: &GraphNode, ctx: &CanvasRenderingContext2d, (x, y, w, _h): (f64, f64, f64, f64)) {
	let font_size = if node.is_root() { 22.0 } else { 17.0 };
	ctx.set_font(&format!("600 {font_size}px sans-serif"));
	ctx.set_fill_style_str("white");
	let max_width = w - 2.0 * CAPTION_PADDING - 20.0;
	for (i, line) in wrap_title(ctx, &node.title, max_width).iter().enumerate() {
		let baseline = y + CAPTION_PADDING + font_size + i as f64 * (font_size + 4.0);
		let _ = ctx.fill_text(line, x + CAPTION_PADDING, baseline);
	}

	if node.kind == NodeKind::Folder && !node.is_root() {
		let marker = if node.expanded { "−" } else { "+" };
		ctx.set_font("700 20px sans-serif");
		ctx.set_fill_style_str(&accent(1.0));
		let _ = ctx.fill_text(marker, x + w - CAPTION_PADDING - 12.0, y + CAPTION_PADDING + 18.0);
	}
}

fn text_width(ctx: &CanvasRenderingContext2d, text: &str) -> f64 {
	ctx.measure_text(text).map(|m| m.width()).unwrap_or(0.0)
}

/// Breaks a title into at most `TITLE_LINES` lines, per character since
/// Thai titles carry no spaces between words.
fn wrap_title(ctx: &CanvasRenderingContext2d, title: &str, max_width: f64) -> Vec<String> {
	let mut lines = Vec::new();
	let mut line = String::new();
	for ch in title.chars() {
		let mut candidate = line.clone();
		candidate.push(ch);
		if line.is_empty() || text_width(ctx, &candidate) <= max_width {
			line = candidate;
			continue;
		}
		lines.push(std::mem::take(&mut line));
		if lines.len() == TITLE_LINES {
			if let Some(last) = lines.last_mut() {
				last.pop();
				last.push('…');
			}
			return lines;
		}
		if !ch.is_whitespace() {
			line.push(ch);
		}
	}
	if !line.is_empty() {
		lines.push(line);
	}
	lines
}

fn draw_spinner(time: f64, ctx: &CanvasRenderingContext2d, cx: f64, cy: f64) {
	ctx.begin_path();
	let _ = ctx.arc(cx, cy, 34.0, 0.0, 2.0 * PI);
	ctx.set_fill_style_str("rgba(0, 0, 0, 0.55)");
	ctx.fill();

	let start = time * 6.0;
	ctx.begin_path();
	let _ = ctx.arc(cx, cy, 22.0, start, start + 1.5 * PI);
	ctx.set_stroke_style_str(&accent(1.0));
	ctx.set_line_width(5.0);
	ctx.stroke();
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
	ctx.begin_path();
	ctx.move_to(x + r, y);
	let _ = ctx.arc_to(x + w, y, x + w, y + h, r);
	let _ = ctx.arc_to(x + w, y + h, x, y + h, r);
	let _ = ctx.arc_to(x, y + h, x, y, r);
	let _ = ctx.arc_to(x, y, x + w, y, r);
	ctx.close_path();
}
