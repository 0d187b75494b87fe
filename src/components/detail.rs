use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::warn;

use crate::controller::DetailSelection;
use crate::policy::{HttpTransport, ImageResolver, PolicyFetcher, PolicyNode};

/// Side panel for the selected leaf. Shows what the graph already knows at
/// once and swaps in the full record when it arrives.
#[component]
pub fn DetailPanel(
	selection: RwSignal<Option<DetailSelection>>,
	fetcher: Rc<PolicyFetcher<HttpTransport>>,
	resolver: ImageResolver,
) -> impl IntoView {
	let full = RwSignal::new(None::<PolicyNode>);

	Effect::new(move |_| {
		full.set(None);
		let Some(selected) = selection.get() else {
			return;
		};
		let Some(level) = selected.node.level else {
			return;
		};
		let fetcher = fetcher.clone();
		spawn_local(async move {
			let slug = selected.node.slug;
			match fetcher.fetch_policy(level, &slug).await {
				Ok(record) => {
					let current = selection.with_untracked(|s| s.as_ref().is_some_and(|s| s.node.slug == slug));
					if current {
						full.set(Some((*record).clone()));
					}
				}
				Err(err) => warn!("details for {slug} unavailable: {err}"),
			}
		});
	});

	view! {
		{move || {
			let selected = selection.get()?;
			let node = full.get().unwrap_or(selected.node);
			let image = resolver.image_url(node.image.as_deref());
			let crumbs = selected
				.breadcrumbs
				.into_iter()
				.map(|n| view! { <li>{n.title}</li> })
				.collect_view();
			Some(view! {
				<aside class="detail-panel">
					<button class="detail-close" on:click=move |_| selection.set(None)>"×"</button>
					<ol class="breadcrumbs">{crumbs}</ol>
					{record_view(image, node)}
				</aside>
			})
		}}
	}
}

fn record_view(image: Option<String>, node: PolicyNode) -> impl IntoView {
	let blocks = node.content_blocks.unwrap_or_default();
	let body = if blocks.is_empty() {
		node.content
			.map(|c| view! { <div class="detail-content">{c}</div> }.into_any())
	} else {
		Some(
			blocks
				.into_iter()
				.map(|block| {
					view! {
						<section class=format!("detail-block detail-block-{}", block.kind)>
							{block.title.map(|t| view! { <h3>{t}</h3> })}
							<div inner_html=block.content></div>
						</section>
					}
				})
				.collect_view()
				.into_any(),
		)
	};

	view! {
		<article class="detail-record">
			{image.map(|src| view! { <img class="detail-image" src=src alt=node.title.clone() /> })}
			<h2>{node.title.clone()}</h2>
			{node.summary.map(|s| view! { <p class="detail-summary">{s}</p> })}
			{body}
		</article>
	}
}
