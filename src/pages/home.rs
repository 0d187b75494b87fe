use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::info;

use crate::components::detail::DetailPanel;
use crate::components::policy_graph::PolicyGraphCanvas;
use crate::components::search::SearchBox;
use crate::config::ExplorerConfig;
use crate::controller::{DetailSelection, PolicyExplorer, preload_branch_previews};
use crate::policy::{HttpTransport, PolicyFetcher};

/// The explorer page: graph canvas with search, reset and detail overlays.
#[component]
pub fn Home(#[prop(optional)] config: ExplorerConfig) -> impl IntoView {
	let origin = window().location().origin().unwrap_or_default();
	let fetcher = Rc::new(PolicyFetcher::new(
		HttpTransport::new(&origin),
		&config.data_path,
		&config.search_index_path,
	));
	let explorer = Rc::new(RefCell::new(PolicyExplorer::new(&config)));
	info!("explorer ready with {} nodes", explorer.borrow().graph().node_count());

	let search_target = RwSignal::new(None::<String>);
	let detail = RwSignal::new(None::<DetailSelection>);
	let fit_request = RwSignal::new(0u32);

	let (explorer_preload, fetcher_preload) = (explorer.clone(), fetcher.clone());
	spawn_local(async move {
		preload_branch_previews(&explorer_preload, &fetcher_preload).await;
	});

	let resolver = config.image_resolver();
	view! {
		<div class="fullscreen-graph">
			<PolicyGraphCanvas
				explorer=explorer
				fetcher=fetcher.clone()
				resolver=resolver.clone()
				search_target=search_target
				fit_request=fit_request
				on_detail=Callback::new(move |selection| detail.set(Some(selection)))
			/>
			<div class="graph-overlay">
				<h1>{config.root_title.clone()}</h1>
				<SearchBox
					fetcher=fetcher.clone()
					limit=config.search_result_limit
					on_select=Callback::new(move |slug| search_target.set(Some(slug)))
				/>
				<button class="reset-view" on:click=move |_| fit_request.update(|n| *n += 1)>
					"Reset view"
				</button>
			</div>
			<DetailPanel selection=detail fetcher=fetcher resolver=resolver />
		</div>
	}
}
