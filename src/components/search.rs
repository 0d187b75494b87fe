use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::policy::{HttpTransport, PolicyFetcher, SearchEntry};

/// Search field over the flattened policy index. Picking a result hands its
/// slug to `on_select` and clears the field.
#[component]
pub fn SearchBox(
	fetcher: Rc<PolicyFetcher<HttpTransport>>,
	limit: usize,
	on_select: Callback<String>,
) -> impl IntoView {
	let query = RwSignal::new(String::new());
	let results = RwSignal::new(Vec::<SearchEntry>::new());

	let on_input = move |ev: leptos::ev::Event| {
		let term = event_target_value(&ev);
		query.set(term.clone());
		if term.trim().is_empty() {
			results.set(Vec::new());
			return;
		}
		let fetcher = fetcher.clone();
		spawn_local(async move {
			let index = fetcher.search_index().await;
			// A newer keystroke owns the result list.
			if query.get_untracked() != term {
				return;
			}
			results.set(index.query(&term, limit).into_iter().cloned().collect());
		});
	};

	view! {
		<div class="policy-search">
			<input
				type="search"
				placeholder="Search policies"
				prop:value=move || query.get()
				on:input=on_input
			/>
			<ul class="policy-search-results">
				{move || {
					results
						.get()
						.into_iter()
						.map(|entry| {
							let slug = entry.slug.clone();
							view! {
								<li on:click=move |_| {
									query.set(String::new());
									results.set(Vec::new());
									on_select.run(slug.clone());
								}>
									<span class="result-title">{entry.title}</span>
									<span class="result-summary">{entry.summary}</span>
								</li>
							}
						})
						.collect_view()
				}}
			</ul>
		</div>
	}
}
