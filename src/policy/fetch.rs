use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info, warn};
use thiserror::Error;

use super::search::SearchIndex;
use super::types::{PolicyNode, PolicyResponse, SearchEntry};

#[derive(Debug, Error)]
pub enum FetchError {
	#[error("request for {url} failed: {source}")]
	Request {
		url: String,
		#[source]
		source: reqwest::Error,
	},
	#[error("{url} answered with HTTP {status}")]
	Status { url: String, status: u16 },
	#[error("could not decode {path}: {source}")]
	Decode {
		path: String,
		#[source]
		source: serde_json::Error,
	},
}

/// Read-only access to the static data store.
#[allow(async_fn_in_trait)]
pub trait Transport {
	/// Fetches the body stored at `path`, relative to the store root.
	async fn get_text(&self, path: &str) -> Result<String, FetchError>;
}

/// Fetches from the site the app is served from.
pub struct HttpTransport {
	client: reqwest::Client,
	base_url: String,
}

impl HttpTransport {
	pub fn new(base_url: &str) -> Self {
		Self {
			client: reqwest::Client::new(),
			base_url: base_url.trim_end_matches('/').to_string(),
		}
	}
}

impl Transport for HttpTransport {
	async fn get_text(&self, path: &str) -> Result<String, FetchError> {
		let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
		let response = self
			.client
			.get(&url)
			.send()
			.await
			.map_err(|source| FetchError::Request {
				url: url.clone(),
				source,
			})?;
		let status = response.status();
		if !status.is_success() {
			return Err(FetchError::Status {
				url,
				status: status.as_u16(),
			});
		}
		response
			.text()
			.await
			.map_err(|source| FetchError::Request { url, source })
	}
}

/// Data Fetcher: resolves `(level, slug)` to policy records, caching decoded
/// documents and the search index for the session. Failures are not cached.
pub struct PolicyFetcher<T> {
	transport: T,
	data_path: String,
	search_index_path: String,
	records: RefCell<HashMap<(u32, String), Rc<PolicyNode>>>,
	search: RefCell<Option<Rc<SearchIndex>>>,
}

impl<T: Transport> PolicyFetcher<T> {
	pub fn new(transport: T, data_path: &str, search_index_path: &str) -> Self {
		Self {
			transport,
			data_path: data_path.trim_matches('/').to_string(),
			search_index_path: search_index_path.trim_start_matches('/').to_string(),
			records: RefCell::new(HashMap::new()),
			search: RefCell::new(None),
		}
	}

	#[cfg(test)]
	pub fn transport(&self) -> &T {
		&self.transport
	}

	pub async fn fetch_policy(&self, level: u32, slug: &str) -> Result<Rc<PolicyNode>, FetchError> {
		let key = (level, slug.to_string());
		if let Some(hit) = self.records.borrow().get(&key) {
			return Ok(hit.clone());
		}

		let path = format!("{}/{}/{}.json", self.data_path, level, slug);
		let body = self.transport.get_text(&path).await?;
		let doc: PolicyResponse =
			serde_json::from_str(&body).map_err(|source| FetchError::Decode {
				path: path.clone(),
				source,
			})?;
		debug!("fetched {path} ({} children)", doc.policy.children().len());

		let record = Rc::new(doc.policy);
		// A concurrent fetch for the same key may have landed first; the data is
		// immutable so either copy is fine.
		self.records.borrow_mut().insert(key, record.clone());
		Ok(record)
	}

	pub async fn fetch_children(&self, level: u32, slug: &str) -> Result<Vec<PolicyNode>, FetchError> {
		let record = self.fetch_policy(level, slug).await?;
		Ok(record.children().to_vec())
	}

	/// Loads the search index once. An unavailable index searches as empty and
	/// is retried on the next call.
	pub async fn search_index(&self) -> Rc<SearchIndex> {
		if let Some(index) = self.search.borrow().as_ref() {
			return index.clone();
		}

		match self.load_search_index().await {
			Ok(index) => {
				info!("search index loaded ({} entries)", index.len());
				let index = Rc::new(index);
				*self.search.borrow_mut() = Some(index.clone());
				index
			}
			Err(err) => {
				warn!("search index unavailable: {err}");
				Rc::new(SearchIndex::default())
			}
		}
	}

	async fn load_search_index(&self) -> Result<SearchIndex, FetchError> {
		let body = self.transport.get_text(&self.search_index_path).await?;
		let entries: Vec<SearchEntry> =
			serde_json::from_str(&body).map_err(|source| FetchError::Decode {
				path: self.search_index_path.clone(),
				source,
			})?;
		Ok(SearchIndex::new(entries))
	}
}


#[cfg(test)]
mod tests {
	use futures::executor::block_on;

	use super::testing::*;
	use super::*;

	#[test]
	fn caches_records_per_key() {
		let fetcher = fixture_fetcher();
		let first = block_on(fetcher.fetch_children(1, "A")).unwrap();
		let second = block_on(fetcher.fetch_children(1, "A")).unwrap();
		assert_eq!(first.len(), 3);
		assert_eq!(first, second);
		assert_eq!(fetcher.transport().calls("data/policy/1/A.json"), 1);
	}

	#[test]
	fn missing_document_is_an_error_and_not_cached() {
		let fetcher = fixture_fetcher();
		let err = block_on(fetcher.fetch_children(1, "D")).unwrap_err();
		assert!(matches!(err, FetchError::Status { status: 404, .. }));
		let _ = block_on(fetcher.fetch_children(1, "D"));
		assert_eq!(fetcher.transport().calls("data/policy/1/D.json"), 2);
	}

	#[test]
	fn malformed_document_reports_decode_error() {
		let mut transport = MemoryTransport::default();
		transport.insert("data/policy/1/A.json", "{ not json");
		let fetcher = PolicyFetcher::new(transport, "/data/policy/", "search-index.json");
		let err = block_on(fetcher.fetch_policy(1, "A")).unwrap_err();
		assert!(matches!(err, FetchError::Decode { .. }));
	}

	#[test]
	fn search_index_loads_once() {
		let fetcher = fixture_fetcher();
		let index = block_on(fetcher.search_index());
		assert_eq!(index.len(), 2);
		let _ = block_on(fetcher.search_index());
		assert_eq!(fetcher.transport().calls("search-index.json"), 1);
	}

	#[test]
	fn unavailable_search_index_is_empty_and_retried() {
		let fetcher = PolicyFetcher::new(MemoryTransport::default(), "data/policy", "search-index.json");
		assert!(block_on(fetcher.search_index()).is_empty());
		assert!(block_on(fetcher.search_index()).is_empty());
		assert_eq!(fetcher.transport().calls("search-index.json"), 2);
	}
}
