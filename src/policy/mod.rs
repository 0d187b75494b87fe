mod fetch;
mod image;
mod search;
mod types;

pub use fetch::{FetchError, HttpTransport, PolicyFetcher, Transport};
pub use image::{Cover, ImageResolver};
pub use types::{ContentBlock, NodeKind, PolicyNode, SearchEntry};

#[cfg(test)]
pub(crate) use fetch::testing;
