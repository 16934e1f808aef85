use std::{future::Future, sync::Arc, time::Duration};

use axum::body::Bytes;
use moka::future::Cache;

const MAX_CAPACITY: u64 = 1024;

/// Feeds whose rendered pages are cached.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum CachedFeed {
	Global,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct FeedKey {
	pub feed: CachedFeed,
	pub page: i64,
}

impl FeedKey {
	pub fn global(page: i64) -> Self {
		Self {
			feed: CachedFeed::Global,
			page: page.max(1),
		}
	}
}

/// Process-wide cache of rendered feed pages.
///
/// Entries expire after a fixed time-to-live; nothing else invalidates
/// them, so new posts only show up once the page expires or the cache
/// is cleared.
#[derive(Clone)]
pub struct FeedCache {
	inner: Cache<FeedKey, Bytes>,
}

impl FeedCache {
	pub fn new(ttl: Duration) -> Self {
		Self {
			inner: Cache::builder()
				.max_capacity(MAX_CAPACITY)
				.time_to_live(ttl)
				.build(),
		}
	}

	/// Returns the cached page for `key`, rendering it with `compute` on a
	/// miss. Concurrent misses for the same key share a single render.
	///
	/// Failed renders are not cached.
	pub async fn get_or_compute<F, Fut, E>(&self, key: FeedKey, compute: F) -> Result<Bytes, Arc<E>>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<Bytes, E>>,
		E: Send + Sync + 'static,
	{
		self.inner.try_get_with(key, compute()).await
	}

	/// Drops every cached page immediately.
	#[cfg(test)]
	pub fn clear(&self) {
		tracing::info!("clearing feed cache");
		self.inner.invalidate_all();
	}
}
