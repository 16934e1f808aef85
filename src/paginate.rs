use std::num::NonZeroU32;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The position of a single page within an ordered collection.
///
/// Out of range requests are clamped: anything below the first page is the
/// first page, and anything past the end is the last page. An empty
/// collection still has one (empty) page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
	pub number: u64,
	pub size: u64,
	pub total_pages: u64,
	pub count: u64,
}

impl Pagination {
	pub fn new(count: u64, size: NonZeroU32, requested: i64) -> Self {
		let size = u64::from(size.get());
		let total_pages = count.div_ceil(size).max(1);
		let number = u64::try_from(requested)
			.unwrap_or(1)
			.clamp(1, total_pages);

		Self {
			number,
			size,
			total_pages,
			count,
		}
	}

	pub fn offset(&self) -> i64 {
		i64::try_from((self.number - 1) * self.size).unwrap_or(i64::MAX)
	}

	pub fn limit(&self) -> i64 {
		i64::try_from(self.size).unwrap_or(i64::MAX)
	}

	pub fn has_next(&self) -> bool {
		self.number < self.total_pages
	}

	pub fn has_previous(&self) -> bool {
		self.number > 1
	}

	pub fn into_page<T>(self, items: Vec<T>) -> Page<T> {
		Page {
			has_next: self.has_next(),
			has_previous: self.has_previous(),
			items,
			page: self.number,
			total_pages: self.total_pages,
			count: self.count,
		}
	}
}

/// A single page of an ordered collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Page<T> {
	/// The items on this page, in collection order.
	pub items: Vec<T>,
	/// The 1-indexed number of this page.
	pub page: u64,
	pub has_next: bool,
	pub has_previous: bool,
	pub total_pages: u64,
	/// The number of items in the whole collection.
	pub count: u64,
}

/// Slices an in-memory collection into the requested page.
#[cfg(test)]
pub fn paginate<T: Clone>(items: &[T], size: NonZeroU32, requested: i64) -> Page<T> {
	let pagination = Pagination::new(items.len() as u64, size, requested);
	let start = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
	let end = start.saturating_add(size.get() as usize);

	let items = items
		.get(start..end.min(items.len()))
		.map(<[T]>::to_vec)
		.unwrap_or_default();

	pagination.into_page(items)
}
