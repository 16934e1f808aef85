pub use crate::route::model::{PageInput, SlugInput, UsernameInput};

use std::num::NonZeroU32;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
	paginate::{Page, Pagination},
	route::{
		auth::model::Author,
		post::model::{Group, Post, PostRow, ORDER_POSTS, SELECT_POST},
	},
	Database,
};

/// The contexts a post listing can be built for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feed {
	/// Every post.
	Global,
	/// Posts published in a group.
	Group(i64),
	/// Posts written by a user.
	Profile(i64),
	/// Posts by every author the user follows.
	Following(i64),
}

impl Feed {
	fn filter(self) -> (&'static str, Option<i64>) {
		match self {
			Self::Global => ("", None),
			Self::Group(group) => ("WHERE post.group_id = ?", Some(group)),
			Self::Profile(author) => ("WHERE post.author_id = ?", Some(author)),
			Self::Following(user) => (
				"WHERE post.author_id IN (SELECT author_id FROM follow WHERE user_id = ?)",
				Some(user),
			),
		}
	}

	pub async fn count(self, database: &Database) -> Result<u64, sqlx::Error> {
		let (filter, id) = self.filter();
		let sql = format!("SELECT COUNT(*) FROM post {filter}");
		let mut query = sqlx::query_scalar::<_, i64>(&sql);

		if let Some(id) = id {
			query = query.bind(id);
		}

		let count = query.fetch_one(database).await?;

		Ok(u64::try_from(count).unwrap_or_default())
	}

	/// Fetches the requested page of the feed, newest post first.
	///
	/// The page number is clamped into the available range.
	pub async fn page(
		self,
		database: &Database,
		size: NonZeroU32,
		requested: i64,
	) -> Result<Page<Post>, sqlx::Error> {
		let pagination = Pagination::new(self.count(database).await?, size, requested);

		let (filter, id) = self.filter();
		let sql = format!("{SELECT_POST} {filter} {ORDER_POSTS} LIMIT ? OFFSET ?");
		let mut query = sqlx::query_as::<_, PostRow>(&sql);

		if let Some(id) = id {
			query = query.bind(id);
		}

		let rows = query
			.bind(pagination.limit())
			.bind(pagination.offset())
			.fetch_all(database)
			.await?;

		Ok(pagination.into_page(rows.into_iter().map(Post::from).collect()))
	}
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GroupFeed {
	pub group: Group,
	pub page: Page<Post>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ProfileFeed {
	pub author: Author,
	/// Whether the requesting user follows the author. Always false when
	/// nobody is logged in.
	pub is_following: bool,
	pub page: Page<Post>,
}
