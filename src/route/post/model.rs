pub use crate::route::model::IdInput;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::{route::auth::model::Author, Database};

/// Rejects text that is empty once surrounding whitespace is removed.
pub fn validate_not_blank(text: &str) -> Result<(), ValidationError> {
	if text.trim().is_empty() {
		let mut error = ValidationError::new("required");
		error.message = Some("this field is required".into());

		return Err(error);
	}

	Ok(())
}

/// A named community that posts can be published to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::FromRow)]
pub struct Group {
	pub id: i64,
	pub title: String,
	/// The unique, URL-safe name of the group.
	pub slug: String,
	pub description: String,
}

impl Group {
	pub async fn by_slug(database: &Database, slug: &str) -> Result<Option<Self>, sqlx::Error> {
		sqlx::query_as::<_, Self>(r#"SELECT * FROM "group" WHERE slug = ?"#)
			.bind(slug)
			.fetch_optional(database)
			.await
	}

	pub async fn exists(database: &Database, id: i64) -> Result<bool, sqlx::Error> {
		sqlx::query_scalar::<_, bool>(r#"SELECT EXISTS (SELECT 1 FROM "group" WHERE id = ?)"#)
			.bind(id)
			.fetch_one(database)
			.await
	}
}

/// The group a post belongs to, as shown next to the post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GroupRef {
	pub id: i64,
	pub title: String,
	pub slug: String,
}

/// Selects the columns of [`PostRow`], joined with the author and group.
pub const SELECT_POST: &str = r#"
	SELECT
		post.id, post.text, post.pub_date, post.image,
		post.author_id, author.username AS author_username,
		post.group_id, "group".title AS group_title, "group".slug AS group_slug
	FROM post
	JOIN "user" AS author ON author.id = post.author_id
	LEFT JOIN "group" ON "group".id = post.group_id
"#;

/// Newest first, with later inserts first among equal timestamps.
pub const ORDER_POSTS: &str = "ORDER BY post.pub_date DESC, post.id DESC";

#[derive(Debug, sqlx::FromRow)]
pub struct PostRow {
	pub id: i64,
	pub text: String,
	pub pub_date: chrono::DateTime<chrono::Utc>,
	pub image: Option<String>,
	pub author_id: i64,
	pub author_username: String,
	pub group_id: Option<i64>,
	pub group_title: Option<String>,
	pub group_slug: Option<String>,
}

/// A single post, created by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Post {
	/// The unique identifier of the post.
	pub id: i64,
	/// The content of the post.
	pub text: String,
	/// The publication time of the post. Never changes once set.
	pub pub_date: chrono::DateTime<chrono::Utc>,
	pub author: Author,
	pub group: Option<GroupRef>,
	/// Reference to the attached image in media storage.
	pub image: Option<String>,
}

impl From<PostRow> for Post {
	fn from(row: PostRow) -> Self {
		let group = match (row.group_id, row.group_title, row.group_slug) {
			(Some(id), Some(title), Some(slug)) => Some(GroupRef { id, title, slug }),
			_ => None,
		};

		Self {
			id: row.id,
			text: row.text,
			pub_date: row.pub_date,
			author: Author {
				id: row.author_id,
				username: row.author_username,
			},
			group,
			image: row.image,
		}
	}
}

impl Post {
	pub async fn by_id(database: &Database, id: i64) -> Result<Option<Self>, sqlx::Error> {
		let row = sqlx::query_as::<_, PostRow>(&format!("{SELECT_POST} WHERE post.id = ?"))
			.bind(id)
			.fetch_optional(database)
			.await?;

		Ok(row.map(Self::from))
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct CommentRow {
	pub id: i64,
	pub post_id: i64,
	pub author_id: i64,
	pub author_username: String,
	pub text: String,
	pub created_at: chrono::DateTime<chrono::Utc>,
	pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// A comment left on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Comment {
	pub id: i64,
	pub post_id: i64,
	pub author: Author,
	pub text: String,
	pub created_at: chrono::DateTime<chrono::Utc>,
	pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<CommentRow> for Comment {
	fn from(row: CommentRow) -> Self {
		Self {
			id: row.id,
			post_id: row.post_id,
			author: Author {
				id: row.author_id,
				username: row.author_username,
			},
			text: row.text,
			created_at: row.created_at,
			updated_at: row.updated_at,
		}
	}
}

impl Comment {
	/// Comments on a post, newest first.
	pub async fn for_post(database: &Database, post_id: i64) -> Result<Vec<Self>, sqlx::Error> {
		let rows = sqlx::query_as::<_, CommentRow>(
			r#"
				SELECT
					comment.id, comment.post_id, comment.text,
					comment.created_at, comment.updated_at,
					comment.author_id, author.username AS author_username
				FROM comment
				JOIN "user" AS author ON author.id = comment.author_id
				WHERE comment.post_id = ?
				ORDER BY comment.created_at DESC, comment.id DESC
			"#,
		)
		.bind(post_id)
		.fetch_all(database)
		.await?;

		Ok(rows.into_iter().map(Comment::from).collect())
	}
}

/// A post with everything its detail view shows.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PostDetail {
	pub post: Post,
	pub comments: Vec<Comment>,
	/// Where new comments on this post are submitted.
	pub comment_url: String,
}

/// The fields of a post that its author controls.
#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct PostInput {
	/// The content of the post.
	#[validate(custom(function = "validate_not_blank"))]
	pub text: String,
	/// The group to publish the post in.
	pub group: Option<i64>,
	/// A base64 encoded picture, optionally as a `data:` URL.
	pub image: Option<String>,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct CommentInput {
	#[validate(custom(function = "validate_not_blank"))]
	pub text: String,
}
