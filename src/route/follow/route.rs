use axum::extract::State;
use macros::route;

use crate::{
	extract::{Path, Session},
	openapi::tag,
	redirect::SeeOther,
	Database,
};

use super::{model, Error, RouteError};

/// Follow author
/// Adds the author to the authenticated user's followed feed, then redirects
/// to their profile. Following yourself, or someone you already follow,
/// changes nothing.
#[route(tag = tag::FOLLOW, redirect = "Redirects to the author's profile.")]
pub async fn follow(
	State(database): State<Database>,
	session: Session,
	Path(path): Path<model::UsernameInput>,
) -> Result<SeeOther, RouteError> {
	let author_id = sqlx::query_scalar::<_, i64>(r#"SELECT id FROM "user" WHERE username = ?"#)
		.bind(&path.username)
		.fetch_optional(&database)
		.await?
		.ok_or_else(|| Error::UnknownUser(path.username.clone()))?;

	if author_id == session.user.id {
		return Ok(SeeOther::profile(&path.username));
	}

	let created = sqlx::query(
		r#"
			INSERT INTO follow (user_id, author_id) VALUES (?, ?)
			ON CONFLICT (user_id, author_id) DO NOTHING
		"#,
	)
	.bind(session.user.id)
	.bind(author_id)
	.execute(&database)
	.await?
	.rows_affected();

	if created > 0 {
		tracing::info!(user = %session.user.username, author = %path.username, "followed author");
	}

	Ok(SeeOther::profile(&path.username))
}

/// Unfollow author
/// Removes the author from the authenticated user's followed feed, then
/// redirects to their profile.
#[route(tag = tag::FOLLOW, redirect = "Redirects to the author's profile.")]
pub async fn unfollow(
	State(database): State<Database>,
	session: Session,
	Path(path): Path<model::UsernameInput>,
) -> Result<SeeOther, RouteError> {
	let deleted = sqlx::query(
		r#"
			DELETE FROM follow
			WHERE user_id = ? AND author_id = (SELECT id FROM "user" WHERE username = ?)
		"#,
	)
	.bind(session.user.id)
	.bind(&path.username)
	.execute(&database)
	.await?
	.rows_affected();

	if deleted == 0 {
		return Err(Error::NotFollowing(path.username).into());
	}

	tracing::info!(user = %session.user.username, author = %path.username, "unfollowed author");

	Ok(SeeOther::profile(&path.username))
}
