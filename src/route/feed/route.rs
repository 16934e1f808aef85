use axum::{body::Bytes, extract::State};
use macros::route;

use crate::{
	cache::FeedKey,
	error::AppError,
	extract::{CachedJson, Json, MaybeSession, Path, Query, Session},
	openapi::tag,
	paginate::Page,
	route::{
		auth::model::User,
		post::model::{Group, Post},
	},
	AppState, Database,
};

use super::{
	model::{self, Feed},
	Error, RouteError,
};

/// List posts
/// Returns a page of every post, newest first. Pages are cached for a short
/// while, so new posts can take a moment to show up here.
#[route(tag = tag::FEED)]
pub async fn list_global_feed(
	State(state): State<AppState>,
	Query(query): Query<model::PageInput>,
) -> Result<CachedJson<Page<Post>>, RouteError> {
	let requested = query.number();
	let database = &state.database;
	let size = state.config.posts_per_page;

	let body = state
		.cache
		.get_or_compute(FeedKey::global(requested), || async move {
			let page = Feed::Global.page(database, size, requested).await?;

			Ok::<_, AppError>(Bytes::from(serde_json::to_vec(&page)?))
		})
		.await
		.map_err(AppError::Shared)?;

	Ok(CachedJson::new(body))
}

/// List group posts
/// Returns the group and a page of the posts published in it, newest first.
#[route(tag = tag::FEED)]
pub async fn list_group_feed(
	State(state): State<AppState>,
	Path(path): Path<model::SlugInput>,
	Query(query): Query<model::PageInput>,
) -> Result<Json<model::GroupFeed>, RouteError> {
	let group = Group::by_slug(&state.database, &path.slug)
		.await?
		.ok_or(Error::UnknownGroup(path.slug))?;

	let page = Feed::Group(group.id)
		.page(&state.database, state.config.posts_per_page, query.number())
		.await?;

	Ok(Json(model::GroupFeed { group, page }))
}

/// List profile posts
/// Returns the author, whether the requesting user follows them, and a page
/// of their posts, newest first.
#[route(tag = tag::FEED)]
pub async fn list_profile_feed(
	State(state): State<AppState>,
	MaybeSession(session): MaybeSession,
	Path(path): Path<model::UsernameInput>,
	Query(query): Query<model::PageInput>,
) -> Result<Json<model::ProfileFeed>, RouteError> {
	let author = sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE username = ?"#)
		.bind(&path.username)
		.fetch_optional(&state.database)
		.await?
		.ok_or(Error::UnknownUser(path.username))?;

	let is_following = match session {
		Some(session) => is_following(&state.database, session.user.id, author.id).await?,
		None => false,
	};

	let page = Feed::Profile(author.id)
		.page(&state.database, state.config.posts_per_page, query.number())
		.await?;

	Ok(Json(model::ProfileFeed {
		author: (&author).into(),
		is_following,
		page,
	}))
}

/// List followed posts
/// Returns a page of the posts by every author the authenticated user
/// follows, newest first.
#[route(tag = tag::FEED)]
pub async fn list_follow_feed(
	State(state): State<AppState>,
	session: Session,
	Query(query): Query<model::PageInput>,
) -> Result<Json<Page<Post>>, RouteError> {
	let page = Feed::Following(session.user.id)
		.page(&state.database, state.config.posts_per_page, query.number())
		.await?;

	Ok(Json(page))
}

async fn is_following(database: &Database, user_id: i64, author_id: i64) -> Result<bool, sqlx::Error> {
	sqlx::query_scalar::<_, bool>(
		"SELECT EXISTS (SELECT 1 FROM follow WHERE user_id = ? AND author_id = ?)",
	)
	.bind(user_id)
	.bind(author_id)
	.fetch_one(database)
	.await
}
