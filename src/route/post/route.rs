use axum::extract::State;
use macros::route;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
	error::AppError,
	extract::{Json, Path, RawJson, Session},
	media::{Image, MediaStore},
	openapi::tag,
	redirect::SeeOther,
	AppState, Database,
};

use super::{model, Error, RouteError};

/// The references of a post input, resolved and checked.
struct Attachments {
	group: Option<i64>,
	image: Option<Image>,
}

fn field_error(code: &'static str, message: String) -> ValidationError {
	let mut error = ValidationError::new(code);
	error.message = Some(message.into());
	error
}

/// Checks what the field validators cannot: that the group exists and that
/// the image decodes. Reports every failing field at once.
async fn resolve_attachments(
	database: &Database,
	input: &model::PostInput,
) -> Result<Attachments, RouteError> {
	let mut errors = ValidationErrors::new();

	if let Some(group) = input.group {
		if !model::Group::exists(database, group).await? {
			errors.add("group", field_error("unknown_group", format!("group {group} does not exist")));
		}
	}

	let image = match input.image.as_deref().map(Image::decode).transpose() {
		Ok(image) => image,
		Err(error) => {
			errors.add("image", field_error("invalid_image", error.to_string()));
			None
		}
	};

	if !errors.errors().is_empty() {
		return Err(errors.into());
	}

	Ok(Attachments {
		group: input.group,
		image,
	})
}

async fn store_image(media: &MediaStore, image: Option<&Image>) -> Result<Option<String>, RouteError> {
	match image {
		Some(image) => Ok(Some(
			media
				.save_post_image(image)
				.await
				.map_err(AppError::from)?,
		)),
		None => Ok(None),
	}
}

/// Deletes an image stored for a post whose row was never written.
async fn discard_image(media: &MediaStore, reference: Option<&str>) {
	let Some(reference) = reference else {
		return;
	};

	if let Err(error) = media.remove(reference).await {
		tracing::warn!(%error, reference, "failed to remove orphaned image");
	}
}

/// Get post
/// Returns a single post with its comments, newest comment first.
#[route(tag = tag::POST)]
pub async fn get_post(
	State(database): State<Database>,
	Path(path): Path<model::IdInput>,
) -> Result<Json<model::PostDetail>, RouteError> {
	let post = model::Post::by_id(&database, path.id)
		.await?
		.ok_or(Error::UnknownPost(path.id))?;
	let comments = model::Comment::for_post(&database, post.id).await?;

	Ok(Json(model::PostDetail {
		comment_url: format!("{}/comment", SeeOther::post(post.id).0),
		post,
		comments,
	}))
}

/// Create post
/// Publishes a new post as the authenticated user, then redirects to their profile.
#[route(tag = tag::POST, redirect = "Created, redirecting to the author's profile.")]
pub async fn create_post(
	State(state): State<AppState>,
	session: Session,
	Json(input): Json<model::PostInput>,
) -> Result<SeeOther, RouteError> {
	let attachments = resolve_attachments(&state.database, &input).await?;
	let image = store_image(&state.media, attachments.image.as_ref()).await?;

	let inserted = sqlx::query_scalar::<_, i64>(
		r#"
			INSERT INTO post (text, author_id, group_id, image)
			VALUES (?, ?, ?, ?)
			RETURNING id
		"#,
	)
	.bind(&input.text)
	.bind(session.user.id)
	.bind(attachments.group)
	.bind(image.as_deref())
	.fetch_one(&state.database)
	.await;

	let id = match inserted {
		Ok(id) => id,
		Err(error) => {
			discard_image(&state.media, image.as_deref()).await;
			return Err(error.into());
		}
	};

	tracing::info!(post = id, author = %session.user.username, "created post");

	Ok(SeeOther::profile(&session.user.username))
}

/// Edit post
/// Updates a post written by the authenticated user, then redirects to its detail view.
/// Anyone else is redirected to the unchanged post instead. Leaving out the image keeps
/// the current one, leaving out the group removes the post from its group.
#[route(tag = tag::POST, redirect = "Redirects to the detail view of the post.")]
pub async fn edit_post(
	State(state): State<AppState>,
	session: Session,
	Path(path): Path<model::IdInput>,
	body: Result<RawJson<model::PostInput>, AppError>,
) -> Result<SeeOther, RouteError> {
	let author_id = sqlx::query_scalar::<_, i64>("SELECT author_id FROM post WHERE id = ?")
		.bind(path.id)
		.fetch_optional(&state.database)
		.await?
		.ok_or(Error::UnknownPost(path.id))?;

	if author_id != session.user.id {
		tracing::info!(post = path.id, editor = %session.user.username, "refused edit by non-author");

		return Ok(SeeOther::post(path.id));
	}

	let RawJson(input) = body?;
	input.validate()?;

	let attachments = resolve_attachments(&state.database, &input).await?;
	let image = store_image(&state.media, attachments.image.as_ref()).await?;

	let updated = sqlx::query(
		r#"
			UPDATE post
			SET text = ?, group_id = ?, image = COALESCE(?, image)
			WHERE id = ?
		"#,
	)
	.bind(&input.text)
	.bind(attachments.group)
	.bind(image.as_deref())
	.bind(path.id)
	.execute(&state.database)
	.await;

	if let Err(error) = updated {
		discard_image(&state.media, image.as_deref()).await;
		return Err(error.into());
	}

	tracing::info!(post = path.id, "edited post");

	Ok(SeeOther::post(path.id))
}

/// Add comment
/// Comments on a post as the authenticated user, then redirects to the post.
#[route(tag = tag::POST, redirect = "Redirects to the detail view of the post.")]
pub async fn add_comment(
	State(database): State<Database>,
	session: Session,
	Path(path): Path<model::IdInput>,
	RawJson(input): RawJson<model::CommentInput>,
) -> Result<SeeOther, RouteError> {
	let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM post WHERE id = ?)")
		.bind(path.id)
		.fetch_one(&database)
		.await?;

	if !exists {
		return Err(Error::UnknownPost(path.id).into());
	}

	input.validate()?;

	let id = sqlx::query_scalar::<_, i64>(
		"INSERT INTO comment (post_id, author_id, text) VALUES (?, ?, ?) RETURNING id",
	)
	.bind(path.id)
	.bind(session.user.id)
	.bind(&input.text)
	.fetch_one(&database)
	.await?;

	tracing::info!(comment = id, post = path.id, "added comment");

	Ok(SeeOther::post(path.id))
}
