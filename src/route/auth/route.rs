use aide::axum::IntoApiResponse;
use argon2::Argon2;
use axum::{
	extract::State,
	http::{header, StatusCode},
	response::IntoResponse,
};
use macros::route;
use sqlx::SqliteExecutor;
use uuid::Uuid;

use crate::{
	extract::{Json, Query, Session},
	openapi::tag,
	redirect::{self, SeeOther},
	session, AppState, Database,
};

use super::{model, Error, RouteError};

pub const KEY_LENGTH: usize = 32;

/// Hashes a password with Argon2, using the user's salt.
/// Since this is only used for logging in and creating a new password,
/// the scope of this function can remain in here with no issues.
fn hash_password(
	hasher: &Argon2,
	password: &str,
	salt: &Uuid,
) -> Result<[u8; KEY_LENGTH], argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(password.as_bytes(), salt.as_bytes(), &mut hash)?;
	Ok(hash)
}

async fn create_session<'c>(
	executor: impl SqliteExecutor<'c>,
	user_id: i64,
) -> Result<model::Session, sqlx::Error> {
	sqlx::query_as::<_, model::Session>(
		"INSERT INTO session (id, user_id) VALUES (?, ?) RETURNING *",
	)
	.bind(Uuid::new_v4())
	.bind(user_id)
	.fetch_one(executor)
	.await
}

/// Log in
/// Logs in to an account, setting an associated session cookie. When a local `next`
/// path is given, redirects there instead of returning the session.
#[route(tag = tag::AUTH, response(status = 200, description = "Logged in successfully.", shape = "Json<model::Session>"), redirect = "Logged in, continuing to `next`.")]
pub async fn login(
	State(state): State<AppState>,
	Query(query): Query<model::LoginQuery>,
	Json(auth): Json<model::LoginInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let user = sqlx::query_as::<_, model::User>(r#"SELECT * FROM "user" WHERE username = ?"#)
		.bind(&auth.username)
		.fetch_optional(&state.database)
		.await?;

	let Some(user) = user else {
		return Err(Error::InvalidUsernameOrPassword.into());
	};

	let hashed = hash_password(&state.hasher, &auth.password, &user.salt).map_err(Error::Argon)?;

	if user.password != hashed {
		return Err(Error::InvalidUsernameOrPassword.into());
	}

	let session = create_session(&state.database, user.id).await?;
	let cookie = [(header::SET_COOKIE, session::create_cookie(session.id).to_string())];

	tracing::info!(user = %user.username, "logged in");

	Ok(match query.next.filter(|next| redirect::is_local(next)) {
		Some(next) => (cookie, SeeOther(next)).into_response(),
		None => (cookie, Json(session)).into_response(),
	})
}

/// Log out
/// Logs out of the authenticated account and clears the session cookie.
#[route(tag = tag::AUTH, response(status = 204, description = "Logged out successfully."))]
pub async fn logout(
	State(database): State<Database>,
	session: Session,
) -> Result<impl IntoApiResponse, RouteError> {
	sqlx::query("DELETE FROM session WHERE id = ?")
		.bind(session.id)
		.execute(&database)
		.await?;

	// Clear the session cookie
	Ok((
		[(header::SET_COOKIE, session::clear_cookie().to_string())],
		StatusCode::NO_CONTENT,
	))
}

/// Register account
/// Registers a new account, returning an associated session cookie.
#[route(tag = tag::AUTH, response(status = 200, description = "Registered successfully.", shape = "Json<model::Session>"))]
pub async fn register(
	State(state): State<AppState>,
	Json(auth): Json<model::RegisterInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let salt = Uuid::new_v4();
	let hashed = hash_password(&state.hasher, &auth.password, &salt).map_err(Error::Argon)?;

	let mut tx = state.database.begin().await?;

	let user_id = sqlx::query_scalar::<_, i64>(
		r#"
			INSERT INTO "user" (email, username, password, salt) VALUES (?, ?, ?, ?) RETURNING id
		"#,
	)
	.bind(&auth.email)
	.bind(&auth.username)
	.bind(&hashed[..])
	.bind(salt)
	.fetch_one(&mut *tx)
	.await
	.map_err(|e| match e {
		sqlx::Error::Database(ref d) if d.is_unique_violation() => {
			if d.message().contains("user.username") {
				Error::UsernameTaken.into()
			} else {
				Error::EmailTaken.into()
			}
		}
		e => RouteError::from(e),
	})?;

	let session = create_session(&mut *tx, user_id).await?;

	tx.commit().await?;

	tracing::info!(user = %auth.username, "registered");

	let cookie = session::create_cookie(session.id);

	Ok(([(header::SET_COOKIE, cookie.to_string())], Json(session)))
}

/// Get user
/// Returns the authenticated user.
#[route(tag = tag::AUTH)]
pub async fn get_me(session: Session) -> Json<model::User> {
	Json(session.user)
}
