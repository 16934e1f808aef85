use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, redirect::SeeOther, AppState};

pub mod model;
pub mod route;

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid username or password")]
	InvalidUsernameOrPassword,
	#[error("password validation error")]
	Argon(#[from] argon2::Error),
	#[error("login required")]
	LoginRequired { next: String },
	#[error("username already taken")]
	UsernameTaken,
	#[error("email already taken")]
	EmailTaken,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/login", post_with(login, login_docs))
		.api_route("/logout", get_with(logout, logout_docs))
		.api_route("/register", post_with(register, register_docs))
		.api_route("/me", get_with(get_me, get_me_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::InvalidUsernameOrPassword => StatusCode::UNAUTHORIZED,
			Self::LoginRequired { .. } => StatusCode::SEE_OTHER,
			Self::Argon(..) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::UsernameTaken | Self::EmailTaken => StatusCode::CONFLICT,
		}
	}

	fn into_errors(self) -> Vec<error::Message> {
		let message = error::Message::new(self.to_string());

		match self {
			Self::UsernameTaken => message.field("username").into_vec(),
			Self::EmailTaken => message.field("email").into_vec(),
			Self::LoginRequired { next } => message.detail("next", next).into_vec(),
			_ => message.into_vec(),
		}
	}

	fn location(&self) -> Option<String> {
		match self {
			Self::LoginRequired { next } => Some(SeeOther::login(next).0),
			_ => None,
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[sqlx::test]
	async fn test_signup_flow(pool: Database) {
		let app = app(pool);

		let response = app
			.post("/auth/register")
			.json(&json!({
				"email": "john@smith.com",
				"username": "john",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 200);

		assert!(response
			.header("set-cookie")
			.to_str()
			.unwrap()
			.contains("session="));

		let response = app
			.post("/auth/login")
			.json(&json!({
				"username": "john",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 200);

		assert!(response
			.header("set-cookie")
			.to_str()
			.unwrap()
			.contains("session="));

		let response = app.get("/auth/me").await;

		assert_eq!(response.status_code(), 200);

		assert_eq!(response.json::<Value>()["username"], "john");
	}

	#[sqlx::test]
	async fn test_wrong_password(pool: Database) {
		let app = app(pool.clone());
		register(&app, &pool, "john").await;

		let response = app
			.post("/auth/login")
			.json(&json!({
				"username": "john",
				"password": "not-the-password",
			}))
			.await;

		assert_eq!(response.status_code(), 401);
	}

	#[sqlx::test]
	async fn test_duplicate_username(pool: Database) {
		let app = app(pool.clone());
		register(&app, &pool, "john").await;

		let response = app
			.post("/auth/register")
			.json(&json!({
				"email": "other@smith.com",
				"username": "john",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 409);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "username");
	}

	#[sqlx::test]
	async fn test_invalid_registration(pool: Database) {
		let app = app(pool);

		let response = app
			.post("/auth/register")
			.json(&json!({
				"email": "not-an-email",
				"username": "a b",
				"password": "short",
			}))
			.await;

		assert_eq!(response.status_code(), 400);

		let fields = response.json::<Value>()["errors"]
			.as_array()
			.unwrap()
			.iter()
			.map(|error| error["field"].as_str().unwrap().to_owned())
			.collect::<Vec<_>>();

		assert!(fields.contains(&"email".to_owned()));
		assert!(fields.contains(&"username".to_owned()));
		assert!(fields.contains(&"password".to_owned()));
	}

	#[sqlx::test]
	async fn test_anonymous_is_sent_to_login(pool: Database) {
		let app = app(pool);

		let response = app.get("/auth/me").await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location"), "/auth/login?next=%2Fauth%2Fme");
	}

	#[sqlx::test]
	async fn test_login_returns_to_next(pool: Database) {
		let app = app(pool.clone());
		register(&app, &pool, "john").await;

		let response = app
			.post("/auth/login")
			.add_query_param("next", "/follow")
			.json(&json!({
				"username": "john",
				"password": PASSWORD,
			}))
			.await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location"), "/follow");

		let response = app
			.post("/auth/login")
			.add_query_param("next", "//evil.example")
			.json(&json!({
				"username": "john",
				"password": PASSWORD,
			}))
			.await;

		assert_eq!(response.status_code(), 200);
	}

	#[sqlx::test]
	async fn test_logout(pool: Database) {
		let app = app(pool.clone());
		register(&app, &pool, "john").await;

		let response = app.get("/auth/logout").await;
		assert_eq!(response.status_code(), 204);

		let response = app.get("/auth/me").await;
		assert_eq!(response.status_code(), 303);
	}
}
