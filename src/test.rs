pub use axum_test::TestServer;
pub use serde_json::{json, Value};

pub use crate::{AppState, Database};

use std::ops::Deref;

use axum_test::TestServerConfig;
use tempfile::TempDir;

use crate::config::Config;

pub const PASSWORD: &str = "hunter2hunter";

/// Application state whose media directory is removed once it is dropped.
pub struct TestState {
	state: AppState,
	_media: TempDir,
}

impl Deref for TestState {
	type Target = AppState;

	fn deref(&self) -> &AppState {
		&self.state
	}
}

/// A single visitor of an application with its own media directory.
pub struct TestApp {
	server: TestServer,
	_media: TempDir,
}

impl Deref for TestApp {
	type Target = TestServer;

	fn deref(&self) -> &TestServer {
		&self.server
	}
}

/// Application state over `pool`, writing media to a fresh temporary directory.
pub fn state(pool: Database) -> TestState {
	let media = tempfile::tempdir().unwrap();
	let config = Config {
		media_root: media.path().to_path_buf(),
		..Config::default()
	};

	TestState {
		state: AppState::new(pool, config),
		_media: media,
	}
}

/// A client for the application that keeps its own cookies, so every server
/// created from the same state acts as a separate visitor.
pub fn server(state: &AppState) -> TestServer {
	let config = TestServerConfig {
		save_cookies: true,
		..Default::default()
	};

	TestServer::new_with_config(crate::route::router(state.clone()), config).unwrap()
}

pub fn app(pool: Database) -> TestApp {
	let TestState {
		state: app_state,
		_media: media,
	} = state(pool);

	TestApp {
		server: server(&app_state),
		_media: media,
	}
}

/// Registers `username` through the API, logging `app` in as them.
pub async fn register(app: &TestServer, pool: &Database, username: &str) -> i64 {
	let response = app
		.post("/auth/register")
		.json(&json!({
			"email": format!("{username}@example.com"),
			"username": username,
			"password": PASSWORD,
		}))
		.await;

	assert_eq!(response.status_code(), 200);

	sqlx::query_scalar(r#"SELECT id FROM "user" WHERE username = ?"#)
		.bind(username)
		.fetch_one(pool)
		.await
		.unwrap()
}

pub async fn create_group(pool: &Database, slug: &str) -> i64 {
	sqlx::query_scalar(
		r#"INSERT INTO "group" (title, slug, description) VALUES (?, ?, ?) RETURNING id"#,
	)
	.bind(format!("The {slug} group"))
	.bind(slug)
	.bind(format!("Everything about {slug}"))
	.fetch_one(pool)
	.await
	.unwrap()
}

pub async fn insert_post(pool: &Database, author_id: i64, text: &str, group_id: Option<i64>) -> i64 {
	sqlx::query_scalar("INSERT INTO post (text, author_id, group_id) VALUES (?, ?, ?) RETURNING id")
		.bind(text)
		.bind(author_id)
		.bind(group_id)
		.fetch_one(pool)
		.await
		.unwrap()
}

pub async fn latest_post(pool: &Database) -> i64 {
	sqlx::query_scalar("SELECT MAX(id) FROM post")
		.fetch_one(pool)
		.await
		.unwrap()
}

pub async fn count(pool: &Database, table: &str) -> i64 {
	sqlx::query_scalar(&format!(r#"SELECT COUNT(*) FROM "{table}""#))
		.fetch_one(pool)
		.await
		.unwrap()
}
