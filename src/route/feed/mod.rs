use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown group")]
	UnknownGroup(String),
	#[error("unknown user")]
	UnknownUser(String),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/", get_with(list_global_feed, list_global_feed_docs))
		.api_route("/group/:slug", get_with(list_group_feed, list_group_feed_docs))
		.api_route(
			"/profile/:username",
			get_with(list_profile_feed, list_profile_feed_docs),
		)
		.api_route("/follow", get_with(list_follow_feed, list_follow_feed_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		StatusCode::NOT_FOUND
	}

	fn into_errors(self) -> Vec<error::Message> {
		let message = error::Message::new(self.to_string());

		let message = match self {
			Self::UnknownGroup(slug) => message.detail("slug", slug),
			Self::UnknownUser(username) => message.detail("username", username),
		};

		message.into_vec()
	}
}

#[cfg(test)]
mod test {
	use crate::{paginate::Page, route::post::model::Post, test::*};

	use super::model::{GroupFeed, ProfileFeed};

	fn texts(page: &Page<Post>) -> Vec<&str> {
		page.items.iter().map(|post| post.text.as_str()).collect()
	}

	#[sqlx::test]
	async fn test_global_feed_pages(pool: Database) {
		let app = app(pool.clone());
		let author = register(&app, &pool, "alice").await;

		for n in 0..15 {
			insert_post(&pool, author, &format!("post {n}"), None).await;
		}

		let first = app.get("/").await.json::<Page<Post>>();

		assert_eq!(first.items.len(), 10);
		assert_eq!(first.items[0].text, "post 14");
		assert_eq!(first.items[9].text, "post 5");
		assert!(first.has_next);
		assert!(!first.has_previous);
		assert_eq!(first.count, 15);

		let second = app
			.get("/")
			.add_query_param("page", 2)
			.await
			.json::<Page<Post>>();

		assert_eq!(second.items.len(), 5);
		assert_eq!(second.items[4].text, "post 0");
		assert!(!second.has_next);
		assert!(second.has_previous);
	}

	#[sqlx::test]
	async fn test_global_feed_clamps_pages(pool: Database) {
		let app = app(pool.clone());
		let author = register(&app, &pool, "alice").await;

		for n in 0..15 {
			insert_post(&pool, author, &format!("post {n}"), None).await;
		}

		let first = app.get("/").await.text();
		let last = app.get("/").add_query_param("page", 2).await.text();

		for page in ["0", "-3", "abc", ""] {
			let response = app.get("/").add_query_param("page", page).await;

			assert_eq!(response.status_code(), 200);
			assert_eq!(response.text(), first, "page {page:?}");
		}

		for page in ["3", "99999999999999999999999"] {
			let response = app.get("/").add_query_param("page", page).await;

			assert_eq!(response.json::<Page<Post>>().page, 2, "page {page:?}");
		}

		assert_ne!(first, last);
	}

	#[sqlx::test]
	async fn test_global_feed_is_cached_until_cleared(pool: Database) {
		let state = state(pool.clone());
		let app = server(&state);
		let author = register(&app, &pool, "alice").await;
		insert_post(&pool, author, "before", None).await;

		let before = app.get("/").await.text();
		insert_post(&pool, author, "after", None).await;

		assert_eq!(app.get("/").await.text(), before);

		state.cache.clear();

		let after = app.get("/").await.json::<Page<Post>>();

		assert_eq!(texts(&after), ["after", "before"]);
	}

	#[sqlx::test]
	async fn test_empty_global_feed(pool: Database) {
		let app = app(pool);

		let response = app.get("/").await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.header("content-type"), "application/json");

		let page = response.json::<Page<Post>>();

		assert!(page.items.is_empty());
		assert_eq!(page.page, 1);
		assert_eq!(page.total_pages, 1);
	}

	#[sqlx::test]
	async fn test_group_feed(pool: Database) {
		let app = app(pool.clone());
		let author = register(&app, &pool, "alice").await;
		let cats = create_group(&pool, "cats").await;
		let dogs = create_group(&pool, "dogs").await;

		insert_post(&pool, author, "meow", Some(cats)).await;
		insert_post(&pool, author, "woof", Some(dogs)).await;
		insert_post(&pool, author, "purr", Some(cats)).await;
		insert_post(&pool, author, "nothing", None).await;

		let response = app.get("/group/cats").await;
		assert_eq!(response.status_code(), 200);

		let feed = response.json::<GroupFeed>();

		assert_eq!(feed.group.id, cats);
		assert_eq!(feed.group.slug, "cats");
		assert_eq!(texts(&feed.page), ["purr", "meow"]);
	}

	#[sqlx::test]
	async fn test_group_feed_is_not_cached(pool: Database) {
		let app = app(pool.clone());
		let author = register(&app, &pool, "alice").await;
		let cats = create_group(&pool, "cats").await;

		app.get("/group/cats").await;
		insert_post(&pool, author, "meow", Some(cats)).await;

		let feed = app.get("/group/cats").await.json::<GroupFeed>();

		assert_eq!(texts(&feed.page), ["meow"]);
	}

	#[sqlx::test]
	async fn test_unknown_group(pool: Database) {
		let app = app(pool);

		let response = app.get("/group/missing").await;

		assert_eq!(response.status_code(), 404);
		assert_eq!(
			response.json::<Value>()["errors"][0]["details"]["slug"],
			"missing"
		);
	}

	#[sqlx::test]
	async fn test_profile_feed(pool: Database) {
		let state = state(pool.clone());
		let alice = server(&state);
		let bob = server(&state);
		let alice_id = register(&alice, &pool, "alice").await;
		let bob_id = register(&bob, &pool, "bob").await;

		insert_post(&pool, alice_id, "by alice", None).await;
		insert_post(&pool, bob_id, "by bob", None).await;

		let feed = bob.get("/profile/alice").await.json::<ProfileFeed>();

		assert_eq!(feed.author.id, alice_id);
		assert_eq!(feed.author.username, "alice");
		assert!(!feed.is_following);
		assert_eq!(texts(&feed.page), ["by alice"]);

		bob.post("/profile/alice/follow").await;

		assert!(bob.get("/profile/alice").await.json::<ProfileFeed>().is_following);
		assert!(!alice.get("/profile/bob").await.json::<ProfileFeed>().is_following);
		assert!(!server(&state).get("/profile/alice").await.json::<ProfileFeed>().is_following);
	}

	#[sqlx::test]
	async fn test_unknown_profile(pool: Database) {
		let app = app(pool);

		let response = app.get("/profile/nobody").await;

		assert_eq!(response.status_code(), 404);
	}

	#[sqlx::test]
	async fn test_follow_feed_requires_login(pool: Database) {
		let app = app(pool);

		let response = app.get("/follow").add_query_param("page", 2).await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(
			response.header("location"),
			"/auth/login?next=%2Ffollow%3Fpage%3D2"
		);
	}

	#[sqlx::test]
	async fn test_follow_feed(pool: Database) {
		let state = state(pool.clone());
		let reader = server(&state);
		let alice = server(&state);
		let bob = server(&state);
		register(&reader, &pool, "reader").await;
		let alice_id = register(&alice, &pool, "alice").await;
		let bob_id = register(&bob, &pool, "bob").await;

		insert_post(&pool, alice_id, "by alice", None).await;
		insert_post(&pool, bob_id, "by bob", None).await;

		let feed = reader.get("/follow").await.json::<Page<Post>>();
		assert!(feed.items.is_empty());

		reader.post("/profile/alice/follow").await;

		let feed = reader.get("/follow").await.json::<Page<Post>>();
		assert_eq!(texts(&feed), ["by alice"]);

		reader.post("/profile/bob/follow").await;
		insert_post(&pool, alice_id, "by alice again", None).await;

		let feed = reader.get("/follow").await.json::<Page<Post>>();
		assert_eq!(texts(&feed), ["by alice again", "by bob", "by alice"]);
	}
}
