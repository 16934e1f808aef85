#![warn(clippy::pedantic)]

mod cache;
mod config;
mod error;
mod extract;
mod media;
mod openapi;
mod paginate;
mod redirect;
mod route;
mod session;
#[cfg(test)]
mod test;
mod trace;

use std::str::FromStr;

use argon2::Argon2;
use sqlx::sqlite::SqliteConnectOptions;

use crate::{cache::FeedCache, config::Config, media::MediaStore};

pub type Database = sqlx::Pool<sqlx::Sqlite>;
pub type AppState = State;

/// The shared application state.
///
/// Every field has a distinct type, so handlers can extract just the part
/// they need with [`axum::extract::State`].
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Argon2<'static>,
	pub cache: FeedCache,
	pub media: MediaStore,
	pub config: Config,
}

impl State {
	pub fn new(database: Database, config: Config) -> Self {
		Self {
			database,
			hasher: Argon2::default(),
			cache: FeedCache::new(config.feed_cache_ttl),
			media: MediaStore::new(config.media_root.clone()),
			config,
		}
	}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	dotenvy::dotenv().ok();

	let config = Config::from_env()?;
	trace::init_tracing_subscriber(config.log_level);

	let options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
	let database = Database::connect_with(options).await?;

	sqlx::migrate!().run(&database).await?;

	let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;

	tracing::info!(address = %listener.local_addr()?, "listening");

	let app = route::router(State::new(database, config));

	axum::serve(listener, app).await?;

	Ok(())
}
