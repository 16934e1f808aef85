use std::{env, num::NonZeroU32, path::PathBuf, str::FromStr, time::Duration};

use tracing::level_filters::LevelFilter;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("{key} has an invalid value {value:?}")]
	Invalid { key: &'static str, value: String },
}

/// Runtime configuration, read from the environment (and a `.env` file,
/// when present).
#[derive(Clone, Debug)]
pub struct Config {
	pub database_url: String,
	pub host: String,
	pub port: u16,
	/// Number of posts shown on a single feed page.
	pub posts_per_page: NonZeroU32,
	/// How long a rendered global feed page is served from the cache.
	pub feed_cache_ttl: Duration,
	/// Directory that uploaded images are written to.
	pub media_root: PathBuf,
	pub log_level: LevelFilter,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			database_url: "sqlite://blog.db".into(),
			host: "127.0.0.1".into(),
			port: 3000,
			posts_per_page: NonZeroU32::new(10).unwrap_or(NonZeroU32::MIN),
			feed_cache_ttl: Duration::from_secs(20),
			media_root: PathBuf::from("media"),
			log_level: LevelFilter::INFO,
		}
	}
}

impl Config {
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| env::var(key).ok())
	}

	fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let defaults = Self::default();

		Ok(Self {
			database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
			host: lookup("HOST").unwrap_or(defaults.host),
			port: parse(&lookup, "PORT")?.unwrap_or(defaults.port),
			posts_per_page: parse(&lookup, "POSTS_PER_PAGE")?.unwrap_or(defaults.posts_per_page),
			feed_cache_ttl: parse(&lookup, "FEED_CACHE_TTL")?
				.map_or(defaults.feed_cache_ttl, Duration::from_secs),
			media_root: lookup("MEDIA_ROOT").map_or(defaults.media_root, PathBuf::from),
			log_level: parse(&lookup, "LOG_LEVEL")?.unwrap_or(defaults.log_level),
		})
	}
}

fn parse<T: FromStr>(
	lookup: impl Fn(&str) -> Option<String>,
	key: &'static str,
) -> Result<Option<T>, ConfigError> {
	lookup(key)
		.map(|value| {
			value
				.trim()
				.parse()
				.map_err(|_| ConfigError::Invalid { key, value })
		})
		.transpose()
}

#[cfg(test)]
mod test {
	use std::collections::HashMap;

	use super::*;

	fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
		let vars = vars
			.iter()
			.map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
			.collect::<HashMap<_, _>>();

		Config::from_lookup(|key| vars.get(key).cloned())
	}

	#[test]
	fn test_defaults() {
		let config = config(&[]).unwrap();

		assert_eq!(config.port, 3000);
		assert_eq!(config.posts_per_page.get(), 10);
		assert_eq!(config.feed_cache_ttl, Duration::from_secs(20));
		assert_eq!(config.log_level, LevelFilter::INFO);
	}

	#[test]
	fn test_overrides() {
		let config = config(&[
			("POSTS_PER_PAGE", "25"),
			("FEED_CACHE_TTL", "0"),
			("LOG_LEVEL", "debug"),
			("MEDIA_ROOT", "/srv/media"),
		])
		.unwrap();

		assert_eq!(config.posts_per_page.get(), 25);
		assert_eq!(config.feed_cache_ttl, Duration::ZERO);
		assert_eq!(config.log_level, LevelFilter::DEBUG);
		assert_eq!(config.media_root, PathBuf::from("/srv/media"));
	}

	#[test]
	fn test_zero_page_size_is_rejected() {
		let error = config(&[("POSTS_PER_PAGE", "0")]).unwrap_err();

		assert!(matches!(
			error,
			ConfigError::Invalid {
				key: "POSTS_PER_PAGE",
				..
			}
		));
	}

	#[test]
	fn test_invalid_port_is_rejected() {
		assert!(config(&[("PORT", "http")]).is_err());
	}
}
