use aide::axum::{routing::post_with, ApiRouter};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown user")]
	UnknownUser(String),
	#[error("not following")]
	NotFollowing(String),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/profile/:username/follow", post_with(follow, follow_docs))
		.api_route("/profile/:username/unfollow", post_with(unfollow, unfollow_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		StatusCode::NOT_FOUND
	}

	fn into_errors(self) -> Vec<error::Message> {
		let message = error::Message::new(self.to_string());

		match self {
			Self::UnknownUser(username) | Self::NotFollowing(username) => {
				message.detail("username", username).into_vec()
			}
		}
	}
}
