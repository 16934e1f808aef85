use std::sync::Arc;

use aide::{axum::ApiRouter, openapi::OpenApi};
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

use crate::{error::AppError, openapi, AppState};

pub mod auth;
pub mod docs;
pub mod feed;
pub mod follow;
pub mod model;
pub mod post;

/// Builds the application router, with its OpenAPI document served under `/docs`.
pub fn router(state: AppState) -> Router {
	aide::gen::extract_schemas(true);

	let mut api = OpenApi::default();

	let router = ApiRouter::new()
		.nest("/auth", auth::routes())
		.merge(feed::routes())
		.merge(follow::routes())
		.nest("/posts", post::routes())
		.nest_api_service("/docs", docs::routes())
		.finish_api_with(&mut api, openapi::docs);

	router
		.fallback(|| async { AppError::UnknownRoute })
		.layer(Extension(Arc::new(api)))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}
