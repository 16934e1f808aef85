use std::{borrow::Cow, fmt, sync::Arc};

use aide::OperationOutput;
use axum::{
	extract::rejection::{JsonRejection, PathRejection, QueryRejection},
	http::{header, StatusCode},
	response::{IntoResponse, Response},
	Json,
};
use schemars::JsonSchema;
use serde::Serialize;

pub type Map = serde_json::Map<String, serde_json::Value>;

/// A single error message, presented to the client.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message {
	/// A machine-friendly description of the error.
	pub content: Cow<'static, str>,
	/// The input field that caused the error, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'static, str>>,
	/// Additional structured information about the error.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Map>,
}

impl Message {
	pub fn new(content: impl Into<Cow<'static, str>>) -> Self {
		Self {
			content: content.into(),
			field: None,
			details: None,
		}
	}

	#[must_use]
	pub fn field(mut self, field: impl Into<Cow<'static, str>>) -> Self {
		self.field = Some(field.into());
		self
	}

	#[must_use]
	pub fn detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
		self.details
			.get_or_insert_with(Map::new)
			.insert(key.into(), value.into());
		self
	}

	pub fn into_vec(self) -> Vec<Self> {
		vec![self]
	}
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorResponse {
	pub success: bool,
	pub errors: Vec<Message>,
}

impl ErrorResponse {
	fn new(errors: Vec<Message>) -> Self {
		Self {
			success: false,
			errors,
		}
	}
}

/// The shape of a route-specific error as seen by the client.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;

	fn into_errors(self) -> Vec<Message>;

	/// Where the client should be sent instead, for errors that redirect.
	fn location(&self) -> Option<String> {
		None
	}
}

/// Errors shared by every route.
///
/// The Display implementation is not sent to the client, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("json error: {0}")]
	Json(#[from] JsonRejection),
	#[error("query error: {0}")]
	Query(#[from] QueryRejection),
	#[error("path error: {0}")]
	Path(#[from] PathRejection),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("serialization error: {0}")]
	Serialize(#[from] serde_json::Error),
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
	#[error("{0}")]
	Shared(Arc<AppError>),
	#[error("unknown route")]
	UnknownRoute,
}

impl AppError {
	fn status(&self) -> StatusCode {
		match self {
			Self::Validation(..) | Self::Json(..) | Self::Query(..) | Self::Path(..) => {
				StatusCode::BAD_REQUEST
			}
			Self::UnknownRoute => StatusCode::NOT_FOUND,
			Self::Database(..) | Self::Serialize(..) | Self::Io(..) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
			Self::Shared(inner) => inner.status(),
		}
	}

	fn errors(&self) -> Vec<Message> {
		match self {
			Self::Validation(errors) => {
				let mut messages = errors
					.field_errors()
					.into_iter()
					.flat_map(|(field, errors)| {
						errors.iter().map(move |error| {
							let content = error
								.message
								.clone()
								.unwrap_or_else(|| error.code.clone());

							Message::new(content).field(field)
						})
					})
					.collect::<Vec<_>>();

				// `field_errors` is backed by a hash map
				messages.sort_by(|a, b| a.field.cmp(&b.field));
				messages
			}
			Self::Json(error) => Message::new(error.body_text()).into_vec(),
			Self::Query(error) => Message::new(error.body_text()).into_vec(),
			Self::Path(error) => Message::new(error.body_text()).into_vec(),
			Self::UnknownRoute => Message::new("not_found").into_vec(),
			Self::Shared(inner) => inner.errors(),
			Self::Database(..) | Self::Serialize(..) | Self::Io(..) => Vec::new(),
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response {
		let status = self.status();

		if status.is_server_error() {
			tracing::error!(error = %self, "request failed");
		}

		(status, Json(ErrorResponse::new(self.errors()))).into_response()
	}
}

/// The error type returned by route handlers, combining the shared
/// [`AppError`] with the errors specific to a group of routes.
#[derive(Debug)]
pub enum RouteError<T> {
	App(AppError),
	Route(T),
}

impl<T: fmt::Display> fmt::Display for RouteError<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::App(error) => fmt::Display::fmt(error, f),
			Self::Route(error) => fmt::Display::fmt(error, f),
		}
	}
}

impl<T: fmt::Debug + fmt::Display> std::error::Error for RouteError<T> {}

impl<T: ErrorShape> From<T> for RouteError<T> {
	fn from(error: T) -> Self {
		Self::Route(error)
	}
}

impl<T> From<AppError> for RouteError<T> {
	fn from(error: AppError) -> Self {
		Self::App(error)
	}
}

impl<T> From<sqlx::Error> for RouteError<T> {
	fn from(error: sqlx::Error) -> Self {
		Self::App(error.into())
	}
}

impl<T> From<validator::ValidationErrors> for RouteError<T> {
	fn from(errors: validator::ValidationErrors) -> Self {
		Self::App(errors.into())
	}
}

impl<T: ErrorShape> IntoResponse for RouteError<T> {
	fn into_response(self) -> Response {
		let error = match self {
			Self::App(error) => return error.into_response(),
			Self::Route(error) => error,
		};

		let status = error.status();
		let location = error.location();
		let body = Json(ErrorResponse::new(error.into_errors()));

		match location {
			Some(location) => (status, [(header::LOCATION, location)], body).into_response(),
			None => (status, body).into_response(),
		}
	}
}

impl<T> OperationOutput for RouteError<T> {
	type Inner = ErrorResponse;
}
