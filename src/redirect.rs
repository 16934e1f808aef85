use aide::OperationOutput;
use axum::response::{IntoResponse, Redirect, Response};

/// A `303 See Other` to one of the canonical read views.
#[derive(Debug, PartialEq, Eq)]
pub struct SeeOther(pub String);

impl SeeOther {
	/// The profile feed of `username`.
	pub fn profile(username: &str) -> Self {
		Self(format!("/profile/{username}"))
	}

	/// The detail view of a post.
	pub fn post(id: i64) -> Self {
		Self(format!("/posts/{id}"))
	}

	/// The login flow, returning to `next` afterwards.
	pub fn login(next: &str) -> Self {
		let query = serde_urlencoded::to_string(&[("next", next)]).unwrap_or_default();

		Self(format!("/auth/login?{query}"))
	}
}

impl IntoResponse for SeeOther {
	fn into_response(self) -> Response {
		Redirect::to(&self.0).into_response()
	}
}

impl OperationOutput for SeeOther {
	type Inner = ();
}

/// Whether `next` is a path on this site, so it is safe to redirect to.
pub fn is_local(next: &str) -> bool {
	next.starts_with('/') && !next.starts_with("//") && !next.contains('\\')
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_login_escapes_return_path() {
		assert_eq!(
			SeeOther::login("/follow?page=2").0,
			"/auth/login?next=%2Ffollow%3Fpage%3D2"
		);
	}

	#[test]
	fn test_is_local() {
		assert!(is_local("/posts/1"));
		assert!(!is_local("//evil.example"));
		assert!(!is_local("https://evil.example"));
		assert!(!is_local("/\\evil.example"));
	}
}
