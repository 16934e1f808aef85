mod route;

use proc_macro::TokenStream;

/// Creates a new documentation function for the route, named after the original function with the suffix `_docs`.
///
/// ```rust,ignore
/// /// Get post
/// /// Returns a single post with its comments.
/// #[route(tag = tag::POST)]
/// pub async fn get_post() {}
///
/// /// Follow author
/// /// Follows an author, then redirects to their profile.
/// #[route(tag = tag::FOLLOW, redirect = "Redirects to the author's profile.")]
/// pub async fn follow() {}
/// ```
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
	route::from_input(args, input)
}
