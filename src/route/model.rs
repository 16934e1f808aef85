use schemars::JsonSchema;
use serde::Deserialize;
use validator::Validate;

/// The requested feed page.
///
/// Anything that is not a number falls back to the first page, so stale or
/// hand-edited links never fail.
#[derive(Debug, Default, Deserialize, Validate, JsonSchema)]
pub struct PageInput {
	/// The page number to return (1-indexed).
	pub page: Option<String>,
}

impl PageInput {
	pub fn number(&self) -> i64 {
		let Some(page) = self.page.as_deref().map(str::trim) else {
			return 1;
		};

		match page.parse() {
			Ok(number) => number,
			// Too large for an i64, which is past the last page either way
			Err(_) if !page.is_empty() && page.bytes().all(|b| b.is_ascii_digit()) => i64::MAX,
			Err(_) => 1,
		}
	}
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct IdInput {
	pub id: i64,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct UsernameInput {
	pub username: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct SlugInput {
	pub slug: String,
}

#[cfg(test)]
mod test {
	use super::PageInput;

	fn page(value: &str) -> i64 {
		PageInput {
			page: Some(value.into()),
		}
		.number()
	}

	#[test]
	fn test_missing_page_is_first() {
		assert_eq!(PageInput::default().number(), 1);
	}

	#[test]
	fn test_numeric_page() {
		assert_eq!(page("2"), 2);
		assert_eq!(page(" 7 "), 7);
		assert_eq!(page("-3"), -3);
	}

	#[test]
	fn test_non_numeric_page_is_first() {
		assert_eq!(page("last"), 1);
		assert_eq!(page(""), 1);
		assert_eq!(page("2.5"), 1);
	}

	#[test]
	fn test_huge_page_is_past_the_end() {
		assert_eq!(page("99999999999999999999999"), i64::MAX);
	}
}
