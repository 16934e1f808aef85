use std::{path::PathBuf, sync::Arc};

use base64::Engine;
use uuid::Uuid;

/// Directory (relative to the media root) that post images are stored in.
const POST_IMAGES: &str = "posts";

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
	#[error("image is not valid base64: {0}")]
	Encoding(#[from] base64::DecodeError),
	#[error("image is not a supported picture format")]
	UnknownFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
	Png,
	Jpeg,
	Gif,
	Webp,
	Bmp,
}

impl ImageFormat {
	/// Detects the format from the leading signature bytes.
	pub fn sniff(bytes: &[u8]) -> Option<Self> {
		match bytes {
			[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(Self::Png),
			[0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
			[b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some(Self::Gif),
			[b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(Self::Webp),
			[b'B', b'M', ..] if bytes.len() > 14 => Some(Self::Bmp),
			_ => None,
		}
	}

	pub fn extension(self) -> &'static str {
		match self {
			Self::Png => "png",
			Self::Jpeg => "jpg",
			Self::Gif => "gif",
			Self::Webp => "webp",
			Self::Bmp => "bmp",
		}
	}
}

/// A decoded image upload, ready to be stored.
#[derive(Debug)]
pub struct Image {
	pub bytes: Vec<u8>,
	pub format: ImageFormat,
}

impl Image {
	/// Decodes a base64 payload, optionally wrapped in a `data:` URL.
	pub fn decode(payload: &str) -> Result<Self, ImageError> {
		let payload = payload.trim();
		let payload = match payload.strip_prefix("data:") {
			Some(url) => url.split_once(',').map_or(url, |(_, data)| data),
			None => payload,
		};

		let bytes = base64::engine::general_purpose::STANDARD.decode(payload)?;
		let format = ImageFormat::sniff(&bytes).ok_or(ImageError::UnknownFormat)?;

		Ok(Self { bytes, format })
	}
}

/// Stores uploaded files under a root directory, handing out opaque
/// references relative to that root.
#[derive(Clone, Debug)]
pub struct MediaStore {
	root: Arc<PathBuf>,
}

impl MediaStore {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self {
			root: Arc::new(root.into()),
		}
	}

	/// Writes a post image and returns its reference.
	pub async fn save_post_image(&self, image: &Image) -> std::io::Result<String> {
		let directory = self.root.join(POST_IMAGES);
		tokio::fs::create_dir_all(&directory).await?;

		let name = format!("{}.{}", Uuid::new_v4(), image.format.extension());
		tokio::fs::write(directory.join(&name), &image.bytes).await?;

		tracing::debug!(%name, "stored post image");

		Ok(format!("{POST_IMAGES}/{name}"))
	}

	/// Deletes a stored file by its reference.
	pub async fn remove(&self, reference: &str) -> std::io::Result<()> {
		tokio::fs::remove_file(self.root.join(reference)).await
	}

	#[cfg(test)]
	pub fn path(&self, reference: &str) -> PathBuf {
		self.root.join(reference)
	}
}

#[cfg(test)]
pub mod test {
	use super::*;

	/// The smallest valid GIF: a single transparent pixel.
	pub const PIXEL_GIF: &[u8] = &[
		0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
		0x00, 0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
		0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x01, 0x44, 0x00, 0x3B,
	];

	pub fn pixel_base64() -> String {
		base64::engine::general_purpose::STANDARD.encode(PIXEL_GIF)
	}

	#[test]
	fn test_decode_plain_base64() {
		let image = Image::decode(&pixel_base64()).unwrap();

		assert_eq!(image.format, ImageFormat::Gif);
		assert_eq!(image.bytes, PIXEL_GIF);
	}

	#[test]
	fn test_decode_data_url() {
		let payload = format!("data:image/gif;base64,{}", pixel_base64());

		assert_eq!(Image::decode(&payload).unwrap().format, ImageFormat::Gif);
	}

	#[test]
	fn test_reject_invalid_base64() {
		assert!(matches!(
			Image::decode("not base64!"),
			Err(ImageError::Encoding(..))
		));
	}

	#[test]
	fn test_reject_non_image() {
		let payload = base64::engine::general_purpose::STANDARD.encode(b"just some text");

		assert!(matches!(
			Image::decode(&payload),
			Err(ImageError::UnknownFormat)
		));
	}

	#[test]
	fn test_sniff_formats() {
		assert_eq!(
			ImageFormat::sniff(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"),
			Some(ImageFormat::Png)
		);
		assert_eq!(
			ImageFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]),
			Some(ImageFormat::Jpeg)
		);
		assert_eq!(
			ImageFormat::sniff(b"RIFF\0\0\0\0WEBPVP8 "),
			Some(ImageFormat::Webp)
		);
		assert_eq!(ImageFormat::sniff(b"BM"), None);
	}

	#[tokio::test]
	async fn test_save_post_image() {
		let root = tempfile::tempdir().unwrap();
		let store = MediaStore::new(root.path());
		let image = Image::decode(&pixel_base64()).unwrap();

		let reference = store.save_post_image(&image).await.unwrap();

		assert!(reference.starts_with("posts/"));
		assert!(reference.ends_with(".gif"));
		assert_eq!(
			tokio::fs::read(store.path(&reference)).await.unwrap(),
			PIXEL_GIF
		);
	}

	#[tokio::test]
	async fn test_remove_post_image() {
		let root = tempfile::tempdir().unwrap();
		let store = MediaStore::new(root.path());
		let image = Image::decode(&pixel_base64()).unwrap();

		let reference = store.save_post_image(&image).await.unwrap();
		store.remove(&reference).await.unwrap();

		assert!(!store.path(&reference).exists());
	}
}
