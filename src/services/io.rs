//! Image I/O operations service
//!
//! Loading from either kind of source, and persisting encoded results under a
//! name derived from the source.

use crate::{
    download::ImageDownloader,
    error::{EditorError, Result},
    services::format::EncodedImage,
    source::{ImageSource, SourceLocation},
    types::DecodedImage,
};
use std::path::{Path, PathBuf};

/// Suffix for format conversion outputs
pub const CONVERTED_SUFFIX: &str = "_converted";

/// Suffix for background removal outputs
pub const NO_BACKGROUND_SUFFIX: &str = "_nobg";

/// Produces decoded images from resolved sources
#[derive(Debug, Clone)]
pub struct ImageLoader {
    downloader: ImageDownloader,
}

impl ImageLoader {
    pub fn new(downloader: ImageDownloader) -> Self {
        Self { downloader }
    }

    /// Read or download the source and decode it
    ///
    /// # Errors
    /// - `EditorError::Io` when a local file cannot be read
    /// - Download failures from [`ImageDownloader::download`]
    /// - `EditorError::Decode` when the bytes are not an image
    pub async fn load(&self, source: &ImageSource) -> Result<DecodedImage> {
        let bytes = match source.location() {
            SourceLocation::LocalFile(path) => tokio::fs::read(path)
                .await
                .map_err(|e| EditorError::file_io_error("read image file", path, &e))?,
            SourceLocation::RemoteUrl(url) => self.downloader.download(url).await?,
        };

        let decoded = DecodedImage::decode(&bytes, &source.to_string())?;
        log::debug!(
            "Loaded {} ({}x{}, mode {})",
            source,
            decoded.width(),
            decoded.height(),
            decoded.mode()
        );
        Ok(decoded)
    }
}

/// Persists encoded images next to their source
pub struct OutputWriter;

impl OutputWriter {
    /// `<dir>/<stem><suffix>.<ext>`
    pub fn output_path(dir: &Path, stem: &str, suffix: &str, extension: &str) -> PathBuf {
        dir.join(format!("{stem}{suffix}.{extension}"))
    }

    /// Write `encoded` under the derived name, replacing any existing file
    ///
    /// # Errors
    /// - `EditorError::Io` if the file cannot be written
    pub fn write(
        encoded: &EncodedImage,
        dir: &Path,
        stem: &str,
        suffix: &str,
    ) -> Result<PathBuf> {
        let path = Self::output_path(dir, stem, suffix, encoded.extension);
        if path.exists() {
            log::info!("Overwriting existing file {}", path.display());
        }

        std::fs::write(&path, &encoded.bytes)
            .map_err(|e| EditorError::file_io_error("write output image", &path, &e))?;

        log::debug!("Wrote {} bytes to {}", encoded.bytes.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn encoded(extension: &'static str, bytes: &[u8]) -> EncodedImage {
        EncodedImage {
            bytes: bytes.to_vec(),
            extension,
            width: 1,
            height: 1,
        }
    }

    #[test]
    fn test_output_path() {
        let dir = Path::new("/photos");
        assert_eq!(
            OutputWriter::output_path(dir, "photo", CONVERTED_SUFFIX, "png"),
            PathBuf::from("/photos/photo_converted.png")
        );
        assert_eq!(
            OutputWriter::output_path(dir, "cat", NO_BACKGROUND_SUFFIX, "webp"),
            PathBuf::from("/photos/cat_nobg.webp")
        );
    }

    #[test]
    fn test_write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let first = OutputWriter::write(&encoded("png", b"one"), dir.path(), "a", CONVERTED_SUFFIX)
            .unwrap();
        let second =
            OutputWriter::write(&encoded("png", b"two"), dir.path(), "a", CONVERTED_SUFFIX).unwrap();
        assert_eq!(first, second);
        assert_eq!(std::fs::read(&second).unwrap(), b"two");
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = OutputWriter::write(&encoded("png", b"x"), &missing, "a", CONVERTED_SUFFIX)
            .unwrap_err();
        assert!(matches!(err, EditorError::Io(_)));
    }

    #[tokio::test]
    async fn test_load_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        image::DynamicImage::new_rgba8(3, 5).save(&path).unwrap();

        let loader = ImageLoader::new(
            ImageDownloader::with_limits(Duration::from_secs(5), 1024).unwrap(),
        );
        let decoded = loader.load(&ImageSource::from_path(&path)).await.unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 5));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let loader = ImageLoader::new(
            ImageDownloader::with_limits(Duration::from_secs(5), 1024).unwrap(),
        );
        let err = loader
            .load(&ImageSource::from_path("/no/such/file.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, EditorError::Io(_)));
    }

    #[tokio::test]
    async fn test_load_from_silent_server_times_out() {
        // Accepts connections and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _held = tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let loader = ImageLoader::new(
            ImageDownloader::with_limits(Duration::from_millis(200), 1024).unwrap(),
        );
        let url = url::Url::parse(&format!("http://{addr}/cat.png")).unwrap();

        let started = std::time::Instant::now();
        let err = loader.load(&ImageSource::from_url(url)).await.unwrap_err();
        assert!(matches!(err, EditorError::Network(_)), "got {err:?}");
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
