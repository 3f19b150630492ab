//! Classification of user input into a local file or a remote URL

use std::path::{Path, PathBuf};
use url::Url;

/// Stem used when a URL carries no usable file name
pub const DEFAULT_STEM: &str = "image";

/// Where the image bytes live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    LocalFile(PathBuf),
    RemoteUrl(Url),
}

/// A resolved image source together with its output stem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    location: SourceLocation,
    stem: String,
}

impl ImageSource {
    /// Resolve raw user text into a source
    ///
    /// Returns `None` when the text names neither a parseable http(s) URL nor
    /// an existing file; the caller decides whether to ask again.
    pub fn resolve(raw: &str) -> Option<Self> {
        let cleaned = clean_input(raw);
        if cleaned.is_empty() {
            return None;
        }

        if has_http_scheme(cleaned) {
            return match Url::parse(cleaned) {
                Ok(url) => Some(Self::from_url(url)),
                Err(e) => {
                    log::debug!("Rejected URL input {}: {}", cleaned, e);
                    None
                },
            };
        }

        let path = Path::new(cleaned);
        if path.is_file() {
            Some(Self::from_path(path))
        } else {
            log::debug!("File not found: {}", path.display());
            None
        }
    }

    /// Wrap a local path without checking that it exists
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_STEM.to_string());
        Self {
            location: SourceLocation::LocalFile(path),
            stem,
        }
    }

    pub fn from_url(url: Url) -> Self {
        let stem = url_stem(&url);
        Self {
            location: SourceLocation::RemoteUrl(url),
            stem,
        }
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.location, SourceLocation::RemoteUrl(_))
    }

    /// Directory outputs derived from this source are written to
    ///
    /// The file's parent for local sources, the working directory for URLs.
    ///
    /// # Errors
    /// - The working directory cannot be determined
    pub fn output_dir(&self) -> std::io::Result<PathBuf> {
        match &self.location {
            SourceLocation::LocalFile(path) => match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => Ok(parent.to_path_buf()),
                _ => Ok(PathBuf::from(".")),
            },
            SourceLocation::RemoteUrl(_) => std::env::current_dir(),
        }
    }
}

impl std::fmt::Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            SourceLocation::LocalFile(path) => write!(f, "{}", path.display()),
            SourceLocation::RemoteUrl(url) => write!(f, "{url}"),
        }
    }
}

/// Strip surrounding whitespace and the quotes terminals add on drag-and-drop
pub fn clean_input(raw: &str) -> &str {
    raw.trim().trim_matches(|c| c == '\'' || c == '"')
}

fn has_http_scheme(text: &str) -> bool {
    let lower = text.get(..8).unwrap_or(text).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Last non-empty path segment without its extension; query and fragment are ignored
fn url_stem(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
        .unwrap_or_default();
    let stem = Path::new(segment)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    if stem.is_empty() {
        DEFAULT_STEM.to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stem_of(url: &str) -> String {
        ImageSource::from_url(Url::parse(url).unwrap()).stem().to_string()
    }

    #[test]
    fn test_local_stem() {
        let source = ImageSource::from_path("/a/b/photo.png");
        assert_eq!(source.stem(), "photo");
        assert!(!source.is_remote());

        assert_eq!(ImageSource::from_path("archive.tar.gz").stem(), "archive.tar");
        assert_eq!(ImageSource::from_path("noext").stem(), "noext");
    }

    #[test]
    fn test_url_stem_ignores_query() {
        assert_eq!(stem_of("https://x.com/img/cat.jpg?x=1"), "cat");
        assert_eq!(stem_of("http://x.com/dog.webp#frag"), "dog");
        assert_eq!(stem_of("https://x.com/img/"), "img");
        assert_eq!(stem_of("https://x.com/img/cat.jpg/"), "cat");
        assert_eq!(stem_of("https://x.com//"), "image");
        assert_eq!(stem_of("https://x.com/"), "image");
        assert_eq!(stem_of("https://x.com"), "image");
    }

    #[test]
    fn test_stem_is_stable() {
        let first = ImageSource::from_path("/a/b/photo.png");
        let again = ImageSource::from_path(first.stem());
        assert_eq!(again.stem(), "photo");
    }

    #[test]
    fn test_clean_input() {
        assert_eq!(clean_input("  'photo.png'\n"), "photo.png");
        assert_eq!(clean_input("\"/tmp/a b.jpg\""), "/tmp/a b.jpg");
    }

    #[test]
    fn test_resolve_classification() {
        let remote = ImageSource::resolve(" https://example.com/pics/cat.png ").unwrap();
        assert!(remote.is_remote());
        assert_eq!(remote.stem(), "cat");

        let upper = ImageSource::resolve("HTTPS://example.com/a.png").unwrap();
        assert!(upper.is_remote());

        assert!(ImageSource::resolve("").is_none());
        assert!(ImageSource::resolve("/definitely/not/here.png").is_none());
        assert!(ImageSource::resolve("http://").is_none());
    }

    #[test]
    fn test_resolve_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("photo.jpg");
        std::fs::write(&file, b"not checked here").unwrap();

        let quoted = format!("'{}'", file.display());
        let source = ImageSource::resolve(&quoted).unwrap();
        assert_eq!(source.location(), &SourceLocation::LocalFile(file));
        assert_eq!(source.output_dir().unwrap(), dir.path());

        // Directories are not image files
        assert!(ImageSource::resolve(&dir.path().display().to_string()).is_none());
    }

    #[test]
    fn test_output_dir_for_bare_file_name() {
        assert_eq!(
            ImageSource::from_path("photo.jpg").output_dir().unwrap(),
            PathBuf::from(".")
        );
        let remote = ImageSource::from_url(Url::parse("https://x.com/a.png").unwrap());
        assert_eq!(remote.output_dir().unwrap(), std::env::current_dir().unwrap());
    }
}
