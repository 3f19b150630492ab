//! Background removal through the remove.bg HTTP API
//!
//! Local files are uploaded as `image_file`; URL sources are passed by
//! reference as `image_url` and never downloaded here. The service answers
//! with PNG bytes whatever output format the caller wants.

use crate::{
    config::{redacted, ApiCredential, EditorConfig},
    download::build_client,
    error::{EditorError, Result},
    source::{ImageSource, SourceLocation},
};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, StatusCode};
use serde::Deserialize;
use std::path::Path;
use tokio_util::io::ReaderStream;

/// Header carrying the credential
pub const API_KEY_HEADER: &str = "X-Api-Key";

const CREDITS_HEADER: &str = "X-Credits-Charged";

/// A service that cuts the background out of an image
#[async_trait]
pub trait BackgroundRemovalBackend: Send + Sync {
    /// Return the PNG-encoded cut-out for `source`
    async fn remove_background(&self, source: &ImageSource) -> Result<Vec<u8>>;
}

/// Client for the remove.bg API
#[derive(Clone)]
pub struct RemoveBgClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for RemoveBgClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoveBgClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &redacted(self.api_key.as_deref()))
            .finish_non_exhaustive()
    }
}

impl RemoveBgClient {
    /// # Errors
    /// - Failed to create HTTP client
    pub fn new(config: &EditorConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.network_timeout)?,
            endpoint: config.removal_endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }

    async fn build_form(source: &ImageSource) -> Result<RemovalRequest> {
        match source.location() {
            SourceLocation::RemoteUrl(url) => Ok(RemovalRequest::UrlReference(vec![
                ("image_url", url.to_string()),
                ("size", "auto".to_string()),
            ])),
            SourceLocation::LocalFile(path) => {
                let part = file_part(path).await?;
                Ok(RemovalRequest::Upload(
                    Form::new().text("size", "auto").part("image_file", part),
                ))
            },
        }
    }
}

enum RemovalRequest {
    UrlReference(Vec<(&'static str, String)>),
    Upload(Form),
}

/// Stream the file's bytes as a multipart part
async fn file_part(path: &Path) -> Result<Part> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| EditorError::file_io_error("open image for upload", path, &e))?;
    let length = file
        .metadata()
        .await
        .map_err(|e| EditorError::file_io_error("read image metadata", path, &e))?
        .len();
    let file_name = path
        .file_name()
        .map_or_else(|| "image".to_string(), |n| n.to_string_lossy().into_owned());

    Ok(Part::stream_with_length(Body::wrap_stream(ReaderStream::new(file)), length)
        .file_name(file_name))
}

#[async_trait]
impl BackgroundRemovalBackend for RemoveBgClient {
    async fn remove_background(&self, source: &ImageSource) -> Result<Vec<u8>> {
        // No request leaves the process without a usable key
        let credential = ApiCredential::resolve(self.api_key.as_deref())?;

        let request = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, credential.expose());
        let request = match Self::build_form(source).await? {
            RemovalRequest::UrlReference(fields) => request.form(&fields),
            RemovalRequest::Upload(form) => request.multipart(form),
        };

        log::info!("Requesting background removal for {}", source);
        let response = request
            .send()
            .await
            .map_err(|e| EditorError::network(format!("Background removal request failed: {}", e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            let message = failure_message(status, response.text().await);
            log::warn!("remove.bg answered {}: {}", status.as_u16(), message);
            return Err(EditorError::RemoteApi {
                status: status.as_u16(),
                message,
            });
        }

        if let Some(credits) = response
            .headers()
            .get(CREDITS_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            log::info!("remove.bg credits charged: {}", credits);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| EditorError::network(format!("Failed to read API response: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    errors: Vec<ApiErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEntry {
    title: Option<String>,
}

/// `errors[0].title` from a JSON error body, else the body verbatim
pub fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.errors.into_iter().next())
        .and_then(|entry| entry.title)
        .unwrap_or_else(|| body.to_string())
}

/// Message for a non-200 answer; the status reason stands in for an unreadable body
fn failure_message<E: std::fmt::Display>(
    status: StatusCode,
    body: std::result::Result<String, E>,
) -> String {
    match body {
        Ok(body) => extract_error_message(&body),
        Err(e) => {
            log::debug!("Failed to read error body: {}", e);
            status.canonical_reason().unwrap_or("Unknown error").to_string()
        },
    }
}

/// Decode an API payload, which is PNG regardless of what was requested
///
/// # Errors
/// - `EditorError::Decode` if the payload is not a PNG image
pub fn decode_api_payload(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|e| EditorError::decode_error("remove.bg response", &e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_error_title() {
        assert_eq!(
            extract_error_message(r#"{"errors":[{"title":"Invalid image"}]}"#),
            "Invalid image"
        );
        assert_eq!(
            extract_error_message(r#"{"errors":[{"title":"First"},{"title":"Second"}]}"#),
            "First"
        );
    }

    #[test]
    fn test_extract_error_falls_back_to_body() {
        assert_eq!(
            extract_error_message("Internal Server Error"),
            "Internal Server Error"
        );
        assert_eq!(extract_error_message(r#"{"errors":[]}"#), r#"{"errors":[]}"#);
        assert_eq!(
            extract_error_message(r#"{"errors":[{"code":"x"}]}"#),
            r#"{"errors":[{"code":"x"}]}"#
        );
        assert_eq!(extract_error_message(r#"{"detail":"nope"}"#), r#"{"detail":"nope"}"#);
        assert_eq!(extract_error_message(""), "");
    }

    #[test]
    fn test_decode_payload_requires_png() {
        let mut jpeg = Vec::new();
        DynamicImage::new_rgb8(2, 2)
            .write_to(&mut std::io::Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .unwrap();
        assert!(matches!(
            decode_api_payload(&jpeg).unwrap_err(),
            EditorError::Decode(_)
        ));
    }

    #[tokio::test]
    async fn test_missing_key_sends_nothing() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let config = EditorConfig::builder()
            .removal_endpoint(server.url())
            .build()
            .unwrap();
        let client = RemoveBgClient::new(&config).unwrap();
        let source = ImageSource::from_path("does-not-matter.png");

        let err = client.remove_background(&source).await.unwrap_err();
        assert!(err.is_configuration());
        mock.assert_async().await;
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = EditorConfig::builder().api_key("sk-secret-123").build().unwrap();
        let client = RemoveBgClient::new(&config).unwrap();
        let printed = format!("{client:?}");
        assert!(!printed.contains("sk-secret-123"), "{printed}");
        assert!(printed.contains("***"));
    }

    #[tokio::test]
    async fn test_silent_api_times_out() {
        // Accepts connections and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _held = tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let config = EditorConfig::builder()
            .removal_endpoint(format!("http://{addr}/v1.0/removebg"))
            .api_key("test-key")
            .network_timeout(std::time::Duration::from_millis(200))
            .build()
            .unwrap();
        let client = RemoveBgClient::new(&config).unwrap();
        let source = ImageSource::from_url(url::Url::parse("https://example.com/cat.png").unwrap());

        let started = std::time::Instant::now();
        let err = client.remove_background(&source).await.unwrap_err();
        assert!(matches!(err, EditorError::Network(_)), "got {err:?}");
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }

    #[test]
    fn test_unreadable_error_body_uses_status_reason() {
        let unreadable: std::result::Result<String, &str> = Err("connection reset");
        assert_eq!(
            failure_message(StatusCode::INTERNAL_SERVER_ERROR, unreadable),
            "Internal Server Error"
        );
        assert_eq!(
            failure_message::<&str>(StatusCode::BAD_REQUEST, Ok(r#"{"errors":[{"title":"Bad"}]}"#.into())),
            "Bad"
        );
    }
}
