//! HTTP access to the gallery backend
//!
//! Implements [`MediaSource`] over the backend's JSON API:
//! - `GET /api/thumbnails/{size}/{folder}` folder listing
//! - `GET /api/check-changes/{folder}` change signature
//! - `DELETE /api/delete/{path}` deletion

use app_core::{AppError, ChangeSignature, MediaItem, MediaSource};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Body of a delete response
#[derive(Debug, Deserialize)]
struct DeleteResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// [`MediaSource`] backed by the gallery HTTP API
#[derive(Debug, Clone)]
pub struct HttpMediaSource {
    client: Client,
    base_url: Url,
}

impl HttpMediaSource {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("invalid server url {:?}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!("server url {} cannot be a base", base_url)));
        }

        let client = Client::builder()
            .user_agent(concat!("gallery_viewer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Init(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// `{base}/{prefix...}/{path segments}`. Segments are percent-encoded individually.
    pub fn endpoint(&self, prefix: &[&str], path: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            segments.extend(prefix);
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, AppError> {
        tracing::debug!("GET {}", url);
        let res = self.client.get(url.clone()).send().await.map_err(transport)?;
        let status = res.status();
        let body = res.bytes().await.map_err(transport)?;
        parse_json(&url, status, &body)
    }
}

#[async_trait]
impl MediaSource for HttpMediaSource {
    async fn list_folder(&self, path: &str, size_hint: u32) -> Result<Vec<MediaItem>, AppError> {
        let size = size_hint.to_string();
        self.get_json(self.endpoint(&["api", "thumbnails", size.as_str()], path))
            .await
    }

    async fn change_signature(&self, path: &str) -> Result<ChangeSignature, AppError> {
        self.get_json(self.endpoint(&["api", "check-changes"], path)).await
    }

    async fn delete_item(&self, path: &str) -> Result<(), AppError> {
        let url = self.endpoint(&["api", "delete"], path);
        tracing::debug!("DELETE {}", url);

        let res = self.client.delete(url).send().await.map_err(transport)?;
        let status = res.status();
        let body = res.bytes().await.map_err(transport)?;
        delete_outcome(path, status, &body)
    }
}

/// Status check, then decode
fn parse_json<T: DeserializeOwned>(url: &Url, status: StatusCode, body: &[u8]) -> Result<T, AppError> {
    if !status.is_success() {
        return Err(AppError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    serde_json::from_slice(body).map_err(|e| AppError::Decode(format!("{}: {}", url, e)))
}

/// Failures carry a JSON body with the reason, so the body is read before judging the status
fn delete_outcome(path: &str, status: StatusCode, body: &[u8]) -> Result<(), AppError> {
    let body: DeleteResponse = serde_json::from_slice(body).unwrap_or(DeleteResponse {
        success: false,
        error: None,
    });

    if status.is_success() && body.success {
        return Ok(());
    }

    let reason = body
        .error
        .unwrap_or_else(|| format!("server returned {}", status));
    Err(AppError::DeleteFailed {
        path: path.to_string(),
        reason,
    })
}

/// Connection-level failure: no usable response at all
fn transport(e: reqwest::Error) -> AppError {
    AppError::Transport(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_url() {
        let source = HttpMediaSource::new("http://gallery.local:5000").unwrap();
        let url = source.endpoint(&["api", "thumbnails", "180"], "trips/2023");
        assert_eq!(url.as_str(), "http://gallery.local:5000/api/thumbnails/180/trips/2023");

        let root = source.endpoint(&["api", "thumbnails", "80"], "");
        assert_eq!(root.as_str(), "http://gallery.local:5000/api/thumbnails/80");
    }

    #[test]
    fn test_segments_are_encoded() {
        let source = HttpMediaSource::new("http://h/base/").unwrap();
        let url = source.endpoint(&["api", "delete"], "my photos/a#1.jpg");
        assert_eq!(url.as_str(), "http://h/base/api/delete/my%20photos/a%231.jpg");
    }

    fn url() -> Url {
        Url::parse("http://h/api/check-changes/a").unwrap()
    }

    #[test]
    fn test_json_body_decoded() {
        let body = br#"{"last_modified": 12.5, "item_count": 3}"#;
        let sig: ChangeSignature = parse_json(&url(), StatusCode::OK, body).unwrap();
        assert_eq!(sig, ChangeSignature::new(12.5, 3));

        let body = br#"[{"type": "folder", "path": "sub", "name": "sub"}, {"type": "image", "path": "a.jpg", "filename": "a.jpg", "thumbnail": "/t/a"}]"#;
        let items: Vec<MediaItem> = parse_json(&url(), StatusCode::OK, body).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].thumbnail.as_deref(), Some("/t/a"));
    }

    #[test]
    fn test_error_status_wins_over_body() {
        let err = parse_json::<ChangeSignature>(&url(), StatusCode::NOT_FOUND, br#"{"error": "no such folder"}"#)
            .unwrap_err();
        assert!(matches!(err, AppError::Status { status: 404, ref url } if url.ends_with("/check-changes/a")));
    }

    #[test]
    fn test_undecodable_body() {
        let err = parse_json::<ChangeSignature>(&url(), StatusCode::OK, b"<html>oops</html>").unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));

        let err = parse_json::<ChangeSignature>(&url(), StatusCode::OK, br#"{"item_count": 1}"#).unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));
    }

    #[test]
    fn test_delete_success() {
        assert!(delete_outcome("a.jpg", StatusCode::OK, br#"{"success": true}"#).is_ok());
    }

    #[test]
    fn test_delete_reported_failure_keeps_server_reason() {
        let err = delete_outcome("trips/a.jpg", StatusCode::OK, br#"{"success": false, "error": "File is locked"}"#)
            .unwrap_err();
        match err {
            AppError::DeleteFailed { path, reason } => {
                assert_eq!(path, "trips/a.jpg");
                assert_eq!(reason, "File is locked");
            }
            other => panic!("unexpected {:?}", other),
        }

        let err = delete_outcome("a.jpg", StatusCode::FORBIDDEN, br#"{"error": "Access denied"}"#).unwrap_err();
        assert!(matches!(err, AppError::DeleteFailed { ref reason, .. } if reason == "Access denied"));
    }

    #[test]
    fn test_delete_error_status_without_body() {
        let err = delete_outcome("a.jpg", StatusCode::INTERNAL_SERVER_ERROR, b"").unwrap_err();
        assert!(
            matches!(err, AppError::DeleteFailed { ref reason, .. } if reason == "server returned 500 Internal Server Error")
        );

        // A 2xx without a success flag is not trusted
        let err = delete_outcome("a.jpg", StatusCode::OK, b"{}").unwrap_err();
        assert!(matches!(err, AppError::DeleteFailed { .. }));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(HttpMediaSource::new("not a url"), Err(AppError::Config(_))));
        assert!(matches!(HttpMediaSource::new("mailto:x@y"), Err(AppError::Config(_))));
    }
}
