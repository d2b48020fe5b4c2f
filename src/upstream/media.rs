//! Media-upload adapter.
//!
//! Speaks the Cloudinary wire shape: `POST {base}/{cloud}/{resource}/upload`
//! as a multipart form under basic auth. Uploads are rare and large, so they
//! use a per-call connection instead of the pooled client, a dedicated
//! breaker, and exactly one attempt (no retry loop).

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::MediaConfig;
use crate::error::{snippet, GatewayError, GatewayResult};
use crate::observability::metrics;
use crate::resilience::CircuitBreaker;
use crate::upstream::executor::is_transient;

/// Character budget for body snippets in upload errors.
const SNIPPET_MAX_CHARS: usize = 256;

/// A stored object: its identifier and publicly addressable URL.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadResult {
    pub public_id: String,
    pub secure_url: String,
}

/// Adapter for the media-hosting upstream.
#[derive(Debug)]
pub struct MediaUpstream {
    config: MediaConfig,
    base_url: String,
    timeout: Duration,
    breaker: Arc<CircuitBreaker>,
}

impl MediaUpstream {
    pub(crate) fn new(config: &MediaConfig, timeout: Duration, breaker: Arc<CircuitBreaker>) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            config: config.clone(),
            timeout,
            breaker,
        }
    }

    /// Whether all three upload credentials are present.
    pub fn is_configured(&self) -> bool {
        !self.config.cloud_name.is_empty()
            && !self.config.api_key.is_empty()
            && !self.config.api_secret.is_empty()
    }

    /// Upload an image; see [`MediaUpstream::upload`].
    pub async fn upload_image(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        folder: Option<&str>,
    ) -> GatewayResult<UploadResult> {
        self.upload(bytes, filename, folder, "image").await
    }

    /// Upload a file as the given resource type.
    ///
    /// The stored object's public id is the filename stem (extension
    /// stripped). Fails with a configuration error before any I/O when
    /// credentials are missing.
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        folder: Option<&str>,
        resource_type: &str,
    ) -> GatewayResult<UploadResult> {
        if !self.is_configured() {
            return Err(GatewayError::Configuration(
                "media upload credentials missing (cloud_name, api_key, api_secret)".to_string(),
            ));
        }
        self.breaker.allow()?;

        let url = format!(
            "{}/{}/{}/upload",
            self.base_url, self.config.cloud_name, resource_type
        );
        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(filename.to_string()))
            .text("folder", folder.unwrap_or("").to_string())
            .text("public_id", public_id_for(filename))
            .text("upload_preset", self.config.upload_preset.clone());

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| GatewayError::Configuration(format!("failed to build http client: {e}")))?;

        let started = Instant::now();
        let result = client
            .post(&url)
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .multipart(form)
            .send()
            .await;

        match result {
            Ok(response) if response.status() == StatusCode::OK => {
                self.breaker.report_success();
                metrics::record_upstream_request(self.breaker.name(), 200, started);
                let uploaded: UploadResult =
                    response
                        .json()
                        .await
                        .map_err(|e| GatewayError::BadUpstreamResponse {
                            url: url.clone(),
                            status: StatusCode::OK.as_u16(),
                            snippet: snippet(&e.to_string(), SNIPPET_MAX_CHARS),
                        })?;
                tracing::info!(
                    public_id = %uploaded.public_id,
                    filename,
                    "media upload stored"
                );
                Ok(uploaded)
            }
            Ok(response) if is_transient(response.status()) => {
                let status = response.status();
                self.breaker.report_failure();
                metrics::record_upstream_request(self.breaker.name(), status.as_u16(), started);
                tracing::warn!(status = status.as_u16(), url = %url, "media upstream unavailable");
                Err(GatewayError::UpstreamUnavailable {
                    reason: format!("{url} returned {status}"),
                    retry_after: None,
                })
            }
            Ok(response) => {
                let status = response.status();
                self.breaker.report_failure();
                metrics::record_upstream_request(self.breaker.name(), status.as_u16(), started);
                let body_text = response.text().await.unwrap_or_default();
                Err(GatewayError::BadUpstreamResponse {
                    url,
                    status: status.as_u16(),
                    snippet: snippet(&body_text, SNIPPET_MAX_CHARS),
                })
            }
            Err(err) if err.is_timeout() => {
                self.breaker.report_failure();
                metrics::record_upstream_error(self.breaker.name(), "timeout");
                Err(GatewayError::UpstreamTimeout { url })
            }
            Err(err) => {
                self.breaker.report_failure();
                metrics::record_upstream_error(self.breaker.name(), "network");
                Err(GatewayError::UpstreamUnavailable {
                    reason: format!("error calling {url}: {err}"),
                    retry_after: None,
                })
            }
        }
    }
}

/// Public identifier derived from a filename: the stem, extension stripped.
fn public_id_for(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string())
}
