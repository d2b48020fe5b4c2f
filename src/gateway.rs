//! Gateway façade: the single egress point for upstream calls.

use std::sync::Arc;

use crate::config::{config_from_env, validate_config, GatewayConfig};
use crate::error::{GatewayError, GatewayResult};
use crate::resilience::CircuitBreaker;
use crate::upstream::inference::{
    EmbeddingsRequest, EmbeddingsResponse, GenerateRequest, GenerateResponse, InferenceUpstream,
};
use crate::upstream::media::{MediaUpstream, UploadResult};

/// Unified handler for external service interactions.
///
/// Owns the configuration, one pooled HTTP client reused across calls, and
/// one circuit breaker per upstream: generation and embeddings share the
/// inference breaker, uploads get their own. The gateway is safe to share
/// (`Arc<Gateway>`) across many concurrent in-flight calls; the breakers are
/// the only locked state.
///
/// Construct once at startup. Dropping the gateway releases the pooled
/// client and its connections on every exit path; there is no separate
/// close step.
#[derive(Debug)]
pub struct Gateway {
    config: GatewayConfig,
    inference: InferenceUpstream,
    media: MediaUpstream,
}

impl Gateway {
    /// Build a gateway from a validated configuration.
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        validate_config(&config).map_err(|errors| {
            GatewayError::Configuration(
                errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            )
        })?;

        let client = reqwest::Client::builder()
            .timeout(config.timeouts.request())
            .build()
            .map_err(|e| GatewayError::Configuration(format!("failed to build http client: {e}")))?;

        let inference_breaker = Arc::new(CircuitBreaker::new(
            "inference",
            config.breaker.failure_threshold,
            config.breaker.cooldown(),
        ));
        let media_breaker = Arc::new(CircuitBreaker::new(
            "media",
            config.breaker.failure_threshold,
            config.breaker.cooldown(),
        ));

        let inference = InferenceUpstream::new(
            client,
            &config.inference,
            config.retries.clone(),
            inference_breaker,
        );
        let media = MediaUpstream::new(&config.media, config.timeouts.request(), media_breaker);

        tracing::info!(
            inference_base_url = %config.inference.base_url,
            media_configured = media.is_configured(),
            retries = config.retries.max_retries,
            failure_threshold = config.breaker.failure_threshold,
            "gateway initialized"
        );

        Ok(Self {
            config,
            inference,
            media,
        })
    }

    /// Build a gateway from environment variables.
    pub fn from_env() -> GatewayResult<Self> {
        Self::new(config_from_env()?)
    }

    /// Send a text generation request to the inference upstream.
    pub async fn generate(&self, req: &GenerateRequest) -> GatewayResult<GenerateResponse> {
        self.inference.generate(req).await
    }

    /// Send an embeddings request to the inference upstream.
    pub async fn embeddings(&self, req: &EmbeddingsRequest) -> GatewayResult<EmbeddingsResponse> {
        self.inference.embeddings(req).await
    }

    /// Upload an image to the media upstream.
    pub async fn upload_image(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        folder: Option<&str>,
    ) -> GatewayResult<UploadResult> {
        self.media.upload_image(bytes, filename, folder).await
    }

    /// Upload a file of an arbitrary resource type to the media upstream.
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        folder: Option<&str>,
        resource_type: &str,
    ) -> GatewayResult<UploadResult> {
        self.media
            .upload(bytes, filename, folder, resource_type)
            .await
    }

    /// The configuration this gateway was built with.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}
