//! Model-inference adapter: text generation and embeddings.
//!
//! Speaks the Ollama wire shape: `POST /api/generate` and
//! `POST /api/embeddings`. Both operations go through the shared retrying
//! executor and the inference breaker.

use std::sync::Arc;

use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::config::{InferenceConfig, RetryConfig};
use crate::error::{snippet, GatewayError, GatewayResult};
use crate::resilience::CircuitBreaker;
use crate::upstream::executor;

/// Character budget for parse-failure snippets.
const SNIPPET_MAX_CHARS: usize = 512;

/// A text generation request.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    /// When set, the upstream answers with newline-delimited JSON chunks.
    pub stream: bool,
    /// Free-form model options forwarded verbatim when present.
    pub options: Option<serde_json::Value>,
}

/// The model's full text response.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateResponse {
    pub response: String,
}

/// An embeddings request; one vector comes back per input string.
#[derive(Debug, Clone)]
pub struct EmbeddingsRequest {
    pub model: String,
    pub input: Vec<String>,
}

/// Equal-length embedding vectors, one per input.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingsResponse {
    pub embeddings: Vec<Vec<f32>>,
}

/// Adapter for the model-inference upstream.
#[derive(Debug)]
pub struct InferenceUpstream {
    client: Client,
    base_url: String,
    retries: RetryConfig,
    breaker: Arc<CircuitBreaker>,
}

impl InferenceUpstream {
    pub(crate) fn new(
        client: Client,
        config: &InferenceConfig,
        retries: RetryConfig,
        breaker: Arc<CircuitBreaker>,
    ) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retries,
            breaker,
        }
    }

    /// Send a generation request and return the full answer text.
    pub async fn generate(&self, req: &GenerateRequest) -> GatewayResult<GenerateResponse> {
        let url = format!("{}/api/generate", self.base_url);
        let mut payload = json!({
            "model": req.model,
            "prompt": req.prompt,
            "stream": req.stream,
        });
        if let Some(options) = &req.options {
            payload["options"] = options.clone();
        }

        let response = executor::execute(
            &self.client,
            &self.breaker,
            &self.retries,
            Method::POST,
            &url,
            &payload,
            StatusCode::OK,
        )
        .await?;
        let body = read_body(&url, response).await?;
        parse_generate(&url, &body, req.stream)
    }

    /// Send an embeddings request.
    ///
    /// An empty input list short-circuits to an empty result without any
    /// network call; this is the one documented case where no error is raised.
    pub async fn embeddings(&self, req: &EmbeddingsRequest) -> GatewayResult<EmbeddingsResponse> {
        if req.input.is_empty() {
            return Ok(EmbeddingsResponse {
                embeddings: Vec::new(),
            });
        }

        let url = format!("{}/api/embeddings", self.base_url);
        let payload = embeddings_payload(req);

        let response = executor::execute(
            &self.client,
            &self.breaker,
            &self.retries,
            Method::POST,
            &url,
            &payload,
            StatusCode::OK,
        )
        .await?;
        let body = read_body(&url, response).await?;
        parse_embeddings(&url, &body)
    }
}

/// Build the embeddings payload.
///
/// Two historical upstream API shapes take the input under different field
/// names, so both are always populated: a single input lands in `input` and
/// `prompt` identically; several inputs keep the list in `input` with a
/// `" \n"`-joined rendering in `prompt`.
fn embeddings_payload(req: &EmbeddingsRequest) -> serde_json::Value {
    match req.input.as_slice() {
        [single] => json!({
            "model": req.model,
            "input": single,
            "prompt": single,
        }),
        many => json!({
            "model": req.model,
            "input": many,
            "prompt": many.join(" \n"),
        }),
    }
}

async fn read_body(url: &str, response: reqwest::Response) -> GatewayResult<String> {
    response
        .text()
        .await
        .map_err(|e| GatewayError::UpstreamUnavailable {
            reason: format!("error reading body from {url}: {e}"),
            retry_after: None,
        })
}

#[derive(Deserialize)]
struct RawGenerate {
    response: String,
}

fn parse_generate(url: &str, body: &str, streamed: bool) -> GatewayResult<GenerateResponse> {
    if streamed {
        // Newline-delimited JSON chunks; partial text concatenates in order.
        let mut full = String::new();
        for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let chunk: RawGenerate = serde_json::from_str(line).map_err(|e| parse_error(url, e))?;
            full.push_str(&chunk.response);
        }
        Ok(GenerateResponse { response: full })
    } else {
        let raw: RawGenerate = serde_json::from_str(body).map_err(|e| parse_error(url, e))?;
        Ok(GenerateResponse {
            response: raw.response,
        })
    }
}

#[derive(Deserialize)]
struct RawEmbeddings {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
    #[serde(default)]
    embedding: Vec<f32>,
}

fn parse_embeddings(url: &str, body: &str) -> GatewayResult<EmbeddingsResponse> {
    let raw: RawEmbeddings = serde_json::from_str(body).map_err(|e| parse_error(url, e))?;
    if !raw.embeddings.is_empty() {
        return Ok(EmbeddingsResponse {
            embeddings: raw.embeddings,
        });
    }
    // Older upstream API: one vector under the singular field.
    if !raw.embedding.is_empty() {
        return Ok(EmbeddingsResponse {
            embeddings: vec![raw.embedding],
        });
    }
    Err(GatewayError::BadUpstreamResponse {
        url: url.to_string(),
        status: StatusCode::OK.as_u16(),
        snippet: "no embeddings in response body".to_string(),
    })
}

/// A 200 whose body does not match the contract is a bad response, never a
/// silent empty result.
fn parse_error(url: &str, err: serde_json::Error) -> GatewayError {
    GatewayError::BadUpstreamResponse {
        url: url.to_string(),
        status: StatusCode::OK.as_u16(),
        snippet: snippet(&err.to_string(), SNIPPET_MAX_CHARS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embed_req(input: &[&str]) -> EmbeddingsRequest {
        EmbeddingsRequest {
            model: "nomic-embed-text".into(),
            input: input.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_embeddings_payload_single_input_mirrors_both_fields() {
        let payload = embeddings_payload(&embed_req(&["tahini"]));
        assert_eq!(payload["input"], "tahini");
        assert_eq!(payload["prompt"], "tahini");
        assert_eq!(payload["model"], "nomic-embed-text");
    }

    #[test]
    fn test_embeddings_payload_multiple_inputs() {
        let payload = embeddings_payload(&embed_req(&["a", "b"]));
        assert_eq!(payload["input"], json!(["a", "b"]));
        assert_eq!(payload["prompt"], "a \nb");
    }

    #[test]
    fn test_parse_generate_single_object() {
        let out = parse_generate("http://u", r#"{"response":"hi","done":true}"#, false).unwrap();
        assert_eq!(out.response, "hi");
    }

    #[test]
    fn test_parse_generate_missing_field_is_error() {
        let err = parse_generate("http://u", r#"{"done":true}"#, false).unwrap_err();
        assert!(matches!(err, GatewayError::BadUpstreamResponse { .. }));
    }

    #[test]
    fn test_parse_generate_stream_concatenates_in_order() {
        let body = "{\"response\":\"Hel\"}\n{\"response\":\"lo\"}\n";
        let out = parse_generate("http://u", body, true).unwrap();
        assert_eq!(out.response, "Hello");
    }

    #[test]
    fn test_parse_generate_stream_skips_blank_lines() {
        let body = "\n{\"response\":\"a\"}\n\n  \n{\"response\":\"b\"}\n";
        let out = parse_generate("http://u", body, true).unwrap();
        assert_eq!(out.response, "ab");
    }

    #[test]
    fn test_parse_generate_stream_malformed_line_is_error() {
        let body = "{\"response\":\"a\"}\nnot json\n";
        let err = parse_generate("http://u", body, true).unwrap_err();
        assert!(matches!(err, GatewayError::BadUpstreamResponse { .. }));
    }

    #[test]
    fn test_parse_embeddings_prefers_plural_field() {
        let body = r#"{"embeddings":[[0.1,0.2]],"embedding":[9.0]}"#;
        let out = parse_embeddings("http://u", body).unwrap();
        assert_eq!(out.embeddings, vec![vec![0.1, 0.2]]);
    }

    #[test]
    fn test_parse_embeddings_falls_back_to_singular() {
        let body = r#"{"embedding":[0.5,0.6]}"#;
        let out = parse_embeddings("http://u", body).unwrap();
        assert_eq!(out.embeddings, vec![vec![0.5, 0.6]]);

        // An empty plural field also falls through to the singular one.
        let body = r#"{"embeddings":[],"embedding":[0.5]}"#;
        let out = parse_embeddings("http://u", body).unwrap();
        assert_eq!(out.embeddings, vec![vec![0.5]]);
    }

    #[test]
    fn test_parse_embeddings_empty_both_is_error() {
        let err = parse_embeddings("http://u", r#"{"embeddings":[]}"#).unwrap_err();
        assert!(matches!(err, GatewayError::BadUpstreamResponse { .. }));
    }
}
