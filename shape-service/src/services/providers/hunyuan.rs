//! Hunyuan3D-2 Space provider implementation.
//!
//! Talks to the hosted Gradio Space over its REST surface: the staged
//! image is uploaded first, then the named operation is invoked once with
//! a fixed parameter set and the event stream is read to its final
//! payload. No per-request tuning is exposed.

use super::{ProviderError, ShapeProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::path::Path;

/// Named operation exposed by the Space.
const SHAPE_API_NAME: &str = "shape_generation";

// Fixed generation parameters, matching the Space's documented defaults.
const STEPS: u32 = 30;
const GUIDANCE_SCALE: f64 = 5.0;
const SEED: u64 = 1234;
const OCTREE_RESOLUTION: u32 = 256;
const REMOVE_BACKGROUND: bool = true;
const NUM_CHUNKS: u32 = 8000;
// Forwarded verbatim alongside the fixed seed; the Space owns the
// semantics of that combination.
const RANDOMIZE_SEED: bool = true;

/// Hunyuan provider configuration.
#[derive(Debug, Clone)]
pub struct HunyuanConfig {
    pub space_url: String,
    pub hf_token: Option<String>,
}

/// Client handle to the hosted Space, constructed once at startup.
pub struct HunyuanShapeProvider {
    config: HunyuanConfig,
    client: Client,
}

impl HunyuanShapeProvider {
    pub fn new(config: HunyuanConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(600))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/gradio_api/{}",
            self.config.space_url.trim_end_matches('/'),
            path
        )
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.hf_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Push the staged image to the Space and return its server-side path.
    async fn upload_image(&self, image_path: &Path) -> Result<String, ProviderError> {
        let data = tokio::fs::read(image_path)
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to read staged image: {}", e)))?;

        let file_name = image_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.png")
            .to_string();

        let form = reqwest::multipart::Form::new()
            .part("files", reqwest::multipart::Part::bytes(data).file_name(file_name));

        let response = self
            .authorize(self.client.post(self.api_url("upload")))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::ApiError(format!(
                "Image upload failed with status {}",
                response.status()
            )));
        }

        let uploaded: Vec<String> = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse upload response: {}", e)))?;

        uploaded
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ApiError("Upload response contained no file".to_string()))
    }

    /// Positional parameter payload for the operation, in the order the
    /// Space declares: caption, image, four multi-view slots, then the
    /// generation parameters.
    fn call_payload(remote_image: &str) -> Value {
        json!({
            "data": [
                Value::Null,
                { "path": remote_image, "meta": { "_type": "gradio.FileData" } },
                Value::Null,
                Value::Null,
                Value::Null,
                Value::Null,
                STEPS,
                GUIDANCE_SCALE,
                SEED,
                OCTREE_RESOLUTION,
                REMOVE_BACKGROUND,
                NUM_CHUNKS,
                RANDOMIZE_SEED,
            ]
        })
    }

    /// Extract the final `data:` payload from the operation's event
    /// stream. The stream is read to completion in one pass; no partial
    /// results are surfaced.
    fn parse_event_stream(body: &str) -> Result<Value, ProviderError> {
        let mut last_event = None;
        let mut last_data = None;

        for line in body.lines() {
            if let Some(event) = line.strip_prefix("event: ") {
                last_event = Some(event.trim().to_string());
            } else if let Some(data) = line.strip_prefix("data: ") {
                last_data = Some(data.trim().to_string());
            }
        }

        let data = last_data.ok_or_else(|| {
            ProviderError::ApiError("Event stream ended without a result".to_string())
        })?;

        if last_event.as_deref() == Some("error") {
            return Err(ProviderError::ApiError(format!(
                "Space reported an error: {}",
                data
            )));
        }

        serde_json::from_str(&data)
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse result payload: {}", e)))
    }
}

#[async_trait]
impl ShapeProvider for HunyuanShapeProvider {
    async fn generate(&self, image_path: &Path) -> Result<Value, ProviderError> {
        let remote_image = self.upload_image(image_path).await?;

        tracing::debug!(
            space = %self.config.space_url,
            operation = SHAPE_API_NAME,
            "Invoking shape generation"
        );

        let call_url = self.api_url(&format!("call/{}", SHAPE_API_NAME));
        let response = self
            .authorize(self.client.post(&call_url))
            .json(&Self::call_payload(&remote_image))
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError(format!(
                "Space call failed with status {}: {}",
                status, error_text
            )));
        }

        let call: CallResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse call response: {}", e)))?;

        let result_url = self.api_url(&format!("call/{}/{}", SHAPE_API_NAME, call.event_id));
        let response = self
            .authorize(self.client.get(&result_url))
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::ApiError(format!(
                "Result fetch failed with status {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        Self::parse_event_stream(&body)
    }
}

#[derive(Debug, serde::Deserialize)]
struct CallResponse {
    event_id: String,
}
