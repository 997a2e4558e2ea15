/// OpenAI Responses API provider
///
/// Sends one prompt per call to `/v1/responses` with `store: false` and returns the
/// concatenated output text. No retries: transport and status failures surface to
/// the engine as fatal errors.
use reqwest::Client as HttpClient;

use crate::{
    error::{AppError, AppResult},
    models::{ResponsesRequest, ResponsesResponse},
    services::providers::GenerationProvider,
};

#[derive(Clone)]
pub struct OpenAiProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/responses", self.api_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl GenerationProvider for OpenAiProvider {
    async fn generate(&self, prompt: &str, model: &str) -> AppResult<String> {
        let request = ResponsesRequest {
            model,
            input: prompt,
            store: false,
        };

        let response = self
            .http_client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "OpenAI API returned status {}: {}",
                status, body
            )));
        }

        let response_text = response.text().await?;
        let parsed: ResponsesResponse = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                response = %response_text,
                "Failed to deserialize OpenAI response"
            );
            AppError::ExternalApi(format!("Failed to parse OpenAI response: {}", e))
        })?;

        let text = parsed.output_text().trim().to_string();

        tracing::debug!(
            model = %model,
            prompt_chars = prompt.len(),
            output_chars = text.len(),
            provider = "openai",
            "Generation completed"
        );

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let provider = OpenAiProvider::new("key".to_string(), "https://api.openai.com/".to_string());
        assert_eq!(provider.endpoint(), "https://api.openai.com/v1/responses");
    }

    #[test]
    fn test_request_serialization() {
        let request = ResponsesRequest {
            model: "gpt-4.1-mini",
            input: "hello",
            store: false,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"model": "gpt-4.1-mini", "input": "hello", "store": false})
        );
    }
}
