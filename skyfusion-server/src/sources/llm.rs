//! Generative-model / embedding provider client (§6), disableable by
//! configuration per §7 `ProviderDisabled`. Used for threat-assessment
//! explanation text and entity-enhancement embeddings, both out of the
//! core crate's pure-logic scope.

use serde::{Deserialize, Serialize};

use crate::errors::FetchError;

#[derive(Serialize)]
struct GenerationRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Deserialize)]
struct GenerationResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f64>,
}

/// `None` when disabled by configuration — callers degrade gracefully
/// rather than branching on an `Option<LlmClient>` everywhere.
pub enum LlmClient {
    Enabled { client: reqwest::Client, base_url: String, api_key: String },
    Disabled,
}

impl LlmClient {
    pub fn new(base_url: Option<String>, api_key: Option<String>) -> Self {
        match (base_url, api_key) {
            (Some(base_url), Some(api_key)) => {
                LlmClient::Enabled { client: reqwest::Client::new(), base_url, api_key }
            }
            _ => LlmClient::Disabled,
        }
    }

    pub async fn generate_text(&self, prompt: &str) -> Result<String, FetchError> {
        let LlmClient::Enabled { client, base_url, api_key } = self else {
            return Err(FetchError::ProviderDisabled);
        };

        let request = GenerationRequest {
            contents: vec![Content { parts: vec![Part { text: prompt.to_string() }] }],
            generation_config: GenerationConfig { temperature: 0.2, max_output_tokens: 512, response_mime_type: None },
        };

        let resp = client
            .post(base_url)
            .query(&[("key", api_key)])
            .json(&request)
            .timeout(std::time::Duration::from_secs(15))
            .send()
            .await
            .map_err(|e| FetchError::TransientUpstream { source: e, attempt: 1 })?;

        let body: GenerationResponse = resp.json().await.map_err(|e| FetchError::BadPayload(e.to_string()))?;
        body.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| FetchError::BadPayload("no candidates returned".to_string()))
    }

    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, FetchError> {
        let LlmClient::Enabled { client, base_url, api_key } = self else {
            return Err(FetchError::ProviderDisabled);
        };

        let requests: Vec<_> = texts
            .iter()
            .map(|t| Content { parts: vec![Part { text: t.clone() }] })
            .collect();

        let resp = client
            .post(format!("{base_url}:batchEmbedContents"))
            .query(&[("key", api_key)])
            .json(&serde_json::json!({ "requests": requests.iter().map(|c| serde_json::json!({"content": c})).collect::<Vec<_>>() }))
            .timeout(std::time::Duration::from_secs(15))
            .send()
            .await
            .map_err(|e| FetchError::TransientUpstream { source: e, attempt: 1 })?;

        let body: EmbeddingResponse = resp.json().await.map_err(|e| FetchError::BadPayload(e.to_string()))?;
        Ok(body.embeddings.into_iter().map(|e| e.values).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_client_short_circuits() {
        let client = LlmClient::new(None, None);
        let err = client.generate_text("hello").await.unwrap_err();
        assert!(matches!(err, FetchError::ProviderDisabled));
    }
}
