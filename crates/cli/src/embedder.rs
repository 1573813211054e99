use recipedb_core::config;
use recipedb_core::{EmbedError, Embedder};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    input: &'a str,
}

/// Accepted response bodies: a bare float array, `{"embedding": [...]}`, or
/// the OpenAI-style `{"data": [{"embedding": [...]}]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum EmbedResponse {
    Flat(Vec<f32>),
    Single { embedding: Vec<f32> },
    Batch { data: Vec<EmbeddingItem> },
}

#[derive(Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

impl EmbedResponse {
    fn into_vector(self) -> Result<Vec<f32>, EmbedError> {
        let vector = match self {
            EmbedResponse::Flat(v) | EmbedResponse::Single { embedding: v } => v,
            EmbedResponse::Batch { data } => data
                .into_iter()
                .next()
                .map(|item| item.embedding)
                .ok_or("embedding response contained no data")?,
        };
        if vector.is_empty() {
            return Err("embedding response was empty".into());
        }
        Ok(vector)
    }
}

/// Embeds query text by POSTing `{"input": text}` to an HTTP endpoint.
pub struct HttpEmbedder {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpEmbedder {
    pub fn new(url: impl Into<String>) -> reqwest::Result<Self> {
        Self::with_timeout(url, Duration::from_secs(config::DEFAULT_EMBED_TIMEOUT_SECS))
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Embedder for HttpEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let response: EmbedResponse = self
            .client
            .post(&self.url)
            .json(&EmbedRequest { input: text })
            .send()?
            .error_for_status()?
            .json()?;
        let vector = response.into_vector()?;
        tracing::debug!("Embedded {}-byte query into {} dims", text.len(), vector.len());
        Ok(vector)
    }
}
