//! Pinecone-backed memory gateway.
//!
//! Records are embedded with an [`Embedder`] and upserted into a Pinecone
//! index through its data-plane REST API. Queries embed the incoming text and
//! ask the index for the nearest records of the same user.

use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::config::MemoryConfig;
use crate::memory::embedding::{Embedder, to_f32_values};
use crate::memory::errors::{MemoryError, MemoryResult};
use crate::memory::gateway::{InteractionRecord, MemoryFuture, MemoryGateway};

/// Pinecone REST API version header value.
const API_VERSION: &str = "2024-07";

#[derive(Serialize)]
struct RecordMetadata<'a> {
    text: &'a str,
    user_id: &'a str,
    created_at: String,
}

#[derive(Serialize)]
struct UpsertVector<'a> {
    id: String,
    values: Vec<f32>,
    metadata: RecordMetadata<'a>,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<UpsertVector<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest {
    vector: Vec<f32>,
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    filter: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    #[serde(default)]
    score: f64,
    #[serde(default)]
    metadata: Option<MatchMetadata>,
}

#[derive(Debug, Deserialize)]
struct MatchMetadata {
    #[serde(default)]
    text: String,
}

/// Memory gateway over a Pinecone index.
pub struct PineconeMemory {
    client: Client,
    host: String,
    api_key: String,
    embedder: Arc<dyn Embedder>,
}

impl PineconeMemory {
    /// Create a gateway from config.
    ///
    /// # Errors
    /// Returns an error if Pinecone settings are missing or invalid.
    pub fn new(config: &MemoryConfig, embedder: Arc<dyn Embedder>) -> MemoryResult<Self> {
        let api_key = config
            .pinecone_api_key
            .clone()
            .ok_or_else(|| MemoryError::InvalidConfig("missing Pinecone API key".to_string()))?;
        let host = config.pinecone_index_host.clone().ok_or_else(|| {
            MemoryError::InvalidConfig("missing Pinecone index host".to_string())
        })?;
        Url::parse(&host)?;

        if embedder.ndims() != config.embedding_ndims {
            return Err(MemoryError::InvalidConfig(format!(
                "embedder produces {} dimensions, config expects {}",
                embedder.ndims(),
                config.embedding_ndims
            )));
        }

        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            api_key,
            embedder,
        })
    }

    async fn embed(&self, text: &str) -> MemoryResult<Vec<f32>> {
        let embedding = self.embedder.embed_text(text).await?;
        to_f32_values(&embedding, self.embedder.ndims())
    }

    async fn post<T: Serialize + Sync>(&self, path: &str, body: &T) -> MemoryResult<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}{path}", self.host))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MemoryError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

impl MemoryGateway for PineconeMemory {
    fn write<'a>(
        &'a self,
        user_id: &'a str,
        message: &'a str,
        response: &'a str,
    ) -> MemoryFuture<'a, MemoryResult<()>> {
        Box::pin(async move {
            let record = InteractionRecord::new(user_id, message, response);
            let text = record.text();
            let values = self.embed(&text).await?;

            let request = UpsertRequest {
                vectors: vec![UpsertVector {
                    id: record.id(),
                    values,
                    metadata: RecordMetadata {
                        text: &text,
                        user_id,
                        created_at: record.created_at.to_rfc3339(),
                    },
                }],
            };
            self.post("/vectors/upsert", &request).await?;
            debug!("Upserted memory {} for {}", record.id(), user_id);
            Ok(())
        })
    }

    fn query<'a>(
        &'a self,
        user_id: &'a str,
        text: &'a str,
        top_k: usize,
    ) -> MemoryFuture<'a, MemoryResult<Vec<String>>> {
        Box::pin(async move {
            let vector = self.embed(text).await?;
            let request = QueryRequest {
                vector,
                top_k,
                include_metadata: true,
                include_values: false,
                filter: user_filter(user_id),
            };

            let response: QueryResponse = self.post("/query", &request).await?.json().await?;
            Ok(extract_texts(response))
        })
    }

    fn name(&self) -> &'static str {
        "pinecone"
    }
}

fn user_filter(user_id: &str) -> serde_json::Value {
    json!({ "user_id": { "$eq": user_id } })
}

fn extract_texts(mut response: QueryResponse) -> Vec<String> {
    response
        .matches
        .sort_by(|a, b| b.score.total_cmp(&a.score));
    response
        .matches
        .into_iter()
        .filter_map(|m| m.metadata.map(|meta| meta.text))
        .filter(|text| !text.is_empty())
        .collect()
}
