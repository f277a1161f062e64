//! Streaming Ollama client for `POST /api/generate`.
//!
//! Behaviour:
//! - `stream` posts the prompt with `stream: true` and spawns a reader task
//!   that decodes the NDJSON body into [`StreamEvent`]s.
//! - `is_ready` checks `GET /api/version`, used at startup for diagnostics.
//! - `preload` warms the model with a one-token generation.

use std::time::Duration;

use futures::StreamExt;
use reqwest::Client;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::GenerationConfig;
use crate::llm::generation::{
    GenerationError, GenerationFuture, GenerationStream, Generator, StreamEvent, StreamItem,
};
use crate::llm::stream::{GenerateRecord, NdjsonDecoder};

/// Target context length (tokens).
const CONTEXT_LENGTH: u32 = 8_192;

/// Keep the model loaded in memory between requests.
const KEEP_ALIVE: &str = "30m";

/// Warm-up prompt: minimal non-empty prompt.
const WARMUP_PROMPT: &str = " ";

/// Warm-up token budget.
const WARMUP_NUM_PREDICT: u32 = 1;

/// Bound on buffered chunks between the reader task and the consumer.
const CHANNEL_CAPACITY: usize = 64;

#[derive(Serialize)]
struct GenerateOptions {
    num_ctx: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    keep_alive: &'a str,
    options: GenerateOptions,
}

/// Ollama text generator.
#[derive(Clone)]
pub struct OllamaGenerator {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaGenerator {
    /// Create a client from config.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|err| GenerationError::Client(err.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout: config.timeout,
        })
    }

    /// Model name sent with each request.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Check whether Ollama answers `GET /api/version`.
    pub async fn is_ready(&self) -> bool {
        let url = format!("{}/api/version", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!("Ollama readiness check failed: {err}");
                false
            }
        }
    }

    /// Load the model into memory with a one-token generation.
    ///
    /// # Errors
    /// Returns an error if the warm-up request fails.
    pub async fn preload(&self) -> Result<(), GenerationError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt: WARMUP_PROMPT,
            stream: false,
            keep_alive: KEEP_ALIVE,
            options: GenerateOptions {
                num_ctx: CONTEXT_LENGTH,
                num_predict: Some(WARMUP_NUM_PREDICT),
            },
        };

        let response = self
            .client
            .post(self.generate_url())
            .json(&request)
            .send()
            .await
            .map_err(|err| self.classify(&err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::HttpStatus(status.as_u16()));
        }
        Ok(())
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    fn classify(&self, err: &reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout(self.timeout)
        } else if err.is_connect() {
            GenerationError::Connect(err.to_string())
        } else {
            GenerationError::Client(err.to_string())
        }
    }
}

impl Generator for OllamaGenerator {
    fn stream(&self, prompt: &str) -> GenerationFuture<'_, Result<GenerationStream, GenerationError>> {
        let prompt = prompt.to_string();
        Box::pin(async move {
            let request = GenerateRequest {
                model: &self.model,
                prompt: &prompt,
                stream: true,
                keep_alive: KEEP_ALIVE,
                options: GenerateOptions {
                    num_ctx: CONTEXT_LENGTH,
                    num_predict: None,
                },
            };

            let response = self
                .client
                .post(self.generate_url())
                .json(&request)
                .send()
                .await
                .map_err(|err| self.classify(&err))?;

            let status = response.status();
            if !status.is_success() {
                return Err(GenerationError::HttpStatus(status.as_u16()));
            }

            let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
            let timeout = self.timeout;
            let producer = tokio::spawn(async move {
                let mut bytes = response.bytes_stream();
                let mut decoder = NdjsonDecoder::new();

                while let Some(chunk) = bytes.next().await {
                    let chunk = match chunk {
                        Ok(chunk) => chunk,
                        Err(err) => {
                            let error = if err.is_timeout() {
                                GenerationError::Timeout(timeout)
                            } else {
                                GenerationError::Interrupted(err.to_string())
                            };
                            let _ = tx.send(Err(error)).await;
                            return;
                        }
                    };

                    for record in decoder.push(&chunk) {
                        if !forward_record(&tx, record).await {
                            return;
                        }
                    }
                }

                if let Some(record) = decoder.finish()
                    && !forward_record(&tx, record).await
                {
                    return;
                }

                if decoder.skipped() > 0 {
                    warn!("Generation stream skipped {} malformed lines", decoder.skipped());
                }
                debug!("Generation stream closed without a done record");
                let _ = tx.send(Ok(StreamEvent::Done)).await;
            });

            Ok(GenerationStream::new(rx, producer))
        })
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Send the events carried by one record; `false` once the stream is over.
async fn forward_record(tx: &mpsc::Sender<StreamItem>, record: GenerateRecord) -> bool {
    if let Some(error) = record.error {
        let _ = tx.send(Err(GenerationError::Backend(error))).await;
        return false;
    }

    if let Some(text) = record.response
        && !text.is_empty()
        && tx.send(Ok(StreamEvent::Chunk(text))).await.is_err()
    {
        return false;
    }

    if record.done {
        let _ = tx.send(Ok(StreamEvent::Done)).await;
        return false;
    }

    true
}
