//! Recording test doubles for the generation and memory gateways.

use std::sync::Mutex;
use std::time::Duration;

use crate::llm::{GenerationError, GenerationFuture, GenerationStream, Generator};
use crate::memory::{MemoryError, MemoryFuture, MemoryGateway, MemoryResult};

/// What a [`RecordingGenerator`] answers with.
#[derive(Clone, Debug)]
pub enum GeneratorBehavior {
    Reply(String),
    ConnectFailure,
    TimeoutFailure,
    BadStatus(u16),
}

/// Generator that records every prompt it receives.
pub struct RecordingGenerator {
    behavior: GeneratorBehavior,
    prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    pub fn replying(text: &str) -> Self {
        Self::with_behavior(GeneratorBehavior::Reply(text.to_string()))
    }

    pub fn with_behavior(behavior: GeneratorBehavior) -> Self {
        Self {
            behavior,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

impl Generator for RecordingGenerator {
    fn stream(&self, prompt: &str) -> GenerationFuture<'_, Result<GenerationStream, GenerationError>> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let behavior = self.behavior.clone();
        Box::pin(async move {
            match behavior {
                GeneratorBehavior::Reply(text) => Ok(GenerationStream::from_chunks(
                    text.split_inclusive(' ').map(str::to_string).collect::<Vec<_>>(),
                )),
                GeneratorBehavior::ConnectFailure => {
                    Err(GenerationError::Connect("connection refused".to_string()))
                }
                GeneratorBehavior::TimeoutFailure => {
                    Err(GenerationError::Timeout(Duration::from_secs(120)))
                }
                GeneratorBehavior::BadStatus(status) => Err(GenerationError::HttpStatus(status)),
            }
        })
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }
}

/// One recorded memory write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedWrite {
    pub user_id: String,
    pub message: String,
    pub response: String,
}

/// Memory gateway that records writes and serves canned query results.
#[derive(Default)]
pub struct RecordingMemory {
    results: Vec<String>,
    fail_writes: bool,
    fail_queries: bool,
    writes: Mutex<Vec<RecordedWrite>>,
    queries: Mutex<Vec<(String, String, usize)>>,
}

impl RecordingMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(results: &[&str]) -> Self {
        Self {
            results: results.iter().map(|text| (*text).to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            fail_queries: true,
            ..Self::default()
        }
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().unwrap().clone()
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn last_query(&self) -> Option<(String, String, usize)> {
        self.queries.lock().unwrap().last().cloned()
    }
}

impl MemoryGateway for RecordingMemory {
    fn write<'a>(
        &'a self,
        user_id: &'a str,
        message: &'a str,
        response: &'a str,
    ) -> MemoryFuture<'a, MemoryResult<()>> {
        Box::pin(async move {
            self.writes.lock().unwrap().push(RecordedWrite {
                user_id: user_id.to_string(),
                message: message.to_string(),
                response: response.to_string(),
            });
            if self.fail_writes {
                return Err(MemoryError::HttpStatus {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
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
            self.queries
                .lock()
                .unwrap()
                .push((user_id.to_string(), text.to_string(), top_k));
            if self.fail_queries {
                return Err(MemoryError::HttpStatus {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            Ok(self.results.iter().take(top_k).cloned().collect())
        })
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Fresh upload directory under the system temp dir.
pub fn temp_upload_dir() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("jarvis-test-{}", rand::random::<u64>()))
}

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn spawn_stub(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
