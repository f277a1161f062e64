//! Generation gateway abstraction and its streaming handle.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Boxed future type for generation operations.
pub type GenerationFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors produced while generating text.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The backend could not be reached.
    #[error("unable to connect to generation backend: {0}")]
    Connect(String),
    /// The backend did not finish within the budget.
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
    /// HTTP response was not a success.
    #[error("generation backend returned http status {0}")]
    HttpStatus(u16),
    /// The backend reported an error inside the stream.
    #[error("generation backend error: {0}")]
    Backend(String),
    /// The byte stream broke before the completion record.
    #[error("generation stream interrupted: {0}")]
    Interrupted(String),
    /// The caller cancelled the stream.
    #[error("generation cancelled")]
    Cancelled,
    /// HTTP client error not covered above.
    #[error("http client error: {0}")]
    Client(String),
}

/// One event on a generation stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental text.
    Chunk(String),
    /// Terminal marker; no events follow.
    Done,
}

/// Item carried on the stream channel.
pub type StreamItem = Result<StreamEvent, GenerationError>;

/// Handle over an in-flight generation.
///
/// Dropping the handle cancels the producer.
pub struct GenerationStream {
    rx: mpsc::Receiver<StreamItem>,
    producer: Option<JoinHandle<()>>,
    finished: bool,
}

impl GenerationStream {
    /// Wrap a channel fed by `producer`.
    #[must_use]
    pub fn new(rx: mpsc::Receiver<StreamItem>, producer: JoinHandle<()>) -> Self {
        Self {
            rx,
            producer: Some(producer),
            finished: false,
        }
    }

    /// Wrap a channel with no owned producer task.
    #[must_use]
    pub fn from_channel(rx: mpsc::Receiver<StreamItem>) -> Self {
        Self {
            rx,
            producer: None,
            finished: false,
        }
    }

    /// Build an already-completed stream from fixed chunks.
    #[must_use]
    pub fn from_chunks<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<StreamItem> = chunks
            .into_iter()
            .map(|chunk| Ok(StreamEvent::Chunk(chunk.into())))
            .chain(std::iter::once(Ok(StreamEvent::Done)))
            .collect();
        let (tx, rx) = mpsc::channel(items.len().max(1));
        for item in items {
            if tx.try_send(item).is_err() {
                break;
            }
        }
        Self::from_channel(rx)
    }

    /// Next event, or `None` once the stream is over.
    ///
    /// A channel that closes without a terminal marker is treated as done.
    pub async fn next_event(&mut self) -> Option<StreamItem> {
        if self.finished {
            return None;
        }

        match self.rx.recv().await {
            Some(Ok(StreamEvent::Done)) => {
                self.finished = true;
                Some(Ok(StreamEvent::Done))
            }
            Some(Err(err)) => {
                self.finished = true;
                Some(Err(err))
            }
            Some(item) => Some(item),
            None => {
                self.finished = true;
                Some(Ok(StreamEvent::Done))
            }
        }
    }

    /// Stop the producer and close the stream.
    pub fn cancel(&mut self) {
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
        self.rx.close();
        self.finished = true;
    }

    /// Whether the terminal marker, an error, or a cancel has been seen.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Concatenate chunks until the terminal marker.
    ///
    /// # Errors
    /// Returns the first error reported by the producer, or
    /// [`GenerationError::Cancelled`] if the stream was cancelled first.
    pub async fn collect_text(mut self) -> Result<String, GenerationError> {
        if self.finished {
            return Err(GenerationError::Cancelled);
        }

        let mut text = String::new();
        while let Some(item) = self.next_event().await {
            match item? {
                StreamEvent::Chunk(chunk) => text.push_str(&chunk),
                StreamEvent::Done => break,
            }
        }
        Ok(text)
    }
}

impl Drop for GenerationStream {
    fn drop(&mut self) {
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}

/// Generation gateway toward an external text model.
pub trait Generator: Send + Sync {
    /// Start a streamed generation.
    ///
    /// # Errors
    /// Returns an error if the request cannot be started.
    fn stream(&self, prompt: &str) -> GenerationFuture<'_, Result<GenerationStream, GenerationError>>;

    /// Budget for a whole generation.
    fn timeout(&self) -> Duration;

    /// Generate the full text, bounded by [`Generator::timeout`].
    ///
    /// # Errors
    /// Returns an error on connection failure, timeout, or a broken stream.
    fn generate(&self, prompt: &str) -> GenerationFuture<'_, Result<String, GenerationError>> {
        let prompt = prompt.to_string();
        Box::pin(async move {
            let budget = self.timeout();
            let run = async {
                let stream = self.stream(&prompt).await?;
                stream.collect_text().await
            };
            match tokio::time::timeout(budget, run).await {
                Ok(result) => result.map(|text| text.trim().to_string()),
                Err(_) => Err(GenerationError::Timeout(budget)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowGenerator;

    impl Generator for SlowGenerator {
        fn stream(
            &self,
            _prompt: &str,
        ) -> GenerationFuture<'_, Result<GenerationStream, GenerationError>> {
            Box::pin(async move {
                let (tx, rx) = mpsc::channel(4);
                let producer = tokio::spawn(async move {
                    let _ = tx.send(Ok(StreamEvent::Chunk("partial".to_string()))).await;
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    let _ = tx.send(Ok(StreamEvent::Done)).await;
                });
                Ok(GenerationStream::new(rx, producer))
            })
        }

        fn timeout(&self) -> Duration {
            Duration::from_millis(50)
        }
    }

    #[tokio::test]
    async fn test_collect_concatenates_in_order() {
        let stream = GenerationStream::from_chunks(["Hel", "lo", " world"]);
        assert_eq!(stream.collect_text().await.unwrap(), "Hello world");
    }

    #[tokio::test]
    async fn test_closed_channel_counts_as_done() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(Ok(StreamEvent::Chunk("abc".to_string()))).await.unwrap();
        drop(tx);
        let stream = GenerationStream::from_channel(rx);
        assert_eq!(stream.collect_text().await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn test_error_stops_collection() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(Ok(StreamEvent::Chunk("abc".to_string()))).await.unwrap();
        tx.send(Err(GenerationError::Interrupted("reset".to_string())))
            .await
            .unwrap();
        let stream = GenerationStream::from_channel(rx);
        assert!(matches!(
            stream.collect_text().await,
            Err(GenerationError::Interrupted(_))
        ));
    }

    #[tokio::test]
    async fn test_no_events_after_done() {
        let mut stream = GenerationStream::from_chunks(["a"]);
        assert_eq!(
            stream.next_event().await.unwrap().unwrap(),
            StreamEvent::Chunk("a".to_string())
        );
        assert_eq!(stream.next_event().await.unwrap().unwrap(), StreamEvent::Done);
        assert!(stream.next_event().await.is_none());
        assert!(stream.is_finished());
    }

    #[tokio::test]
    async fn test_cancel_stops_producer() {
        let (tx, rx) = mpsc::channel::<StreamItem>(1);
        let producer = tokio::spawn(async move {
            loop {
                if tx.send(Ok(StreamEvent::Chunk("x".to_string()))).await.is_err() {
                    break;
                }
            }
        });
        let mut stream = GenerationStream::new(rx, producer);
        assert!(stream.next_event().await.is_some());
        stream.cancel();
        assert!(stream.next_event().await.is_none());
        assert!(matches!(
            stream.collect_text().await,
            Err(GenerationError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn test_generate_times_out() {
        let result = SlowGenerator.generate("prompt").await;
        assert!(matches!(result, Err(GenerationError::Timeout(_))));
    }
}
