//! The assistant turn: route, assemble context, generate, remember.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::assistant::greeting::GreetingPicker;
use crate::assistant::intent::{Intent, IntentRouter};
use crate::assistant::normalizer::excerpt;
use crate::assistant::prompt::{Prompt, SYSTEM_PROMPT};
use crate::config::AppConfig;
use crate::documents::{DocumentError, DocumentResult, DocumentStore, extract_text, save_upload};
use crate::llm::{GenerationError, Generator};
use crate::memory::MemoryGateway;

/// Reply to an empty message.
pub const EMPTY_MESSAGE_REPLY: &str = "Please type something to begin.";
/// Memory message recorded for an upload.
pub const UPLOAD_MEMORY_MESSAGE: &str = "document_upload";

/// Reply when the generation backend cannot be reached.
pub const CONNECT_FALLBACK: &str =
    "⚠️ Unable to connect to Ollama. Please ensure it's running (use: `ollama serve`).";
/// Reply when generation exceeds its budget.
pub const TIMEOUT_FALLBACK: &str = "⚠️ Request timed out. The model took too long to respond.";
/// Reply for any other generation failure.
pub const GENERIC_FALLBACK: &str =
    "⚠️ Sorry, something went wrong while generating the response.";

/// User-safe text for a generation failure.
#[must_use]
pub fn fallback_reply(err: &GenerationError) -> &'static str {
    match err {
        GenerationError::Connect(_) => CONNECT_FALLBACK,
        GenerationError::Timeout(_) => TIMEOUT_FALLBACK,
        _ => GENERIC_FALLBACK,
    }
}

/// Outcome of one chat turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatReply {
    /// Text shown to the user.
    pub response: String,
    /// Routed intent; `None` for an empty message.
    pub intent: Option<Intent>,
}

/// Outcome of a successful upload.
#[derive(Clone, Debug)]
pub struct UploadReceipt {
    /// Where the file was saved.
    pub path: PathBuf,
    /// Characters of extracted text.
    pub chars: usize,
}

/// Settings the assistant reads on every turn.
#[derive(Clone, Debug)]
struct TurnSettings {
    default_user_id: String,
    max_document_chars: usize,
    memory_top_k: usize,
    upload_dir: PathBuf,
    memory_excerpt_chars: usize,
}

/// Document assistant over pluggable storage, memory and generation.
pub struct Assistant {
    documents: Arc<dyn DocumentStore>,
    memory: Arc<dyn MemoryGateway>,
    generator: Arc<dyn Generator>,
    router: IntentRouter,
    greetings: GreetingPicker,
    settings: TurnSettings,
}

impl Assistant {
    /// Create an assistant with entropy-seeded greetings.
    #[must_use]
    pub fn new(
        config: &AppConfig,
        documents: Arc<dyn DocumentStore>,
        memory: Arc<dyn MemoryGateway>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            documents,
            memory,
            generator,
            router: IntentRouter::default(),
            greetings: GreetingPicker::new(),
            settings: TurnSettings {
                default_user_id: config.assistant.default_user_id.clone(),
                max_document_chars: config.assistant.max_document_chars,
                memory_top_k: config.memory.top_k,
                upload_dir: config.documents.upload_dir.clone(),
                memory_excerpt_chars: config.documents.memory_excerpt_chars,
            },
        }
    }

    /// Make greeting selection deterministic.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.greetings = GreetingPicker::with_seed(seed);
        self
    }

    /// The user a request acts for; blank ids fall back to the default user.
    #[must_use]
    pub fn resolve_user<'a>(&'a self, user_id: Option<&'a str>) -> &'a str {
        user_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(self.settings.default_user_id.as_str())
    }

    /// Answer one message. Never fails: collaborator errors become fallbacks.
    pub async fn chat(&self, user_id: Option<&str>, message: &str) -> ChatReply {
        let message = message.trim();
        if message.is_empty() {
            return ChatReply {
                response: EMPTY_MESSAGE_REPLY.to_string(),
                intent: None,
            };
        }
        let user_id = self.resolve_user(user_id);

        let document = if self.router.mentions_document(message) {
            self.load_document(user_id).await
        } else {
            None
        };
        let intent = self.router.classify(message, document.is_some());
        info!("Routed message from {} as {}", user_id, intent);

        let response = match (intent, document) {
            (Intent::Greeting, _) => self.greetings.pick().to_string(),
            (Intent::DocumentQuery, Some(document)) => {
                let prompt =
                    Prompt::for_document(SYSTEM_PROMPT, &document, self.settings.max_document_chars);
                self.generate(&prompt).await
            }
            _ => {
                let memories = self.recall(user_id, message).await;
                let prompt = Prompt::for_conversation(SYSTEM_PROMPT, &memories, message);
                self.generate(&prompt).await
            }
        };

        self.remember(user_id, message, &response).await;
        ChatReply {
            response,
            intent: Some(intent),
        }
    }

    /// Save, extract and store an uploaded file as the user's document.
    ///
    /// # Errors
    /// Returns [`DocumentError::NoFileSelected`] for an empty name,
    /// [`DocumentError::NoReadableText`] when nothing can be extracted, or a
    /// storage error.
    pub async fn upload(
        &self,
        user_id: Option<&str>,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> DocumentResult<UploadReceipt> {
        if file_name.trim().is_empty() {
            return Err(DocumentError::NoFileSelected);
        }
        let user_id = self.resolve_user(user_id);

        let path = save_upload(&self.settings.upload_dir, file_name, &bytes).await?;
        let text = extract_text(file_name, bytes).await?;
        let chars = text.chars().count();
        let memory_excerpt = excerpt(&text, self.settings.memory_excerpt_chars).to_string();

        self.documents.put(user_id, text).await?;
        info!(
            "Stored document '{}' for {} ({} chars, {})",
            file_name,
            user_id,
            chars,
            self.documents.name()
        );

        self.remember(user_id, UPLOAD_MEMORY_MESSAGE, &memory_excerpt).await;
        Ok(UploadReceipt { path, chars })
    }

    async fn load_document(&self, user_id: &str) -> Option<Arc<str>> {
        match self.documents.get(user_id).await {
            Ok(document) => document,
            Err(e) => {
                warn!("Document lookup failed for {}: {}", user_id, e);
                None
            }
        }
    }

    async fn recall(&self, user_id: &str, message: &str) -> Vec<String> {
        match self
            .memory
            .query(user_id, message, self.settings.memory_top_k)
            .await
        {
            Ok(memories) => {
                debug!("Recalled {} memories for {}", memories.len(), user_id);
                memories
            }
            Err(e) => {
                warn!("Memory query failed ({}): {}", self.memory.name(), e);
                Vec::new()
            }
        }
    }

    async fn generate(&self, prompt: &Prompt) -> String {
        match self.generator.generate(&prompt.render()).await {
            Ok(text) => text,
            Err(e) => {
                error!("Generation failed: {}", e);
                fallback_reply(&e).to_string()
            }
        }
    }

    async fn remember(&self, user_id: &str, message: &str, response: &str) {
        if let Err(e) = self.memory.write(user_id, message, response).await {
            warn!("Memory write failed ({}): {}", self.memory.name(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::greeting::GREETING_REPLIES;
    use crate::assistant::prompt::DOCUMENT_OPEN;
    use crate::documents::InMemoryDocumentStore;
    use crate::test_support::{
        GeneratorBehavior, RecordingGenerator, RecordingMemory, temp_upload_dir,
    };

    struct Harness {
        assistant: Assistant,
        documents: Arc<InMemoryDocumentStore>,
        memory: Arc<RecordingMemory>,
        generator: Arc<RecordingGenerator>,
        upload_dir: PathBuf,
    }

    fn harness(memory: RecordingMemory, generator: RecordingGenerator) -> Harness {
        let upload_dir = temp_upload_dir();
        let mut config = AppConfig::default();
        config.documents.upload_dir = upload_dir.clone();

        let documents = Arc::new(InMemoryDocumentStore::new());
        let memory = Arc::new(memory);
        let generator = Arc::new(generator);
        let assistant = Assistant::new(
            &config,
            documents.clone(),
            memory.clone(),
            generator.clone(),
        )
        .with_seed(7);

        Harness {
            assistant,
            documents,
            memory,
            generator,
            upload_dir,
        }
    }

    fn default_harness() -> Harness {
        harness(RecordingMemory::new(), RecordingGenerator::replying("Generated answer."))
    }

    #[tokio::test]
    async fn test_first_greeting_skips_generation() {
        let h = default_harness();
        let reply = h.assistant.chat(None, "hi").await;

        assert_eq!(reply.intent, Some(Intent::Greeting));
        assert!(GREETING_REPLIES.contains(&reply.response.as_str()));
        assert_eq!(h.generator.calls(), 0);

        let writes = h.memory.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].user_id, "jotiba");
        assert_eq!(writes[0].message, "hi");
        assert_eq!(writes[0].response, reply.response);
    }

    #[tokio::test]
    async fn test_seeded_greetings_repeat() {
        let a = default_harness();
        let b = default_harness();
        for _ in 0..5 {
            assert_eq!(
                a.assistant.chat(None, "hello").await.response,
                b.assistant.chat(None, "hello").await.response
            );
        }
    }

    #[tokio::test]
    async fn test_empty_message_touches_nothing() {
        let h = default_harness();
        let reply = h.assistant.chat(Some("alice"), "   \n").await;

        assert_eq!(reply.response, EMPTY_MESSAGE_REPLY);
        assert_eq!(reply.intent, None);
        assert_eq!(h.generator.calls(), 0);
        assert!(h.memory.writes().is_empty());
        assert_eq!(h.memory.query_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_then_summarize_uses_document() {
        let h = default_harness();
        h.assistant
            .upload(None, "hello.txt", b"Hello World program in Python".to_vec())
            .await
            .unwrap();

        let reply = h.assistant.chat(None, "summarize this document").await;
        assert_eq!(reply.intent, Some(Intent::DocumentQuery));
        assert_eq!(reply.response, "Generated answer.");

        let prompt = h.generator.last_prompt().unwrap();
        assert!(prompt.contains(DOCUMENT_OPEN));
        assert!(prompt.contains("Hello World program in Python"));
        assert!(!prompt.contains("Context:"));
        assert_eq!(h.memory.query_count(), 0);

        tokio::fs::remove_dir_all(&h.upload_dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_document_words_without_document_use_memory() {
        let h = harness(
            RecordingMemory::with_results(&["User: what is rust\nAI: A language."]),
            RecordingGenerator::replying("ok"),
        );
        let reply = h.assistant.chat(Some("bob"), "explain the file").await;

        assert_eq!(reply.intent, Some(Intent::GeneralQuery));
        let prompt = h.generator.last_prompt().unwrap();
        assert!(!prompt.contains(DOCUMENT_OPEN));
        assert!(prompt.contains("Context: User: what is rust\nAI: A language.\nUser: explain the file\n"));
        assert_eq!(
            h.memory.last_query(),
            Some(("bob".to_string(), "explain the file".to_string(), 3))
        );
    }

    #[tokio::test]
    async fn test_documents_are_per_user() {
        let h = default_harness();
        h.assistant
            .upload(Some("alice"), "a.txt", b"Alice notes".to_vec())
            .await
            .unwrap();

        let reply = h.assistant.chat(Some("bob"), "summarize the document").await;
        assert_eq!(reply.intent, Some(Intent::GeneralQuery));
        assert!(h.documents.get("bob").await.unwrap().is_none());

        tokio::fs::remove_dir_all(&h.upload_dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_failure_falls_back() {
        let h = harness(
            RecordingMemory::new(),
            RecordingGenerator::with_behavior(GeneratorBehavior::ConnectFailure),
        );
        let reply = h.assistant.chat(None, "tell me a joke").await;

        assert_eq!(reply.response, CONNECT_FALLBACK);
        let writes = h.memory.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].response, CONNECT_FALLBACK);
    }

    #[tokio::test]
    async fn test_other_failures_fall_back() {
        let h = harness(
            RecordingMemory::new(),
            RecordingGenerator::with_behavior(GeneratorBehavior::TimeoutFailure),
        );
        assert_eq!(h.assistant.chat(None, "slow question").await.response, TIMEOUT_FALLBACK);

        let h = harness(
            RecordingMemory::new(),
            RecordingGenerator::with_behavior(GeneratorBehavior::BadStatus(500)),
        );
        assert_eq!(h.assistant.chat(None, "any question").await.response, GENERIC_FALLBACK);
    }

    #[tokio::test]
    async fn test_memory_failures_do_not_block_reply() {
        let h = harness(RecordingMemory::failing(), RecordingGenerator::replying("still here"));
        let reply = h.assistant.chat(None, "what is rust").await;

        assert_eq!(reply.response, "still here");
        let prompt = h.generator.last_prompt().unwrap();
        assert!(prompt.contains("Context: \nUser: what is rust\n"));
        assert_eq!(h.memory.writes().len(), 1);
    }

    #[tokio::test]
    async fn test_every_turn_writes_once() {
        let h = default_harness();
        let messages = ["hey", "what is rust", "explain the program", "good morning"];
        for message in messages {
            h.assistant.chat(None, message).await;
        }
        assert_eq!(h.memory.writes().len(), messages.len());
    }

    #[tokio::test]
    async fn test_upload_records_excerpt() {
        let h = default_harness();
        let body = "x".repeat(1_500);
        let receipt = h
            .assistant
            .upload(Some("alice"), "long.txt", body.into_bytes())
            .await
            .unwrap();

        assert_eq!(receipt.chars, 1_500);
        assert_eq!(receipt.path, h.upload_dir.join("long.txt"));
        let writes = h.memory.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].message, UPLOAD_MEMORY_MESSAGE);
        assert_eq!(writes[0].response.len(), 1_000);

        tokio::fs::remove_dir_all(&h.upload_dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_upload_rejections_store_nothing() {
        let h = default_harness();

        let err = h.assistant.upload(None, "", b"text".to_vec()).await.unwrap_err();
        assert!(matches!(err, DocumentError::NoFileSelected));

        let err = h
            .assistant
            .upload(None, "blank.txt", b"   ".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::NoReadableText));

        assert!(h.documents.is_empty());
        assert!(h.memory.writes().is_empty());
        let _ = tokio::fs::remove_dir_all(&h.upload_dir).await;
    }

    #[test]
    fn test_resolve_user() {
        let h = default_harness();
        assert_eq!(h.assistant.resolve_user(None), "jotiba");
        assert_eq!(h.assistant.resolve_user(Some("  ")), "jotiba");
        assert_eq!(h.assistant.resolve_user(Some("alice")), "alice");
    }
}
