//! Configuration for the Jarvis agent.
//!
//! Every section has sensible defaults so the server can start with no
//! environment at all; `AppConfig::from_env` overlays `JARVIS_*` variables.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value is out of range or otherwise unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// An environment variable could not be parsed.
    #[error("invalid value for {name}: {value}")]
    BadEnv {
        /// Variable name.
        name: &'static str,
        /// Raw value found in the environment.
        value: String,
    },
    /// A base URL could not be parsed.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

/// Top-level configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Text generation backend settings.
    pub generation: GenerationConfig,
    /// Long-term memory settings.
    pub memory: MemoryConfig,
    /// Document upload and storage settings.
    pub documents: DocumentConfig,
    /// Routing and prompt settings.
    pub assistant: AssistantConfig,
}

impl AppConfig {
    /// Build a configuration from defaults overlaid with environment variables.
    ///
    /// # Errors
    /// Returns an error if a numeric variable cannot be parsed or the result
    /// fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay values provided by `lookup` (usually the process environment).
    ///
    /// # Errors
    /// Returns an error if a numeric variable cannot be parsed.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("JARVIS_PORT") {
            self.server.port = parse_env("JARVIS_PORT", &port)?;
        }
        if let Some(dir) = lookup("JARVIS_STATIC_DIR") {
            self.server.static_dir = PathBuf::from(dir);
        }
        if let Some(limit) = lookup("JARVIS_MAX_UPLOAD_BYTES") {
            self.server.max_upload_bytes = parse_env("JARVIS_MAX_UPLOAD_BYTES", &limit)?;
        }

        if let Some(base_url) = lookup("JARVIS_OLLAMA_URL") {
            self.generation.base_url = base_url.clone();
            self.memory.embedding_base_url = Some(base_url);
        }
        if let Some(model) = lookup("JARVIS_MODEL") {
            self.generation.model = model;
        }
        if let Some(secs) = lookup("JARVIS_GENERATION_TIMEOUT_SECS") {
            let secs: u64 = parse_env("JARVIS_GENERATION_TIMEOUT_SECS", &secs)?;
            self.generation.timeout = Duration::from_secs(secs);
        }

        if let Some(model) = lookup("JARVIS_EMBEDDING_MODEL") {
            self.memory.embedding_model = model;
        }
        if let Some(ndims) = lookup("JARVIS_EMBEDDING_NDIMS") {
            self.memory.embedding_ndims = parse_env("JARVIS_EMBEDDING_NDIMS", &ndims)?;
        }
        if let Some(key) = lookup("PINECONE_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.memory.pinecone_api_key = Some(key);
        }
        if let Some(host) = lookup("PINECONE_INDEX_HOST").filter(|h| !h.trim().is_empty()) {
            self.memory.pinecone_index_host = Some(host);
        }
        if let Some(top_k) = lookup("JARVIS_MEMORY_TOP_K") {
            self.memory.top_k = parse_env("JARVIS_MEMORY_TOP_K", &top_k)?;
        }

        if let Some(dir) = lookup("JARVIS_UPLOAD_DIR") {
            self.documents.upload_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("JARVIS_DOCUMENT_DB") {
            self.documents.sqlite_path = Some(PathBuf::from(path));
        }

        if let Some(user) = lookup("JARVIS_DEFAULT_USER").filter(|u| !u.trim().is_empty()) {
            self.assistant.default_user_id = user;
        }
        if let Some(chars) = lookup("JARVIS_MAX_DOCUMENT_CHARS") {
            self.assistant.max_document_chars = parse_env("JARVIS_MAX_DOCUMENT_CHARS", &chars)?;
        }

        Ok(())
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_upload_bytes must be > 0".to_string(),
            ));
        }

        if self.generation.timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "generation.timeout must be > 0".to_string(),
            ));
        }

        if self.memory.top_k == 0 {
            return Err(ConfigError::Invalid("memory.top_k must be > 0".to_string()));
        }

        if self.memory.embedding_ndims == 0 {
            return Err(ConfigError::Invalid(
                "memory.embedding_ndims must be > 0".to_string(),
            ));
        }

        if self.documents.memory_excerpt_chars == 0 {
            return Err(ConfigError::Invalid(
                "documents.memory_excerpt_chars must be > 0".to_string(),
            ));
        }

        if self.assistant.max_document_chars == 0 {
            return Err(ConfigError::Invalid(
                "assistant.max_document_chars must be > 0".to_string(),
            ));
        }

        if self.assistant.default_user_id.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "assistant.default_user_id must not be empty".to_string(),
            ));
        }

        Url::parse(&self.generation.base_url)?;

        if let Some(base_url) = &self.memory.embedding_base_url {
            Url::parse(base_url)?;
        }

        if let Some(host) = &self.memory.pinecone_index_host {
            Url::parse(host)?;
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::BadEnv {
        name,
        value: value.to_string(),
    })
}

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listening port.
    pub port: u16,
    /// Directory served at `/`.
    pub static_dir: PathBuf,
    /// Maximum accepted request body for uploads.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            static_dir: PathBuf::from("static"),
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

/// Text generation backend settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Ollama base URL.
    pub base_url: String,
    /// Model name as installed in Ollama.
    pub model: String,
    /// Upper bound on a whole streamed generation.
    #[serde(with = "duration_serde")]
    pub timeout: Duration,
    /// TCP connect timeout.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            model: "mistral".to_string(),
            timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Long-term memory settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Ollama embedding model name.
    pub embedding_model: String,
    /// Embedding vector dimensions; must match the Pinecone index.
    pub embedding_ndims: usize,
    /// Optional custom Ollama base URL for embeddings.
    pub embedding_base_url: Option<String>,
    /// Pinecone API key. Without it the in-process memory is used.
    pub pinecone_api_key: Option<String>,
    /// Pinecone index data-plane host, e.g. `https://jarvis-memory-xxxx.svc.pinecone.io`.
    pub pinecone_index_host: Option<String>,
    /// Number of past interactions to retrieve.
    pub top_k: usize,
    /// Per-user capacity of the in-process memory.
    pub in_memory_capacity: usize,
    /// Timeout for memory backend calls.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            embedding_model: "all-minilm".to_string(),
            embedding_ndims: 384,
            embedding_base_url: None,
            pinecone_api_key: None,
            pinecone_index_host: None,
            top_k: 3,
            in_memory_capacity: 512,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl MemoryConfig {
    /// Whether both Pinecone settings are present.
    #[must_use]
    pub const fn pinecone_enabled(&self) -> bool {
        self.pinecone_api_key.is_some() && self.pinecone_index_host.is_some()
    }
}

/// Document upload and storage settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Directory uploaded files are saved into.
    pub upload_dir: PathBuf,
    /// `SQLite` path for the document store; in-memory when unset.
    pub sqlite_path: Option<PathBuf>,
    /// Size of the excerpt recorded to memory on upload.
    pub memory_excerpt_chars: usize,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            sqlite_path: None,
            memory_excerpt_chars: 1000,
        }
    }
}

/// Routing and prompt settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// User identifier used when a request does not carry one.
    pub default_user_id: String,
    /// Character budget for document context.
    pub max_document_chars: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            default_user_id: "jotiba".to_string(),
            max_document_chars: crate::assistant::normalizer::DEFAULT_MAX_CHARS,
        }
    }
}

/// Serde module for Duration serialization.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.generation.model, "mistral");
        assert_eq!(config.generation.timeout, Duration::from_secs(120));
        assert_eq!(config.memory.top_k, 3);
        assert_eq!(config.memory.embedding_ndims, 384);
        assert_eq!(config.documents.memory_excerpt_chars, 1000);
        assert_eq!(config.assistant.max_document_chars, 7000);
        assert_eq!(config.assistant.default_user_id, "jotiba");
        assert!(!config.memory.pinecone_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overlay() {
        let mut config = AppConfig::default();
        let lookup = lookup_from(&[
            ("JARVIS_PORT", "8080"),
            ("JARVIS_MODEL", "llama3"),
            ("JARVIS_OLLAMA_URL", "http://10.0.0.2:11434"),
            ("JARVIS_GENERATION_TIMEOUT_SECS", "30"),
            ("PINECONE_API_KEY", "pc-key"),
            ("PINECONE_INDEX_HOST", "https://jarvis-memory.svc.pinecone.io"),
            ("JARVIS_DEFAULT_USER", "alice"),
        ]);

        config.apply_env(lookup).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.generation.model, "llama3");
        assert_eq!(config.generation.base_url, "http://10.0.0.2:11434");
        assert_eq!(
            config.memory.embedding_base_url.as_deref(),
            Some("http://10.0.0.2:11434")
        );
        assert_eq!(config.generation.timeout, Duration::from_secs(30));
        assert!(config.memory.pinecone_enabled());
        assert_eq!(config.assistant.default_user_id, "alice");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_env_value() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(lookup_from(&[("JARVIS_PORT", "not-a-port")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::BadEnv { name: "JARVIS_PORT", .. }));
    }

    #[test]
    fn test_validate_rejects_zero_top_k() {
        let mut config = AppConfig::default();
        config.memory.top_k = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = AppConfig::default();
        config.generation.base_url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Url(_))));
    }
}
