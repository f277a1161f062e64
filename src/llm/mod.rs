//! Text generation: the gateway trait, its streaming handle, and the Ollama client.

pub mod generation;
pub mod ollama;
pub mod stream;

pub use generation::{
    GenerationError, GenerationFuture, GenerationStream, Generator, StreamEvent, StreamItem,
};
pub use ollama::OllamaGenerator;
pub use stream::{GenerateRecord, NdjsonDecoder};
