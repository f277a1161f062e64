//! Decoder for Ollama's newline-delimited JSON generation stream.
//!
//! Each line is an independent object such as
//! `{"response":"Hel","done":false}`; the stream ends with a record whose
//! `done` flag is set. Bytes are buffered until a full line is available so
//! multi-byte characters split across network chunks decode correctly.

use serde::Deserialize;
use tracing::debug;

/// One record of the generation stream.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct GenerateRecord {
    /// Incremental text.
    #[serde(default)]
    pub response: Option<String>,
    /// Completion flag.
    #[serde(default)]
    pub done: bool,
    /// Error reported by the backend.
    #[serde(default)]
    pub error: Option<String>,
}

/// Incremental NDJSON line decoder.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    buffer: Vec<u8>,
    skipped: usize,
}

impl NdjsonDecoder {
    /// Create an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes and return every complete record they finish.
    ///
    /// Malformed lines are skipped and counted.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<GenerateRecord> {
        self.buffer.extend_from_slice(bytes);

        let mut records = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(record) = self.decode_line(&line) {
                records.push(record);
            }
        }
        records
    }

    /// Decode whatever is left once the byte stream has ended.
    pub fn finish(&mut self) -> Option<GenerateRecord> {
        let rest = std::mem::take(&mut self.buffer);
        self.decode_line(&rest)
    }

    /// Number of malformed lines skipped so far.
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }

    fn decode_line(&mut self, line: &[u8]) -> Option<GenerateRecord> {
        let line = line.trim_ascii();
        if line.is_empty() {
            return None;
        }

        match serde_json::from_slice::<GenerateRecord>(line) {
            Ok(record) => Some(record),
            Err(err) => {
                self.skipped += 1;
                debug!("Skipping malformed stream line: {err}");
                None
            }
        }
    }
}
