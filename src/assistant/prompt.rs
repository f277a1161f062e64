//! Prompt assembly.
//!
//! A [`Prompt`] carries exactly one context source, so document text and
//! retrieved memory can never be mixed in the same request.

use crate::assistant::normalizer::normalize_text;

/// Persona and formatting rules prepended to every prompt.
pub const SYSTEM_PROMPT: &str = "You are Jarvis AI, a professional, precise, and concise assistant developed by Jotiba Ugale. \
You specialize in summarizing, explaining, and analyzing technical documents. \
All responses must be cleanly formatted in Markdown, factual, and human-readable. \
Avoid unnecessary repetition or vague language. Focus only on the document’s content.";

/// Task instruction for document-grounded turns.
pub const DOCUMENT_TASK: &str = "Summarize and analyze the entire document provided below.\n\
If it contains multiple programs or sections, list each with a short explanation.\n\
Format the output clearly in Markdown.";

/// Task instruction for memory-grounded turns.
pub const CONVERSATION_TASK: &str =
    "Use past context if relevant; otherwise, respond conversationally.";

/// Opening delimiter of the document block.
pub const DOCUMENT_OPEN: &str = "<Document>";
/// Closing delimiter of the document block.
pub const DOCUMENT_CLOSE: &str = "</Document>";

/// Cue the model continues from.
const ASSISTANT_CUE: &str = "Jarvis:";

/// Context selected for one turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContextBlock {
    /// Normalized document excerpt.
    Document {
        /// Normalized, truncated document text.
        excerpt: String,
    },
    /// Retrieved past interactions, possibly empty.
    Memory {
        /// Retrieved texts joined by newlines.
        context: String,
        /// Raw user message.
        user_message: String,
    },
}

/// Fully assembled instruction for the generation backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prompt {
    persona: String,
    context: ContextBlock,
}

impl Prompt {
    /// Document-grounded prompt from raw stored text.
    #[must_use]
    pub fn for_document(persona: &str, document: &str, max_chars: usize) -> Self {
        Self {
            persona: persona.to_string(),
            context: ContextBlock::Document {
                excerpt: normalize_text(document, max_chars),
            },
        }
    }

    /// Memory-grounded prompt. Retrieved texts are used verbatim.
    #[must_use]
    pub fn for_conversation(persona: &str, memories: &[String], user_message: &str) -> Self {
        Self {
            persona: persona.to_string(),
            context: ContextBlock::Memory {
                context: memories.join("\n").trim().to_string(),
                user_message: user_message.to_string(),
            },
        }
    }

    /// Selected context.
    #[must_use]
    pub const fn context(&self) -> &ContextBlock {
        &self.context
    }

    /// Render the prompt text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.estimate_len());
        out.push('\n');
        out.push_str(&self.persona);
        out.push_str("\n\n");

        match &self.context {
            ContextBlock::Document { excerpt } => {
                out.push_str(DOCUMENT_TASK);
                out.push_str("\n\n");
                out.push_str(DOCUMENT_OPEN);
                out.push('\n');
                out.push_str(excerpt);
                out.push('\n');
                out.push_str(DOCUMENT_CLOSE);
                out.push_str("\n\n");
            }
            ContextBlock::Memory {
                context,
                user_message,
            } => {
                out.push_str(CONVERSATION_TASK);
                out.push_str("\n\nContext: ");
                out.push_str(context);
                out.push_str("\nUser: ");
                out.push_str(user_message);
                out.push('\n');
            }
        }

        out.push_str(ASSISTANT_CUE);
        out.push('\n');
        out
    }

    fn estimate_len(&self) -> usize {
        let body = match &self.context {
            ContextBlock::Document { excerpt } => {
                DOCUMENT_TASK.len() + DOCUMENT_OPEN.len() + DOCUMENT_CLOSE.len() + excerpt.len()
            }
            ContextBlock::Memory {
                context,
                user_message,
            } => CONVERSATION_TASK.len() + context.len() + user_message.len() + 24,
        };
        self.persona.len() + body + ASSISTANT_CUE.len() + 16
    }
}
