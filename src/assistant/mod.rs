//! Document assistant: intent routing, context assembly and the chat turn.
//!
//! - `intent`: greeting / document / general classification
//! - `normalizer`: whitespace folding and character budgets
//! - `prompt`: persona, task and context rendering
//! - `greeting`: canned introductions
//! - `service`: the [`Assistant`] tying it all to storage, memory and generation

pub mod greeting;
pub mod intent;
pub mod normalizer;
pub mod prompt;
pub mod service;

pub use greeting::{GREETING_REPLIES, GreetingPicker};
pub use intent::{Intent, IntentRouter};
pub use normalizer::{excerpt, normalize_text};
pub use prompt::{ContextBlock, Prompt, SYSTEM_PROMPT};
pub use service::{Assistant, ChatReply, UploadReceipt, fallback_reply};
