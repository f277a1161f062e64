//! Canned introductions for greeting messages.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Introduction replies; one is picked per greeting.
pub const GREETING_REPLIES: [&str; 3] = [
    "Hey 👋, I'm Jarvis — your AI assistant. Upload a PDF, and I’ll summarize or explain it!",
    "Hello! I'm Jarvis, here to help you analyze your document.",
    "Hi there! Upload a file anytime, and I’ll extract and summarize its contents.",
];

/// Picks greeting replies from a seedable random source.
pub struct GreetingPicker {
    rng: Mutex<StdRng>,
}

impl Default for GreetingPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl GreetingPicker {
    /// Picker seeded from OS entropy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic picker, for tests and reproducible demos.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Pick one reply.
    #[must_use]
    pub fn pick(&self) -> &'static str {
        let idx = self
            .rng
            .lock()
            .map_or(0, |mut rng| rng.gen_range(0..GREETING_REPLIES.len()));
        GREETING_REPLIES[idx]
    }
}
