//! Jarvis server binary.
//! Run with: cargo run --bin jarvis-server

use std::process::ExitCode;

use jarvis_agent::start_jarvis_agent;

fn main() -> ExitCode {
    start_jarvis_agent::run()
}
