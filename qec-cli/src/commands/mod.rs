//! CLI command implementations.
//!
//! This module contains the implementations of all CLI commands:
//! - `compose`: `up`, `down`, `config`, `ps`, `logs` and pass-through verbs
//! - `merge`: Print the merged compose file
//! - `completions`: Generate shell completion scripts

pub mod completions;
pub mod compose;
pub mod merge;

pub use completions::CompletionsCommand;
pub use compose::{ComposeArgs, UpCommand};
pub use merge::MergeCommand;
