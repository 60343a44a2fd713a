//! spendwatch - AI API usage and budget tracker
//!
//! Records token usage for OpenAI and Gemini calls, prices it against a
//! per-model rate table, and tracks spend against monthly budgets with
//! warning and critical alerts. Ships an HTTP API and a CLI.

// Note: deny (not forbid) to allow #[allow(unsafe_code)] in test helpers for env var manipulation
#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod core;
pub mod error;
pub mod render;
pub mod server;
pub mod storage;
pub mod util;

#[cfg(test)]
pub mod test_utils;

pub use error::{ExitCode, Result, SpendError};
