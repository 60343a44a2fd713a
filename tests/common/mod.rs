//! Common test utilities for integration tests.
//!
//! # Modules
//!
//! - `fixtures`: trackers, stores, and CLI command builders
//! - `log_capture`: tracing capture for log assertions

#![allow(dead_code)]

pub mod fixtures;
pub mod log_capture;
