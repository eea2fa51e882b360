//! Structured logging facility for compenv
//!
//! This module provides a canonical logging facility with:
//! - Single initialization point via `init(profile)`
//! - Structured logging macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//! - Test capture mode for deterministic assertions
//!
//! The environment facade owns lifecycle logging: it emits one start and one
//! end (or end_error) event per operation. Lower layers (disposer, registries,
//! contexts) only use `tracing::debug!` / `tracing::warn!` for internal detail.
//!
//! # Usage
//!
//! ```rust
//! use compenv_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
