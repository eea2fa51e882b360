//! Core types shared across compenv facilities
//!
//! This crate provides foundational types used by the lifecycle core,
//! its error facility and its logging facility:
//!
//! - **Identifiers**: ApplicationId, ProjectId, SourceId, NodeId
//! - **Schema constants**: Canonical field keys and event names

pub mod ids;
pub mod schema;

pub use ids::{ApplicationId, NodeId, ProjectId, SourceId};
