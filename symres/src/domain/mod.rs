//! Domain model for symres
//!
//! This module contains the core data types and errors shared by the record
//! source, the engines, the resolver handle and the pipeline:
//! - Plain data carried from the database to standard output
//! - Structured error handling, one enum per concern

pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use types::{Frame, Job, Record, Resolution, UNKNOWN};

pub use errors::{EngineError, HandleError, PipelineError, ResolveError, SourceError};
