//! Structured error types for symres
//!
//! Using thiserror for automatic Display implementation and error chaining.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the record source
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Unsupported database driver: {0}")]
    UnsupportedDriver(String),

    #[error("Failed to connect to {driver} database: {source}")]
    Connect {
        driver: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Symbol query failed: {0}")]
    Query(#[source] sqlx::Error),

    #[error("Failed to read symbol row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: sqlx::Error,
    },
}

/// Failures opening or closing an engine handle
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to read image {path}: {source}")]
    ReadImage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse image {path}: {source}")]
    ParseImage {
        path: PathBuf,
        #[source]
        source: object::Error,
    },

    #[error("Failed to load DWARF debug information: {0}")]
    Dwarf(#[from] gimli::Error),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} exited with {1}")]
    Exit(PathBuf, std::process::ExitStatus),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Per-address failures; never fatal
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("invalid address {0:?}")]
    InvalidAddress(String),

    #[error("no symbol information for {0}")]
    NotFound(String),

    #[error("lookup of {offset} failed: {reason}")]
    Lookup { offset: String, reason: String },

    #[error("engine protocol error: {0}")]
    Protocol(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by the resolver handle
#[derive(Error, Debug)]
pub enum HandleError {
    #[error("Failed to open symbol engine: {0}")]
    Open(#[source] EngineError),

    #[error("Failed to reopen symbol engine after {requests} requests: {source}")]
    Reopen {
        requests: u64,
        #[source]
        source: EngineError,
    },

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl HandleError {
    /// Engine (re)open failures end the run; resolution failures do not
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, HandleError::Open(_) | HandleError::Reopen { .. })
    }
}

/// Failures of the producer/consumer pipeline as a whole
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to spawn resolver thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Job queue closed before the terminate job arrived")]
    QueueClosed,

    #[error("Resolver thread exited without signalling completion")]
    ConsumerLost,

    #[error(transparent)]
    Handle(#[from] HandleError),
}
