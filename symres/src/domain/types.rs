//! Core data types
//!
//! Addresses travel through the program as the opaque strings the database
//! stores. Only the engines interpret them.

use std::fmt;

/// Placeholder used for a function or file the engine could not name
pub const UNKNOWN: &str = "??";

/// One row of the `symbols` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub address: String,
}

impl Record {
    #[must_use]
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self { name: name.into(), address: address.into() }
    }
}

/// Unit of work carried by the queue
///
/// Exactly one `Terminate` is enqueued per run, after every `Resolve`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    Resolve { offset: String, name: String },
    Terminate,
}

impl Job {
    #[must_use]
    pub fn is_terminate(&self) -> bool {
        matches!(self, Job::Terminate)
    }
}

impl From<&Record> for Job {
    fn from(record: &Record) -> Self {
        Job::Resolve { offset: record.address.clone(), name: record.name.clone() }
    }
}

/// A resolved source location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub function: String,
    pub file: String,
    pub line: u32,
}

impl Frame {
    #[must_use]
    pub fn new(function: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self { function: function.into(), file: file.into(), line }
    }

    /// Frame for which the engine knew nothing at all
    #[must_use]
    pub fn unknown() -> Self {
        Self::new(UNKNOWN, UNKNOWN, 0)
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.function == UNKNOWN && self.file == UNKNOWN
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {} {}", self.function, self.file, self.line)
    }
}

/// All frames the engine returned for one offset
///
/// `frames` is never empty: the first entry is the location the offset maps
/// to, the rest are the frames it was inlined into, in engine order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub offset: String,
    pub frames: Vec<Frame>,
}

impl Resolution {
    /// The location the offset itself maps to
    #[must_use]
    pub fn primary(&self) -> &Frame {
        &self.frames[0]
    }

    /// Frames after the primary one
    #[must_use]
    pub fn inlined(&self) -> &[Frame] {
        &self.frames[1..]
    }
}
