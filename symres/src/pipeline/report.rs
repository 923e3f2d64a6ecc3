//! Line formats for standard output
//!
//! Fields are separated by single spaces:
//! - `<offset> : <function> @ <file> <line>`
//! - `<offset> : Inlined by <function> @ <file> <line>`
//! - `<offset> : <name> Error resolving address <error>`

use std::fmt::Display;

use crate::domain::Frame;

/// Line for the frame an offset maps to
#[must_use]
pub fn frame_line(offset: &str, frame: &Frame) -> String {
    format!("{offset} : {frame}")
}

/// Line for a frame the primary one was inlined into
#[must_use]
pub fn inlined_line(offset: &str, frame: &Frame) -> String {
    format!("{offset} : Inlined by {frame}")
}

/// Line for an offset the engine could not resolve
#[must_use]
pub fn failure_line(offset: &str, name: &str, error: &impl Display) -> String {
    format!("{offset} : {name} Error resolving address {error}")
}
