//! The seam between the resolver handle and a concrete symbol engine

use crate::domain::{EngineError, Frame, ResolveError};

/// An open, stateful engine bound to one target image
///
/// Implementations are driven from a single thread at a time; the resolver
/// handle serializes every call.
pub trait SymbolEngine: Send {
    /// Resolve one offset to its frames (primary location first)
    ///
    /// An `Ok` result is never empty.
    ///
    /// # Errors
    /// Returns a [`ResolveError`] if the engine cannot map the offset
    fn resolve(&mut self, offset: &str) -> Result<Vec<Frame>, ResolveError>;

    /// Release the engine's resources
    ///
    /// # Errors
    /// Returns an error if the engine did not shut down cleanly
    fn close(self) -> Result<(), EngineError>
    where
        Self: Sized;
}

/// Opens fresh engines against a fixed image
pub trait EngineLoader: Send {
    type Engine: SymbolEngine;

    /// # Errors
    /// Returns an error if the image cannot be loaded
    fn open(&self) -> Result<Self::Engine, EngineError>;
}

/// Parse an address token into a numeric offset
///
/// Tokens are hexadecimal with an optional `0x`/`0X` prefix.
///
/// # Errors
/// Returns [`ResolveError::InvalidAddress`] for anything else
pub fn parse_offset(offset: &str) -> Result<u64, ResolveError> {
    let trimmed = offset.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.is_empty() {
        return Err(ResolveError::InvalidAddress(offset.to_string()));
    }

    u64::from_str_radix(digits, 16).map_err(|_| ResolveError::InvalidAddress(offset.to_string()))
}
