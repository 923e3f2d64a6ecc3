//! Resolver handle with periodic engine recycling
//!
//! Long-running engines accumulate cached debug-info state. The handle counts
//! requests and, before every request whose 1-based number is a multiple of
//! the recycle threshold, closes the engine and opens a fresh one against the
//! same image.

use log::{info, warn};
use std::num::NonZeroU64;
use std::sync::{Mutex, PoisonError};

use super::engine::{EngineLoader, SymbolEngine};
use crate::domain::{HandleError, Resolution, ResolveError};

/// Requests served by one engine before it is recycled
pub const DEFAULT_RECYCLE_THRESHOLD: u64 = 3000;

struct HandleState<E> {
    /// `None` only after a failed reopen
    engine: Option<E>,
    requests: u64,
    recycles: u64,
}

/// Single-owner wrapper around an engine
///
/// Resolution and recycling both happen under one lock, so a handle shared by
/// several consumers would still never interleave two engine calls.
pub struct ResolverHandle<L: EngineLoader> {
    loader: L,
    threshold: Option<NonZeroU64>,
    state: Mutex<HandleState<L::Engine>>,
}

impl<L: EngineLoader> ResolverHandle<L> {
    /// Open the first engine
    ///
    /// `threshold` of `None` disables recycling.
    ///
    /// # Errors
    /// Returns [`HandleError::Open`] if the engine cannot be opened
    pub fn open(loader: L, threshold: Option<NonZeroU64>) -> Result<Self, HandleError> {
        let engine = loader.open().map_err(HandleError::Open)?;
        info!(
            "Symbol engine opened (recycle every {})",
            threshold.map_or_else(|| "never".to_string(), |n| format!("{n} requests"))
        );

        Ok(Self {
            loader,
            threshold,
            state: Mutex::new(HandleState { engine: Some(engine), requests: 0, recycles: 0 }),
        })
    }

    /// Resolve one offset, recycling the engine first when due
    ///
    /// # Errors
    /// Returns [`HandleError::Reopen`] (fatal) if a recycle could not open a
    /// new engine, or [`HandleError::Resolve`] if the engine cannot map the
    /// offset
    pub fn resolve(&self, offset: &str) -> Result<Resolution, HandleError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.requests += 1;
        let requests = state.requests;

        if self.threshold.is_some_and(|n| requests % n.get() == 0) {
            self.recycle(&mut state)?;
        }

        let engine = state
            .engine
            .as_mut()
            .ok_or_else(|| HandleError::Reopen { requests, source: closed_engine() })?;
        let frames = engine.resolve(offset)?;
        if frames.is_empty() {
            return Err(ResolveError::NotFound(offset.to_string()).into());
        }

        Ok(Resolution { offset: offset.to_string(), frames })
    }

    fn recycle(&self, state: &mut HandleState<L::Engine>) -> Result<(), HandleError> {
        if let Some(engine) = state.engine.take() {
            if let Err(e) = engine.close() {
                warn!("Closing symbol engine failed: {e}");
            }
        }

        let engine = self
            .loader
            .open()
            .map_err(|source| HandleError::Reopen { requests: state.requests, source })?;
        state.engine = Some(engine);
        state.recycles += 1;

        info!("Symbol engine recycled after {} requests", state.requests);
        Ok(())
    }

    /// Requests seen so far, including failed ones
    pub fn requests(&self) -> u64 {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).requests
    }

    /// Completed close+reopen cycles
    pub fn recycles(&self) -> u64 {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).recycles
    }
}

fn closed_engine() -> crate::domain::EngineError {
    std::io::Error::other("symbol engine is closed").into()
}
