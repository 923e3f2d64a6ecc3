//! # Queue Consumer
//!
//! The only reader of the job queue. Owns the resolver handle and the output
//! writer for the whole run.
//!
//! ## States
//!
//! - `Running`: pull a job; resolve it and print the result
//! - `Terminated`: entered once, on the terminate job; nothing more is pulled
//!
//! A fatal handle error (engine reopen failure) stops the loop early and is
//! returned to the producer through the completion channel.

use crossbeam_channel::Receiver;
use log::{debug, error};
use std::io::Write;

use super::report::{failure_line, frame_line, inlined_line};
use crate::domain::{HandleError, Job, PipelineError};
use crate::symbolization::{EngineLoader, ResolverHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Running,
    Terminated,
}

/// Counters kept while consuming
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConsumerStats {
    /// Resolve jobs pulled from the queue
    pub jobs: u64,
    pub resolved: u64,
    pub failed: u64,
    /// Inlined-frame lines printed
    pub inlined: u64,
    /// Lines that could not be written to the output
    pub output_errors: u64,
}

/// Returned to the producer once the terminate job has been handled
pub struct ConsumerReport<W> {
    pub output: W,
    pub stats: ConsumerStats,
    pub recycles: u64,
}

pub struct Consumer<L: EngineLoader, W: Write> {
    handle: ResolverHandle<L>,
    output: W,
    include_inlines: bool,
    state: ConsumerState,
    pub stats: ConsumerStats,
}

impl<L: EngineLoader, W: Write> Consumer<L, W> {
    #[must_use]
    pub fn new(handle: ResolverHandle<L>, output: W, include_inlines: bool) -> Self {
        Self {
            handle,
            output,
            include_inlines,
            state: ConsumerState::Running,
            stats: ConsumerStats::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> ConsumerState {
        self.state
    }

    /// Pull jobs until the terminate job arrives
    ///
    /// # Errors
    /// Returns a fatal [`HandleError`] from the resolver, or
    /// [`PipelineError::QueueClosed`] if every sender went away before the
    /// terminate job was seen
    pub fn run(mut self, jobs: &Receiver<Job>) -> Result<ConsumerReport<W>, PipelineError> {
        while self.state == ConsumerState::Running {
            let job = jobs.recv().map_err(|_| PipelineError::QueueClosed)?;
            self.process_job(job)?;
        }

        if let Err(e) = self.output.flush() {
            error!("Failed to flush output: {e}");
            self.stats.output_errors += 1;
        }

        Ok(ConsumerReport {
            recycles: self.handle.recycles(),
            output: self.output,
            stats: self.stats,
        })
    }

    /// Handle a single job
    ///
    /// # Errors
    /// Returns only fatal handle errors; resolution failures are printed
    pub fn process_job(&mut self, job: Job) -> Result<(), HandleError> {
        let (offset, name) = match job {
            Job::Terminate => {
                debug!("Terminate job received after {} jobs", self.stats.jobs);
                self.state = ConsumerState::Terminated;
                return Ok(());
            }
            Job::Resolve { offset, name } => (offset, name),
        };

        self.stats.jobs += 1;

        match self.handle.resolve(&offset) {
            Ok(resolution) => {
                self.stats.resolved += 1;
                self.emit(&frame_line(&offset, resolution.primary()));

                if self.include_inlines {
                    for frame in resolution.inlined() {
                        self.stats.inlined += 1;
                        self.emit(&inlined_line(&offset, frame));
                    }
                }
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                debug!("Resolution of {offset} ({name}) failed: {e}");
                self.stats.failed += 1;
                self.emit(&failure_line(&offset, &name, &e));
            }
        }

        Ok(())
    }

    fn emit(&mut self, line: &str) {
        if let Err(e) = writeln!(self.output, "{line}") {
            error!("Failed to write output line: {e}");
            self.stats.output_errors += 1;
        }
    }
}
