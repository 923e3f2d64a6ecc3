//! # Resolution Pipeline
//!
//! One producer (the caller of [`run`]) and exactly one consumer thread,
//! connected by a bounded FIFO queue.
//!
//! ```text
//!  producer ──Job::Resolve × N──▶ [ queue: 16 slots ] ──▶ consumer ──▶ stdout
//!           ──Job::Terminate────▶                          │
//!     ▲                                                    │
//!     └──────────── completion channel (1 slot) ◀──────────┘
//! ```
//!
//! The producer blocks when the queue is full and the consumer blocks when it
//! is empty. Jobs are resolved in enqueue order. The completion channel is
//! created here, handed to the consumer at spawn time and fires exactly once.

pub mod consumer;
pub mod report;

use crossbeam_channel::bounded;
use log::{debug, warn};
use std::io::Write;
use std::thread;

pub use consumer::{Consumer, ConsumerReport, ConsumerState, ConsumerStats};

use crate::domain::{Job, PipelineError, Record};
use crate::symbolization::{EngineLoader, ResolverHandle};

/// Slots in the job queue
pub const QUEUE_CAPACITY: usize = 16;

/// Per-run pipeline settings
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub include_inlines: bool,
    pub queue_capacity: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { include_inlines: false, queue_capacity: QUEUE_CAPACITY }
    }
}

/// Resolve every record through `handle`, writing result lines to `output`
///
/// Blocks until the consumer has processed the terminate job.
///
/// # Errors
/// Returns an error if the consumer thread cannot be spawned, if the resolver
/// hit a fatal engine error, or if the consumer vanished without signalling
pub fn run<L, W>(
    records: &[Record],
    handle: ResolverHandle<L>,
    options: PipelineOptions,
    output: W,
) -> Result<ConsumerReport<W>, PipelineError>
where
    L: EngineLoader + 'static,
    W: Write + Send + 'static,
{
    let (job_tx, job_rx) = bounded::<Job>(options.queue_capacity.max(1));
    let (done_tx, done_rx) = bounded(1);

    let consumer = Consumer::new(handle, output, options.include_inlines);
    let worker = thread::Builder::new()
        .name("symres-resolver".to_string())
        .spawn(move || {
            let outcome = consumer.run(&job_rx);
            // The producer only stops listening once it has an outcome
            let _ = done_tx.send(outcome);
        })
        .map_err(PipelineError::Spawn)?;

    let mut enqueued = 0usize;
    for record in records {
        if job_tx.send(Job::from(record)).is_err() {
            warn!("Resolver stopped after {enqueued} of {} jobs", records.len());
            break;
        }
        enqueued += 1;
    }

    if job_tx.send(Job::Terminate).is_ok() {
        debug!("Enqueued {enqueued} jobs and the terminate job");
    }
    drop(job_tx);

    let outcome = done_rx.recv().map_err(|_| PipelineError::ConsumerLost);
    if worker.join().is_err() {
        return Err(PipelineError::ConsumerLost);
    }
    outcome?
}
