//! # symres - Database-driven Symbol Resolution
//!
//! symres reads `(name, address)` pairs recorded for one instance from a
//! database and resolves each address to a source location (function, file,
//! line) against a fixed target image, usually a kernel `vmlinux`.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐   records   ┌──────────────┐   address : name
//! │   Database   │────────────▶│     Sink     │──────────────────▶ addr2line_Symbols.txt
//! │  (source)    │      │      └──────────────┘
//! └──────────────┘      │
//!                       ▼
//!               ┌──────────────┐  Job × N + Terminate  ┌──────────────┐
//!               │   Producer   │──────────────────────▶│   Consumer   │──▶ stdout
//!               │  (pipeline)  │◀──────completion──────│   (thread)   │
//!               └──────────────┘                       └──────┬───────┘
//!                                                             │
//!                                                     ┌───────▼───────┐
//!                                                     │ResolverHandle │
//!                                                     │ lock, counter,│
//!                                                     │ recycle every │
//!                                                     │  N requests   │
//!                                                     └───────┬───────┘
//!                                                             │
//!                                                     ┌───────▼───────┐
//!                                                     │    Engine     │
//!                                                     │DWARF/binutils │
//!                                                     └───────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`source`]: database driver selection and the single symbol query
//! - [`symbolization`]: engines and the recycling [`symbolization::ResolverHandle`]
//! - [`pipeline`]: bounded job queue, producer loop and the consumer thread
//! - [`sink`]: the `addr2line_Symbols.txt` listing
//! - [`preflight`]: image and tool checks before the first engine opens
//! - [`cli`]: command-line arguments and [`cli::RunConfig`]
//! - [`domain`]: shared data types and errors
//!
//! ## Error Policy
//!
//! - **Fatal**: database connection failure, engine open failure (initial or
//!   during recycling). These propagate to the binary, which exits non-zero.
//! - **Reported**: row read errors (partial results kept), per-address
//!   resolution failures (printed, processing continues), output write
//!   failures (logged).
//!
//! ## Typical Usage
//!
//! ```bash
//! # Resolve instance 42 against ./vmlinux, including inlined frames
//! symres postgres 'postgres://user:pw@db/symbols' 42 true
//!
//! # Recycle the engine every 1000 requests, use binutils addr2line
//! symres sqlite3 symbols.db 42 false 1000 --engine binutils
//! ```

pub mod cli;
pub mod domain;
pub mod pipeline;
pub mod preflight;
pub mod sink;
pub mod source;
pub mod symbolization;
