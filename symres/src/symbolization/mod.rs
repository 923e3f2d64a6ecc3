//! # Symbol Resolution
//!
//! This module turns address tokens from the database into source locations
//! (function, file, line). The actual mapping is done by an **engine**; this
//! crate ships two of them behind one trait:
//!
//! - **`dwarf`**: in-process, reads DWARF debug information from the image
//!   with `gimli`/`addr2line` and falls back to the ELF symbol table
//! - **`process`**: out-of-process, drives the binutils `addr2line` tool over
//!   pipes
//!
//! ## Inlined Frames
//!
//! Optimized code inlines functions into their callers. For such an address
//! the engine returns several frames: the location of the address itself,
//! then each function it was inlined into, in the order the engine reports
//! them.
//!
//! ## Engine Recycling
//!
//! Engines keep parsed units and line tables around for the lifetime of the
//! handle. Over hundreds of thousands of requests that state grows without
//! bound, so [`ResolverHandle`] closes and reopens its engine every N
//! requests (3000 by default).
//!
//! ```text
//! request:   1 ... N-1 | N ... 2N-1 | 2N ...
//! engine:    #1        | #2         | #3
//!                      ^ close + reopen before request N
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! let handle = ResolverHandle::open(DwarfLoader::new("vmlinux"), NonZeroU64::new(3000))?;
//! let resolution = handle.resolve("0xffffffff81234567")?;
//! println!("{}", resolution.primary());
//! ```

pub mod dwarf;
pub mod engine;
pub mod handle;
pub mod process;

pub use dwarf::{demangle_symbol, DebugCoverage, DwarfEngine, DwarfLoader};
pub use engine::{parse_offset, EngineLoader, SymbolEngine};
pub use handle::{ResolverHandle, DEFAULT_RECYCLE_THRESHOLD};
pub use process::{ProcessEngine, ProcessLoader};
