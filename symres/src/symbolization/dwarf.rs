//! In-process engine backed by DWARF debug information
//!
//! Offsets are looked up with `addr2line`; when the debug info has nothing to
//! say about an offset the ELF symbol table still provides a function name.

use addr2line::Context;
use gimli::{EndianArcSlice, RunTimeEndian};
use log::{debug, warn};
use object::{Object, ObjectSection, ObjectSymbol, SymbolKind};
use rustc_demangle::demangle;
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::engine::{parse_offset, EngineLoader, SymbolEngine};
use crate::domain::{EngineError, Frame, ResolveError, UNKNOWN};

/// How much the image can tell about an address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugCoverage {
    /// DWARF debug info present
    Full,
    /// Symbol table only: function names without file or line
    SymbolsOnly,
    /// Neither, nothing will resolve
    Stripped,
}

impl DebugCoverage {
    fn of(obj: &object::File<'_>) -> Self {
        let non_empty = |name: &str| obj.section_by_name(name).is_some_and(|s| s.size() > 0);
        Self::classify(non_empty(".debug_info"), non_empty(".symtab"))
    }

    fn classify(has_debug_info: bool, has_symtab: bool) -> Self {
        match (has_debug_info, has_symtab) {
            (true, _) => DebugCoverage::Full,
            (false, true) => DebugCoverage::SymbolsOnly,
            (false, false) => DebugCoverage::Stripped,
        }
    }
}

/// Opens [`DwarfEngine`]s for one image
#[derive(Debug, Clone)]
pub struct DwarfLoader {
    image: PathBuf,
    coverage_reported: Arc<AtomicBool>,
}

impl DwarfLoader {
    pub fn new<P: Into<PathBuf>>(image: P) -> Self {
        Self { image: image.into(), coverage_reported: Arc::default() }
    }
}

impl EngineLoader for DwarfLoader {
    type Engine = DwarfEngine;

    fn open(&self) -> Result<DwarfEngine, EngineError> {
        let engine = DwarfEngine::open(&self.image)?;

        // Recycles reload the same image, warn once
        if !self.coverage_reported.swap(true, Ordering::Relaxed) {
            match engine.coverage() {
                DebugCoverage::Full => {}
                DebugCoverage::SymbolsOnly => warn!(
                    "{} has no DWARF debug info, file and line will be unknown",
                    self.image.display()
                ),
                DebugCoverage::Stripped => warn!(
                    "{} is stripped, every address will fail to resolve",
                    self.image.display()
                ),
            }
        }

        Ok(engine)
    }
}

/// Symbol engine over a parsed image
///
/// Section data is held in `Arc` slices so the engine can be handed to the
/// resolver thread.
pub struct DwarfEngine {
    ctx: Context<EndianArcSlice<RunTimeEndian>>,
    symbols: SymbolTable,
    coverage: DebugCoverage,
}

impl DwarfEngine {
    /// Load the image and its debug information
    ///
    /// # Errors
    /// Returns an error if the image cannot be read or parsed, or if its DWARF
    /// sections are malformed
    pub fn open<P: AsRef<Path>>(image: P) -> Result<Self, EngineError> {
        let path = image.as_ref();
        let binary_data = fs::read(path)
            .map_err(|source| EngineError::ReadImage { path: path.to_path_buf(), source })?;

        let obj_file = object::File::parse(&*binary_data)
            .map_err(|source| EngineError::ParseImage { path: path.to_path_buf(), source })?;

        let endian =
            if obj_file.is_little_endian() { RunTimeEndian::Little } else { RunTimeEndian::Big };

        let load_section =
            |id: gimli::SectionId| -> Result<EndianArcSlice<RunTimeEndian>, gimli::Error> {
                let data = obj_file
                    .section_by_name(id.name())
                    .and_then(|section| section.uncompressed_data().ok())
                    .unwrap_or(Cow::Borrowed(&[][..]));
                Ok(EndianArcSlice::new(Arc::from(&*data), endian))
            };

        let coverage = DebugCoverage::of(&obj_file);
        let dwarf = gimli::Dwarf::load(&load_section)?;
        let ctx = Context::from_dwarf(dwarf)?;
        let symbols = SymbolTable::from_object(&obj_file);

        debug!("Loaded {} ({} text symbols)", path.display(), symbols.len());

        Ok(Self { ctx, symbols, coverage })
    }

    /// Debug information found when the image was loaded
    #[must_use]
    pub fn coverage(&self) -> DebugCoverage {
        self.coverage
    }

    fn find_frames(&self, offset: &str, addr: u64) -> Result<Vec<Frame>, ResolveError> {
        let lookup_error =
            |e: gimli::Error| ResolveError::Lookup { offset: offset.to_string(), reason: e.to_string() };

        let mut frames = Vec::new();
        let mut frame_iter = self.ctx.find_frames(addr).skip_all_loads().map_err(lookup_error)?;

        while let Some(frame) = frame_iter.next().map_err(lookup_error)? {
            let function = frame
                .function
                .and_then(|f| f.demangle().ok().map(|s| s.to_string()))
                .unwrap_or_else(|| UNKNOWN.to_string());

            let (file, line) = frame
                .location
                .map(|loc| (loc.file.map(str::to_string), loc.line))
                .unwrap_or_default();

            frames.push(Frame {
                function,
                file: file.unwrap_or_else(|| UNKNOWN.to_string()),
                line: line.unwrap_or(0),
            });
        }

        Ok(frames)
    }
}

impl SymbolEngine for DwarfEngine {
    fn resolve(&mut self, offset: &str) -> Result<Vec<Frame>, ResolveError> {
        let addr = parse_offset(offset)?;
        let mut frames = self.find_frames(offset, addr)?;

        let needs_symbol = frames.first().map_or(true, |f| f.function == UNKNOWN);
        if needs_symbol {
            if let Some(symbol) = self.symbols.lookup(addr) {
                let name = demangle_symbol(&symbol.name);
                if frames.is_empty() {
                    frames.push(Frame::new(name, UNKNOWN, 0));
                } else {
                    frames[0].function = name;
                }
            }
        }

        if frames.is_empty() {
            return Err(ResolveError::NotFound(offset.to_string()));
        }

        Ok(frames)
    }

    fn close(self) -> Result<(), EngineError> {
        // Dropping the context releases every cached unit
        Ok(())
    }
}

/// Demangle a Rust symbol name
#[must_use]
pub fn demangle_symbol(symbol: &str) -> String {
    format!("{:#}", demangle(symbol))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Symbol {
    address: u64,
    size: u64,
    name: String,
}

/// Text symbols sorted by address
#[derive(Debug, Default)]
struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    fn from_object(obj: &object::File<'_>) -> Self {
        let symbols = obj
            .symbols()
            .filter(|s| s.kind() == SymbolKind::Text && s.address() != 0)
            .filter_map(|s| {
                let name = s.name().ok().filter(|n| !n.is_empty())?;
                Some(Symbol { address: s.address(), size: s.size(), name: name.to_string() })
            })
            .collect();
        Self::from_symbols(symbols)
    }

    fn from_symbols(mut symbols: Vec<Symbol>) -> Self {
        symbols.sort_by_key(|s| s.address);
        Self { symbols }
    }

    fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Closest symbol at or below `addr`; sized symbols must cover it
    fn lookup(&self, addr: u64) -> Option<&Symbol> {
        let idx = self.symbols.partition_point(|s| s.address <= addr);
        let symbol = self.symbols.get(idx.checked_sub(1)?)?;
        (symbol.size == 0 || addr - symbol.address < symbol.size).then_some(symbol)
    }
}
