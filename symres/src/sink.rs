//! Symbol file writer
//!
//! Writes one `address : name` line per record, in record order, before any
//! resolution starts. Every failure is logged and skipped.

use log::{error, info};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::Record;

/// Default name of the symbol file, relative to the working directory
pub const SYMBOL_FILE: &str = "addr2line_Symbols.txt";

/// Create (or truncate) `path` and write every record to it
///
/// Returns the number of lines written.
pub fn write_symbol_file(path: &Path, records: &[Record]) -> usize {
    let file = match File::create(path) {
        Ok(file) => file,
        Err(e) => {
            error!("Failed to create {}: {e}", path.display());
            return 0;
        }
    };

    let mut writer = BufWriter::new(file);
    let written = write_symbols(&mut writer, records);

    match writer.into_inner() {
        Ok(file) => {
            if let Err(e) = file.sync_all() {
                error!("Failed to sync {}: {e}", path.display());
            }
        }
        Err(e) => error!("Failed to flush {}: {}", path.display(), e.error()),
    }

    info!("Wrote {written} symbols to {}", path.display());
    written
}

/// Write `address : name` lines, skipping any that fail
pub fn write_symbols<W: Write>(out: &mut W, records: &[Record]) -> usize {
    records
        .iter()
        .filter(|record| match writeln!(out, "{} : {}", record.address, record.name) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to write symbol {}: {e}", record.name);
                false
            }
        })
        .count()
}
