//! Run configuration
//!
//! Built once from [`Args`] and handed to each component; nothing reads the
//! command line after this point.

use clap::ValueEnum;
use log::warn;
use std::num::NonZeroU64;
use std::path::PathBuf;

use super::args::Args;
use crate::symbolization::DEFAULT_RECYCLE_THRESHOLD;

/// Which engine resolves addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EngineKind {
    /// In-process DWARF reader
    Dwarf,
    /// External binutils addr2line process
    Binutils,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub driver: String,
    pub dsn: String,
    pub instance_id: String,
    pub include_inlines: bool,
    /// `None` disables recycling
    pub recycle_threshold: Option<NonZeroU64>,
    pub image: PathBuf,
    pub engine: EngineKind,
    pub addr2line: PathBuf,
    pub output: PathBuf,
}

impl RunConfig {
    /// Build the configuration, or `None` if a required positional is missing
    #[must_use]
    pub fn from_args(args: Args) -> Option<Self> {
        let (Some(driver), Some(dsn), Some(instance_id)) = (args.driver, args.dsn, args.instance_id)
        else {
            return None;
        };

        let include_inlines = args.include_inlines.as_deref() == Some("true");

        let max_requests = match args.max_requests.as_deref().map(parse_uint) {
            Some(Some(n)) => n,
            Some(None) => {
                warn!(
                    "Ignoring invalid MAX_REQUESTS {:?}, using {DEFAULT_RECYCLE_THRESHOLD}",
                    args.max_requests.unwrap_or_default()
                );
                DEFAULT_RECYCLE_THRESHOLD
            }
            None => DEFAULT_RECYCLE_THRESHOLD,
        };

        Some(Self {
            driver,
            dsn,
            instance_id,
            include_inlines,
            recycle_threshold: NonZeroU64::new(max_requests),
            image: args.image,
            engine: args.engine,
            addr2line: args.addr2line,
            output: args.output,
        })
    }
}

/// Parse an unsigned integer, detecting the base from its prefix
///
/// `0x` is hexadecimal, `0o` or a bare leading `0` octal, `0b` binary,
/// anything else decimal. Underscores may separate digits or follow a prefix.
#[must_use]
pub fn parse_uint(s: &str) -> Option<u64> {
    let lower = s.trim().to_ascii_lowercase();
    let (digits, radix) = if let Some(rest) = lower.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (rest, 8)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (rest, 2)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (&lower[1..], 8)
    } else {
        (lower.as_str(), 10)
    };

    if !underscores_separate_digits(digits, radix != 10) {
        return None;
    }
    let digits: String = digits.chars().filter(|&c| c != '_').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u64::from_str_radix(&digits, radix).ok()
}

fn underscores_separate_digits(digits: &str, after_prefix: bool) -> bool {
    let mut after_digit = after_prefix;
    for c in digits.chars() {
        if c == '_' {
            if !after_digit {
                return false;
            }
            after_digit = false;
        } else {
            after_digit = true;
        }
    }
    after_digit
}
