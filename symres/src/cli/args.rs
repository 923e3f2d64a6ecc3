//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

use super::config::EngineKind;
use crate::sink::SYMBOL_FILE;
use crate::symbolization::process::DEFAULT_PROGRAM;

#[derive(Parser, Debug)]
#[command(
    name = "symres",
    about = "Resolve symbol addresses recorded in a database to source locations",
    after_help = "\
EXAMPLES:
    symres sqlite3 symbols.db 7                          Resolve instance 7 against ./vmlinux
    symres postgres 'user:pw@db/syms' 7 true 5000        Include inlined frames, recycle every 5000
    symres mysql 'u:p@tcp(db:3306)/syms' 7 --image ./vmlinux-6.1 --engine binutils"
)]
pub struct Args {
    /// Database driver (postgres, mysql, sqlite3)
    #[arg(value_name = "DB_DRIVER")]
    pub driver: Option<String>,

    /// Driver-specific data source name
    #[arg(value_name = "DB_DSN")]
    pub dsn: Option<String>,

    /// Value of symbol_instance_id_ref to resolve
    #[arg(value_name = "INSTANCE_ID")]
    pub instance_id: Option<String>,

    /// Print inlined frames too ("true" to enable)
    #[arg(value_name = "INCLUDE_INLINES")]
    pub include_inlines: Option<String>,

    /// Requests served by one engine before it is recycled (0 = never)
    #[arg(value_name = "MAX_REQUESTS")]
    pub max_requests: Option<String>,

    /// Binary to resolve addresses against
    #[arg(long, default_value = "vmlinux")]
    pub image: PathBuf,

    /// Resolution backend
    #[arg(long, value_enum, default_value_t = EngineKind::Dwarf)]
    pub engine: EngineKind,

    /// addr2line program used by the binutils backend
    #[arg(long, value_name = "PATH", default_value = DEFAULT_PROGRAM)]
    pub addr2line: PathBuf,

    /// Where to write the address/name listing
    #[arg(long, value_name = "FILE", default_value = SYMBOL_FILE)]
    pub output: PathBuf,
}
