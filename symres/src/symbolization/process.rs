//! Out-of-process engine driving the binutils `addr2line` tool
//!
//! The tool runs as `addr2line -a -f -i -C -e <image>` and answers one address
//! per stdin line. Because `-i` makes the number of frames per answer
//! variable, every request is followed by a marker address; the answer ends
//! where the marker's echo (`0x…`) begins.

use log::debug;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use super::engine::{parse_offset, EngineLoader, SymbolEngine};
use crate::domain::{EngineError, Frame, ResolveError, UNKNOWN};

/// Program name used when none is configured
pub const DEFAULT_PROGRAM: &str = "addr2line";

/// Address written after every request
const MARKER: &str = "0";

/// Spawns [`ProcessEngine`]s for one image
#[derive(Debug, Clone)]
pub struct ProcessLoader {
    program: PathBuf,
    image: PathBuf,
}

impl ProcessLoader {
    pub fn new<P: Into<PathBuf>, I: Into<PathBuf>>(program: P, image: I) -> Self {
        Self { program: program.into(), image: image.into() }
    }
}

impl EngineLoader for ProcessLoader {
    type Engine = ProcessEngine;

    fn open(&self) -> Result<ProcessEngine, EngineError> {
        let mut child = Command::new(&self.program)
            .args(["-a", "-f", "-i", "-C", "-e"])
            .arg(&self.image)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| EngineError::Spawn { program: self.program.clone(), source })?;

        let missing_pipe = || std::io::Error::other("child pipe unavailable");
        let stdin = child.stdin.take().ok_or_else(missing_pipe)?;
        let stdout = child.stdout.take().ok_or_else(missing_pipe)?;

        debug!("Started {} (pid {})", self.program.display(), child.id());

        Ok(ProcessEngine {
            program: self.program.clone(),
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }
}

/// A running `addr2line` child process
pub struct ProcessEngine {
    program: PathBuf,
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl ProcessEngine {
    fn read_line(&mut self) -> Result<String, ResolveError> {
        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(ResolveError::Protocol(format!(
                "{} closed its output",
                self.program.display()
            )));
        }
        Ok(line.trim_end().to_string())
    }
}

impl SymbolEngine for ProcessEngine {
    fn resolve(&mut self, offset: &str) -> Result<Vec<Frame>, ResolveError> {
        // Anything the tool would not parse as an address would desync the stream
        parse_offset(offset)?;

        writeln!(self.stdin, "{}\n{MARKER}", offset.trim())?;
        self.stdin.flush()?;

        // Echo of the requested address
        let echo = self.read_line()?;
        if !echo.starts_with("0x") {
            return Err(ResolveError::Protocol(format!("unexpected reply {echo:?}")));
        }

        let mut frames = Vec::new();
        loop {
            let function = self.read_line()?;
            if function.starts_with("0x") {
                // Marker echo; its single frame follows
                self.read_line()?;
                self.read_line()?;
                break;
            }
            let location = self.read_line()?;
            frames.push(parse_frame(function, &location));
        }

        match frames.as_slice() {
            [] => Err(ResolveError::Protocol(format!("no frames for {offset}"))),
            [only] if only.is_unknown() => Err(ResolveError::NotFound(offset.to_string())),
            _ => Ok(frames),
        }
    }

    fn close(self) -> Result<(), EngineError> {
        let Self { program, mut child, stdin, stdout } = self;
        // EOF on stdin makes the tool exit
        drop(stdin);
        drop(stdout);

        let status = child.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(EngineError::Exit(program, status))
        }
    }
}

/// Build a frame from a function line and a `file:line` line
fn parse_frame(function: String, location: &str) -> Frame {
    // "file.c:42 (discriminator 3)"
    let location = location.split(" (").next().unwrap_or(location);

    let (file, line) = match location.rsplit_once(':') {
        Some((file, line)) => (file, line.parse().unwrap_or(0)),
        None => (location, 0),
    };

    Frame {
        function: if function.is_empty() { UNKNOWN.to_string() } else { function },
        file: if file.is_empty() { UNKNOWN.to_string() } else { file.to_string() },
        line,
    }
}
