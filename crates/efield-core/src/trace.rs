//! Field trace output.
//!
//! One line per evaluated timestep with the time and the field along each
//! axis: four whitespace-separated columns in `%10g` format. A fresh trace
//! starts with an xvg header; an appended trace continues the previous one.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::format::format_g;

/// Errors opening or closing a trace.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("Failed to open field trace '{path}': {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("Failed to write field trace: {0}")]
    Write(#[from] io::Error),
}

/// Append-only writer of `(t, Ex, Ey, Ez)` lines.
pub struct TraceWriter {
    out: Box<dyn Write + Send>,
    lines: usize,
}

impl TraceWriter {
    /// Open `path`. With `append` the file is extended without a header,
    /// otherwise it is truncated and a header written.
    pub fn open(path: &Path, append: bool) -> Result<Self, TraceError> {
        let opened = if append {
            OpenOptions::new().create(true).append(true).open(path)
        } else {
            File::create(path)
        };
        let file = opened.map_err(|source| TraceError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        log::info!("Writing applied field trace to {}", path.display());
        Self::from_writer(Box::new(BufWriter::new(file)), !append)
    }

    /// Wrap an arbitrary writer, optionally emitting the header first.
    pub fn from_writer(out: Box<dyn Write + Send>, header: bool) -> Result<Self, TraceError> {
        let mut writer = Self { out, lines: 0 };
        if header {
            writer.write_header()?;
        }
        Ok(writer)
    }

    fn write_header(&mut self) -> io::Result<()> {
        writeln!(self.out, "@    title \"Applied electric field\"")?;
        writeln!(self.out, "@    xaxis  label \"Time (ps)\"")?;
        writeln!(self.out, "@    yaxis  label \"E (V/nm)\"")?;
        writeln!(self.out, "@TYPE xy")
    }

    /// Append one line for time `t`.
    pub fn record(&mut self, t: f64, fields: [f64; 3]) -> io::Result<()> {
        writeln!(
            self.out,
            "{:>10}  {:>10}  {:>10}  {:>10}",
            format_g(t),
            format_g(fields[0]),
            format_g(fields[1]),
            format_g(fields[2])
        )?;
        self.lines += 1;
        Ok(())
    }

    /// Number of lines recorded so far.
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Flush and release the underlying stream.
    pub fn close(mut self) -> Result<(), TraceError> {
        self.out.flush()?;
        log::debug!("field trace closed after {} lines", self.lines);
        Ok(())
    }
}

impl std::fmt::Debug for TraceWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceWriter").field("lines", &self.lines).finish()
    }
}
