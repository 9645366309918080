//! Sinks for per-step result records.
//!
//! Records are written as comma separated lines in a fixed column order so that a
//! run can be checked by reading back its last line.
use crate::errors::{RSMIError, RSMIResult};
use crate::value_set::FloatValue;
use std::fmt::Debug;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

pub trait ResultSink: Debug + Send {
    fn write_header(&mut self, columns: &[&str]) -> RSMIResult<()>;

    fn write_record(&mut self, values: &[FloatValue]) -> RSMIResult<()>;

    fn flush(&mut self) -> RSMIResult<()> {
        Ok(())
    }
}

/// Writes records as comma separated lines.
#[derive(Debug)]
pub struct CsvSink<W: Write> {
    writer: W,
    columns: Option<usize>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            columns: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Debug + Send> ResultSink for CsvSink<W> {
    fn write_header(&mut self, columns: &[&str]) -> RSMIResult<()> {
        self.columns = Some(columns.len());
        writeln!(self.writer, "{}", columns.join(","))?;
        Ok(())
    }

    fn write_record(&mut self, values: &[FloatValue]) -> RSMIResult<()> {
        if let Some(columns) = self.columns {
            if columns != values.len() {
                return Err(RSMIError::Error(format!(
                    "record has {} values for {} columns",
                    values.len(),
                    columns
                )));
            }
        }
        let line: Vec<String> = values.iter().map(|value| value.to_string()).collect();
        writeln!(self.writer, "{}", line.join(","))?;
        Ok(())
    }

    fn flush(&mut self) -> RSMIResult<()> {
        Ok(self.writer.flush()?)
    }
}

/// An in-memory byte buffer that can be written by a sink and read by its owner.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        self.0
            .lock()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self
            .0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "result buffer is poisoned"))?;
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Parse one comma separated record.
pub fn parse_record(line: &str) -> RSMIResult<Vec<FloatValue>> {
    line.split(',')
        .map(|field| {
            field
                .trim()
                .parse::<FloatValue>()
                .map_err(|e| RSMIError::Error(format!("invalid value {:?}: {}", field, e)))
        })
        .collect()
}

/// Parse the last non-empty line of `contents`.
pub fn last_record(contents: &str) -> RSMIResult<Vec<FloatValue>> {
    let line = contents
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .ok_or_else(|| RSMIError::Error("no records were written".to_string()))?;
    parse_record(line)
}
