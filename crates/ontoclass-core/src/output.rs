//! Output table writing for CSV and JSON Lines.
//!
//! Rows are flushed as soon as they are written so an interrupted run
//! leaves a valid prefix of the table on disk.

use crate::error::Result;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Comma-separated values with a header row
    Csv,
    /// One JSON object per line, keyed by column name
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

enum Sink<W: Write> {
    Csv(csv::Writer<W>),
    JsonLines(W),
}

/// A single-writer table with a fixed header.
pub struct TableWriter<W: Write> {
    sink: Sink<W>,
    headers: Vec<String>,
    rows_written: usize,
}

impl<W: Write> TableWriter<W> {
    /// Create a table writer.
    ///
    /// `write_header` is false when appending to a table that already has one.
    pub fn new(
        writer: W,
        format: OutputFormat,
        headers: &[&str],
        write_header: bool,
    ) -> Result<Self> {
        let sink = match format {
            OutputFormat::Csv => {
                let mut csv_writer = csv::WriterBuilder::new()
                    .has_headers(false)
                    .from_writer(writer);
                if write_header {
                    csv_writer.write_record(headers)?;
                    csv_writer.flush()?;
                }
                Sink::Csv(csv_writer)
            }
            OutputFormat::JsonLines => Sink::JsonLines(writer),
        };
        Ok(Self {
            sink,
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows_written: 0,
        })
    }

    /// Append one row and flush it.
    pub fn write_row(&mut self, row: &[String]) -> Result<()> {
        debug_assert_eq!(row.len(), self.headers.len(), "row width must match header");
        match &mut self.sink {
            Sink::Csv(writer) => {
                writer.write_record(row)?;
                writer.flush()?;
            }
            Sink::JsonLines(writer) => {
                let object: Map<String, Value> = self
                    .headers
                    .iter()
                    .cloned()
                    .zip(row.iter().map(|cell| Value::String(cell.clone())))
                    .collect();
                serde_json::to_writer(&mut *writer, &object)?;
                writeln!(writer)?;
                writer.flush()?;
            }
        }
        self.rows_written += 1;
        Ok(())
    }

    /// Get the number of rows written by this writer.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        match &mut self.sink {
            Sink::Csv(writer) => writer.flush()?,
            Sink::JsonLines(writer) => writer.flush()?,
        }
        Ok(())
    }
}

impl TableWriter<BufWriter<File>> {
    /// Open a table file.
    ///
    /// With `append`, an existing non-empty file is extended without a new
    /// header; otherwise the file is truncated and the header written.
    pub fn create(path: &Path, format: OutputFormat, headers: &[&str], append: bool) -> Result<Self> {
        let has_content = append && std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false);
        let file = if has_content {
            OpenOptions::new().append(true).open(path)?
        } else {
            File::create(path)?
        };
        Self::new(BufWriter::new(file), format, headers, !has_content)
    }
}

/// Load the record keys already present in an output table.
///
/// A key is the first `key_columns` cells of a row. Missing files yield an
/// empty set; unreadable JSON lines are skipped with a warning.
pub fn load_existing_keys(
    path: &Path,
    format: OutputFormat,
    headers: &[&str],
    key_columns: usize,
) -> Result<HashSet<Vec<String>>> {
    let mut keys = HashSet::new();
    if !path.exists() {
        return Ok(keys);
    }

    match format {
        OutputFormat::Csv => {
            let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
            for row in reader.records() {
                let row = row?;
                keys.insert(row.iter().take(key_columns).map(str::to_string).collect());
            }
        }
        OutputFormat::JsonLines => {
            let reader = BufReader::new(File::open(path)?);
            for (line_no, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Map<String, Value>>(&line) {
                    Ok(object) => {
                        keys.insert(
                            headers
                                .iter()
                                .take(key_columns)
                                .map(|h| object.get(*h).and_then(Value::as_str).unwrap_or("").to_string())
                                .collect(),
                        );
                    }
                    Err(e) => {
                        tracing::warn!("Skipping unreadable line {} in {:?}: {e}", line_no + 1, path);
                    }
                }
            }
        }
    }
    Ok(keys)
}
