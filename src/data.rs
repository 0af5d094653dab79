//! Delimited text readers and writers.
//!
//! Samples and weights are stored as comma-separated rows without a header.
//! Lines starting with `#` are remarks and are skipped on input. Rows are
//! parsed into caller-provided buffers through a reused record, so the
//! per-sample loop does not allocate new vectors.

use std::fmt::Write as _;
use std::io::{Read, Write};

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};

use crate::page::{Matrix, Pages};
use crate::{Error, Result};

/// Sequential reader of comma-separated float rows.
#[derive(Debug)]
pub struct DataReader<R> {
    inner: csv::Reader<R>,
    record: StringRecord,
}

impl<R: Read> DataReader<R> {
    pub fn new(inner: R) -> Self {
        let inner = ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .flexible(true)
            .trim(Trim::All)
            .from_reader(inner);
        Self {
            inner,
            record: StringRecord::new(),
        }
    }

    fn line(&self) -> u64 {
        self.record.position().map_or(0, |p| p.line())
    }

    /// Read the next data row into `values`.
    ///
    /// Returns `Ok(false)` at end of input. A row with fewer values than
    /// `values.len()` is an error; extra trailing values are ignored.
    pub fn next_values(&mut self, values: &mut [f32]) -> Result<bool> {
        if values.is_empty() {
            return Err(Error::InvalidData(
                "destination buffer must not be empty".to_owned(),
            ));
        }

        loop {
            if !self.inner.read_record(&mut self.record)? {
                return Ok(false);
            }
            // Whitespace-only lines and indented remarks.
            match self.record.get(0) {
                Some(first) if self.record.len() == 1 && first.is_empty() => continue,
                Some(first) if first.starts_with('#') => continue,
                _ => {}
            }

            if self.record.len() < values.len() {
                return Err(Error::InvalidData(format!(
                    "line {}: expected {} values, found {}",
                    self.line(),
                    values.len(),
                    self.record.len()
                )));
            }
            for (slot, field) in values.iter_mut().zip(self.record.iter()) {
                *slot = field.parse().map_err(|e| {
                    Error::InvalidData(format!("line {}: bad value {field:?}: {e}", self.line()))
                })?;
            }
            return Ok(true);
        }
    }

    /// Read one row per matrix row.
    pub fn next_matrix(&mut self, matrix: &mut Matrix) -> Result<bool> {
        if matrix.rows == 0 || matrix.cols == 0 {
            return Err(Error::InvalidShape("matrix must not be empty".to_owned()));
        }
        for j in 0..matrix.rows {
            if !self.next_values(matrix.row_mut(j))? {
                return Err(Error::InvalidData(format!(
                    "unexpected end of input at matrix row {j} of {}",
                    matrix.rows
                )));
            }
        }
        Ok(true)
    }

    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}

/// Sequential writer of comma-separated float rows.
#[derive(Debug)]
pub struct DataWriter<W: Write> {
    inner: csv::Writer<W>,
    field: String,
}

impl<W: Write> DataWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: WriterBuilder::new().has_headers(false).from_writer(inner),
            field: String::new(),
        }
    }

    /// Write a `# remark` line.
    pub fn next_remark(&mut self, remark: &str) -> Result<()> {
        // Remarks bypass the record writer, so drain its buffer first.
        self.inner.flush()?;
        writeln!(self.inner.get_mut(), "# {remark}")?;
        Ok(())
    }

    /// Write one row in fixed-width scientific notation.
    pub fn next_values(&mut self, values: &[f32]) -> Result<()> {
        if values.is_empty() {
            return Err(Error::InvalidData("cannot write an empty row".to_owned()));
        }
        for v in values {
            self.field.clear();
            // Formatting into a String cannot fail.
            let _ = write!(self.field, "{v:>14.6e}");
            self.inner.write_field(&self.field)?;
        }
        self.inner.write_record(None::<&[u8]>)?;
        Ok(())
    }

    pub fn next_matrix(&mut self, matrix: &Matrix) -> Result<()> {
        for j in 0..matrix.rows {
            self.next_values(matrix.row(j))?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))
    }
}

/// Load every page's weight matrix, in stage order.
pub fn read_weights<R: Read>(reader: &mut DataReader<R>, pages: &mut Pages) -> Result<()> {
    for page in &mut pages.pages {
        reader.next_matrix(&mut page.w)?;
    }
    Ok(())
}

/// Save every page's weight matrix, each preceded by a `# Layer k weights` remark.
pub fn write_weights<W: Write>(writer: &mut DataWriter<W>, pages: &Pages) -> Result<()> {
    for (k, page) in pages.pages.iter().enumerate() {
        writer.next_remark(&format!("Layer {k} weights"))?;
        writer.next_matrix(&page.w)?;
    }
    writer.flush()
}
