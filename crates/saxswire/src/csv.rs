//! Sample loading from `q, intensity, intensity_err` text files.
//!
//! Fields may be separated by commas or whitespace. Lines that are empty,
//! start with `#`, have fewer than three fields, or hold a value that does
//! not parse as a number (including `NaN`) are skipped, so a header line
//! needs no special handling. Columns past the third are ignored.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use saxswire_record::{Sample, ValidationError};
use tracing::{debug, trace};

#[derive(Debug, thiserror::Error)]
pub enum CsvError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("no numeric rows found")]
    Empty,

    #[error("invalid sample: {0}")]
    Invalid(#[from] ValidationError),
}

/// Parse one data row. `None` means the row is skipped.
fn parse_row(line: &str) -> Option<[f64; 3]> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let mut fields = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|field| !field.is_empty());

    let mut row = [0.0f64; 3];
    for slot in &mut row {
        let value: f64 = fields.next()?.parse().ok()?;
        if value.is_nan() {
            return None;
        }
        *slot = value;
    }
    Some(row)
}

/// Read a sample from any buffered source.
pub fn read_sample<R: BufRead>(reader: R) -> Result<Sample, CsvError> {
    let mut q_values = Vec::new();
    let mut intensity = Vec::new();
    let mut intensity_err = Vec::new();
    let mut skipped = 0usize;

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        match parse_row(&line) {
            Some([q, i, di]) => {
                q_values.push(q);
                intensity.push(i);
                intensity_err.push(di);
            }
            None => {
                trace!(line = number + 1, "skipped non-numeric row");
                skipped += 1;
            }
        }
    }

    if q_values.is_empty() {
        return Err(CsvError::Empty);
    }

    let len = q_values.len();
    let sample = Sample::new(q_values, intensity)
        .with_errors(intensity_err)
        .with_shape(len);
    sample.validate()?;

    debug!(points = len, skipped, "loaded sample");
    Ok(sample)
}

/// Parse a sample from an in-memory string.
pub fn parse_sample(text: &str) -> Result<Sample, CsvError> {
    read_sample(text.as_bytes())
}

/// Load a sample from a file on disk.
pub fn load_sample(path: impl AsRef<Path>) -> Result<Sample, CsvError> {
    let file = File::open(path.as_ref())?;
    read_sample(BufReader::new(file))
}
