//! Three-column BED interval files.
//!
//! Format: `target start end [ignored...]`, tab or space separated, 0-based
//! half-open. `browser`, `track`, `#` and blank lines are skipped.

use std::io::{self, Write};
use std::path::Path;

use crate::core::types::Interval;
use crate::parsing::source::{open_path, LineSource, TextLines};
use crate::parsing::ParseError;

const FORMAT: &str = "BED";

/// Read every interval from a line source, then close it
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a line has fewer than 3 fields,
/// a non-numeric coordinate, or a start after its end, and `ParseError::Io`
/// if reading fails.
pub fn read_intervals<S: LineSource>(mut source: S) -> Result<Vec<Interval>, ParseError> {
    let mut intervals = Vec::new();
    let mut line_number = 0;

    while let Some(line) = source.next_line()? {
        line_number += 1;
        let line = line.trim();
        if line.is_empty()
            || line.starts_with('#')
            || line.starts_with("browser")
            || line.starts_with("track")
        {
            continue;
        }
        intervals.push(parse_line(line, line_number)?);
    }

    source.close()?;
    Ok(intervals)
}

/// Parse a BED file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn parse_bed_file(path: &Path) -> Result<Vec<Interval>, ParseError> {
    read_intervals(open_path(path)?)
}

/// Parse BED text
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for the first malformed line.
pub fn parse_bed_text(text: &str) -> Result<Vec<Interval>, ParseError> {
    read_intervals(TextLines::new(text.as_bytes()))
}

fn parse_line(line: &str, line_number: usize) -> Result<Interval, ParseError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 3 {
        return Err(ParseError::invalid(
            FORMAT,
            line_number,
            format!("expected 3 fields, found {}", fields.len()),
        ));
    }

    let coordinate = |value: &str| {
        value.parse::<u64>().map_err(|_| {
            ParseError::invalid(FORMAT, line_number, format!("invalid coordinate '{value}'"))
        })
    };
    let start = coordinate(fields[1])?;
    let end = coordinate(fields[2])?;
    if start > end {
        return Err(ParseError::invalid(
            FORMAT,
            line_number,
            format!("start {start} is after end {end}"),
        ));
    }

    Ok(Interval::new(fields[0], start, end))
}

/// Write intervals as BED lines
///
/// # Errors
///
/// Returns any error from the underlying writer.
pub fn write_bed<W: Write>(writer: &mut W, intervals: &[Interval]) -> io::Result<()> {
    for interval in intervals {
        writeln!(writer, "{interval}")?;
    }
    Ok(())
}
