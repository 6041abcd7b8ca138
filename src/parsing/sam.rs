//! Pull-based SAM alignment reader and writer.
//!
//! Header lines (`@...`) are skipped. Each alignment line must have at least
//! the 11 mandatory columns:
//!
//! | Col | Field | Parsed as |
//! |-----|-------|-----------|
//! | 1 | QNAME | string |
//! | 2 | FLAG | `u16` |
//! | 3 | RNAME | string |
//! | 4 | POS | `i64` |
//! | 5 | MAPQ | `u8` (0 when out of range and lenient) |
//! | 6 | CIGAR | string + decoded ops |
//! | 7 | MRNM | string |
//! | 8 | MPOS | `i64` |
//! | 9 | ISIZE | `i64` |
//! | 10 | SEQ | `None` when `*` |
//! | 11 | QUAL | `None` when `*` |
//! | 12+ | tags | one opaque string, tabs preserved |

use std::io::{self, Write};
use std::str::FromStr;

use tracing::{debug, warn};

use crate::core::cigar::{parse_cigar_string, try_parse_cigar};
use crate::core::record::AlignmentRecord;
use crate::parsing::source::{LineSource, TextLines};
use crate::parsing::{ParseError, ParseOptions};
use crate::utils::validation::{is_missing, lenient_int, SAM_MANDATORY_FIELDS};

const FORMAT: &str = "SAM";

/// Reads one [`AlignmentRecord`] per call from a [`LineSource`].
///
/// Nothing is read until the first call to [`SamReader::next_record`]. Every
/// record returned is owned by the caller; the reader keeps no reference to it.
pub struct SamReader<S: LineSource> {
    source: S,
    options: ParseOptions,
    line_number: usize,
    done: bool,
}

impl<S: LineSource> SamReader<S> {
    pub fn new(source: S) -> Self {
        Self::with_options(source, ParseOptions::default())
    }

    pub fn with_options(source: S, options: ParseOptions) -> Self {
        Self {
            source,
            options,
            line_number: 0,
            done: false,
        }
    }

    /// Number of lines consumed so far (1-based number of the last line read)
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Read the next alignment record, or `None` at end of stream.
    ///
    /// After an error has been returned the reader is finished and further
    /// calls return `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidFormat` for a malformed line (unless
    /// skipping malformed records) and `ParseError::Io` if reading fails.
    pub fn next_record(&mut self) -> Result<Option<AlignmentRecord>, ParseError> {
        if self.done {
            return Ok(None);
        }

        loop {
            let line = match self.source.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!(lines = self.line_number, "SAM stream exhausted");
                    self.done = true;
                    return Ok(None);
                }
                Err(e) => {
                    self.done = true;
                    return Err(e.into());
                }
            };
            self.line_number += 1;

            if line.is_empty() || line.starts_with('@') {
                continue;
            }

            match parse_line(&line, self.line_number, self.options) {
                Ok(record) => return Ok(Some(record)),
                Err(e) if self.options.skip_malformed && e.is_malformed_record() => {
                    warn!(error = %e, "Skipping malformed SAM record");
                }
                Err(e) => {
                    self.done = true;
                    return Err(e);
                }
            }
        }
    }

    /// Release the line source
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Io` if the source fails to close.
    pub fn close(mut self) -> Result<(), ParseError> {
        self.source.close()?;
        Ok(())
    }
}

impl<S: LineSource> Iterator for SamReader<S> {
    type Item = Result<AlignmentRecord, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// Read every record from a source, then close it
///
/// # Errors
///
/// Returns the first error encountered while reading or closing.
pub fn read_all<S: LineSource>(
    source: S,
    options: ParseOptions,
) -> Result<Vec<AlignmentRecord>, ParseError> {
    let mut reader = SamReader::with_options(source, options);
    let mut records = Vec::new();
    while let Some(record) = reader.next_record()? {
        records.push(record);
    }
    reader.close()?;
    Ok(records)
}

/// Parse SAM records from in-memory text
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for the first malformed line.
pub fn parse_sam_text(text: &str, options: ParseOptions) -> Result<Vec<AlignmentRecord>, ParseError> {
    read_all(TextLines::new(text.as_bytes()), options)
}

fn parse_number<T>(
    value: &str,
    field: &str,
    line: usize,
    options: ParseOptions,
) -> Result<T, ParseError>
where
    T: FromStr + TryFrom<i64> + Default,
{
    if options.lenient {
        return Ok(lenient_int(value));
    }
    value
        .parse()
        .map_err(|_| ParseError::invalid(FORMAT, line, format!("invalid {field} '{value}'")))
}

fn optional_field(value: &str) -> Option<String> {
    if is_missing(value) {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_line(line: &str, line_number: usize, options: ParseOptions) -> Result<AlignmentRecord, ParseError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < SAM_MANDATORY_FIELDS {
        return Err(ParseError::invalid(
            FORMAT,
            line_number,
            format!(
                "expected at least {SAM_MANDATORY_FIELDS} tab-separated fields, found {}",
                fields.len()
            ),
        ));
    }

    let cigar = fields[5];
    let cigar_ops = if options.lenient {
        parse_cigar_string(cigar)
    } else {
        try_parse_cigar(cigar).map_err(|e| {
            ParseError::invalid(FORMAT, line_number, format!("invalid CIGAR '{cigar}': {e}"))
        })?
    };

    let tags = if fields.len() > SAM_MANDATORY_FIELDS {
        Some(fields[SAM_MANDATORY_FIELDS..].join("\t"))
    } else {
        None
    };

    let record = AlignmentRecord {
        query_name: fields[0].to_string(),
        flags: parse_number(fields[1], "FLAG", line_number, options)?,
        reference_name: fields[2].to_string(),
        position: parse_number(fields[3], "POS", line_number, options)?,
        mapping_quality: parse_number(fields[4], "MAPQ", line_number, options)?,
        cigar: cigar.to_string(),
        cigar_ops,
        mate_reference_name: fields[6].to_string(),
        mate_position: parse_number(fields[7], "MPOS", line_number, options)?,
        insert_size: parse_number(fields[8], "ISIZE", line_number, options)?,
        sequence: optional_field(fields[9]),
        quality: optional_field(fields[10]),
        tags,
    };

    if !options.lenient {
        check_lengths(&record, line_number)?;
    }

    Ok(record)
}

fn check_lengths(record: &AlignmentRecord, line_number: usize) -> Result<(), ParseError> {
    if let (Some(seq), Some(qual)) = (&record.sequence, &record.quality) {
        if seq.len() != qual.len() {
            return Err(ParseError::invalid(
                FORMAT,
                line_number,
                format!(
                    "SEQ length {} differs from QUAL length {}",
                    seq.len(),
                    qual.len()
                ),
            ));
        }
    }
    if !record.sequence_matches_cigar() {
        return Err(ParseError::invalid(
            FORMAT,
            line_number,
            format!(
                "SEQ length {} does not match CIGAR '{}'",
                record.sequence.as_ref().map_or(0, String::len),
                record.cigar
            ),
        ));
    }
    Ok(())
}

/// Writes alignment records as SAM lines
pub struct SamWriter<W: Write> {
    writer: W,
}

impl<W: Write> SamWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// The underlying writer, for interleaving other output
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Write one record followed by a newline
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn write_record(&mut self, record: &AlignmentRecord) -> io::Result<()> {
        writeln!(self.writer, "{record}")
    }

    /// Flush and return the underlying writer
    ///
    /// # Errors
    ///
    /// Returns any error raised while flushing.
    pub fn finish(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}
