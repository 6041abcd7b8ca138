//! Schema-driven reader and writer for the mapped read format (MRF).
//!
//! An MRF file is tab-delimited. Lines starting with `#` are comments. The
//! first other line is a header naming the columns:
//!
//! | Column | Required | Content |
//! |--------|----------|---------|
//! | `AlignmentBlocks` | yes | blocks of read 1, then `\|` and blocks of read 2 for pairs |
//! | `Sequence` | no | sequence(s), `\|`-separated for pairs |
//! | `QualityScores` | no | quality string(s), `\|`-separated for pairs |
//! | `QueryId` | no | query id(s), `\|`-separated for pairs |
//!
//! Blocks are comma-separated `target:strand:targetStart:targetEnd:queryStart:queryEnd`
//! tuples with 1-based inclusive coordinates, e.g.
//!
//! ```text
//! AlignmentBlocks	Sequence
//! chr1:+:100:149:1:50,chr1:+:300:325:51:76|chr1:-:500:575:1:76	ACGT...|TTGA...
//! ```
//!
//! Other column names are rejected unless registered with
//! [`MrfReader::register_column`] before the first entry is read. Their
//! values are kept verbatim in [`MappedReadPair::extra_columns`].
//!
//! Block tuples are always parsed strictly; [`ParseOptions::lenient`] has no
//! effect on this format.

use std::io::{self, Write};

use tracing::{debug, warn};

use crate::core::block::{AlignmentBlock, MappedRead, MappedReadPair, Strand};
use crate::parsing::source::{LineSource, TextLines};
use crate::parsing::{ParseError, ParseOptions};
use crate::utils::validation::{check_block, MRF_BLOCK_FIELDS};

const FORMAT: &str = "MRF";

pub const COLUMN_BLOCKS: &str = "AlignmentBlocks";
pub const COLUMN_SEQUENCE: &str = "Sequence";
pub const COLUMN_QUALITY_SCORES: &str = "QualityScores";
pub const COLUMN_QUERY_ID: &str = "QueryId";

const READ_SEPARATOR: char = '|';
const BLOCK_SEPARATOR: &str = ",";
const FIELD_SEPARATOR: char = ':';

/// Characters a per-read cell value cannot contain
const RESERVED_IN_READ_CELL: [char; 4] = [READ_SEPARATOR, '\t', '\n', '\r'];
/// Characters a block target name cannot contain
const RESERVED_IN_TARGET: [char; 5] = [READ_SEPARATOR, ',', '\t', '\n', '\r'];
/// Characters an extra column value cannot contain
const RESERVED_IN_EXTRA: [char; 3] = ['\t', '\n', '\r'];

/// What a column holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Blocks,
    Sequence,
    QualityScores,
    QueryId,
    /// A registered column whose values are carried through uninterpreted
    Extra,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub role: ColumnRole,
    pub required: bool,
}

impl ColumnDef {
    fn new(name: impl Into<String>, role: ColumnRole, required: bool) -> Self {
        Self {
            name: name.into(),
            role,
            required,
        }
    }
}

/// The set of column names a reader accepts
#[derive(Debug, Clone)]
pub struct ColumnRegistry {
    columns: Vec<ColumnDef>,
}

impl Default for ColumnRegistry {
    fn default() -> Self {
        Self {
            columns: vec![
                ColumnDef::new(COLUMN_BLOCKS, ColumnRole::Blocks, true),
                ColumnDef::new(COLUMN_SEQUENCE, ColumnRole::Sequence, false),
                ColumnDef::new(COLUMN_QUALITY_SCORES, ColumnRole::QualityScores, false),
                ColumnDef::new(COLUMN_QUERY_ID, ColumnRole::QueryId, false),
            ],
        }
    }
}

impl ColumnRegistry {
    /// Accept an additional optional column. Registering a known name is a no-op.
    pub fn register(&mut self, name: &str) {
        if self.get(name).is_none() {
            self.columns
                .push(ColumnDef::new(name, ColumnRole::Extra, false));
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Resolve column names, in file order, into a schema
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Configuration` for an unknown or duplicated name,
    /// or when a required column is absent.
    pub fn resolve<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<MrfSchema, ParseError> {
        let mut columns: Vec<ColumnDef> = Vec::new();

        for name in names {
            let def = self.get(name).ok_or_else(|| {
                ParseError::Configuration(format!(
                    "unknown column '{name}'; register it before parsing"
                ))
            })?;
            if columns.iter().any(|c| c.name == name) {
                return Err(ParseError::Configuration(format!(
                    "column '{name}' appears more than once"
                )));
            }
            columns.push(def.clone());
        }

        for required in self.columns.iter().filter(|c| c.required) {
            if !columns.iter().any(|c| c.name == required.name) {
                return Err(ParseError::Configuration(format!(
                    "required column '{}' is missing",
                    required.name
                )));
            }
        }

        MrfSchema::from_columns(columns)
    }
}

/// Columns of one MRF stream in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MrfSchema {
    columns: Vec<ColumnDef>,
    blocks_index: usize,
}

impl Default for MrfSchema {
    /// `AlignmentBlocks`, `Sequence`, `QualityScores`, `QueryId`
    fn default() -> Self {
        Self {
            columns: ColumnRegistry::default().columns,
            blocks_index: 0,
        }
    }
}

impl MrfSchema {
    fn from_columns(columns: Vec<ColumnDef>) -> Result<Self, ParseError> {
        let blocks_index = columns
            .iter()
            .position(|c| c.role == ColumnRole::Blocks)
            .ok_or_else(|| {
                ParseError::Configuration(format!("required column '{COLUMN_BLOCKS}' is missing"))
            })?;
        Ok(Self {
            columns,
            blocks_index,
        })
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    #[must_use]
    pub fn header_line(&self) -> String {
        self.columns
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join("\t")
    }

    /// Check that every value written under this schema reads back unchanged.
    ///
    /// Per-read values may not contain `|`, tabs or line breaks, target names
    /// additionally may not contain `,`, and extra column values may not
    /// contain tabs or line breaks. There is no escape syntax.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidInput` error naming the first offending value.
    pub fn check_entry(&self, entry: &MappedReadPair) -> io::Result<()> {
        for column in &self.columns {
            let offending = match column.role {
                ColumnRole::Blocks => entry
                    .reads()
                    .flat_map(|read| &read.blocks)
                    .map(|block| block.target_name.as_str())
                    .find(|name| name.contains(RESERVED_IN_TARGET)),
                ColumnRole::Sequence => find_reserved(entry, |read| read.sequence.as_deref()),
                ColumnRole::QualityScores => {
                    find_reserved(entry, |read| read.quality_scores.as_deref())
                }
                ColumnRole::QueryId => find_reserved(entry, |read| read.query_id.as_deref()),
                ColumnRole::Extra => entry
                    .extra_column(&column.name)
                    .filter(|value| value.contains(RESERVED_IN_EXTRA)),
            };
            if let Some(value) = offending {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "value {value:?} for MRF column '{}' contains a reserved separator",
                        column.name
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Serialize an entry as one line, columns in schema order
    #[must_use]
    pub fn format_entry(&self, entry: &MappedReadPair) -> String {
        self.columns
            .iter()
            .map(|column| match column.role {
                ColumnRole::Blocks => format_per_read(entry, |read| Some(format_blocks(&read.blocks))),
                ColumnRole::Sequence => format_per_read(entry, |read| read.sequence.clone()),
                ColumnRole::QualityScores => {
                    format_per_read(entry, |read| read.quality_scores.clone())
                }
                ColumnRole::QueryId => format_per_read(entry, |read| read.query_id.clone()),
                ColumnRole::Extra => entry.extra_column(&column.name).unwrap_or_default().to_string(),
            })
            .collect::<Vec<_>>()
            .join("\t")
    }

    fn parse_entry(&self, line: &str, line_number: usize) -> Result<MappedReadPair, ParseError> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != self.columns.len() {
            return Err(ParseError::invalid(
                FORMAT,
                line_number,
                format!(
                    "expected {} tab-separated fields, found {}",
                    self.columns.len(),
                    fields.len()
                ),
            ));
        }

        let mut read1 = MappedRead::default();
        let mut read2: Option<MappedRead> = None;
        let mut extra_columns = Vec::new();

        // Blocks decide whether the entry is paired; resolve them first
        let (first, second) = split_reads(fields[self.blocks_index]);
        read1.blocks = parse_blocks(first, line_number)?;
        if let Some(second) = second {
            read2 = Some(MappedRead::new(parse_blocks(second, line_number)?));
        }

        for (column, value) in self.columns.iter().zip(&fields) {
            if column.role == ColumnRole::Extra {
                extra_columns.push((column.name.clone(), (*value).to_string()));
                continue;
            }
            if column.role == ColumnRole::Blocks {
                continue;
            }

            let (first, second) = split_reads(value);
            if second.is_some() != read2.is_some() {
                return Err(ParseError::invalid(
                    FORMAT,
                    line_number,
                    format!(
                        "column '{}' and '{COLUMN_BLOCKS}' disagree on whether the entry is paired",
                        column.name
                    ),
                ));
            }

            assign(&mut read1, column.role, first);
            if let (Some(read), Some(value)) = (read2.as_mut(), second) {
                assign(read, column.role, value);
            }
        }

        for read in std::iter::once(&read1).chain(read2.as_ref()) {
            if !read.has_consistent_qualities() {
                return Err(ParseError::invalid(
                    FORMAT,
                    line_number,
                    "sequence and quality scores differ in length",
                ));
            }
            if !read.has_ordered_blocks() {
                return Err(ParseError::invalid(
                    FORMAT,
                    line_number,
                    "blocks overlap or are not ordered by target start",
                ));
            }
        }

        Ok(MappedReadPair {
            is_paired: read2.is_some(),
            read1,
            read2,
            extra_columns,
        })
    }
}

fn assign(read: &mut MappedRead, role: ColumnRole, value: &str) {
    let value = (!value.is_empty()).then(|| value.to_string());
    match role {
        ColumnRole::Sequence => read.sequence = value,
        ColumnRole::QualityScores => read.quality_scores = value,
        ColumnRole::QueryId => read.query_id = value,
        ColumnRole::Blocks | ColumnRole::Extra => {}
    }
}

fn split_reads(cell: &str) -> (&str, Option<&str>) {
    match cell.split_once(READ_SEPARATOR) {
        Some((first, second)) => (first, Some(second)),
        None => (cell, None),
    }
}

fn find_reserved<'a>(
    entry: &'a MappedReadPair,
    value: impl Fn(&'a MappedRead) -> Option<&'a str>,
) -> Option<&'a str> {
    entry
        .reads()
        .filter_map(value)
        .find(|v| v.contains(RESERVED_IN_READ_CELL))
}

fn format_per_read(entry: &MappedReadPair, value: impl Fn(&MappedRead) -> Option<String>) -> String {
    let first = value(&entry.read1).unwrap_or_default();
    match &entry.read2 {
        Some(read2) if entry.is_paired => {
            format!("{first}{READ_SEPARATOR}{}", value(read2).unwrap_or_default())
        }
        _ => first,
    }
}

/// Format blocks as comma-separated MRF tuples
#[must_use]
pub fn format_blocks(blocks: &[AlignmentBlock]) -> String {
    blocks
        .iter()
        .map(|b| {
            format!(
                "{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}",
                b.target_name, b.strand, b.target_start, b.target_end, b.query_start, b.query_end
            )
        })
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

/// Parse the comma-separated block tuples of one read
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for a tuple with the wrong number of
/// fields, an unknown strand, a non-numeric or zero coordinate, or a start
/// after its end.
pub fn parse_blocks(cell: &str, line_number: usize) -> Result<Vec<AlignmentBlock>, ParseError> {
    if cell.is_empty() {
        return Ok(Vec::new());
    }
    cell.split(BLOCK_SEPARATOR)
        .map(|tuple| parse_block(tuple, line_number))
        .collect()
}

fn parse_block(tuple: &str, line_number: usize) -> Result<AlignmentBlock, ParseError> {
    let malformed =
        |reason: &str| ParseError::invalid(FORMAT, line_number, format!("malformed block '{tuple}': {reason}"));

    // Split from the right so that target names may contain ':'
    let parts: Vec<&str> = tuple.rsplitn(MRF_BLOCK_FIELDS, FIELD_SEPARATOR).collect();
    if parts.len() != MRF_BLOCK_FIELDS || parts[5].is_empty() {
        return Err(malformed(&format!("expected {MRF_BLOCK_FIELDS} ':'-separated fields")));
    }

    let coordinate = |value: &str| {
        value
            .parse::<u64>()
            .map_err(|_| malformed(&format!("invalid coordinate '{value}'")))
    };

    let mut strand_chars = parts[4].chars();
    let strand = match (strand_chars.next(), strand_chars.next()) {
        (Some(c), None) => Strand::from_char(c),
        _ => None,
    }
    .ok_or_else(|| malformed(&format!("invalid strand '{}'", parts[4])))?;

    let block = AlignmentBlock::new(
        parts[5],
        strand,
        coordinate(parts[3])?,
        coordinate(parts[2])?,
        coordinate(parts[1])?,
        coordinate(parts[0])?,
    );

    if let Some(problem) = check_block(&block) {
        return Err(malformed(&problem));
    }

    Ok(block)
}

/// Reads one [`MappedReadPair`] per call from a [`LineSource`].
///
/// The header is resolved into an [`MrfSchema`] on the first read, after
/// which the column registry is frozen.
pub struct MrfReader<S: LineSource> {
    source: S,
    options: ParseOptions,
    registry: ColumnRegistry,
    schema: Option<MrfSchema>,
    started: bool,
    done: bool,
    line_number: usize,
}

impl<S: LineSource> MrfReader<S> {
    pub fn new(source: S) -> Self {
        Self::with_options(source, ParseOptions::default())
    }

    pub fn with_options(source: S, options: ParseOptions) -> Self {
        Self {
            source,
            options,
            registry: ColumnRegistry::default(),
            schema: None,
            started: false,
            done: false,
            line_number: 0,
        }
    }

    /// Accept an additional column name in the header
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Configuration` once parsing has started.
    pub fn register_column(&mut self, name: &str) -> Result<(), ParseError> {
        if self.started {
            return Err(ParseError::Configuration(format!(
                "cannot register column '{name}' after parsing has started"
            )));
        }
        self.registry.register(name);
        Ok(())
    }

    /// The resolved schema, once the header has been read
    pub fn schema(&self) -> Option<&MrfSchema> {
        self.schema.as_ref()
    }

    /// Read the header now if it has not been read yet
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Configuration` if the stream has no header line or
    /// the header is invalid, and `ParseError::Io` if reading fails.
    pub fn read_schema(&mut self) -> Result<&MrfSchema, ParseError> {
        self.ensure_schema()?;
        self.schema
            .as_ref()
            .ok_or_else(|| ParseError::Configuration("no MRF header line found".to_string()))
    }

    fn next_content_line(&mut self) -> Result<Option<String>, ParseError> {
        while let Some(line) = self.source.next_line()? {
            self.line_number += 1;
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            return Ok(Some(line));
        }
        Ok(None)
    }

    fn ensure_schema(&mut self) -> Result<(), ParseError> {
        if self.started {
            return Ok(());
        }
        self.started = true;

        let Some(header) = self.next_content_line()? else {
            return Ok(());
        };
        let schema = self.registry.resolve(header.split('\t'))?;
        debug!(columns = %schema.header_line(), "Resolved MRF header");
        self.schema = Some(schema);
        Ok(())
    }

    /// Read the next entry, or `None` at end of stream.
    ///
    /// After an error has been returned the reader is finished and further
    /// calls return `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Configuration` for an invalid header,
    /// `ParseError::InvalidFormat` for a malformed line (unless skipping
    /// malformed records) and `ParseError::Io` if reading fails.
    pub fn next_entry(&mut self) -> Result<Option<MappedReadPair>, ParseError> {
        if self.done {
            return Ok(None);
        }
        let result = self.read_entry();
        if !matches!(result, Ok(Some(_))) {
            self.done = true;
        }
        result
    }

    fn read_entry(&mut self) -> Result<Option<MappedReadPair>, ParseError> {
        self.ensure_schema()?;

        loop {
            let Some(line) = self.next_content_line()? else {
                debug!(lines = self.line_number, "MRF stream exhausted");
                return Ok(None);
            };
            let Some(schema) = self.schema.as_ref() else {
                return Ok(None);
            };

            match schema.parse_entry(&line, self.line_number) {
                Ok(entry) => return Ok(Some(entry)),
                Err(e) if self.options.skip_malformed && e.is_malformed_record() => {
                    warn!(error = %e, "Skipping malformed MRF entry");
                }
                Err(e) => return Err(e),
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

impl<S: LineSource> Iterator for MrfReader<S> {
    type Item = Result<MappedReadPair, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().transpose()
    }
}

/// Parse MRF entries from in-memory text
///
/// # Errors
///
/// Returns the first configuration or format error.
pub fn parse_mrf_text(
    text: &str,
    options: ParseOptions,
) -> Result<(MrfSchema, Vec<MappedReadPair>), ParseError> {
    let mut reader = MrfReader::with_options(TextLines::new(text.as_bytes()), options);
    let schema = reader.read_schema()?.clone();
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry()? {
        entries.push(entry);
    }
    reader.close()?;
    Ok((schema, entries))
}

/// Writes MRF entries under a fixed schema
pub struct MrfWriter<W: Write> {
    writer: W,
    schema: MrfSchema,
}

impl<W: Write> MrfWriter<W> {
    pub fn new(writer: W, schema: MrfSchema) -> Self {
        Self { writer, schema }
    }

    pub fn schema(&self) -> &MrfSchema {
        &self.schema
    }

    /// The underlying writer, for interleaving other output
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Write the header line
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn write_header(&mut self) -> io::Result<()> {
        writeln!(self.writer, "{}", self.schema.header_line())
    }

    /// Write one entry
    ///
    /// # Errors
    ///
    /// Returns an `InvalidInput` error, writing nothing, if a value contains
    /// a separator (see [`MrfSchema::check_entry`]), and any error from the
    /// underlying writer.
    pub fn write_entry(&mut self, entry: &MappedReadPair) -> io::Result<()> {
        self.schema.check_entry(entry)?;
        writeln!(self.writer, "{}", self.schema.format_entry(entry))
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
