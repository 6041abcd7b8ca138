//! CIGAR encoding and decoding.
//!
//! A CIGAR string is a run-length list of `<length><op>` pairs describing how
//! a query consumes reference and query coordinates:
//!
//! | Op | Kind | Consumes query | Consumes reference |
//! |----|------|----------------|--------------------|
//! | M  | alignment match | yes | yes |
//! | I  | insertion | yes | no |
//! | D  | deletion | no | yes |
//! | N  | skipped region | no | yes |
//! | S  | soft clip | yes | no |
//! | H  | hard clip | no | no |
//! | P  | padding | no | no |
//! | =  | sequence match | yes | yes |
//! | X  | sequence mismatch | yes | yes |
//!
//! Two parsers are provided. [`parse_cigar_string`] accepts anything: a
//! malformed length becomes 0 and an unknown op character becomes a
//! [`CigarKind::Invalid`] op, so it never fails. [`try_parse_cigar`] rejects
//! the same input with a [`CigarError`].

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::block::{AlignmentBlock, Strand};

/// The SAM sentinel for an unavailable CIGAR
pub const NO_CIGAR: &str = "*";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CigarError {
    #[error("missing length before operation '{0}'")]
    MissingLength(char),

    #[error("operation length '{0}' is out of range")]
    InvalidLength(String),

    #[error("zero-length operation '{0}'")]
    ZeroLength(char),

    #[error("unknown operation '{0}'")]
    UnknownOperation(char),

    #[error("trailing length '{0}' without an operation")]
    TrailingLength(String),
}

/// Kind of a single CIGAR operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CigarKind {
    Match,
    Insertion,
    Deletion,
    Skip,
    SoftClip,
    HardClip,
    Padding,
    SequenceMatch,
    SequenceMismatch,
    /// Produced by the lenient parser for characters outside `MIDNSHP=X`
    Invalid(char),
}

impl CigarKind {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'M' => Some(Self::Match),
            'I' => Some(Self::Insertion),
            'D' => Some(Self::Deletion),
            'N' => Some(Self::Skip),
            'S' => Some(Self::SoftClip),
            'H' => Some(Self::HardClip),
            'P' => Some(Self::Padding),
            '=' => Some(Self::SequenceMatch),
            'X' => Some(Self::SequenceMismatch),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Self::Match => 'M',
            Self::Insertion => 'I',
            Self::Deletion => 'D',
            Self::Skip => 'N',
            Self::SoftClip => 'S',
            Self::HardClip => 'H',
            Self::Padding => 'P',
            Self::SequenceMatch => '=',
            Self::SequenceMismatch => 'X',
            Self::Invalid(c) => c,
        }
    }

    #[must_use]
    pub fn consumes_query(self) -> bool {
        matches!(
            self,
            Self::Match | Self::Insertion | Self::SoftClip | Self::SequenceMatch | Self::SequenceMismatch
        )
    }

    #[must_use]
    pub fn consumes_reference(self) -> bool {
        matches!(
            self,
            Self::Match | Self::Deletion | Self::Skip | Self::SequenceMatch | Self::SequenceMismatch
        )
    }

    #[must_use]
    pub fn is_invalid(self) -> bool {
        matches!(self, Self::Invalid(_))
    }
}

/// A single `<length><op>` run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CigarOp {
    pub kind: CigarKind,
    pub length: u32,
}

impl CigarOp {
    #[must_use]
    pub fn new(kind: CigarKind, length: u32) -> Self {
        Self { kind, length }
    }
}

impl std::fmt::Display for CigarOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.length, self.kind.as_char())
    }
}

/// Parse a CIGAR string without ever failing.
///
/// Lengths that do not parse (empty or overflowing) become 0, unknown op
/// characters become [`CigarKind::Invalid`] ops and digits left over at the
/// end are ignored. `*` parses to an empty list.
#[must_use]
pub fn parse_cigar_string(text: &str) -> Vec<CigarOp> {
    if text == NO_CIGAR {
        return Vec::new();
    }

    let mut ops = Vec::new();
    let mut digits_start = 0;

    for (i, c) in text.char_indices() {
        if c.is_ascii_digit() {
            continue;
        }
        let length = text[digits_start..i].parse().unwrap_or(0);
        let kind = CigarKind::from_char(c).unwrap_or(CigarKind::Invalid(c));
        ops.push(CigarOp::new(kind, length));
        digits_start = i + c.len_utf8();
    }

    ops
}

/// Parse a CIGAR string, rejecting anything [`parse_cigar_string`] would
/// have to guess about.
///
/// # Errors
///
/// Returns a [`CigarError`] for a missing, zero or overflowing length, an
/// unknown op character, or digits with no op character after them.
pub fn try_parse_cigar(text: &str) -> Result<Vec<CigarOp>, CigarError> {
    if text == NO_CIGAR {
        return Ok(Vec::new());
    }

    let mut ops = Vec::new();
    let mut digits_start = 0;

    for (i, c) in text.char_indices() {
        if c.is_ascii_digit() {
            continue;
        }
        let digits = &text[digits_start..i];
        if digits.is_empty() {
            return Err(CigarError::MissingLength(c));
        }
        let length: u32 = digits
            .parse()
            .map_err(|_| CigarError::InvalidLength(digits.to_string()))?;
        if length == 0 {
            return Err(CigarError::ZeroLength(c));
        }
        let kind = CigarKind::from_char(c).ok_or(CigarError::UnknownOperation(c))?;
        ops.push(CigarOp::new(kind, length));
        digits_start = i + c.len_utf8();
    }

    if digits_start < text.len() {
        return Err(CigarError::TrailingLength(text[digits_start..].to_string()));
    }

    Ok(ops)
}

/// Format ops back into a CIGAR string; an empty list formats as `*`
#[must_use]
pub fn format_cigar(ops: &[CigarOp]) -> String {
    if ops.is_empty() {
        return NO_CIGAR.to_string();
    }
    ops.iter().fold(String::new(), |mut cigar, op| {
        let _ = write!(cigar, "{op}");
        cigar
    })
}

/// Number of query bases consumed (the expected SEQ length)
#[must_use]
pub fn query_length(ops: &[CigarOp]) -> u64 {
    ops.iter()
        .filter(|op| op.kind.consumes_query())
        .map(|op| u64::from(op.length))
        .sum()
}

/// Number of reference bases consumed
#[must_use]
pub fn reference_length(ops: &[CigarOp]) -> u64 {
    ops.iter()
        .filter(|op| op.kind.consumes_reference())
        .map(|op| u64::from(op.length))
        .sum()
}

/// Derive a CIGAR from block boundaries.
///
/// Each block contributes an `M` run of its query span, and the distance
/// between consecutive blocks on the target becomes an `N` run. No
/// insertion, deletion or clipping ops are ever produced since blocks do not
/// carry that information. An empty block list yields `*`.
#[must_use]
pub fn blocks_to_cigar(blocks: &[AlignmentBlock]) -> String {
    if blocks.is_empty() {
        return NO_CIGAR.to_string();
    }

    let mut cigar = String::new();
    let mut previous_end: Option<u64> = None;

    for block in blocks {
        if let Some(end) = previous_end {
            let skip = block.target_start.saturating_sub(end + 1);
            if skip > 0 {
                let _ = write!(cigar, "{skip}N");
            }
        }
        let _ = write!(cigar, "{}M", block.query_span());
        previous_end = Some(block.target_end);
    }

    cigar
}

/// Expand a CIGAR anchored at the 1-based `pos` into alignment blocks.
///
/// `M`, `=` and `X` runs extend the current block. `N` and `D` close it and
/// advance the target; `I` and `S` close it and advance the query; `H`, `P`
/// and invalid ops consume nothing. Query coordinates count soft-clipped
/// bases, so a leading `5S` starts the first block at query position 6.
#[must_use]
pub fn cigar_to_blocks(
    target_name: &str,
    strand: Strand,
    pos: u64,
    ops: &[CigarOp],
) -> Vec<AlignmentBlock> {
    let mut blocks = Vec::new();
    let mut target = pos;
    let mut query = 1;
    let mut open: Option<AlignmentBlock> = None;

    for op in ops {
        let length = u64::from(op.length);
        if length == 0 {
            continue;
        }
        match op.kind {
            CigarKind::Match | CigarKind::SequenceMatch | CigarKind::SequenceMismatch => {
                match open.as_mut() {
                    Some(block) => {
                        block.target_end += length;
                        block.query_end += length;
                    }
                    None => {
                        open = Some(AlignmentBlock::new(
                            target_name,
                            strand,
                            target,
                            target + length - 1,
                            query,
                            query + length - 1,
                        ));
                    }
                }
                target += length;
                query += length;
            }
            CigarKind::Skip | CigarKind::Deletion => {
                blocks.extend(open.take());
                target += length;
            }
            CigarKind::Insertion | CigarKind::SoftClip => {
                blocks.extend(open.take());
                query += length;
            }
            CigarKind::HardClip | CigarKind::Padding | CigarKind::Invalid(_) => {}
        }
    }
    blocks.extend(open);

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(target_start: u64, target_end: u64, query_start: u64, query_end: u64) -> AlignmentBlock {
        AlignmentBlock::new("chr1", Strand::Forward, target_start, target_end, query_start, query_end)
    }

    #[test]
    fn test_parse_all_operation_kinds() {
        let ops = parse_cigar_string("5S10M2I3D100N4M1H2P3=4X");
        let kinds: Vec<char> = ops.iter().map(|op| op.kind.as_char()).collect();
        assert_eq!(kinds, vec!['S', 'M', 'I', 'D', 'N', 'M', 'H', 'P', '=', 'X']);
        let lengths: Vec<u32> = ops.iter().map(|op| op.length).collect();
        assert_eq!(lengths, vec![5, 10, 2, 3, 100, 4, 1, 2, 3, 4]);
    }

    #[test]
    fn test_lenient_parse_keeps_unknown_ops() {
        let ops = parse_cigar_string("10M5Z3M");
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[1], CigarOp::new(CigarKind::Invalid('Z'), 5));
        assert!(ops[1].kind.is_invalid());
    }

    #[test]
    fn test_lenient_parse_defaults_missing_length_to_zero() {
        let ops = parse_cigar_string("M10N");
        assert_eq!(ops[0], CigarOp::new(CigarKind::Match, 0));
        assert_eq!(ops[1], CigarOp::new(CigarKind::Skip, 10));

        // Overflowing lengths are also zero
        let ops = parse_cigar_string("99999999999M");
        assert_eq!(ops[0].length, 0);
    }

    #[test]
    fn test_star_is_empty() {
        assert!(parse_cigar_string("*").is_empty());
        assert_eq!(try_parse_cigar("*"), Ok(Vec::new()));
        assert_eq!(format_cigar(&[]), "*");
    }

    #[test]
    fn test_strict_parse_rejects_malformed() {
        assert_eq!(try_parse_cigar("10M5Z"), Err(CigarError::UnknownOperation('Z')));
        assert_eq!(try_parse_cigar("M"), Err(CigarError::MissingLength('M')));
        assert_eq!(try_parse_cigar("0M"), Err(CigarError::ZeroLength('M')));
        assert_eq!(
            try_parse_cigar("10M5"),
            Err(CigarError::TrailingLength("5".to_string()))
        );
        assert!(matches!(
            try_parse_cigar("99999999999M"),
            Err(CigarError::InvalidLength(_))
        ));
        assert_eq!(try_parse_cigar("10M").unwrap().len(), 1);
    }

    #[test]
    fn test_lengths() {
        let ops = parse_cigar_string("5S10M2I3D100N4M1H");
        assert_eq!(query_length(&ops), 21);
        assert_eq!(reference_length(&ops), 117);
    }

    #[test]
    fn test_blocks_to_cigar() {
        let blocks = vec![block(100, 149, 1, 50), block(300, 325, 51, 76)];
        assert_eq!(blocks_to_cigar(&blocks), "50M150N26M");
    }

    #[test]
    fn test_blocks_to_cigar_adjacent_blocks_have_no_skip() {
        let blocks = vec![block(100, 149, 1, 50), block(150, 159, 51, 60)];
        assert_eq!(blocks_to_cigar(&blocks), "50M10M");
        assert_eq!(blocks_to_cigar(&[]), "*");
    }

    #[test]
    fn test_blocks_to_cigar_then_parse_recovers_runs() {
        let blocks = vec![block(10, 19, 1, 10), block(40, 44, 11, 15), block(100, 129, 16, 45)];
        let ops = parse_cigar_string(&blocks_to_cigar(&blocks));
        assert_eq!(
            ops,
            vec![
                CigarOp::new(CigarKind::Match, 10),
                CigarOp::new(CigarKind::Skip, 20),
                CigarOp::new(CigarKind::Match, 5),
                CigarOp::new(CigarKind::Skip, 55),
                CigarOp::new(CigarKind::Match, 30),
            ]
        );
    }

    #[test]
    fn test_cigar_to_blocks_inverts_blocks_to_cigar() {
        let blocks = vec![block(100, 149, 1, 50), block(300, 325, 51, 76)];
        let ops = parse_cigar_string(&blocks_to_cigar(&blocks));
        assert_eq!(cigar_to_blocks("chr1", Strand::Forward, 100, &ops), blocks);
    }

    #[test]
    fn test_cigar_to_blocks_with_clips_and_indels() {
        let ops = parse_cigar_string("2H5S10M2I5M3D4=1X");
        let blocks = cigar_to_blocks("chr2", Strand::Reverse, 1000, &ops);
        assert_eq!(blocks.len(), 3);
        assert_eq!((blocks[0].target_start, blocks[0].target_end), (1000, 1009));
        assert_eq!((blocks[0].query_start, blocks[0].query_end), (6, 15));
        assert_eq!((blocks[1].target_start, blocks[1].target_end), (1010, 1014));
        assert_eq!((blocks[1].query_start, blocks[1].query_end), (18, 22));
        assert_eq!((blocks[2].target_start, blocks[2].target_end), (1018, 1022));
        assert_eq!((blocks[2].query_start, blocks[2].query_end), (23, 27));
        assert!(blocks.iter().all(|b| b.strand == Strand::Reverse));
    }

    #[test]
    fn test_format_cigar() {
        let ops = parse_cigar_string("3S20M1D7M");
        assert_eq!(format_cigar(&ops), "3S20M1D7M");
    }
}
