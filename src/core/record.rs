use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::block::Strand;
use crate::core::cigar::{query_length, CigarOp};
use crate::core::flags;

/// The SAM sentinel for an absent SEQ or QUAL
pub const MISSING_FIELD: &str = "*";

/// One SAM alignment line.
///
/// The 11 mandatory columns are held as typed fields. Optional tags are
/// kept as a single opaque string so that they re-serialize byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentRecord {
    /// QNAME
    pub query_name: String,

    /// FLAG, see [`crate::core::flags`]
    pub flags: u16,

    /// RNAME
    pub reference_name: String,

    /// POS, 1-based leftmost mapping position (0 when unavailable)
    pub position: i64,

    /// MAPQ
    pub mapping_quality: u8,

    /// CIGAR exactly as read
    pub cigar: String,

    /// CIGAR decoded when the record was parsed
    pub cigar_ops: Vec<CigarOp>,

    /// MRNM/RNEXT, `=` when identical to RNAME
    pub mate_reference_name: String,

    /// MPOS/PNEXT
    pub mate_position: i64,

    /// ISIZE/TLEN
    pub insert_size: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,

    /// Columns 12 and up joined by tabs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

impl AlignmentRecord {
    #[must_use]
    pub fn has_flag(&self, mask: u16) -> bool {
        self.flags & mask != 0
    }

    #[must_use]
    pub fn is_unmapped(&self) -> bool {
        self.has_flag(flags::UNMAPPED)
    }

    /// Strand of the query, from the reverse-complemented bit
    #[must_use]
    pub fn strand(&self) -> Strand {
        if self.has_flag(flags::REVERSE) {
            Strand::Reverse
        } else {
            Strand::Forward
        }
    }

    /// SEQ length implied by the CIGAR, or `None` when the CIGAR is `*` or
    /// contains unknown operations
    #[must_use]
    pub fn expected_sequence_length(&self) -> Option<u64> {
        if self.cigar_ops.is_empty() || self.cigar_ops.iter().any(|op| op.kind.is_invalid()) {
            return None;
        }
        Some(query_length(&self.cigar_ops))
    }

    /// Whether SEQ agrees with the CIGAR wherever both are available
    #[must_use]
    pub fn sequence_matches_cigar(&self) -> bool {
        match (&self.sequence, self.expected_sequence_length()) {
            (Some(seq), Some(expected)) => seq.len() as u64 == expected,
            _ => true,
        }
    }

    /// Re-serialize as a tab-separated SAM line without a trailing newline
    #[must_use]
    pub fn to_sam_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AlignmentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.query_name,
            self.flags,
            self.reference_name,
            self.position,
            self.mapping_quality,
            self.cigar,
            self.mate_reference_name,
            self.mate_position,
            self.insert_size,
            self.sequence.as_deref().unwrap_or(MISSING_FIELD),
            self.quality.as_deref().unwrap_or(MISSING_FIELD),
        )?;
        if let Some(tags) = &self.tags {
            write!(f, "\t{tags}")?;
        }
        Ok(())
    }
}
