use serde::{Deserialize, Serialize};

/// Strand of an alignment block relative to the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strand {
    #[serde(rename = "+")]
    Forward,
    #[serde(rename = "-")]
    Reverse,
}

impl Strand {
    /// Parse the single-character strand used in MRF block tuples
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Self::Forward),
            '-' => Some(Self::Reverse),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Self::Forward => '+',
            Self::Reverse => '-',
        }
    }
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One gap-free piece of an alignment.
///
/// All coordinates are 1-based and inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlignmentBlock {
    pub target_name: String,
    pub strand: Strand,
    pub target_start: u64,
    pub target_end: u64,
    pub query_start: u64,
    pub query_end: u64,
}

impl AlignmentBlock {
    pub fn new(
        target_name: impl Into<String>,
        strand: Strand,
        target_start: u64,
        target_end: u64,
        query_start: u64,
        query_end: u64,
    ) -> Self {
        Self {
            target_name: target_name.into(),
            strand,
            target_start,
            target_end,
            query_start,
            query_end,
        }
    }

    /// Number of query bases covered by this block
    #[must_use]
    pub fn query_span(&self) -> u64 {
        self.query_end - self.query_start + 1
    }

    /// Number of target bases covered by this block
    #[must_use]
    pub fn target_span(&self) -> u64 {
        self.target_end - self.target_start + 1
    }

    /// Whether start <= end holds for both coordinate pairs
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.target_start <= self.target_end && self.query_start <= self.query_end
    }

    /// Whether this block overlaps the half-open, 0-based region `[start, end)`
    /// on `target_name`
    #[must_use]
    pub fn overlaps(&self, target_name: &str, start: u64, end: u64) -> bool {
        // 1-based inclusive [s, e] is 0-based half-open [s - 1, e)
        self.target_name == target_name
            && self.target_start.saturating_sub(1) < end
            && start < self.target_end
    }
}

/// A read together with the blocks it aligns with
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedRead {
    /// Blocks ordered by increasing `target_start`; empty when unmapped
    pub blocks: Vec<AlignmentBlock>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_scores: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_id: Option<String>,
}

impl MappedRead {
    pub fn new(blocks: Vec<AlignmentBlock>) -> Self {
        Self {
            blocks,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_sequence(mut self, sequence: impl Into<String>) -> Self {
        self.sequence = Some(sequence.into());
        self
    }

    #[must_use]
    pub fn with_quality_scores(mut self, quality_scores: impl Into<String>) -> Self {
        self.quality_scores = Some(quality_scores.into());
        self
    }

    #[must_use]
    pub fn with_query_id(mut self, query_id: impl Into<String>) -> Self {
        self.query_id = Some(query_id.into());
        self
    }

    #[must_use]
    pub fn is_mapped(&self) -> bool {
        !self.blocks.is_empty()
    }

    /// Sum of the query spans of all blocks
    #[must_use]
    pub fn read_length(&self) -> u64 {
        self.blocks.iter().map(AlignmentBlock::query_span).sum()
    }

    /// Whether sequence and quality scores, when both present, have equal lengths
    #[must_use]
    pub fn has_consistent_qualities(&self) -> bool {
        match (&self.sequence, &self.quality_scores) {
            (Some(seq), Some(qual)) => seq.len() == qual.len(),
            _ => true,
        }
    }

    /// Whether the blocks are sorted by target start and do not overlap
    #[must_use]
    pub fn has_ordered_blocks(&self) -> bool {
        self.blocks.windows(2).all(|pair| {
            pair[0].target_name != pair[1].target_name || pair[0].target_end < pair[1].target_start
        })
    }
}

/// One MRF entry: a single read or both mates of a fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedReadPair {
    pub is_paired: bool,
    pub read1: MappedRead,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read2: Option<MappedRead>,

    /// Verbatim values of registered, uninterpreted columns as (name, value)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_columns: Vec<(String, String)>,
}

impl MappedReadPair {
    pub fn single(read: MappedRead) -> Self {
        Self {
            is_paired: false,
            read1: read,
            read2: None,
            extra_columns: Vec::new(),
        }
    }

    pub fn paired(read1: MappedRead, read2: MappedRead) -> Self {
        Self {
            is_paired: true,
            read1,
            read2: Some(read2),
            extra_columns: Vec::new(),
        }
    }

    /// Iterate over the reads of this entry, read1 first
    pub fn reads(&self) -> impl Iterator<Item = &MappedRead> {
        std::iter::once(&self.read1).chain(self.read2.as_ref())
    }

    /// Value of a registered extra column, if the entry carries it
    #[must_use]
    pub fn extra_column(&self, name: &str) -> Option<&str> {
        self.extra_columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_length_sums_query_spans() {
        let read = MappedRead::new(vec![
            AlignmentBlock::new("chr1", Strand::Forward, 100, 149, 1, 50),
            AlignmentBlock::new("chr1", Strand::Forward, 300, 325, 51, 76),
        ]);
        assert_eq!(read.read_length(), 76);
        assert!(read.has_ordered_blocks());
    }

    #[test]
    fn test_overlapping_blocks_are_not_ordered() {
        let read = MappedRead::new(vec![
            AlignmentBlock::new("chr1", Strand::Forward, 100, 149, 1, 50),
            AlignmentBlock::new("chr1", Strand::Forward, 149, 160, 51, 62),
        ]);
        assert!(!read.has_ordered_blocks());
    }

    #[test]
    fn test_quality_consistency() {
        let read = MappedRead::default().with_sequence("ACGT").with_quality_scores("IIII");
        assert!(read.has_consistent_qualities());

        let read = MappedRead::default().with_sequence("ACGT").with_quality_scores("III");
        assert!(!read.has_consistent_qualities());

        let read = MappedRead::default().with_sequence("ACGT");
        assert!(read.has_consistent_qualities());
    }

    #[test]
    fn test_block_overlap_uses_half_open_regions() {
        let block = AlignmentBlock::new("chr1", Strand::Reverse, 101, 200, 1, 100);
        assert!(block.overlaps("chr1", 100, 101));
        assert!(block.overlaps("chr1", 199, 300));
        assert!(!block.overlaps("chr1", 200, 300));
        assert!(!block.overlaps("chr1", 0, 100));
        assert!(!block.overlaps("chr2", 100, 200));
    }

    #[test]
    fn test_pair_reads_iteration() {
        let single = MappedReadPair::single(MappedRead::default());
        assert_eq!(single.reads().count(), 1);

        let pair = MappedReadPair::paired(MappedRead::default(), MappedRead::default());
        assert!(pair.is_paired);
        assert_eq!(pair.reads().count(), 2);
    }
}
