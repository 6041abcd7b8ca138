use std::cmp::Ordering;

use thiserror::Error;
use tracing::debug;

use crate::core::block::{AlignmentBlock, MappedRead, MappedReadPair, Strand};
use crate::core::cigar::{blocks_to_cigar, cigar_to_blocks, parse_cigar_string};
use crate::core::flags;
use crate::core::record::{AlignmentRecord, MISSING_FIELD};
use crate::pairing::status::{is_first_in_pair, is_primary, is_second_in_pair, is_unmapped};

/// Conventional separator between a fragment name and its mate index (`read/1`)
pub const DEFAULT_MATE_DELIMITER: char = '/';

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PairingError {
    #[error("No primary alignments to build a pair from")]
    Empty,

    #[error("Fragment '{fragment}' has {count} primary alignments, expected 1 or 2")]
    TooManyMates { fragment: String, count: usize },
}

/// Order records by query name, byte-wise
#[must_use]
pub fn compare_by_query_name(a: &AlignmentRecord, b: &AlignmentRecord) -> Ordering {
    a.query_name.as_bytes().cmp(b.query_name.as_bytes())
}

/// Part of `name` before the first `delimiter`, or the whole name when the
/// delimiter does not occur
#[must_use]
pub fn fragment_name(name: &str, delimiter: char) -> &str {
    match name.find(delimiter) {
        Some(index) => &name[..index],
        None => name,
    }
}

/// Whether two query names belong to the same fragment
///
/// ```
/// use mrf_tools::pairing::same_fragment;
///
/// assert!(same_fragment("readA/1", "readA/2", '/'));
/// assert!(!same_fragment("readA/1", "readB/2", '/'));
/// assert!(!same_fragment("readA", "readB", '/'));
/// ```
#[must_use]
pub fn same_fragment(a: &str, b: &str, delimiter: char) -> bool {
    fragment_name(a, delimiter) == fragment_name(b, delimiter)
}

/// Sort records by fragment name, then query name, and split them into runs
/// of the same fragment.
///
/// Every fragment ends up in exactly one group, including when only some of
/// its names carry the delimiter (`a` and `a/2`). Groups are ordered by
/// fragment name, records within a group by query name.
#[must_use]
pub fn group_mates(mut records: Vec<AlignmentRecord>, delimiter: char) -> Vec<Vec<AlignmentRecord>> {
    records.sort_by(|a, b| {
        fragment_name(&a.query_name, delimiter)
            .cmp(fragment_name(&b.query_name, delimiter))
            .then_with(|| compare_by_query_name(a, b))
    });

    let mut groups: Vec<Vec<AlignmentRecord>> = Vec::new();
    for record in records {
        match groups.last_mut() {
            Some(group)
                if same_fragment(&group[0].query_name, &record.query_name, delimiter) =>
            {
                group.push(record);
            }
            _ => groups.push(vec![record]),
        }
    }

    debug!(groups = groups.len(), "Grouped records by fragment");
    groups
}

/// Convert one SAM record into a [`MappedRead`].
///
/// Blocks come from the CIGAR anchored at POS on RNAME; an unmapped record
/// or one without a position yields no blocks. The query name becomes the
/// query id.
#[must_use]
pub fn record_to_read(record: &AlignmentRecord) -> MappedRead {
    let blocks = match u64::try_from(record.position) {
        Ok(position) if position > 0 && !is_unmapped(record) => cigar_to_blocks(
            &record.reference_name,
            record.strand(),
            position,
            &record.cigar_ops,
        ),
        _ => Vec::new(),
    };

    MappedRead {
        blocks,
        sequence: record.sequence.clone(),
        quality_scores: record.quality.clone(),
        query_id: Some(record.query_name.clone()),
    }
}

/// Build an MRF entry from the records of one fragment.
///
/// Secondary and supplementary alignments are ignored. One primary record
/// gives a single-end entry; two give a pair, with the first-in-pair record
/// (or, failing that, the one not marked second) as `read1`.
///
/// # Errors
///
/// Returns `PairingError::Empty` if no primary record remains, and
/// `PairingError::TooManyMates` if more than two do.
pub fn build_pair(records: &[AlignmentRecord]) -> Result<MappedReadPair, PairingError> {
    let primary: Vec<&AlignmentRecord> = records.iter().filter(|r| is_primary(r)).collect();

    match primary.as_slice() {
        [] => Err(PairingError::Empty),
        [only] => Ok(MappedReadPair::single(record_to_read(only))),
        [a, b] => {
            let swap = is_first_in_pair(b) || (is_second_in_pair(a) && !is_second_in_pair(b));
            let (first, second) = if swap { (b, a) } else { (a, b) };
            Ok(MappedReadPair::paired(record_to_read(first), record_to_read(second)))
        }
        more => Err(PairingError::TooManyMates {
            fragment: more[0].query_name.clone(),
            count: more.len(),
        }),
    }
}

/// MAPQ written for records rebuilt from MRF, which carries no mapping quality
pub const UNKNOWN_MAPPING_QUALITY: u8 = 255;

/// Convert an MRF entry back into SAM records, one per read, read 1 first.
///
/// The CIGAR is derived from the blocks with [`blocks_to_cigar`], so only
/// `M` and `N` operations appear. Reads without a query id are named
/// `fallback_name`, suffixed with `/1` or `/2` for pairs. Mate fields and
/// the pairing FLAG bits are filled in from the other read of a pair.
#[must_use]
pub fn pair_to_records(entry: &MappedReadPair, fallback_name: &str) -> Vec<AlignmentRecord> {
    let reads: Vec<&MappedRead> = entry.reads().collect();
    reads
        .iter()
        .enumerate()
        .map(|(index, read)| {
            let mate = if entry.is_paired {
                reads.get(1 - index).copied()
            } else {
                None
            };
            read_to_record(read, mate, index, entry.is_paired, fallback_name)
        })
        .collect()
}

fn read_to_record(
    read: &MappedRead,
    mate: Option<&MappedRead>,
    index: usize,
    paired: bool,
    fallback_name: &str,
) -> AlignmentRecord {
    let first = read.blocks.first();
    let mate_first = mate.and_then(|m| m.blocks.first());

    let mut bits = 0;
    match first {
        Some(block) if block.strand == Strand::Reverse => bits |= flags::REVERSE,
        Some(_) => {}
        None => bits |= flags::UNMAPPED,
    }
    if paired {
        bits |= flags::PAIRED;
        bits |= if index == 0 {
            flags::FIRST_IN_PAIR
        } else {
            flags::SECOND_IN_PAIR
        };
        match mate_first {
            Some(block) if block.strand == Strand::Reverse => bits |= flags::MATE_REVERSE,
            Some(_) => {}
            None => bits |= flags::MATE_UNMAPPED,
        }
    }

    let query_name = match &read.query_id {
        Some(id) => id.clone(),
        None if paired => format!("{fallback_name}/{}", index + 1),
        None => fallback_name.to_string(),
    };
    let position = |block: &AlignmentBlock| {
        i64::try_from(block.target_start).unwrap_or(i64::MAX)
    };
    let (mate_reference_name, mate_position) = match (first, mate_first) {
        (Some(own), Some(other)) if own.target_name == other.target_name => {
            ("=".to_string(), position(other))
        }
        (_, Some(other)) => (other.target_name.clone(), position(other)),
        (_, None) => (MISSING_FIELD.to_string(), 0),
    };

    let cigar = blocks_to_cigar(&read.blocks);
    AlignmentRecord {
        query_name,
        flags: bits,
        reference_name: first.map_or_else(|| MISSING_FIELD.to_string(), |b| b.target_name.clone()),
        position: first.map_or(0, position),
        mapping_quality: UNKNOWN_MAPPING_QUALITY,
        cigar_ops: parse_cigar_string(&cigar),
        cigar,
        mate_reference_name,
        mate_position,
        insert_size: 0,
        sequence: read.sequence.clone(),
        quality: read.quality_scores.clone(),
        tags: None,
    }
}
