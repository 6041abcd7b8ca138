//! FLAG bit queries on [`AlignmentRecord`]s.

use crate::core::flags;
use crate::core::record::AlignmentRecord;

/// Template has multiple segments (0x1)
#[must_use]
pub fn is_paired(record: &AlignmentRecord) -> bool {
    record.has_flag(flags::PAIRED)
}

/// Next segment in the template is unmapped (0x8)
#[must_use]
pub fn is_mate_unmapped(record: &AlignmentRecord) -> bool {
    record.has_flag(flags::MATE_UNMAPPED)
}

#[must_use]
pub fn is_proper_pair(record: &AlignmentRecord) -> bool {
    record.has_flag(flags::PROPER_PAIR)
}

#[must_use]
pub fn is_unmapped(record: &AlignmentRecord) -> bool {
    record.has_flag(flags::UNMAPPED)
}

#[must_use]
pub fn is_reverse(record: &AlignmentRecord) -> bool {
    record.has_flag(flags::REVERSE)
}

#[must_use]
pub fn is_mate_reverse(record: &AlignmentRecord) -> bool {
    record.has_flag(flags::MATE_REVERSE)
}

#[must_use]
pub fn is_first_in_pair(record: &AlignmentRecord) -> bool {
    record.has_flag(flags::FIRST_IN_PAIR)
}

#[must_use]
pub fn is_second_in_pair(record: &AlignmentRecord) -> bool {
    record.has_flag(flags::SECOND_IN_PAIR)
}

#[must_use]
pub fn is_secondary(record: &AlignmentRecord) -> bool {
    record.has_flag(flags::SECONDARY)
}

#[must_use]
pub fn is_qc_fail(record: &AlignmentRecord) -> bool {
    record.has_flag(flags::QCFAIL)
}

#[must_use]
pub fn is_duplicate(record: &AlignmentRecord) -> bool {
    record.has_flag(flags::DUPLICATE)
}

#[must_use]
pub fn is_supplementary(record: &AlignmentRecord) -> bool {
    record.has_flag(flags::SUPPLEMENTARY)
}

/// Neither secondary nor supplementary
#[must_use]
pub fn is_primary(record: &AlignmentRecord) -> bool {
    !is_secondary(record) && !is_supplementary(record)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record_with_flags(flags: u16) -> AlignmentRecord {
        AlignmentRecord {
            query_name: "read".to_string(),
            flags,
            reference_name: "*".to_string(),
            position: 0,
            mapping_quality: 0,
            cigar: "*".to_string(),
            cigar_ops: Vec::new(),
            mate_reference_name: "*".to_string(),
            mate_position: 0,
            insert_size: 0,
            sequence: None,
            quality: None,
            tags: None,
        }
    }

    #[test]
    fn test_paired_and_mate_unmapped_track_their_bits() {
        for value in 0..=0x07FF_u16 {
            let record = record_with_flags(value);
            assert_eq!(is_paired(&record), value & 0x0001 != 0, "flags {value:#x}");
            assert_eq!(is_mate_unmapped(&record), value & 0x0008 != 0, "flags {value:#x}");
        }
    }

    #[test]
    fn test_other_flag_queries() {
        let record = record_with_flags(0x1 | 0x2 | 0x10 | 0x40 | 0x400);
        assert!(is_proper_pair(&record));
        assert!(is_reverse(&record));
        assert!(is_first_in_pair(&record));
        assert!(is_duplicate(&record));
        assert!(is_primary(&record));
        assert!(!is_second_in_pair(&record));
        assert!(!is_mate_reverse(&record));
        assert!(!is_unmapped(&record));
        assert!(!is_qc_fail(&record));

        assert!(!is_primary(&record_with_flags(0x100)));
        assert!(is_supplementary(&record_with_flags(0x800)));
        assert!(is_qc_fail(&record_with_flags(0x200)));
    }
}
