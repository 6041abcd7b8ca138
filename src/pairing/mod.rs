//! Mate pairing on top of SAM alignment records.
//!
//! - [`status`]: FLAG bit queries
//! - [`mates`]: query-name ordering, fragment identity, and grouping SAM
//!   records into [`MappedReadPair`](crate::core::MappedReadPair)s

pub mod mates;
pub mod status;

pub use mates::{
    build_pair, compare_by_query_name, fragment_name, group_mates, pair_to_records, record_to_read,
    same_fragment, PairingError, DEFAULT_MATE_DELIMITER,
};
pub use status::{is_mate_unmapped, is_paired};
