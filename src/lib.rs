//! # mrf-tools
//!
//! A library for reading and writing alignment records in SAM and MRF (mapped
//! read format) text, and for calling enriched intervals from signal tracks.
//!
//! SAM stores one line per alignment. MRF stores one line per sequenced
//! fragment: the alignment blocks of one read, or of both mates of a pair,
//! plus optional sequence, quality and query id columns. Converting between
//! the two means decoding CIGARs into blocks and pairing mates by query name.
//!
//! ## Features
//!
//! - **Stream parsers**: pull-based SAM and MRF readers over any line source
//!   (files, gzip, stdin, a subprocess pipe), each call yielding an owned record
//! - **Strict by default**: malformed numbers, CIGARs and length mismatches are
//!   errors, with an opt-in lenient mode for historical input
//! - **CIGAR codec**: blocks to CIGAR, CIGAR to typed operations and back to blocks
//! - **Mate pairing**: FLAG queries, fragment names, grouping SAM records into pairs
//! - **Segmentation**: threshold/gap interval calling over wiggle or bedGraph tracks
//!
//! ## Example
//!
//! ```rust
//! use mrf_tools::parsing::mrf::parse_mrf_text;
//! use mrf_tools::parsing::ParseOptions;
//! use mrf_tools::core::cigar::blocks_to_cigar;
//!
//! let text = "AlignmentBlocks\tQueryId\nchr1:+:100:109:1:10,chr1:+:200:209:11:20\tread1\n";
//! let (_schema, entries) = parse_mrf_text(text, ParseOptions::default()).unwrap();
//!
//! assert_eq!(entries[0].read1.query_id.as_deref(), Some("read1"));
//! assert_eq!(blocks_to_cigar(&entries[0].read1.blocks), "10M90N10M");
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Record model, CIGAR codec and SAM flags
//! - [`parsing`]: Line sources and the SAM, MRF, BED and wiggle readers/writers
//! - [`pairing`]: Flag queries and mate grouping
//! - [`segmentation`]: Interval calling from signal tracks
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod pairing;
pub mod parsing;
pub mod segmentation;
pub mod utils;

// Re-export commonly used types for convenience
pub use core::block::{AlignmentBlock, MappedRead, MappedReadPair, Strand};
pub use core::cigar::{CigarKind, CigarOp};
pub use core::record::AlignmentRecord;
pub use core::types::*;
pub use parsing::mrf::{MrfReader, MrfSchema, MrfWriter};
pub use parsing::sam::{SamReader, SamWriter};
pub use parsing::{ParseError, ParseOptions};
pub use segmentation::SegmentationParams;
