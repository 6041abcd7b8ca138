//! Command-line interface for mrf-tools.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **view**: Parse SAM or MRF and write it back out (or as JSON lines)
//! - **convert**: Convert between SAM and MRF
//! - **segment**: Call enriched intervals from a wiggle/bedGraph signal track
//! - **filter**: Keep MRF entries overlapping a set of BED regions
//!
//! ## Usage
//!
//! ```text
//! # Validate and normalize a SAM file
//! mrf-tools view alignments.sam
//!
//! # Read from a pipe
//! mrf-tools view --command "samtools view sample.bam" --input-format sam
//!
//! # Pair mates and write MRF
//! mrf-tools convert alignments.sam.gz --to mrf > reads.mrf
//!
//! # Intervals with mean coverage >= 5
//! mrf-tools segment coverage.wig --threshold 5 --max-gap 10 --min-run 50
//!
//! # Entries touching exons
//! mrf-tools filter reads.mrf --regions exons.bed --format json
//! ```

use clap::{Parser, Subcommand};

pub mod convert;
pub mod filter;
pub mod input;
pub mod segment;
pub mod view;

#[derive(Parser)]
#[command(name = "mrf-tools")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Parse, convert, and segment SAM and MRF alignment data")]
#[command(
    long_about = "mrf-tools reads SAM alignments and MRF (mapped read format) files.\n\nIt can:\n- Validate and re-serialize either format\n- Pair SAM mates into MRF entries and expand MRF back into SAM\n- Call enriched intervals from a signal track\n- Filter MRF entries by genomic regions"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse SAM or MRF records and write them back out
    View(view::ViewArgs),

    /// Convert SAM to MRF or MRF to SAM
    Convert(convert::ConvertArgs),

    /// Call intervals from a signal track
    Segment(segment::SegmentArgs),

    /// Keep MRF entries overlapping BED regions
    Filter(filter::FilterArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}
