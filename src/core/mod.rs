//! Core data types for alignment records and signal tracks.
//!
//! - [`AlignmentBlock`], [`MappedRead`], [`MappedReadPair`]: the MRF record model
//! - [`AlignmentRecord`]: one SAM alignment line
//! - [`cigar`]: CIGAR operations and the block <-> CIGAR codec
//! - [`flags`]: SAM FLAG bit masks
//! - [`Interval`], [`SignalSample`], [`SignalTrack`]: segmentation input and output
//!
//! ## Coordinates
//!
//! | Type | Base | Ends |
//! |------|------|------|
//! | `AlignmentBlock` | 1 | inclusive |
//! | `AlignmentRecord::position` | 1 | n/a |
//! | `Interval` | 0 | half-open |
//! | `SignalSample::position` | as stored in the track | n/a |

pub mod block;
pub mod cigar;
pub mod flags;
pub mod record;
pub mod types;

pub use block::{AlignmentBlock, MappedRead, MappedReadPair, Strand};
pub use cigar::{CigarKind, CigarOp};
pub use record::AlignmentRecord;
pub use types::{Interval, SignalSample, SignalTrack};
