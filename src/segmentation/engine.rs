use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::types::{Interval, SignalSample, SignalTrack};

/// Default signal threshold
pub const DEFAULT_THRESHOLD: f64 = 1.0;

/// Default maximum gap, in samples
pub const DEFAULT_MAX_GAP: usize = 2;

/// Default minimum interval length, in bases
pub const DEFAULT_MIN_RUN_LENGTH: u64 = 1;

/// Parameters for calling intervals from a signal track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentationParams {
    /// Samples with a value at or above this qualify
    pub threshold: f64,
    /// Two qualifying samples this many samples apart (or more) belong to
    /// different intervals.
    ///
    /// This is the distance between qualifying samples, i.e. the number of
    /// sub-threshold samples between them plus one. A region with
    /// `max_gap = 2` therefore ends at its first sub-threshold sample; to
    /// tolerate up to `n` sub-threshold samples use `max_gap = n + 2`.
    pub max_gap: usize,
    /// Intervals shorter than this are dropped
    pub min_run_length: u64,
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_gap: DEFAULT_MAX_GAP,
            min_run_length: DEFAULT_MIN_RUN_LENGTH,
        }
    }
}

impl SegmentationParams {
    pub fn new(threshold: f64, max_gap: usize, min_run_length: u64) -> Self {
        Self {
            threshold,
            max_gap,
            min_run_length,
        }
    }

    /// NaN never qualifies
    fn qualifies(&self, sample: &SignalSample) -> bool {
        sample.value >= self.threshold
    }
}

/// Call enriched intervals from samples sorted by ascending position.
///
/// A region opens at a qualifying sample and extends over later samples while
/// the distance (in samples) between consecutive qualifying samples stays
/// below `max_gap`. The interval spans from the opening sample's position to
/// one past the last qualifying sample's position, and is kept only if it is
/// at least `min_run_length` long. Scanning resumes after the sample that
/// closed the region.
///
/// Samples must be in ascending position order. Out-of-order input does
/// not panic, but a region whose end falls at or before its start is
/// dropped.
///
/// # Examples
///
/// ```
/// use mrf_tools::core::types::SignalSample;
/// use mrf_tools::segmentation::{call_intervals, SegmentationParams};
///
/// let samples: Vec<SignalSample> = [1.0, 5.0, 5.0, 1.0, 1.0, 5.0, 5.0, 5.0, 1.0, 5.0]
///     .iter()
///     .enumerate()
///     .map(|(i, &v)| SignalSample::new(i as u64, v))
///     .collect();
/// let intervals = call_intervals("chr1", &samples, &SegmentationParams::new(3.0, 2, 2));
///
/// let spans: Vec<(u64, u64)> = intervals.iter().map(|i| (i.start, i.end)).collect();
/// assert_eq!(spans, vec![(1, 3), (5, 8)]);
/// ```
pub fn call_intervals(
    target_name: &str,
    samples: &[SignalSample],
    params: &SegmentationParams,
) -> Vec<Interval> {
    let mut intervals = Vec::new();
    let mut i = 0;

    while i < samples.len() {
        if !params.qualifies(&samples[i]) {
            i += 1;
            continue;
        }

        let mut last_above = i;
        let mut below_run = 0;
        let mut j = i + 1;
        while j < samples.len() {
            if params.qualifies(&samples[j]) {
                last_above = j;
                below_run = 0;
            } else {
                below_run += 1;
                // The next qualifying sample would be below_run + 1 away
                if below_run + 1 >= params.max_gap {
                    break;
                }
            }
            j += 1;
        }

        let start = samples[i].position;
        let end = samples[last_above].position.saturating_add(1);
        if end > start && end - start >= params.min_run_length {
            intervals.push(Interval::new(target_name, start, end));
        } else {
            debug!(target_name, start, end, "Dropping short interval");
        }
        i = j + 1;
    }

    intervals
}

/// Call intervals on every track, concatenated in track order
pub fn segment_tracks(tracks: &[SignalTrack], params: &SegmentationParams) -> Vec<Interval> {
    tracks
        .iter()
        .flat_map(|track| {
            let intervals = call_intervals(&track.target_name, &track.samples, params);
            debug!(
                target_name = %track.target_name,
                samples = track.samples.len(),
                intervals = intervals.len(),
                "Segmented track"
            );
            intervals
        })
        .collect()
}
