use serde::{Deserialize, Serialize};

/// A half-open region `[start, end)` on a named target sequence
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Interval {
    pub target_name: String,
    pub start: u64,
    pub end: u64,
}

impl Interval {
    pub fn new(target_name: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            target_name: target_name.into(),
            start,
            end,
        }
    }

    #[must_use]
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.target_name == other.target_name && self.start < other.end && other.start < self.end
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\t{}\t{}", self.target_name, self.start, self.end)
    }
}

/// One value of a signal track (e.g. coverage depth) at a target position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalSample {
    pub position: u64,
    pub value: f64,
}

impl SignalSample {
    #[must_use]
    pub fn new(position: u64, value: f64) -> Self {
        Self { position, value }
    }
}

/// All samples of one target, ascending by position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalTrack {
    pub target_name: String,
    pub samples: Vec<SignalSample>,
}

impl SignalTrack {
    pub fn new(target_name: impl Into<String>) -> Self {
        Self {
            target_name: target_name.into(),
            samples: Vec::new(),
        }
    }

    /// Whether positions strictly increase
    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.samples.windows(2).all(|w| w[0].position < w[1].position)
    }
}
