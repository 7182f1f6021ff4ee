use std::sync::Arc;

use crate::data::model::{ExperimentMetadata, PeakList, ReferenceLibrary};
use crate::data::search::search_by_name;
use crate::matcher::{MatchConfig, MatchResult, Matcher};

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// One user session: loaded data handles, matching parameters, and the last
/// ranking.
///
/// Every mutation triggers one synchronous re-rank; there is no background
/// work and no shared mutable state beyond the read-only data snapshots.
pub struct Session {
    /// Loaded reference library. `None` while unavailable; search and
    /// matching degrade instead of failing.
    pub library: Option<Arc<ReferenceLibrary>>,

    /// Current sample peak list (`None` until one is loaded).
    pub sample: Option<Arc<PeakList>>,

    /// Matching parameters, tolerance always within the control bounds.
    pub config: MatchConfig,

    /// Free-text experiment descriptors.
    pub metadata: ExperimentMetadata,

    /// Ranked results for the current library/sample/tolerance (cached).
    pub ranked: Vec<MatchResult>,

    /// Status / warning message for degraded modes.
    pub status_message: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            library: None,
            sample: None,
            config: MatchConfig::default(),
            metadata: ExperimentMetadata::default(),
            ranked: Vec::new(),
            status_message: None,
        }
    }
}

impl Session {
    /// Ingest a reference library (or its absence) and recompute the ranking.
    pub fn set_library(&mut self, library: Option<Arc<ReferenceLibrary>>) {
        self.status_message = match &library {
            Some(_) => None,
            None => Some(
                "Reference table unavailable; search and matching are disabled.".to_string(),
            ),
        };
        self.library = library;
        self.rematch();
    }

    /// Ingest a sample peak list and recompute the ranking.
    pub fn set_sample(&mut self, sample: Option<Arc<PeakList>>) {
        self.sample = sample;
        self.rematch();
    }

    /// Set the tolerance, clamped to the control bounds, and recompute.
    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.config = MatchConfig::clamped(tolerance);
        self.rematch();
    }

    /// Name search over the loaded library; empty while degraded.
    pub fn search(&self, query: &str) -> Vec<usize> {
        match &self.library {
            Some(library) => search_by_name(library, query),
            None => Vec::new(),
        }
    }

    /// Recompute `ranked` from the current library, sample, and tolerance.
    pub fn rematch(&mut self) {
        self.ranked = match (&self.library, &self.sample) {
            (Some(library), Some(sample)) => {
                Matcher::new(&self.config, &sample.peaks).rank(library)
            }
            _ => Vec::new(),
        };
    }
}
