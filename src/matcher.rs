use serde::Serialize;

use crate::data::model::{ReferenceLibrary, ReferenceRecord, SamplePeak};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Lower bound of the user-facing tolerance control, in ppm.
pub const MIN_TOLERANCE: f64 = 0.005;
/// Upper bound of the user-facing tolerance control, in ppm.
pub const MAX_TOLERANCE: f64 = 0.05;
/// Default matching tolerance, in ppm.
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// Matching parameters.
///
/// `tolerance` is the maximum |observed − expected| distance, in ppm, for a
/// sample peak to count as covering an expected peak. The matcher itself
/// accepts any value including zero (an exact-match request); clamping to
/// the control bounds happens at the session level.
#[derive(Debug, Clone, Copy)]
pub struct MatchConfig {
    pub tolerance: f64,
}

impl MatchConfig {
    pub fn new(tolerance: f64) -> Self {
        MatchConfig { tolerance }
    }

    /// A config with the tolerance clamped to the control bounds.
    pub fn clamped(tolerance: f64) -> Self {
        MatchConfig {
            tolerance: tolerance.clamp(MIN_TOLERANCE, MAX_TOLERANCE),
        }
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

// ---------------------------------------------------------------------------
// MatchResult
// ---------------------------------------------------------------------------

/// Score for one reference record. Derived per invocation, never persisted.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MatchResult {
    /// Index into the reference library this score belongs to.
    pub index: usize,
    /// Expected peaks covered by at least one sample peak within tolerance.
    pub matched: usize,
    /// Size of the record's expected-shift list.
    pub expected: usize,
    /// `matched / expected`, or 0 when the record has no expected shifts.
    pub score: f64,
}

// ---------------------------------------------------------------------------
// Matcher
// ---------------------------------------------------------------------------

/// Scores one sample peak list against reference records.
///
/// Coverage counting: an expected shift counts as matched when at least one
/// sample peak lies within tolerance of it. Several sample peaks near the
/// same expected shift still count it once, and one sample peak may cover
/// expected shifts in any number of records. Extra sample peaks that match
/// nothing never lower a score, so `score` stays within `[0, 1]`.
pub struct Matcher<'a> {
    config: &'a MatchConfig,
    peaks: &'a [SamplePeak],
}

impl Matcher<'_> {
    pub fn new<'a>(config: &'a MatchConfig, peaks: &'a [SamplePeak]) -> Matcher<'a> {
        Matcher { config, peaks }
    }

    /// Score a single record: (covered expected peaks, covered / |expected|).
    ///
    /// An empty expected-shift list scores 0 rather than dividing by zero.
    pub fn score_record(&self, record: &ReferenceRecord) -> (usize, f64) {
        let expected = &record.expected_shifts;
        if expected.is_empty() {
            return (0, 0.0);
        }

        // Brute force is fine at tens of peaks per list.
        let covered = expected
            .iter()
            .filter(|&&e| {
                self.peaks
                    .iter()
                    .any(|p| (p.shift - e).abs() <= self.config.tolerance)
            })
            .count();

        (covered, covered as f64 / expected.len() as f64)
    }

    /// Score every record of the library, sorted by score descending.
    ///
    /// The sort is stable, so equal scores keep reference-table order.
    pub fn rank(&self, library: &ReferenceLibrary) -> Vec<MatchResult> {
        let mut results: Vec<MatchResult> = library
            .records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let (matched, score) = self.score_record(record);
                MatchResult {
                    index,
                    matched,
                    expected: record.expected_shifts.len(),
                    score,
                }
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peaks(shifts: &[f64]) -> Vec<SamplePeak> {
        shifts
            .iter()
            .map(|&shift| SamplePeak {
                shift,
                intensity: 1.0,
            })
            .collect()
    }

    fn record(name: &str, expected: &[f64]) -> ReferenceRecord {
        ReferenceRecord {
            name: name.to_string(),
            hmdb_id: String::new(),
            cas: None,
            formula: None,
            expected_shifts: expected.to_vec(),
            predicted_shifts: None,
        }
    }

    fn score(expected: &[f64], sample: &[f64], tolerance: f64) -> (usize, f64) {
        let config = MatchConfig::new(tolerance);
        let sample = peaks(sample);
        Matcher::new(&config, &sample).score_record(&record("r", expected))
    }

    #[test]
    fn zero_tolerance_requires_exact_match() {
        assert_eq!(score(&[2.0], &[2.0], 0.0), (1, 1.0));
        assert_eq!(score(&[2.0], &[2.0001], 0.0), (0, 0.0));
    }

    #[test]
    fn empty_expected_list_scores_zero() {
        assert_eq!(score(&[], &[1.0, 2.0], 0.01), (0, 0.0));
    }

    #[test]
    fn partial_coverage_is_proportional() {
        assert_eq!(score(&[1.0, 2.0], &[1.0], 0.01), (1, 0.5));
    }

    #[test]
    fn duplicate_sample_peaks_do_not_inflate_the_count() {
        // Two sample peaks near one expected peak: coverage counts the
        // expected peak once, keeping the score within [0, 1].
        assert_eq!(score(&[1.0], &[1.001, 0.999], 0.01), (1, 1.0));
    }

    #[test]
    fn unmatched_sample_peaks_never_penalize() {
        assert_eq!(score(&[1.0], &[1.0, 5.0, 7.2, 9.9], 0.01), (1, 1.0));
    }

    #[test]
    fn ranking_sorts_by_score_descending() {
        let library = ReferenceLibrary::new(vec![
            record("half", &[1.0, 6.0]),
            record("full", &[1.0, 2.0]),
            record("none", &[8.0]),
        ]);
        let config = MatchConfig::new(0.01);
        let sample = peaks(&[1.0, 2.0]);
        let ranked = Matcher::new(&config, &sample).rank(&library);

        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].index, 1);
        assert_eq!(ranked[0].score, 1.0);
        assert_eq!(ranked[1].index, 0);
        assert_eq!(ranked[1].score, 0.5);
        assert_eq!(ranked[2].index, 2);
        assert_eq!(ranked[2].score, 0.0);
    }

    #[test]
    fn tied_scores_keep_table_order() {
        let library = ReferenceLibrary::new(vec![
            record("A", &[1.0, 2.0, 6.0, 7.0, 8.0]),
            record("B", &[1.0, 2.0, 6.1, 7.1, 8.1]),
            record("C", &[1.0]),
        ]);
        let config = MatchConfig::new(0.01);
        let sample = peaks(&[1.0, 2.0]);
        let ranked = Matcher::new(&config, &sample).rank(&library);

        // C wins outright, then A and B tie at 0.4 in table order.
        assert_eq!(ranked[0].index, 2);
        assert_eq!(ranked[1].index, 0);
        assert_eq!(ranked[2].index, 1);
        assert_eq!(ranked[1].score, ranked[2].score);
    }

    #[test]
    fn empty_sample_scores_every_record_zero() {
        let library = ReferenceLibrary::new(vec![record("A", &[1.0])]);
        let config = MatchConfig::default();
        let ranked = Matcher::new(&config, &[]).rank(&library);
        assert_eq!(ranked[0].score, 0.0);
        assert_eq!(ranked[0].expected, 1);
    }

    #[test]
    fn clamped_config_respects_control_bounds() {
        assert_eq!(MatchConfig::clamped(0.0).tolerance, MIN_TOLERANCE);
        assert_eq!(MatchConfig::clamped(1.0).tolerance, MAX_TOLERANCE);
        assert_eq!(MatchConfig::clamped(0.02).tolerance, 0.02);
    }
}
