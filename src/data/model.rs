use std::fmt;

use serde::{Deserialize, Serialize};

/// Intensity assigned to sample peaks whose source file carries no intensity
/// column. Applied once at ingestion; loaded lists are never patched later.
pub const DEFAULT_INTENSITY: f64 = 1.0;

// ---------------------------------------------------------------------------
// ReferenceRecord – one row of the reference table
// ---------------------------------------------------------------------------

/// A single metabolite entry from the HMDB-style reference table.
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceRecord {
    /// Display name, not required to be unique.
    pub name: String,
    /// Stable external identifier (e.g. `HMDB0000190`).
    pub hmdb_id: String,
    pub cas: Option<String>,
    pub formula: Option<String>,
    /// Expected chemical-shift positions in ppm, parsed from the
    /// semicolon-delimited `ppm_list` column. Always finite; may be empty.
    pub expected_shifts: Vec<f64>,
    /// Predicted-shift free text, kept verbatim and never parsed.
    pub predicted_shifts: Option<String>,
}

// ---------------------------------------------------------------------------
// ReferenceLibrary – the complete loaded table
// ---------------------------------------------------------------------------

/// The full reference table in source-file row order.
///
/// Row order matters: ranked match output breaks score ties by table order.
#[derive(Debug, Clone, Default)]
pub struct ReferenceLibrary {
    pub records: Vec<ReferenceRecord>,
}

impl ReferenceLibrary {
    pub fn new(records: Vec<ReferenceRecord>) -> Self {
        ReferenceLibrary { records }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the library is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ReferenceRecord> {
        self.records.get(index)
    }
}

// ---------------------------------------------------------------------------
// SamplePeak / PeakList – one observed spectrum
// ---------------------------------------------------------------------------

/// One observed peak of an uploaded or preloaded spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePeak {
    /// Chemical shift in ppm. Always finite.
    pub shift: f64,
    /// Peak intensity; [`DEFAULT_INTENSITY`] when the source had none.
    pub intensity: f64,
}

/// An ephemeral sample peak list, one per upload/selection.
#[derive(Debug, Clone, Default)]
pub struct PeakList {
    /// Where the peaks came from (file name or label), for display.
    pub source: String,
    /// Peaks in file order.
    pub peaks: Vec<SamplePeak>,
}

impl PeakList {
    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ExperimentMetadata – free-text acquisition descriptors
// ---------------------------------------------------------------------------

/// Free-text experiment descriptors shown alongside results.
///
/// Display only; none of these fields are interpreted.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentMetadata {
    pub field_strength_mhz: String,
    pub pulse_sequence: String,
    pub internal_standard: String,
    pub scans: u32,
}

impl Default for ExperimentMetadata {
    fn default() -> Self {
        ExperimentMetadata {
            field_strength_mhz: "600".to_string(),
            pulse_sequence: "90°".to_string(),
            internal_standard: "0.1 mM DSS".to_string(),
            scans: 256,
        }
    }
}

impl fmt::Display for ExperimentMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Field strength:    {} MHz", self.field_strength_mhz)?;
        writeln!(f, "Pulse sequence:    {}", self.pulse_sequence)?;
        writeln!(f, "Internal standard: {}", self.internal_standard)?;
        write!(f, "Number of scans:   {}", self.scans)
    }
}
