use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use arrow::array::{Array, ArrayRef, Float32Array, Float64Array};
use arrow::record_batch::RecordBatch;
use log::{debug, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;

use super::model::{PeakList, ReferenceLibrary, ReferenceRecord, SamplePeak, DEFAULT_INTENSITY};
use crate::error::Error;

/// Header aliases accepted for the sample shift column, compared
/// case-insensitively after trimming.
const SHIFT_ALIASES: [&str; 3] = ["ppm", "shift", "chemical shift"];
const INTENSITY_COLUMN: &str = "intensity";

// ---------------------------------------------------------------------------
// Reference table
// ---------------------------------------------------------------------------

/// Load the HMDB-style reference table from a CSV file.
///
/// Required columns: `Name`, `HMDB_ID`. Optional: `CAS`, `Formula`,
/// `ppm_list` (semicolon-joined floats), `predicted_ppm`.
pub fn load_reference_csv(path: &Path) -> Result<ReferenceLibrary, Error> {
    let reader = csv::Reader::from_path(path)?;
    read_reference(reader)
}

fn read_reference<R: Read>(mut reader: csv::Reader<R>) -> Result<ReferenceLibrary, Error> {
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let column = |name: &str| headers.iter().position(|h| h == name);
    let name_idx = column("Name").ok_or(Error::MissingReferenceColumn("Name"))?;
    let id_idx = column("HMDB_ID").ok_or(Error::MissingReferenceColumn("HMDB_ID"))?;
    let cas_idx = column("CAS");
    let formula_idx = column("Formula");
    let ppm_idx = column("ppm_list");
    let predicted_idx = column("predicted_ppm");

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        let field = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let expected_shifts = ppm_idx
            .and_then(|i| record.get(i))
            .map(|text| parse_ppm_list(text, row_no))
            .unwrap_or_default();

        records.push(ReferenceRecord {
            name: field(Some(name_idx)).unwrap_or_default(),
            hmdb_id: field(Some(id_idx)).unwrap_or_default(),
            cas: field(cas_idx),
            formula: field(formula_idx),
            expected_shifts,
            predicted_shifts: field(predicted_idx),
        });
    }

    debug!("loaded {} reference records", records.len());
    Ok(ReferenceLibrary::new(records))
}

/// Parse a semicolon-delimited shift list.
///
/// Unparsable or non-finite tokens are dropped with a warning; the record
/// stays usable with the reduced shift set.
pub fn parse_ppm_list(text: &str, row: usize) -> Vec<f64> {
    text.split(';')
        .map(str::trim)
        .filter(|tok| !tok.is_empty())
        .filter_map(|tok| match tok.parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v),
            _ => {
                warn!("row {row}: dropping unparsable ppm_list token '{tok}'");
                None
            }
        })
        .collect()
}

/// Inverse of [`parse_ppm_list`] up to float formatting.
pub fn format_ppm_list(shifts: &[f64]) -> String {
    shifts
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(";")
}

// ---------------------------------------------------------------------------
// Sample peak lists
// ---------------------------------------------------------------------------

/// One peak as it appears in a sample file, before normalization.
#[derive(Debug, Deserialize)]
struct RawPeak {
    #[serde(alias = "Shift", alias = "Chemical Shift")]
    ppm: f64,
    #[serde(default)]
    intensity: Option<f64>,
}

/// Load a sample peak list. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – shift column under one of the accepted header aliases
///                (`ppm`, `Shift`, `Chemical Shift`), optional `intensity`
/// * `.json`    – `[{ "ppm": 1.33, "intensity": 0.5 }, ...]`
/// * `.parquet` – scalar `ppm` column (Float64 or Float32), optional `intensity`
pub fn load_sample(path: &Path) -> Result<PeakList, Error> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let raw = match ext.as_str() {
        "parquet" | "pq" => read_sample_parquet(path)?,
        "json" => read_sample_json(path)?,
        "csv" => read_sample_csv(csv::Reader::from_path(path)?)?,
        other => return Err(Error::UnsupportedExtension(other.to_string())),
    };

    let source = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("sample")
        .to_string();
    Ok(normalize_peaks(source, raw))
}

/// Ingestion-time normalization: drop non-finite shifts, fill missing
/// intensities with [`DEFAULT_INTENSITY`]. Produces a fresh immutable list;
/// loaded data is never patched in place afterwards.
fn normalize_peaks(source: String, raw: Vec<RawPeak>) -> PeakList {
    let mut peaks = Vec::with_capacity(raw.len());
    for p in raw {
        if !p.ppm.is_finite() {
            warn!("{source}: dropping peak with non-finite shift");
            continue;
        }
        peaks.push(SamplePeak {
            shift: p.ppm,
            intensity: p
                .intensity
                .filter(|i| i.is_finite())
                .unwrap_or(DEFAULT_INTENSITY),
        });
    }
    debug!("{}: {} peaks after normalization", source, peaks.len());
    PeakList { source, peaks }
}

// -- CSV --

/// CSV layout: header row, one peak per row. The shift column is located by
/// alias; everything is rejected with row context on the first bad cell.
fn read_sample_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<RawPeak>, Error> {
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let shift_idx = headers
        .iter()
        .position(|h| SHIFT_ALIASES.contains(&h.to_ascii_lowercase().as_str()))
        .ok_or(Error::MissingShiftColumn)?;
    let intensity_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(INTENSITY_COLUMN));

    let mut raw = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result?;

        let shift_text = record.get(shift_idx).unwrap_or("").trim();
        let ppm = shift_text.parse::<f64>().map_err(|_| Error::InvalidNumber {
            row: row_no,
            value: shift_text.to_string(),
        })?;

        let intensity = match intensity_idx.and_then(|i| record.get(i)).map(str::trim) {
            None | Some("") => None,
            Some(text) => Some(text.parse::<f64>().map_err(|_| Error::InvalidNumber {
                row: row_no,
                value: text.to_string(),
            })?),
        };

        raw.push(RawPeak { ppm, intensity });
    }

    Ok(raw)
}

// -- JSON --

/// Records-oriented JSON, the default `df.to_json(orient='records')` layout.
fn read_sample_json(path: &Path) -> Result<Vec<RawPeak>, Error> {
    let file = File::open(path)?;
    let raw: Vec<RawPeak> = serde_json::from_reader(BufReader::new(file))?;
    Ok(raw)
}

// -- Parquet --

fn read_sample_parquet(path: &Path) -> Result<Vec<RawPeak>, Error> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let reader = builder.build()?;

    let mut raw = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        raw.extend(peaks_from_batch(&batch)?);
    }
    Ok(raw)
}

/// Extract raw peaks from one record batch. The shift column is located by
/// alias, same as the CSV path.
fn peaks_from_batch(batch: &RecordBatch) -> Result<Vec<RawPeak>, Error> {
    let schema = batch.schema();

    let shift_idx = schema
        .fields()
        .iter()
        .position(|f| SHIFT_ALIASES.contains(&f.name().to_ascii_lowercase().as_str()))
        .ok_or(Error::MissingShiftColumn)?;
    let intensity_idx = schema
        .fields()
        .iter()
        .position(|f| f.name().eq_ignore_ascii_case(INTENSITY_COLUMN));

    let shifts = scalar_f64_column(batch.column(shift_idx))?;
    let intensities = match intensity_idx {
        Some(i) => Some(scalar_f64_column(batch.column(i))?),
        None => None,
    };

    Ok(shifts
        .into_iter()
        .enumerate()
        .map(|(row, ppm)| RawPeak {
            ppm,
            intensity: intensities.as_ref().map(|v| v[row]),
        })
        .collect())
}

/// Read a whole Float64/Float32 column as `Vec<f64>`. Nulls become NaN and
/// are dropped later during normalization.
fn scalar_f64_column(col: &ArrayRef) -> Result<Vec<f64>, Error> {
    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        Ok(arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(arr) = col.as_any().downcast_ref::<Float32Array>() {
        Ok(arr.iter().map(|v| v.map_or(f64::NAN, f64::from)).collect())
    } else {
        Err(Error::NonNumericColumn(format!("{:?}", col.data_type())))
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use arrow::datatypes::{DataType, Field, Schema};

    use super::*;

    fn reference_from_str(data: &str) -> Result<ReferenceLibrary, Error> {
        read_reference(csv::Reader::from_reader(data.as_bytes()))
    }

    fn sample_from_str(data: &str) -> Result<Vec<RawPeak>, Error> {
        read_sample_csv(csv::Reader::from_reader(data.as_bytes()))
    }

    #[test]
    fn reference_parses_all_columns() {
        let lib = reference_from_str(
            "Name,HMDB_ID,CAS,Formula,ppm_list,predicted_ppm\n\
             Lactate,HMDB0000190,50-21-5,C3H6O3,1.33;4.11,1.32;4.10\n\
             Alanine,HMDB0000161,,,1.48;3.78,\n",
        )
        .unwrap();

        assert_eq!(lib.len(), 2);
        let lactate = &lib.records[0];
        assert_eq!(lactate.name, "Lactate");
        assert_eq!(lactate.hmdb_id, "HMDB0000190");
        assert_eq!(lactate.cas.as_deref(), Some("50-21-5"));
        assert_eq!(lactate.formula.as_deref(), Some("C3H6O3"));
        assert_eq!(lactate.expected_shifts, vec![1.33, 4.11]);
        assert_eq!(lactate.predicted_shifts.as_deref(), Some("1.32;4.10"));

        let alanine = &lib.records[1];
        assert_eq!(alanine.cas, None);
        assert_eq!(alanine.predicted_shifts, None);
    }

    #[test]
    fn reference_missing_required_column_is_rejected() {
        let err = reference_from_str("Name,ppm_list\nLactate,1.33\n").unwrap_err();
        assert!(matches!(err, Error::MissingReferenceColumn("HMDB_ID")));
    }

    #[test]
    fn unparsable_ppm_tokens_are_dropped_not_fatal() {
        let lib = reference_from_str(
            "Name,HMDB_ID,ppm_list\n\
             Weird,HMDB0000001,1.2;oops;3.4;;NaN\n",
        )
        .unwrap();
        assert_eq!(lib.records[0].expected_shifts, vec![1.2, 3.4]);
    }

    #[test]
    fn ppm_list_round_trips() {
        let text = "1.33;4.11;7.5213";
        let shifts = parse_ppm_list(text, 0);
        assert_eq!(format_ppm_list(&shifts), text);
    }

    #[test]
    fn sample_csv_accepts_shift_aliases() {
        for header in ["ppm", "Shift", "Chemical Shift", "PPM"] {
            let raw = sample_from_str(&format!("{header}\n1.33\n4.11\n")).unwrap();
            assert_eq!(raw.len(), 2, "header '{header}'");
            assert_eq!(raw[0].ppm, 1.33);
        }
    }

    #[test]
    fn sample_csv_without_shift_column_is_rejected() {
        let err = sample_from_str("wavelength,intensity\n1.0,2.0\n").unwrap_err();
        assert!(matches!(err, Error::MissingShiftColumn));
    }

    #[test]
    fn sample_csv_bad_number_is_rejected_with_row_context() {
        let err = sample_from_str("ppm\n1.33\nnot-a-number\n").unwrap_err();
        match err {
            Error::InvalidNumber { row, value } => {
                assert_eq!(row, 1);
                assert_eq!(value, "not-a-number");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_intensity_defaults_to_constant() {
        let raw = sample_from_str("ppm,intensity\n1.33,0.8\n4.11,\n").unwrap();
        let list = normalize_peaks("test".to_string(), raw);
        assert_eq!(list.peaks[0].intensity, 0.8);
        assert_eq!(list.peaks[1].intensity, DEFAULT_INTENSITY);
    }

    #[test]
    fn non_finite_shifts_are_dropped_at_ingestion() {
        let raw = vec![
            RawPeak { ppm: 1.0, intensity: None },
            RawPeak { ppm: f64::NAN, intensity: Some(1.0) },
            RawPeak { ppm: 2.0, intensity: Some(f64::INFINITY) },
        ];
        let list = normalize_peaks("test".to_string(), raw);
        assert_eq!(list.len(), 2);
        assert_eq!(list.peaks[0].shift, 1.0);
        // infinite intensity falls back to the default, the peak survives
        assert_eq!(list.peaks[1].intensity, DEFAULT_INTENSITY);
    }

    #[test]
    fn load_sample_dispatches_csv_fixture() {
        let list = load_sample(Path::new("test_files/lactate.csv")).unwrap();
        assert_eq!(list.source, "lactate.csv");
        assert_eq!(list.len(), 4);
        assert_eq!(list.peaks[0].shift, 1.31);
    }

    #[test]
    fn load_sample_dispatches_json_fixture() {
        let list = load_sample(Path::new("test_files/sample_peaks.json")).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.peaks[1].shift, 4.11);
        assert_eq!(list.peaks[1].intensity, DEFAULT_INTENSITY);
    }

    #[test]
    fn load_sample_rejects_unknown_extension() {
        let err = load_sample(Path::new("test_files/sample.xlsx")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedExtension(ext) if ext == "xlsx"));
    }

    #[test]
    fn parquet_batch_extraction_by_alias() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("Chemical Shift", DataType::Float64, false),
            Field::new("intensity", DataType::Float32, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Float64Array::from(vec![1.33, 4.11])) as ArrayRef,
                Arc::new(Float32Array::from(vec![0.5f32, 0.25f32])) as ArrayRef,
            ],
        )
        .unwrap();

        let raw = peaks_from_batch(&batch).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].ppm, 1.33);
        assert_eq!(raw[1].intensity, Some(0.25));
    }

    #[test]
    fn parquet_batch_without_shift_column_is_rejected() {
        let schema = Arc::new(Schema::new(vec![Field::new(
            "wavelength",
            DataType::Float64,
            false,
        )]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(Float64Array::from(vec![1.0])) as ArrayRef],
        )
        .unwrap();
        assert!(matches!(
            peaks_from_batch(&batch),
            Err(Error::MissingShiftColumn)
        ));
    }
}
