use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::warn;
use serde::Serialize;

use shiftmatch::cache::DataCache;
use shiftmatch::data::model::ExperimentMetadata;
use shiftmatch::links;
use shiftmatch::matcher::DEFAULT_TOLERANCE;
use shiftmatch::state::Session;

#[derive(Parser)]
#[command(name = "shiftmatch")]
#[command(about = "Match NMR sample peaks against an HMDB-style metabolite reference table")]
struct Cli {
    /// Reference table CSV (Name, HMDB_ID, ppm_list, ...)
    #[arg(short, long, default_value = "hmdb_reference.csv")]
    reference: PathBuf,

    /// Sample peak list (.csv, .json or .parquet)
    #[arg(short, long)]
    sample: Option<PathBuf>,

    /// Metabolite name to search for (case-insensitive substring)
    #[arg(short, long)]
    query: Option<String>,

    /// Match tolerance in ppm (clamped to 0.005..=0.05)
    #[arg(short, long, default_value_t = DEFAULT_TOLERANCE)]
    tolerance: f64,

    /// Show only the best N candidates
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Emit ranked candidates as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Magnetic field strength (MHz)
    #[arg(long, default_value = "600")]
    field_strength: String,

    /// Pulse sequence
    #[arg(long, default_value = "90°")]
    pulse_sequence: String,

    /// Internal standard
    #[arg(long, default_value = "0.1 mM DSS")]
    internal_standard: String,

    /// Number of scans (NS)
    #[arg(long, default_value_t = 256)]
    scans: u32,
}

/// One ranked candidate in `--json` output.
#[derive(Serialize)]
struct ReportRow<'a> {
    name: &'a str,
    hmdb_id: &'a str,
    score: f64,
    matched: usize,
    expected: usize,
    url: String,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let mut cache = DataCache::new();
    let mut session = Session::default();
    session.metadata = ExperimentMetadata {
        field_strength_mhz: args.field_strength.clone(),
        pulse_sequence: args.pulse_sequence.clone(),
        internal_standard: args.internal_standard.clone(),
        scans: args.scans,
    };
    session.set_tolerance(args.tolerance);

    // A missing reference table degrades search and matching; it is not fatal.
    match cache.library(&args.reference) {
        Ok(library) => session.set_library(Some(library)),
        Err(err) => {
            warn!(
                "cannot load reference table {}: {err}",
                args.reference.display()
            );
            session.set_library(None);
        }
    }

    // An unusable sample file, by contrast, is a descriptive rejection.
    if let Some(path) = &args.sample {
        let sample = cache
            .peak_list(path)
            .with_context(|| format!("failed to load sample peak list {}", path.display()))?;
        session.set_sample(Some(sample));
    }

    if !args.json {
        println!("{}", session.metadata);
        println!();
        if let Some(message) = &session.status_message {
            println!("warning: {message}");
        }
    }

    if let Some(query) = &args.query {
        print_search(&session, query);
    }

    if session.sample.is_some() {
        print_ranking(&session, args.top, args.json)?;
    }

    Ok(())
}

fn print_search(session: &Session, query: &str) {
    let Some(library) = &session.library else {
        return;
    };

    let hits = session.search(query);
    if hits.is_empty() {
        println!("No metabolite found with the name '{query}'.");
        return;
    }

    println!("Results for '{query}':");
    for index in hits {
        let record = &library.records[index];
        println!("  {} ({})", record.name, record.hmdb_id);
        if let Some(cas) = &record.cas {
            println!("    CAS: {cas}");
        }
        if let Some(formula) = &record.formula {
            println!("    Formula: {formula}");
        }
        if !record.expected_shifts.is_empty() {
            println!(
                "    Expected shifts (ppm): {}",
                record
                    .expected_shifts
                    .iter()
                    .map(|v| format!("{v:.2}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        if let Some(predicted) = &record.predicted_shifts {
            println!("    Predicted shifts: {predicted}");
        }
        println!("    {}", links::metabolite_url(&record.hmdb_id));
        println!("    {}", links::structure_image_url(&record.hmdb_id));
    }
    println!();
}

fn print_ranking(session: &Session, top: usize, json: bool) -> Result<()> {
    let Some(library) = &session.library else {
        return Ok(());
    };
    let Some(sample) = &session.sample else {
        return Ok(());
    };

    let rows: Vec<ReportRow> = session
        .ranked
        .iter()
        .take(top)
        .map(|result| {
            let record = &library.records[result.index];
            ReportRow {
                name: &record.name,
                hmdb_id: &record.hmdb_id,
                score: result.score,
                matched: result.matched,
                expected: result.expected,
                url: links::metabolite_url(&record.hmdb_id),
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "Candidates for '{}' ({} peaks, tolerance {} ppm):",
        sample.source,
        sample.len(),
        session.config.tolerance
    );
    println!("  {:<24} {:<12} {:>6}  {:>9}", "Name", "HMDB_ID", "Score", "Matched");
    for row in &rows {
        println!(
            "  {:<24} {:<12} {:>6.3}  {:>5}/{}",
            row.name, row.hmdb_id, row.score, row.matched, row.expected
        );
    }

    Ok(())
}
