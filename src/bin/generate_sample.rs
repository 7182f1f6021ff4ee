use std::sync::Arc;

use arrow::array::Float64Array;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use shiftmatch::data::loader::format_ppm_list;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() {
    let mut rng = SimpleRng::new(42);

    // A handful of common urine/plasma metabolites with literature shifts.
    let reference: Vec<(&str, &str, &str, &str, Vec<f64>)> = vec![
        ("Lactate", "HMDB0000190", "50-21-5", "C3H6O3", vec![1.33, 4.11]),
        ("Alanine", "HMDB0000161", "56-41-7", "C3H7NO2", vec![1.48, 3.78]),
        ("Citrate", "HMDB0000094", "77-92-9", "C6H8O7", vec![2.54, 2.66]),
        ("Creatinine", "HMDB0000562", "60-27-5", "C4H7N3O", vec![3.04, 4.06]),
        (
            "Glucose",
            "HMDB0000122",
            "50-99-7",
            "C6H12O6",
            vec![3.24, 3.40, 3.46, 3.53, 3.72, 3.83, 4.64, 5.23],
        ),
        ("Taurine", "HMDB0000251", "107-35-7", "C2H7NO3S", vec![3.26, 3.42]),
    ];

    // ---- Reference table CSV ----
    let mut writer = csv::Writer::from_path("demo_reference.csv")
        .expect("Failed to create demo_reference.csv");
    writer
        .write_record(["Name", "HMDB_ID", "CAS", "Formula", "ppm_list", "predicted_ppm"])
        .expect("Failed to write header");
    for (name, hmdb_id, cas, formula, shifts) in &reference {
        let ppm_list = format_ppm_list(shifts);
        writer
            .write_record([*name, *hmdb_id, *cas, *formula, ppm_list.as_str(), ""])
            .expect("Failed to write record");
    }
    writer.flush().expect("Failed to flush reference CSV");

    // ---- Sample peak list: jittered lactate peaks plus background noise ----
    let lactate = &reference[0].4;
    let mut ppm: Vec<f64> = lactate
        .iter()
        .map(|&shift| shift + rng.gauss(0.0, 0.003))
        .collect();
    let mut intensity: Vec<f64> = lactate.iter().map(|_| 0.4 + 0.6 * rng.next_f64()).collect();

    for _ in 0..4 {
        ppm.push(0.5 + 9.0 * rng.next_f64());
        intensity.push(0.05 + 0.15 * rng.next_f64());
    }

    // CSV copy
    let mut writer =
        csv::Writer::from_path("demo_sample.csv").expect("Failed to create demo_sample.csv");
    writer
        .write_record(["ppm", "intensity"])
        .expect("Failed to write header");
    for (p, i) in ppm.iter().zip(intensity.iter()) {
        writer
            .write_record([format!("{p:.4}"), format!("{i:.4}")])
            .expect("Failed to write peak");
    }
    writer.flush().expect("Failed to flush sample CSV");

    // Parquet copy (scalar ppm / intensity columns)
    let schema = Arc::new(Schema::new(vec![
        Field::new("ppm", DataType::Float64, false),
        Field::new("intensity", DataType::Float64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Float64Array::from(ppm.clone())),
            Arc::new(Float64Array::from(intensity)),
        ],
    )
    .expect("Failed to create RecordBatch");

    let file = std::fs::File::create("demo_sample.parquet").expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    println!(
        "Wrote {} reference records to demo_reference.csv and {} peaks to demo_sample.csv / demo_sample.parquet",
        reference.len(),
        ppm.len()
    );
}
