use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;
use rusty_tracker::data::model::RawRow;

/// Write synthetic training curves for trying out the viewer.
#[derive(Parser, Debug)]
#[command(name = "generate_sample", about)]
struct Args {
    /// Output file; `.parquet` writes Parquet, anything else CSV.
    #[arg(default_value = "sample_runs.csv")]
    out: PathBuf,

    #[arg(long, default_value_t = 4)]
    experiments: usize,

    /// Steps in the longest run.
    #[arg(long, default_value_t = 2000)]
    steps: u64,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

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

/// One run's curves. Accuracy is only evaluated every 50 steps, so charts
/// mixing it with other runs show gaps.
fn generate_run(id: &str, steps: u64, base_lr: f64, rng: &mut SimpleRng) -> Vec<RawRow> {
    let decay = steps as f64 / (2.0 + 3.0 * rng.next_f64());
    let floor = 0.05 + 0.2 * rng.next_f64();
    let mut rows = Vec::new();

    for step in 0..steps {
        let t = step as f64;
        let loss = (2.5 * (-t / decay).exp() + floor + rng.gauss(0.0, 0.02)).max(0.0);
        rows.push(RawRow::new(id, "loss", step, loss));

        let progress = t / steps as f64;
        let lr = base_lr * 0.5 * (1.0 + (std::f64::consts::PI * progress).cos());
        rows.push(RawRow::new(id, "learning_rate", step, lr));

        if step % 50 == 0 {
            let acc = (1.0 - floor - 0.8 * (-t / decay).exp() + rng.gauss(0.0, 0.01)).clamp(0.0, 1.0);
            rows.push(RawRow::new(id, "accuracy", step, acc));
        }
    }
    rows
}

fn write_csv(path: &Path, rows: &[RawRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[RawRow]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("experiment_id", DataType::Utf8, false),
        Field::new("metric_name", DataType::Utf8, false),
        Field::new("step", DataType::UInt64, false),
        Field::new("value", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.experiment_id.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.metric_name.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(UInt64Array::from(rows.iter().map(|r| r.step).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.value).collect::<Vec<_>>())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);

    let learning_rates = [3e-4, 1e-3, 3e-3, 1e-2];
    let mut rows = Vec::new();
    for i in 0..args.experiments {
        let id = format!("run_{:02}", i + 1);
        // Later runs stop early so step ranges differ.
        let steps = (args.steps - args.steps * i as u64 / (2 * args.experiments.max(1) as u64)).max(1);
        let lr = learning_rates[i % learning_rates.len()];
        rows.extend(generate_run(&id, steps, lr, &mut rng));
    }

    let is_parquet = args
        .out
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("parquet"));
    if is_parquet {
        write_parquet(&args.out, &rows)?;
    } else {
        write_csv(&args.out, &rows)?;
    }

    println!(
        "Wrote {} rows for {} experiments to {}",
        rows.len(),
        args.experiments,
        args.out.display()
    );
    Ok(())
}
