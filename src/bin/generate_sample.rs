use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use clap::Parser;

/// Writes a deterministic synthetic IPO CSV in the dashboard's input format.
#[derive(Parser, Debug)]
#[command(name = "generate_sample")]
#[command(about = "Generate a synthetic Indian IPO dataset", long_about = None)]
struct Args {
    /// Destination CSV file.
    #[arg(default_value = "Indian_IPO_Market_Data.csv")]
    output: PathBuf,

    /// PRNG seed; the same seed always yields the same file.
    #[arg(short, long, default_value_t = 42)]
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

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    /// Log-normal draw, for heavy-tailed subscription multiples.
    fn lognormal(&mut self, mu: f64, sigma: f64) -> f64 {
        self.gauss(mu, sigma).exp()
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

const PREFIXES: [&str; 12] = [
    "Aditya", "Bharat", "Coastal", "Deccan", "Eastern", "Ganga", "Himalaya", "Indus", "Konkan",
    "Malabar", "Narmada", "Sahyadri",
];
const SUFFIXES: [&str; 8] = [
    "Textiles", "Pharma", "Infra", "Finance", "Foods", "Tech", "Chemicals", "Logistics",
];

fn main() -> Result<()> {
    let args = Args::parse();
    let rows = write_sample(&args)?;
    println!("Wrote {rows} IPO records to {}", args.output.display());
    Ok(())
}

fn write_sample(args: &Args) -> Result<usize> {
    let mut rng = SimpleRng::new(args.seed);

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    writer.write_record([
        "Date",
        "IPOName",
        "Issue_Size",
        "Subscription_QIB",
        "Subscription_HNI",
        "Subscription_RII",
        "Subscription_Total",
        "Issue_Price",
        "Listing_Gains_Percent",
    ])?;

    let start = NaiveDate::from_ymd_opt(2010, 1, 4).context("invalid start date")?;
    let mut date = start;
    let mut rows = 0usize;

    for (i, prefix) in PREFIXES.iter().enumerate() {
        for (j, suffix) in SUFFIXES.iter().enumerate() {
            date += Duration::days(10 + ((i * 7 + j * 3) % 40) as i64);

            let qib = round2(rng.lognormal(2.0, 1.4));
            let hni = round2(rng.lognormal(2.2, 1.5));
            let rii = round2(rng.lognormal(1.2, 1.0));
            let total = round2(0.5 * qib + 0.15 * hni + 0.35 * rii);
            let issue_size = round2(rng.lognormal(6.0, 1.0));
            let issue_price = rng.range(40.0, 1200.0).round();
            // Listing gains track demand, with plenty of noise either way.
            let gain = round2(rng.gauss(total.ln() * 6.0, 18.0));

            writer.write_record([
                date.format("%d/%m/%y").to_string(),
                format!("{prefix} {suffix}"),
                issue_size.to_string(),
                qib.to_string(),
                hni.to_string(),
                rii.to_string(),
                total.to_string(),
                issue_price.to_string(),
                gain.to_string(),
            ])?;
            rows += 1;
        }
    }
    writer.flush()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_defaults_to_dashboard_file() {
        let args = Args::try_parse_from(["generate_sample"]).expect("parse");
        assert_eq!(args.output, PathBuf::from("Indian_IPO_Market_Data.csv"));
        assert_eq!(args.seed, 42);
    }

    #[test]
    fn output_path_and_seed_are_arguments() {
        let args = Args::try_parse_from(["generate_sample", "--seed", "7", "out dir/ipo.csv"])
            .expect("parse");
        assert_eq!(args.output, PathBuf::from("out dir/ipo.csv"));
        assert_eq!(args.seed, 7);
        assert!(Args::try_parse_from(["generate_sample", "--seed", "x"]).is_err());
    }

    #[test]
    fn same_seed_writes_same_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let write = |name: &str, seed: u64| {
            let args = Args { output: dir.path().join(name), seed };
            let rows = write_sample(&args).expect("write sample");
            (rows, std::fs::read_to_string(&args.output).expect("read back"))
        };

        let (rows, first) = write("a.csv", 42);
        let (_, again) = write("b.csv", 42);
        let (_, other) = write("c.csv", 43);
        assert_eq!(rows, PREFIXES.len() * SUFFIXES.len());
        assert_eq!(first.lines().count(), rows + 1);
        assert_eq!(first, again);
        assert_ne!(first, other);
    }
}
