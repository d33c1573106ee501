use std::path::PathBuf;

use anyhow::Context;
use chrono::{Duration, NaiveDate};
use clap::Parser;

use disaster_dash::data::model::RawRecord;

/// Write a synthetic raw disaster-events CSV, including a few rows the
/// cleaner is expected to drop.
#[derive(Parser)]
#[command(name = "generate_sample")]
struct Cli {
    #[arg(long, default_value_t = 20_000)]
    rows: usize,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    #[arg(long, default_value = "synthetic_disaster_events_2025.csv")]
    output: PathBuf,
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

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n.max(1)
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len())]
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    /// Heavy-tailed positive value around `median`.
    fn log_normal(&mut self, median: f64, sigma: f64) -> f64 {
        median * self.gauss(0.0, sigma).exp()
    }
}

/// (type, typical response hours, severity bias)
const DISASTER_TYPES: [(&str, f64, f64); 10] = [
    ("Earthquake", 18.0, 1.5),
    ("Flood", 24.0, 0.0),
    ("Hurricane", 20.0, 1.0),
    ("Wildfire", 12.0, 0.5),
    ("Tornado", 8.0, 0.5),
    ("Drought", 96.0, -1.0),
    ("Tsunami", 16.0, 2.0),
    ("Landslide", 30.0, 0.0),
    ("Volcanic Eruption", 36.0, 1.0),
    ("Storm Surge", 22.0, 0.5),
];

const LOCATIONS: [(&str, f64, f64); 20] = [
    ("Tokyo, Japan", 35.68, 139.69),
    ("Manila, Philippines", 14.60, 120.98),
    ("Jakarta, Indonesia", -6.21, 106.85),
    ("Dhaka, Bangladesh", 23.81, 90.41),
    ("Mumbai, India", 19.08, 72.88),
    ("Karachi, Pakistan", 24.86, 67.01),
    ("Tehran, Iran", 35.69, 51.39),
    ("Istanbul, Turkey", 41.01, 28.98),
    ("Athens, Greece", 37.98, 23.73),
    ("Lagos, Nigeria", 6.52, 3.38),
    ("Nairobi, Kenya", -1.29, 36.82),
    ("Cape Town, South Africa", -33.92, 18.42),
    ("Lima, Peru", -12.05, -77.04),
    ("Santiago, Chile", -33.45, -70.67),
    ("Mexico City, Mexico", 19.43, -99.13),
    ("Port-au-Prince, Haiti", 18.59, -72.31),
    ("Miami, USA", 25.76, -80.19),
    ("Los Angeles, USA", 34.05, -118.24),
    ("Sydney, Australia", -33.87, 151.21),
    ("Christchurch, New Zealand", -43.53, 172.64),
];

const AID_TYPES: [&str; 6] = ["Food", "Medical", "Shelter", "Water", "Financial", "Rescue"];

fn event_row(rng: &mut SimpleRng, id: usize, start: NaiveDate) -> RawRecord {
    let &(kind, typical_response, severity_bias) = rng.pick(&DISASTER_TYPES);
    let &(location, lat, lon) = rng.pick(&LOCATIONS);
    let date = start + Duration::days(rng.below(365) as i64);

    let severity = (rng.gauss(5.0 + severity_bias, 2.0).round() as i64).clamp(1, 10);
    let scale = 1.8_f64.powi(severity as i32);
    let population = rng.log_normal(40.0 * scale, 1.0).round() as i64;
    let loss = rng.log_normal(25_000.0 * scale, 1.2);
    let response = rng.log_normal(typical_response, 0.6);
    let damage = (severity as f64 / 10.0 + rng.gauss(0.0, 0.12)).clamp(0.0, 1.0);
    let major = severity >= 8 || (population > 100_000 && rng.next_f64() < 0.5);

    RawRecord {
        event_id: Some(format!("EVT-{id:06}")),
        date: Some(date.format("%Y-%m-%d").to_string()),
        disaster_type: Some(kind.to_string()),
        location: Some(location.to_string()),
        latitude: Some(format!("{:.4}", lat + rng.gauss(0.0, 0.2))),
        longitude: Some(format!("{:.4}", lon + rng.gauss(0.0, 0.2))),
        severity_level: Some(severity.to_string()),
        affected_population: Some(population.to_string()),
        estimated_economic_loss_usd: Some(format!("{loss:.2}")),
        response_time_hours: Some(format!("{response:.1}")),
        infrastructure_damage_index: Some(format!("{damage:.3}")),
        aid_provided: Some(rng.pick(&AID_TYPES).to_string()),
        is_major_disaster: Some(if major { "1" } else { "0" }.to_string()),
    }
}

/// Damage a clean row so that the cleaner has something to drop.
fn corrupt(rng: &mut SimpleRng, row: &mut RawRecord) {
    match rng.below(4) {
        0 => row.location = None,
        1 => row.severity_level = Some("11".to_string()),
        2 => row.response_time_hours = Some("-4.0".to_string()),
        _ => row.infrastructure_damage_index = Some("1.35".to_string()),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let mut rng = SimpleRng::new(cli.seed);
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).context("invalid start date")?;

    let mut writer = csv::Writer::from_path(&cli.output)
        .with_context(|| format!("creating {}", cli.output.display()))?;

    let (mut corrupted, mut duplicated) = (0usize, 0usize);
    for id in 1..=cli.rows {
        let mut row = event_row(&mut rng, id, start);
        let roll = rng.next_f64();
        if roll < 0.01 {
            corrupt(&mut rng, &mut row);
            corrupted += 1;
        }
        writer.serialize(&row)?;
        if roll > 0.995 {
            writer.serialize(&row)?;
            duplicated += 1;
        }
    }
    writer.flush()?;

    println!(
        "Wrote {} events ({corrupted} corrupted, {duplicated} duplicated) to {}",
        cli.rows + duplicated,
        cli.output.display()
    );
    Ok(())
}
