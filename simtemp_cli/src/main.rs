//! # Simtemp Monitoring CLI
//!
//! Starts an in-process simulated temperature sensor and prints its
//! samples in table, JSON, or CSV form, with optional running
//! statistics.
//!
//! # Usage
//!
//! ```bash
//! # Read 20 samples
//! simtemp_cli -n 20
//!
//! # Continuous mode with statistics, until Ctrl+C
//! simtemp_cli -c --stats
//!
//! # 100 samples as JSON lines, fast sensor
//! simtemp_cli -n 100 --format json --sampling-ms 10
//!
//! # Load sensor settings from a TOML file
//! simtemp_cli --config sensor.toml -c
//! ```

use clap::{Parser, ValueEnum};
use simtemp_common::config::SensorConfig;
use simtemp_device::{DeviceError, Readiness, SampleRecord, SimTempDevice};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// Simtemp CLI - monitor the simulated temperature sensor
#[derive(Parser, Debug)]
#[command(name = "simtemp_cli")]
#[command(version)]
#[command(about = "Monitoring CLI for the simulated temperature sensor")]
struct Args {
    /// Number of samples to read
    #[arg(short = 'n', long, default_value_t = 10)]
    samples: u64,

    /// Run until Ctrl+C instead of stopping after --samples
    #[arg(short, long)]
    continuous: bool,

    /// Extra delay between displayed samples in milliseconds
    #[arg(short, long, default_value_t = 0)]
    interval_ms: u64,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Print min/max/avg statistics at the end
    #[arg(short, long)]
    stats: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,

    /// Path to a sensor TOML config file (defaults apply without one)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the producer period in milliseconds
    #[arg(long, value_name = "MS")]
    sampling_ms: Option<u32>,

    /// Override the threshold in milli-Celsius
    #[arg(long, value_name = "MC")]
    threshold_mc: Option<i32>,

    /// Override the base temperature in milli-Celsius
    #[arg(long, value_name = "MC")]
    base_mc: Option<i32>,

    /// Override the variation half-width in milli-Celsius
    #[arg(long, value_name = "MC")]
    variation_mc: Option<i32>,
}

/// Sample output format.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    /// Aligned columns with a header
    Table,
    /// One JSON object per sample
    Json,
    /// Comma-separated values with a header row
    Csv,
}

// ─── Statistics ─────────────────────────────────────────────────────

/// Running min/max/avg aggregation in milli-Celsius.
struct TempStats {
    min_mc: i32,
    max_mc: i32,
    sum_mc: i64,
    count: u64,
    threshold_count: u64,
}

impl TempStats {
    fn new() -> Self {
        Self {
            min_mc: i32::MAX,
            max_mc: i32::MIN,
            sum_mc: 0,
            count: 0,
            threshold_count: 0,
        }
    }

    fn update(&mut self, sample: &SampleRecord) {
        self.min_mc = self.min_mc.min(sample.temp_mc);
        self.max_mc = self.max_mc.max(sample.temp_mc);
        self.sum_mc += i64::from(sample.temp_mc);
        self.count += 1;
        if sample.threshold_exceeded() {
            self.threshold_count += 1;
        }
    }

    fn print(&self) {
        if self.count == 0 {
            println!("\nNo samples collected.");
            return;
        }
        let avg_mc = (self.sum_mc / self.count as i64) as i32;
        println!();
        println!("Temperature statistics");
        println!("  samples:            {}", self.count);
        println!("  min temperature:    {}°C", fmt_mc(self.min_mc));
        println!("  max temperature:    {}°C", fmt_mc(self.max_mc));
        println!("  avg temperature:    {}°C", fmt_mc(avg_mc));
        println!("  threshold exceeded: {}", self.threshold_count);
    }
}

/// Format milli-Celsius as a decimal Celsius string without floating
/// point, e.g. `42000` -> `"42.000"`.
fn fmt_mc(mc: i32) -> String {
    let sign = if mc < 0 { "-" } else { "" };
    let abs = i64::from(mc).abs();
    format!("{sign}{}.{:03}", abs / 1000, abs % 1000)
}

// ─── Output formats ─────────────────────────────────────────────────

fn print_table(sample: &SampleRecord, index: u64, first_ts: u64, verbose: bool) {
    if index == 1 {
        println!(
            "{:>6}  {:>12}  {:<12}  {:>16}",
            "index", "temp", "flags", "time"
        );
    }

    let mut flags = String::new();
    if sample.is_new() {
        flags.push_str("NEW ");
    }
    if sample.threshold_exceeded() {
        flags.push_str("THRESH");
    }

    if verbose {
        println!(
            "{:>6}  {:>10}°C  {:<12}  {:>13} ns",
            index,
            fmt_mc(sample.temp_mc),
            flags,
            sample.timestamp_ns
        );
    } else {
        let elapsed_ms = (sample.timestamp_ns - first_ts) / 1_000_000;
        println!(
            "{:>6}  {:>10}°C  {:<12}  {:>13} ms",
            index,
            fmt_mc(sample.temp_mc),
            flags,
            format!("+{elapsed_ms}")
        );
    }
}

fn print_json(sample: &SampleRecord, index: u64) {
    let value = serde_json::json!({
        "index": index,
        "temperature_c": fmt_mc(sample.temp_mc),
        "temperature_mc": sample.temp_mc,
        "timestamp_ns": sample.timestamp_ns,
        "flags": {
            "new_sample": sample.is_new(),
            "threshold_exceeded": sample.threshold_exceeded(),
        },
    });
    println!("{value}");
}

fn print_csv(sample: &SampleRecord, index: u64) {
    if index == 1 {
        println!("index,temperature_c,temperature_mc,timestamp_ns,new_sample,threshold_exceeded");
    }
    println!(
        "{},{},{},{},{},{}",
        index,
        fmt_mc(sample.temp_mc),
        sample.temp_mc,
        sample.timestamp_ns,
        u8::from(sample.is_new()),
        u8::from(sample.threshold_exceeded())
    );
}

// ─── Entry point ────────────────────────────────────────────────────

fn main() {
    if let Err(e) = run() {
        error!("simtemp_cli failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    setup_tracing(&args);

    let config = build_config(&args)?;
    info!(
        sampling_ms = config.sampling_interval_ms,
        threshold_mc = config.threshold_mc,
        "starting simulated sensor"
    );

    let device = SimTempDevice::start(config)?;
    let mut reader = device.open(true);

    let cancel = reader.cancel_handle();
    ctrlc::set_handler(move || {
        info!("received shutdown signal");
        cancel.cancel();
    })?;

    let mut stats = TempStats::new();
    let mut index = 0u64;
    let mut first_ts = 0u64;

    'outer: while args.continuous || index < args.samples {
        // Poll-driven loop: register readiness interest, wait, then read.
        match reader.wait_readable(Duration::from_secs(1)) {
            Ok(Readiness::NotReadable) => {
                if args.verbose {
                    info!("waiting for data");
                }
                continue;
            }
            Ok(Readiness::Readable) => {}
            Err(DeviceError::Interrupted) => break 'outer,
            Err(e) => return Err(e.into()),
        }

        match reader.read_sample() {
            Ok(sample) => {
                index += 1;
                if index == 1 {
                    first_ts = sample.timestamp_ns;
                }
                if args.stats {
                    stats.update(&sample);
                }
                match args.format {
                    OutputFormat::Table => print_table(&sample, index, first_ts, args.verbose),
                    OutputFormat::Json => print_json(&sample, index),
                    OutputFormat::Csv => print_csv(&sample, index),
                }
                if args.interval_ms > 0 {
                    std::thread::sleep(Duration::from_millis(args.interval_ms));
                }
            }
            // Readiness was spurious: another reader (or none, after a
            // fast drain) got there first. Not an error.
            Err(DeviceError::WouldBlock) => continue,
            Err(DeviceError::Interrupted) => break 'outer,
            Err(e) => return Err(e.into()),
        }
    }

    if args.stats {
        stats.print();
    }

    device.stop();
    info!(total_samples = index, "shutdown complete");
    Ok(())
}

/// Resolve the sensor configuration: file (or defaults), then CLI
/// overrides, then validation.
fn build_config(args: &Args) -> Result<SensorConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => SensorConfig::load(path)?,
        None => SensorConfig::default(),
    };

    if let Some(ms) = args.sampling_ms {
        config.sampling_interval_ms = ms;
    }
    if let Some(mc) = args.threshold_mc {
        config.threshold_mc = mc;
    }
    if let Some(mc) = args.base_mc {
        config.base_temp_mc = mc;
    }
    if let Some(mc) = args.variation_mc {
        config.variation_mc = mc;
    }

    config.validate()?;
    Ok(config)
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
