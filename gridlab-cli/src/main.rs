//! GridLab CLI — run prediction batches and query the sub-models.
//!
//! Commands:
//! - `simulate` — run a Monte Carlo batch from a TOML config and print a
//!   ranked probability table (or JSON), optionally exporting CSV and
//!   appending to the prediction history
//! - `stint` — optimal stint length and wear curve for a compound
//! - `overtake` — combined overtake probability for a battle situation

use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use gridlab_core::domain::{DegradationCategory, TrackCategory};
use gridlab_core::models::aero::{overtake_probability, OvertakeInputs};
use gridlab_core::models::tire::{optimal_stint_length, pace_loss};
use gridlab_core::models::{TireCompound, WeatherScenario};
use gridlab_core::sim::CalibrationSnapshot;
use gridlab_core::stats::{confidence_bands, win_probability_interval};
use gridlab_runner::{
    spawn_worker, to_json_string, write_csv, PredictionHistory, PredictionRecord, SimCommand,
    SimConfig, SimResponse,
};

#[derive(Parser)]
#[command(name = "gridlab", about = "GridLab — stochastic race outcome simulation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a Monte Carlo batch from a TOML config file.
    Simulate {
        /// Path to the run configuration.
        #[arg(long)]
        config: PathBuf,

        /// Override the configured trial count.
        #[arg(long)]
        trials: Option<u32>,

        /// Override the configured master seed.
        #[arg(long)]
        seed: Option<u64>,

        /// Print the full result as JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Also export the probability table as CSV.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Also append the prediction to a JSONL history file.
        #[arg(long)]
        history: Option<PathBuf>,
    },
    /// Optimal stint length and wear curve for a tire compound.
    Stint {
        #[arg(long, value_enum)]
        compound: CompoundArg,

        /// Track temperature, °C.
        #[arg(long, default_value_t = 32.0)]
        temp: f64,

        /// Driver tire smoothness (0.85–1.15).
        #[arg(long, default_value_t = 1.0)]
        smoothness: f64,

        #[arg(long, value_enum, default_value_t = DegradationArg::Medium)]
        degradation: DegradationArg,

        /// Fuel mass on board, kg.
        #[arg(long, default_value_t = 80.0)]
        fuel: f64,
    },
    /// Combined overtake probability for a battle situation.
    Overtake {
        /// Attacker pace advantage, s/lap.
        #[arg(long, default_value_t = 0.3)]
        pace_delta: f64,

        /// Gap to the defender, seconds.
        #[arg(long, default_value_t = 0.7)]
        gap: f64,

        #[arg(long, default_value_t = 2)]
        drs_zones: u8,

        #[arg(long, value_enum, default_value_t = TrackArg::Permanent)]
        track: TrackArg,

        /// Defender tire age minus attacker tire age, laps.
        #[arg(long, default_value_t = 0)]
        tire_age_advantage: i32,

        /// Defender's current position.
        #[arg(long, default_value_t = 5)]
        defender_position: u32,

        #[arg(long, default_value_t = 30)]
        laps_remaining: u32,

        #[arg(long, default_value_t = 60)]
        total_laps: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CompoundArg {
    Soft,
    Medium,
    Hard,
    Intermediate,
    Wet,
}

impl From<CompoundArg> for TireCompound {
    fn from(value: CompoundArg) -> Self {
        match value {
            CompoundArg::Soft => TireCompound::Soft,
            CompoundArg::Medium => TireCompound::Medium,
            CompoundArg::Hard => TireCompound::Hard,
            CompoundArg::Intermediate => TireCompound::Intermediate,
            CompoundArg::Wet => TireCompound::Wet,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DegradationArg {
    Low,
    Medium,
    High,
    Severe,
}

impl From<DegradationArg> for DegradationCategory {
    fn from(value: DegradationArg) -> Self {
        match value {
            DegradationArg::Low => DegradationCategory::Low,
            DegradationArg::Medium => DegradationCategory::Medium,
            DegradationArg::High => DegradationCategory::High,
            DegradationArg::Severe => DegradationCategory::Severe,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum TrackArg {
    Street,
    Permanent,
    HighSpeed,
    Technical,
}

impl From<TrackArg> for TrackCategory {
    fn from(value: TrackArg) -> Self {
        match value {
            TrackArg::Street => TrackCategory::Street,
            TrackArg::Permanent => TrackCategory::Permanent,
            TrackArg::HighSpeed => TrackCategory::HighSpeed,
            TrackArg::Technical => TrackCategory::Technical,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Simulate {
            config,
            trials,
            seed,
            json,
            csv,
            history,
        } => simulate(config, trials, seed, json, csv, history),
        Commands::Stint {
            compound,
            temp,
            smoothness,
            degradation,
            fuel,
        } => {
            stint(compound.into(), temp, smoothness, degradation.into(), fuel);
            Ok(())
        }
        Commands::Overtake {
            pace_delta,
            gap,
            drs_zones,
            track,
            tire_age_advantage,
            defender_position,
            laps_remaining,
            total_laps,
        } => {
            overtake(
                pace_delta,
                gap,
                drs_zones,
                track.into(),
                tire_age_advantage,
                defender_position,
                laps_remaining,
                total_laps,
            );
            Ok(())
        }
    }
}

fn simulate(
    config_path: PathBuf,
    trials: Option<u32>,
    seed: Option<u64>,
    json: bool,
    csv: Option<PathBuf>,
    history: Option<PathBuf>,
) -> Result<()> {
    let mut config = SimConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    if let Some(trials) = trials {
        config.simulation.trials = trials;
    }
    if let Some(seed) = seed {
        config.simulation.master_seed = seed;
    }
    let fingerprint = config.fingerprint();

    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    let handle = spawn_worker(cmd_rx, resp_tx);

    cmd_tx
        .send(SimCommand::RunBatch(Box::new(
            config.to_request(CalibrationSnapshot::default()),
        )))
        .context("worker channel closed")?;

    let stats = match resp_rx.recv().context("worker dropped its response")? {
        SimResponse::BatchComplete(stats) => *stats,
        SimResponse::BatchFailed { error } => bail!("batch failed: {error}"),
    };

    let _ = cmd_tx.send(SimCommand::Shutdown);
    let _ = handle.join();

    if let Some(path) = csv {
        write_csv(&path, &stats).with_context(|| format!("writing {}", path.display()))?;
    }
    if let Some(path) = history {
        let record = PredictionRecord::from_stats(
            &stats,
            &fingerprint,
            chrono::Utc::now().naive_utc(),
        );
        PredictionHistory::new(&path)
            .append(&record)
            .with_context(|| format!("appending {}", path.display()))?;
    }

    if json {
        println!("{}", to_json_string(&stats)?);
    } else {
        print_table(&stats);
    }
    Ok(())
}

fn print_table(stats: &gridlab_core::sim::AggregateStats) {
    println!(
        "{} — {} trials, seed {}",
        stats.race_id, stats.trials, stats.master_seed
    );
    println!(
        "weather: {} dry / {} light / {} wet / {} heavy, safety car in {} trials",
        stats.scenarios.dry,
        stats.scenarios.light_rain,
        stats.scenarios.wet,
        stats.scenarios.heavy_rain,
        stats.safety_car_trials
    );
    println!();
    println!(
        "{:<16} {:<12} {:>7} {:>15} {:>9} {:>9} {:>7}",
        "driver", "team", "win%", "win% 95CI", "podium%", "exp.pos", "dnf%"
    );
    for d in stats.ranked() {
        let win_rate = d.win_rate(stats.trials);
        let ci = win_probability_interval(win_rate, stats.trials)
            .map(|b| format!("{:5.1}–{:4.1}", 100.0 * b.lower, 100.0 * b.upper))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<16} {:<12} {:>6.1} {:>15} {:>8.1} {:>9.2} {:>6.1}",
            d.driver.as_str(),
            d.team.as_str(),
            100.0 * win_rate,
            ci,
            100.0 * d.podium_rate(stats.trials),
            d.expected_finish(stats.trials),
            100.0 * d.dnf_rate(stats.trials),
        );
    }

    if let Some(report) = confidence_bands(&stats.winning_times) {
        println!();
        println!(
            "winning time: mean {:.1}s ± {:.1}s (68%), confidence score {:.2}{}",
            report.stats.mean,
            report.band_68.upper - report.stats.mean,
            report.confidence_score,
            if report.stats.stable {
                ""
            } else {
                " [unstable distribution]"
            }
        );
    }
}

fn stint(
    compound: TireCompound,
    temp: f64,
    smoothness: f64,
    degradation: DegradationCategory,
    fuel: f64,
) {
    let stint = optimal_stint_length(compound, temp, smoothness, degradation, fuel);
    println!("optimal stint: {stint} laps");
    println!();
    println!("{:>5} {:>12}", "lap", "loss (s/lap)");
    for laps in (0..=stint.min(30)).step_by(5) {
        let loss = pace_loss(compound, laps, temp, smoothness, degradation, fuel);
        println!("{laps:>5} {loss:>12.3}");
    }
}

#[allow(clippy::too_many_arguments)]
fn overtake(
    pace_delta: f64,
    gap: f64,
    drs_zones: u8,
    track: TrackCategory,
    tire_age_advantage: i32,
    defender_position: u32,
    laps_remaining: u32,
    total_laps: u32,
) {
    for (label, weather) in [
        ("dry", WeatherScenario::Dry),
        ("light rain", WeatherScenario::LightRain),
        ("wet", WeatherScenario::Wet),
    ] {
        let p = overtake_probability(&OvertakeInputs {
            pace_delta,
            gap_s: gap,
            drs_zones,
            track,
            tire_age_advantage,
            weather,
            defender_position,
            attacker_aggression: 1.0,
            defender_defence: 1.0,
            laps_remaining,
            total_laps,
        });
        println!("{label:<11} {:>5.1}% per lap", 100.0 * p);
    }
}
