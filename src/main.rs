use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabled::{settings::Style, Table, Tabled};
use tracing::Level;

use recoveryrs::config::EngineConfig;
use recoveryrs::fatigue::{FatigueLevel, FatigueTracker, RestPeriod};
use recoveryrs::import::{self, HeartRateCsvImporter, ImportFormat};
use recoveryrs::logging::init_logging;
use recoveryrs::readiness::{ReadinessResult, ReadinessScorer, ReadinessStatus};
use recoveryrs::summary::{summarize_recovery, RecoverySummary};
use recoveryrs::{CalibrationManager, RecoveryError};

/// RecoveryRS - Biometric recovery and fatigue analysis CLI
///
/// Scores daily training readiness from HRV, resting heart rate, sleep and
/// training load, and replays workout heart-rate streams to track fatigue
/// between sets.
#[derive(Parser)]
#[command(name = "recoveryrs")]
#[command(version)]
#[command(about = "Biometric recovery and fatigue analysis CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score today's training readiness
    Readiness {
        /// Today's biometrics (JSON object)
        #[arg(short, long)]
        today: PathBuf,

        /// Prior days of biometrics (JSON array)
        #[arg(short = 'H', long)]
        history: PathBuf,

        /// Recent workouts (JSON array)
        #[arg(short, long)]
        workouts: Option<PathBuf>,

        /// How recovered you feel, 1-10
        #[arg(short, long)]
        subjective: Option<f64>,

        /// Calibration state file, created if missing and updated after scoring
        #[arg(long, value_name = "FILE")]
        calibration: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replay a workout heart-rate stream and track fatigue
    Fatigue {
        /// Heart-rate samples (CSV with timestamp and bpm columns)
        #[arg(short, long)]
        samples: PathBuf,

        /// Resting heart rate used for heart-rate reserve recovery
        #[arg(short, long)]
        resting_hr: Option<f64>,

        /// Print the session summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summarize recovery over recent days
    Summary {
        /// Daily biometrics (JSON array)
        #[arg(short = 'H', long)]
        history: PathBuf,

        /// Window in days (7-30)
        #[arg(short, long, default_value = "14")]
        days: u32,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage the configuration file
    Config {
        /// Write a default configuration file
        #[arg(long)]
        init: bool,

        /// Print the active configuration
        #[arg(long)]
        show: bool,
    },
}

#[derive(Tabled)]
struct RestPeriodRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "Peak HR")]
    start_hr: String,
    #[tabled(rename = "End HR")]
    end_hr: String,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Rate (bpm/s)")]
    rate: String,
}

impl RestPeriodRow {
    fn new(index: usize, rest: &RestPeriod) -> Self {
        RestPeriodRow {
            index: index + 1,
            start: rest.start_time.format("%H:%M:%S").to_string(),
            start_hr: format!("{:.0}", rest.start_hr),
            end_hr: format!("{:.0}", rest.end_hr),
            duration: format!("{:.0}s", rest.duration_seconds),
            rate: format!("{:.2}", rest.recovery_rate()),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        match err.downcast_ref::<RecoveryError>() {
            Some(recovery_err) => {
                log_failure(recovery_err);
                eprintln!("{} {}", "Error:".red().bold(), recovery_err.user_message());
            }
            None => eprintln!("{} {:#}", "Error:".red().bold(), err),
        }
        std::process::exit(1);
    }
}

fn log_failure(err: &RecoveryError) {
    let severity = err.severity();
    let level = severity.to_tracing_level();
    if level == Level::ERROR {
        tracing::error!(?severity, error = %err, "Command failed");
    } else if level == Level::WARN {
        tracing::warn!(?severity, error = %err, "Command rejected input");
    } else {
        tracing::info!(?severity, error = %err, "Command stopped");
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(EngineConfig::default_config_path);
    let config = match &cli.config {
        Some(path) if path.exists() => EngineConfig::load_from_file(path)?,
        Some(_) => EngineConfig::default(),
        None => EngineConfig::load_or_default(),
    };

    init_logging(&config.logging.clone().with_verbosity(cli.verbose))?;

    match cli.command {
        Commands::Readiness {
            today,
            history,
            workouts,
            subjective,
            calibration,
            json,
        } => run_readiness(
            &config,
            &today,
            &history,
            workouts.as_deref(),
            subjective,
            calibration.as_deref(),
            json,
        ),
        Commands::Fatigue {
            samples,
            resting_hr,
            json,
        } => run_fatigue(&config, &samples, resting_hr, json),
        Commands::Summary { history, days, json } => run_summary(&history, days, json),
        Commands::Config { init, show } => run_config(config, &config_path, init, show),
    }
}

fn run_readiness(
    config: &EngineConfig,
    today: &Path,
    history: &Path,
    workouts: Option<&Path>,
    subjective: Option<f64>,
    calibration_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let current = import::load_daily_biometrics(today)?;
    let history = import::load_biometric_history(history)?;
    let workouts = match workouts {
        Some(path) => import::load_workouts(path)?,
        None => Vec::new(),
    };

    let calibration = match calibration_path {
        Some(path) if path.exists() => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read calibration state: {}", path.display()))?;
            CalibrationManager::from_json(config.calibration.clone(), &content)?
        }
        _ => CalibrationManager::new(config.calibration.clone()),
    };

    let scorer = ReadinessScorer::new(config.readiness.clone(), Arc::new(calibration));
    let result = scorer.compute_readiness(&current, &history, &workouts, subjective)?;

    if let Some(path) = calibration_path {
        let state = scorer.calibration().to_json()?;
        fs::write(path, state)
            .with_context(|| format!("Failed to write calibration state: {}", path.display()))?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_readiness(&current.date.to_string(), &result);
    }
    Ok(())
}

fn print_readiness(date: &str, result: &ReadinessResult) {
    let status = result.status.to_string();
    let status = match result.status {
        ReadinessStatus::FullyRecovered => status.green().bold(),
        ReadinessStatus::Adequate => status.cyan().bold(),
        ReadinessStatus::Compromised => status.yellow().bold(),
        ReadinessStatus::NeedsRest => status.red().bold(),
    };

    println!("{}", format!("Readiness for {}", date).bold());
    println!("  Score:          {:.0}/100 ({})", result.score, status);
    println!("  Recommendation: {}", result.recommendation.description());
    println!("  Confidence:     {:.0}%", result.confidence * 100.0);

    if !result.limiting_factors.is_empty() {
        println!("  Limiting factors:");
        for factor in &result.limiting_factors {
            println!("    - {}", factor);
        }
    }

    if let Some(components) = &result.components {
        println!("{}", "  Breakdown:".dimmed());
        println!(
            "{}",
            format!(
                "    HRV z {:+.2}, RHR z {:+.2}, sleep {:.0}%, load {:.2}x, raw {:.1}, calibration {:+.1}",
                components.hrv_z,
                components.rhr_z,
                components.sleep_quality * 100.0,
                components.load_ratio,
                components.raw_score,
                components.calibration_adjustment
            )
            .dimmed()
        );
    }
}

fn run_fatigue(config: &EngineConfig, samples: &Path, resting_hr: Option<f64>, json: bool) -> Result<()> {
    let importer = HeartRateCsvImporter::new();
    if !importer.can_import(samples) {
        tracing::warn!(
            file = %samples.display(),
            format = importer.format_name(),
            "Unexpected file extension, reading as heart-rate CSV anyway"
        );
    }
    let samples = importer.import_file(samples)?;

    let mut tracker = FatigueTracker::new(config.fatigue.clone());
    if let Some(resting) = resting_hr {
        tracker.set_baseline_resting_hr(resting);
    }

    let mut rejected = 0usize;
    for sample in &samples {
        if let Err(err) = tracker.process(*sample) {
            rejected += 1;
            tracing::warn!(timestamp = %sample.timestamp, error = %err, "Sample rejected");
        }
    }

    let snapshot = tracker.snapshot();
    let summary = tracker.finish_session();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let level = summary.final_fatigue_level.to_string();
    let level = match summary.final_fatigue_level {
        FatigueLevel::Fresh => level.green().bold(),
        FatigueLevel::Productive => level.cyan().bold(),
        FatigueLevel::Fatigued => level.yellow().bold(),
        FatigueLevel::Asymptote | FatigueLevel::Depleted => level.red().bold(),
    };

    println!("{}", "Workout fatigue".bold());
    println!(
        "  Samples:       {} ({} rejected)",
        samples.len(),
        rejected
    );
    println!("  Duration:      {:.0} min", summary.duration_seconds / 60.0);
    println!("  Sets:          {}", summary.completed_sets);
    println!(
        "  Fatigue:       {} ({:.0}% degradation)",
        level, summary.final_degradation_percent
    );
    println!("                 {}", summary.final_fatigue_level.description().dimmed());
    if let Some(baseline) = summary.baseline_recovery_rate {
        println!("  Baseline rate: {:.2} bpm/s", baseline);
    }
    if let Some(average) = summary.average_recovery_rate {
        println!("  Average rate:  {:.2} bpm/s", average);
    }
    if let Some(sets) = snapshot.estimated_sets_remaining {
        println!("  Sets left:     ~{}", sets);
    }
    if let Some(reserve) = snapshot.hr_reserve_recovered_percent {
        println!("  HR reserve recovered in last rest: {:.0}%", reserve);
    }

    if summary.rest_periods.is_empty() {
        println!("{}", "  No rest periods detected".dimmed());
    } else {
        let rows: Vec<RestPeriodRow> = summary
            .rest_periods
            .iter()
            .enumerate()
            .map(|(i, rest)| RestPeriodRow::new(i, rest))
            .collect();
        println!("{}", Table::new(rows).with(Style::rounded()));
    }

    Ok(())
}

fn run_summary(history: &Path, days: u32, json: bool) -> Result<()> {
    let history = import::load_biometric_history(history)?;
    let summary = summarize_recovery(&history, days);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &RecoverySummary) {
    println!("{}", format!("Recovery over the last {} days", summary.period_days).bold());

    if summary.is_empty() {
        println!("{}", "  No recovery data found".yellow());
        return;
    }

    if let Some(sleep) = &summary.sleep {
        println!(
            "  Sleep:       {:.1} h average ({} nights)",
            sleep.average_hours, sleep.nights_tracked
        );
    }
    if let Some(hrv) = &summary.hrv {
        println!(
            "  HRV:         {:.0} ms average ({} readings, {})",
            hrv.average_ms, hrv.readings, hrv.trend
        );
        if let (Some(baseline), Some(deviation)) = (hrv.baseline_ms, hrv.deviation_percent) {
            println!(
                "               latest {:+.0}% vs {:.0} ms baseline",
                deviation, baseline
            );
        }
    }
    if let Some(rhr) = &summary.resting_hr {
        println!(
            "  Resting HR:  {:.0} bpm average ({} readings)",
            rhr.average_bpm, rhr.readings
        );
    }
    if let Some(consistency) = summary.bedtime_consistency {
        println!("  Bedtimes:    {}", consistency);
    }
}

fn run_config(mut config: EngineConfig, path: &Path, init: bool, show: bool) -> Result<()> {
    if init {
        if path.exists() {
            anyhow::bail!("Config file already exists: {}", path.display());
        }
        config = EngineConfig::default();
        config.save_to_file(path)?;
        println!("{} {}", "✓ Wrote default configuration to".green(), path.display());
    }

    if show || !init {
        println!("{}", format!("# {}", path.display()).dimmed());
        println!(
            "{}",
            toml::to_string_pretty(&config).context("Failed to serialize configuration")?
        );
    }

    Ok(())
}
