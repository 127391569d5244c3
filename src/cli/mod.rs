//! Wind speed CLI module
//!
//! Command-line interface for training, prediction and serving the form.

use anyhow::Context;
use chrono::{Datelike, Local};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::ArtifactPaths;
use crate::features::{assemble_features, load_observations, FEATURE_NAMES};
use crate::inference::{ms_to_kms, Predictor};
use crate::persist::{read_metrics_text, save_model, write_metrics};
use crate::training::{train, TrainingConfig};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "windspeed")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Wind speed regression: train, predict and serve an interactive form")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train the regressor on a `time,uwnd,vwnd` CSV
    Train {
        /// Input data file (CSV)
        #[arg(short, long)]
        data: PathBuf,

        /// Training configuration (JSON); flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output model file
        #[arg(long)]
        model: Option<PathBuf>,

        /// Output metrics file
        #[arg(long)]
        metrics: Option<PathBuf>,

        /// Boosting rounds
        #[arg(long)]
        n_estimators: Option<usize>,

        #[arg(long)]
        learning_rate: Option<f64>,

        #[arg(long)]
        max_depth: Option<usize>,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Trailing fraction held out for evaluation
        #[arg(long)]
        holdout: Option<f64>,
    },

    /// Predict every complete record of a CSV
    Predict {
        /// Input data file (CSV)
        #[arg(short, long)]
        data: PathBuf,

        /// Output predictions file
        #[arg(short, long, default_value = "predictions.csv")]
        output: PathBuf,

        /// Trained model file
        #[arg(long)]
        model: Option<PathBuf>,
    },

    /// Predict from one set of hand-entered values
    PredictOne {
        /// U-wind component (m/s)
        #[arg(long, allow_hyphen_values = true)]
        uwnd: f64,

        /// V-wind component (m/s)
        #[arg(long, allow_hyphen_values = true)]
        vwnd: f64,

        /// Wind speed 1 day ago (m/s)
        #[arg(long)]
        lag1: f64,

        /// Wind speed 2 days ago (m/s)
        #[arg(long)]
        lag2: f64,

        /// Wind speed 3 days ago (m/s)
        #[arg(long)]
        lag3: f64,

        /// Day of year (defaults to today)
        #[arg(long)]
        day_of_year: Option<u32>,

        /// Month (defaults to today)
        #[arg(long)]
        month: Option<u32>,

        /// Trained model file
        #[arg(long)]
        model: Option<PathBuf>,
    },

    /// Print the stored metrics report
    Metrics {
        /// Metrics file
        #[arg(long)]
        metrics: Option<PathBuf>,
    },

    /// Start the web form
    Serve {
        /// Server port [default: $API_PORT or 8080]
        #[arg(short, long)]
        port: Option<u16>,

        /// Server host [default: $API_HOST or 0.0.0.0]
        #[arg(long)]
        host: Option<String>,

        /// Trained model file
        #[arg(long)]
        model: Option<PathBuf>,

        /// Metrics file
        #[arg(long)]
        metrics: Option<PathBuf>,
    },
}

/// Hyperparameter flags given on the command line
#[derive(Debug, Default, Clone)]
pub struct TrainOverrides {
    pub n_estimators: Option<usize>,
    pub learning_rate: Option<f64>,
    pub max_depth: Option<usize>,
    pub seed: Option<u64>,
    pub holdout: Option<f64>,
}

impl TrainOverrides {
    pub fn apply(&self, mut config: TrainingConfig) -> TrainingConfig {
        if let Some(n) = self.n_estimators {
            config = config.with_n_estimators(n);
        }
        if let Some(lr) = self.learning_rate {
            config = config.with_learning_rate(lr);
        }
        if let Some(depth) = self.max_depth {
            config = config.with_max_depth(depth);
        }
        if let Some(seed) = self.seed {
            config = config.with_random_state(seed);
        }
        if let Some(holdout) = self.holdout {
            config = config.with_holdout_fraction(holdout);
        }
        config
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(
    data_path: &Path,
    config_path: Option<&Path>,
    overrides: &TrainOverrides,
    paths: &ArtifactPaths,
) -> anyhow::Result<()> {
    section("Train");

    let config = match config_path {
        Some(path) => TrainingConfig::load(path)
            .with_context(|| format!("reading training config {}", path.display()))?,
        None => TrainingConfig::default(),
    };
    let config = overrides.apply(config);
    config.validate()?;

    step_run("Loading data");
    let start = Instant::now();
    let raw = load_observations(data_path)
        .with_context(|| format!("loading {}", data_path.display()))?;
    step_done(&format!("{} rows in {:?}", raw.len(), start.elapsed()));

    let h = &config.hyperparameters;
    step_run(&format!(
        "Training {} trees (depth {}, lr {})",
        h.n_estimators.to_string().cyan(),
        h.max_depth,
        h.learning_rate
    ));
    let outcome = train(&raw, &config)?;
    step_done(&format!("{:.3}s", outcome.training_time_secs));

    step_run(&format!("Saving model → {}", paths.model.display()));
    save_model(&outcome.model, &paths.model)?;
    step_done("");

    step_run(&format!("Saving metrics → {}", paths.metrics.display()));
    write_metrics(&outcome.metrics, &paths.metrics)?;
    step_done("");

    println!();
    println!("  {:<16} {}", muted("Records"), outcome.n_records.to_string().white());
    println!(
        "  {:<16} {}",
        muted("Train/holdout"),
        format!("{} / {}", outcome.n_train, outcome.n_holdout).white()
    );
    println!("  {:<16} {}", muted("MSE"), format!("{:.4}", outcome.metrics.mse).white().bold());
    println!("  {:<16} {}", muted("R²"), format!("{:.4}", outcome.metrics.r2).white().bold());
    println!("  {:<16} {}", muted("MAE"), format!("{:.4}", outcome.metrics.mae).white().bold());

    let importances = outcome.model.ranked_importances();
    if !importances.is_empty() {
        section("Feature importance");
        for (name, value) in importances {
            let bar = "█".repeat((value * 40.0).round() as usize);
            println!("  {:<18} {:>6.3} {}", muted(&name), value, accent(&bar));
        }
    }

    println!();
    step_ok("Model and metrics saved");
    println!();
    Ok(())
}

pub fn cmd_predict(data_path: &Path, output: &Path, model_path: &Path) -> anyhow::Result<()> {
    section("Predict");

    step_run("Loading model");
    let predictor = Predictor::load(model_path)?;
    step_done(&format!("{}", model_path.display()));

    step_run("Predicting");
    let start = Instant::now();
    let predictions = predictor.predict_csv(data_path, output)?;
    step_done(&format!("{} predictions in {:?}", predictions.len(), start.elapsed()));

    step_ok(&format!("Saved → {}", output.display()));
    println!();
    Ok(())
}

pub fn cmd_predict_one(
    uwnd: f64,
    vwnd: f64,
    lags: [f64; 3],
    day_of_year: Option<u32>,
    month: Option<u32>,
    model_path: &Path,
) -> anyhow::Result<()> {
    if lags.iter().any(|l| !(*l >= 0.0)) {
        anyhow::bail!("lagged wind speeds must be non-negative");
    }
    let today = Local::now().date_naive();
    let day_of_year = day_of_year.unwrap_or_else(|| today.ordinal());
    let month = month.unwrap_or_else(|| today.month());
    if !(1..=366).contains(&day_of_year) || !(1..=12).contains(&month) {
        anyhow::bail!("day_of_year must be in 1..=366 and month in 1..=12");
    }

    let predictor = Predictor::load(model_path)?;
    let features = assemble_features(uwnd, vwnd, lags, day_of_year, month);
    let ms = predictor.predict_vector(&features)?;

    section("Prediction");
    for (name, value) in FEATURE_NAMES.iter().zip(features.iter()) {
        println!("  {:<18} {}", muted(name), dim(&format!("{:.4}", value)));
    }
    println!();
    println!("  {:<18} {}", muted("Speed (m/s)"), format!("{:.2}", ms).white().bold());
    println!("  {:<18} {}", muted("Speed (km/s)"), format!("{:.5}", ms_to_kms(ms)).white().bold());
    println!();
    Ok(())
}

pub fn cmd_metrics(metrics_path: &Path) -> anyhow::Result<()> {
    section("Model accuracy");
    match read_metrics_text(metrics_path) {
        Ok(text) => {
            for line in text.lines() {
                println!("  {}", line);
            }
        }
        Err(_) => println!("  {}", "Metrics not available".yellow()),
    }
    println!();
    Ok(())
}

pub async fn cmd_serve(
    host: Option<String>,
    port: Option<u16>,
    paths: ArtifactPaths,
) -> anyhow::Result<()> {
    use crate::server::{run_server, ServerConfig};

    let defaults = ServerConfig::default();
    let config = ServerConfig {
        host: host.unwrap_or(defaults.host),
        port: port.unwrap_or(defaults.port),
        artifacts: paths,
    };
    let (host, port) = (config.host.as_str(), config.port);

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "Wind Speed Predictor".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Form   ", &format!("http://{}:{}", host, port)));
    line_box(&kv("API    ", &format!("http://{}:{}/api", host, port)));
    line_box(&kv("Health ", &format!("http://{}:{}/api/health", host, port)));
    line_box(&kv("Model  ", &config.artifacts.model.display().to_string()));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    run_server(config).await
}
