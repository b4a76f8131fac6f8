//! Diamond Pricer CLI Module
//!
//! Command-line interface for training, evaluation, one-off predictions and
//! serving.

use clap::{Parser, Subcommand};
use colored::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::evaluation::{round4, run_evaluation, RESULTS_FILE_NAME};
use crate::schema::DataSchema;
use crate::server::{run_server, AppState, ServerConfig};
use crate::training::{run_training, ModelConfig};
use crate::validation::DiamondRecord;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString {
    s.truecolor(100, 100, 100)
}
fn accent(s: &str) -> ColoredString {
    s.truecolor(120, 170, 255)
}
fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}
fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
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

fn kv(key: &str, val: &str) {
    println!("  {:<16} {}", muted(key), val.white());
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "diamond-pricer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Random forest diamond price regression: train, evaluate, serve")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fit the preprocessing pipeline and random forest on training data
    Train {
        /// Training CSV, or a directory holding one
        #[arg(short, long)]
        data: PathBuf,

        /// Schema JSON file or directory (defaults to the diamond schema)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Model config JSON file or directory
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory for preprocessor.json and model.json
        #[arg(short, long, default_value = "./artifacts")]
        artifacts: PathBuf,
    },

    /// Score saved artifacts on a labelled held-out dataset
    Evaluate {
        /// Held-out CSV, or a directory holding one
        #[arg(short, long)]
        data: PathBuf,

        /// Schema JSON file or directory (defaults to the diamond schema)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        #[arg(short, long, default_value = "./artifacts")]
        artifacts: PathBuf,

        /// Directory for results.json and predictions.csv
        #[arg(short, long, default_value = "./results")]
        results: PathBuf,
    },

    /// Price records from a JSON file (one object or an array of objects)
    Predict {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long, default_value = "./artifacts")]
        artifacts: PathBuf,
    },

    /// Start the prediction server
    Serve {
        /// Server host (falls back to API_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Server port (falls back to API_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Artifacts directory (falls back to ARTIFACTS_DIR)
        #[arg(short, long)]
        artifacts: Option<PathBuf>,
    },
}

fn load_schema(path: Option<&Path>) -> anyhow::Result<DataSchema> {
    match path {
        Some(path) => Ok(DataSchema::load(path)?),
        None => Ok(DataSchema::default()),
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(
    data_path: &Path,
    schema_path: Option<&Path>,
    config_path: Option<&Path>,
    artifacts_dir: &Path,
) -> anyhow::Result<()> {
    section("Train");

    step_run("Loading schema and config");
    let schema = load_schema(schema_path)?;
    let config = match config_path {
        Some(path) => ModelConfig::load(path)?,
        None => ModelConfig::default(),
    };
    step_done(&format!("target {}", schema.target_field()));

    step_run("Training random forest");
    let start = Instant::now();
    let summary = run_training(data_path, &schema, &config, artifacts_dir)?;
    step_done(&format!("{:?}", start.elapsed()));

    println!();
    kv("Rows", &summary.n_rows.to_string());
    kv("Features", &summary.n_features.to_string());
    kv("Trees", &summary.hyperparameters.n_estimators.to_string());
    kv("Max features", &summary.hyperparameters.max_features.to_string());
    if let Some(oob) = summary.oob_score {
        kv("OOB R²", &format!("{:.4}", oob));
    }
    kv("Artifacts", &artifacts_dir.display().to_string());
    println!();

    Ok(())
}

pub fn cmd_evaluate(
    data_path: &Path,
    schema_path: Option<&Path>,
    artifacts_dir: &Path,
    results_dir: &Path,
) -> anyhow::Result<()> {
    section("Evaluate");

    let schema = load_schema(schema_path)?;

    step_run("Scoring held-out data");
    let start = Instant::now();
    let scores = run_evaluation(data_path, &schema, artifacts_dir, results_dir)?;
    step_done(&format!("{:?}", start.elapsed()));

    println!();
    kv("RMSE", &format!("{:.4}", scores.rmse));
    kv("MAE", &format!("{:.4}", scores.mae));
    kv("NMAE", &format!("{:.4}", scores.nmae));
    kv("R²", &format!("{:.4}", scores.r2));
    kv("Results", &results_dir.join(RESULTS_FILE_NAME).display().to_string());
    println!();

    Ok(())
}

pub fn cmd_predict(input_path: &Path, artifacts_dir: &Path) -> anyhow::Result<()> {
    section("Predict");

    step_run("Loading artifacts");
    let state = AppState::load(artifacts_dir)?;
    step_done(&format!("{} features", state.pipeline.feature_names().len()));

    let body: Value = serde_json::from_str(&std::fs::read_to_string(input_path)?)?;
    let records = match body {
        Value::Array(items) => items,
        single => vec![single],
    };

    println!();
    for item in &records {
        let record = DiamondRecord::from_json(item)?;
        let prediction = round4(state.predict_one(&record)?);
        kv(&record.id, &format!("{:.4}", prediction));
    }
    println!();

    Ok(())
}

pub async fn cmd_serve(
    host: Option<String>,
    port: Option<u16>,
    artifacts_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut config = ServerConfig::default();
    if let Some(host) = host {
        config = config.with_host(host);
    }
    if let Some(port) = port {
        config = config.with_port(port);
    }
    if let Some(dir) = artifacts_dir {
        config = config.with_artifacts_dir(dir);
    }

    section("Serve");
    kv("Address", &format!("{}:{}", config.host, config.port));
    kv("Artifacts", &config.artifacts_dir.display().to_string());
    println!();

    run_server(config).await
}
