use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "wattcast")]
#[command(version = "0.1.0")]
#[command(about = "Utility usage delta forecaster", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config directory (default.toml plus optional per-environment file)
    #[arg(short, long, default_value = "config", env = "WATTCAST_CONFIG_DIR")]
    pub config: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the synthetic usage dataset
    Generate {
        /// Number of rows to generate
        #[arg(short = 'n', long)]
        samples: Option<usize>,
        /// Output CSV path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// RNG seed for a reproducible dataset
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Train the delta network and write model artifacts
    Train {
        /// Input CSV path
        #[arg(short, long)]
        dataset: Option<PathBuf>,
        /// Passes over the dataset
        #[arg(long)]
        epochs: Option<usize>,
        /// Seed for weight init and shuffling
        #[arg(long)]
        seed: Option<u64>,
        /// Directory to write artifacts to
        #[arg(long)]
        artifacts: Option<PathBuf>,
    },
    /// Serve POST /predict over HTTP
    Serve {
        /// Port to bind (host comes from config)
        #[arg(short, long)]
        port: Option<u16>,
        /// Directory to load artifacts from
        #[arg(long)]
        artifacts: Option<PathBuf>,
    },
    /// Run one prediction offline and print the JSON response
    Predict {
        #[arg(long)]
        city: String,
        /// Units on the last paid bill
        #[arg(long)]
        units: f64,
        /// Last paid date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Billing cycle in months
        #[arg(long)]
        cycle: u32,
        /// Directory to load artifacts from
        #[arg(long)]
        artifacts: Option<PathBuf>,
    },
}

impl Commands {
    /// Fold command-line overrides into the loaded configuration
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        match self {
            Commands::Generate {
                samples,
                output,
                seed,
            } => {
                if let Some(n) = samples {
                    config.dataset.samples = *n;
                }
                if let Some(path) = output {
                    config.dataset.path = path.clone();
                }
                if seed.is_some() {
                    config.dataset.seed = *seed;
                }
            }
            Commands::Train {
                dataset,
                epochs,
                seed,
                artifacts,
            } => {
                if let Some(path) = dataset {
                    config.dataset.path = path.clone();
                }
                if let Some(n) = epochs {
                    config.training.epochs = *n;
                }
                if seed.is_some() {
                    config.training.seed = *seed;
                }
                if let Some(dir) = artifacts {
                    config.artifacts.dir = dir.clone();
                }
            }
            Commands::Serve { port, artifacts } => {
                if let Some(p) = port {
                    config.server.port = *p;
                }
                if let Some(dir) = artifacts {
                    config.artifacts.dir = dir.clone();
                }
            }
            Commands::Predict { artifacts, .. } => {
                if let Some(dir) = artifacts {
                    config.artifacts.dir = dir.clone();
                }
            }
        }
    }
}

/// Pretty-print one item as JSON followed by a newline.
pub fn write_json<T: Serialize, W: Write>(item: &T, out: &mut W) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(item).context("failed to serialize output")?;
    writeln!(out, "{json}").context("failed to write output")?;
    Ok(())
}

/// Print one item to stdout as pretty JSON.
pub fn print_item<T: Serialize>(item: &T) -> anyhow::Result<()> {
    write_json(item, &mut std::io::stdout().lock())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn train_overrides_replace_config() {
        let cli = Cli::parse_from([
            "wattcast", "train", "--dataset", "rows.csv", "--epochs", "3", "--seed", "9",
        ]);
        let mut config = AppConfig::default();
        cli.command.apply_overrides(&mut config);

        assert_eq!(config.dataset.path, PathBuf::from("rows.csv"));
        assert_eq!(config.training.epochs, 3);
        assert_eq!(config.training.seed, Some(9));
        assert_eq!(config.training.batch_size, 32);
    }

    #[test]
    fn absent_flags_keep_config() {
        let cli = Cli::parse_from(["wattcast", "serve"]);
        let mut config = AppConfig::default();
        cli.command.apply_overrides(&mut config);

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.artifacts.dir, PathBuf::from("artifacts"));
    }

    #[test]
    fn write_json_emits_pretty_object() {
        let mut out = Vec::new();
        write_json(&serde_json::json!({ "target_month": 4 }), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "{\n  \"target_month\": 4\n}\n");
    }

    #[test]
    fn predict_requires_all_fields() {
        assert!(Cli::try_parse_from(["wattcast", "predict", "--city", "Delhi"]).is_err());
        assert!(Cli::try_parse_from([
            "wattcast", "predict", "--city", "Delhi", "--units", "1200", "--date",
            "2024-01-15", "--cycle", "3",
        ])
        .is_ok());
    }
}
