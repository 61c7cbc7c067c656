use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use wattcast::api::{start_api_server, AppState};
use wattcast::cli::{print_item, Cli, Commands};
use wattcast::config::{AppConfig, LoggingConfig};
use wattcast::dataset::{load_samples, write_csv, DatasetSynthesizer};
use wattcast::error::{Result, WattError};
use wattcast::ml::{ModelBundle, PredictionRequest, Predictor};
use wattcast::training::Trainer;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_from(&cli.config)?;
    cli.command.apply_overrides(&mut config);

    init_logging(&config.logging);

    if let Err(errors) = config.validate() {
        for e in &errors {
            error!("Invalid configuration: {}", e);
        }
        return Err(WattError::Validation(errors.join("; ")));
    }

    match &cli.command {
        Commands::Generate { .. } => run_generate(&config),
        Commands::Train { .. } => run_train(&config),
        Commands::Serve { .. } => run_serve(&config).await,
        Commands::Predict {
            city,
            units,
            date,
            cycle,
            ..
        } => run_predict(
            &config,
            PredictionRequest {
                city: city.clone(),
                last_paid_units: *units,
                last_paid_date: date.clone(),
                billing_cycle: *cycle,
            },
        ),
    }
}

fn run_generate(config: &AppConfig) -> Result<()> {
    let rng = match config.dataset.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let samples = DatasetSynthesizer::new(rng).generate(config.dataset.samples);
    write_csv(&config.dataset.path, &samples)?;

    info!(
        "Synthetic dataset generated: {} ({} rows)",
        config.dataset.path.display(),
        samples.len()
    );
    Ok(())
}

fn run_train(config: &AppConfig) -> Result<()> {
    let samples = load_samples(&config.dataset.path)?;
    let trainer = Trainer::new(config.training.clone());
    let (bundle, report) = trainer.fit(&samples)?;
    bundle.save(&config.artifacts.dir)?;

    info!(
        samples = report.samples,
        features = report.columns.len(),
        final_loss = report.final_loss().unwrap_or(f64::NAN),
        "Model and scalers saved to {}",
        config.artifacts.dir.display()
    );
    Ok(())
}

async fn run_serve(config: &AppConfig) -> Result<()> {
    let bundle = ModelBundle::load(&config.artifacts.dir)?;
    let state = AppState::new(Predictor::new(bundle));
    start_api_server(state, &config.server.host, config.server.port).await
}

fn run_predict(config: &AppConfig, request: PredictionRequest) -> Result<()> {
    let predictor = Predictor::new(ModelBundle::load(&config.artifacts.dir)?);
    let response = predictor.predict(&request)?;
    print_item(&response)?;
    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},burn=warn", logging.level))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
