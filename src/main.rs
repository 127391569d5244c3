//! windspeed - Main Entry Point

use clap::Parser;
use windspeed::cli::{
    cmd_metrics, cmd_predict, cmd_predict_one, cmd_serve, cmd_train, Cli, Commands, TrainOverrides,
};
use windspeed::config::ArtifactPaths;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "windspeed=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            data,
            config,
            model,
            metrics,
            n_estimators,
            learning_rate,
            max_depth,
            seed,
            holdout,
        } => {
            let overrides = TrainOverrides { n_estimators, learning_rate, max_depth, seed, holdout };
            let paths = ArtifactPaths::default().with_overrides(model, metrics);
            cmd_train(&data, config.as_deref(), &overrides, &paths)?;
        }
        Commands::Predict { data, output, model } => {
            let paths = ArtifactPaths::default().with_overrides(model, None);
            cmd_predict(&data, &output, &paths.model)?;
        }
        Commands::PredictOne { uwnd, vwnd, lag1, lag2, lag3, day_of_year, month, model } => {
            let paths = ArtifactPaths::default().with_overrides(model, None);
            cmd_predict_one(uwnd, vwnd, [lag1, lag2, lag3], day_of_year, month, &paths.model)?;
        }
        Commands::Metrics { metrics } => {
            let paths = ArtifactPaths::default().with_overrides(None, metrics);
            cmd_metrics(&paths.metrics)?;
        }
        Commands::Serve { port, host, model, metrics } => {
            let paths = ArtifactPaths::default().with_overrides(model, metrics);
            cmd_serve(host, port, paths).await?;
        }
    }

    Ok(())
}
