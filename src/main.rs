//! Diamond Pricer - Main Entry Point

use clap::Parser;
use diamond_pricer::cli::{cmd_evaluate, cmd_predict, cmd_serve, cmd_train, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "diamond_pricer=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            data,
            schema,
            config,
            artifacts,
        } => {
            cmd_train(&data, schema.as_deref(), config.as_deref(), &artifacts)?;
        }
        Commands::Evaluate {
            data,
            schema,
            artifacts,
            results,
        } => {
            cmd_evaluate(&data, schema.as_deref(), &artifacts, &results)?;
        }
        Commands::Predict { input, artifacts } => {
            cmd_predict(&input, &artifacts)?;
        }
        Commands::Serve {
            host,
            port,
            artifacts,
        } => {
            cmd_serve(host, port, artifacts).await?;
        }
    }

    Ok(())
}
