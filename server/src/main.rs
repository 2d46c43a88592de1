//! GROVER fingerprint server.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use grover_server::{commands, CliArgs, Command, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so `predict` output stays machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "grover_server=info,grover_api=info,grover_runner=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();
    let config = ServerConfig::load(&args)?;

    info!("Starting GROVER server v{}", env!("CARGO_PKG_VERSION"));

    match &args.command {
        Command::Serve(serve) => commands::serve(serve, config).await?,
        Command::Pack(pack) => commands::pack(pack, &config)?,
        Command::Predict(predict) => {
            let body = commands::predict(predict, &config).await?;
            println!("{body}");
        }
    }

    Ok(())
}
