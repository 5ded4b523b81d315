use anyhow::{Context, Result};
use rfb_replay::args::Args;
use rfb_replay::{replay_file, Config};
use tracing::info;

fn init_logging(args: &Args) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_filter().into()),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    info!("Starting rfb-replay {}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_args(&args).context("Invalid configuration")?;
    let replay = replay_file(&args.capture, &config)
        .await
        .with_context(|| format!("Failed to replay {}", args.capture.display()))?;

    info!("{}", replay.stats);
    Ok(())
}
