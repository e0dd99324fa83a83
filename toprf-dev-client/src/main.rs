use clap::Parser;
use toprf_dev_client::DevClientConfig;

fn install_tracing() -> eyre::Result<()> {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{
        EnvFilter,
        fmt::{self},
    };

    let fmt_layer = fmt::layer().with_target(false).with_line_number(false);
    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;
    Ok(())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_tracing()?;
    let config = DevClientConfig::parse();
    tracing::info!("starting toprf-dev-client with config: {config:#?}");

    let outputs = toprf_dev_client::run(config).await?;
    if let Some(first) = outputs.first() {
        let hex = first
            .output
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect::<String>();
        tracing::info!("OPRF output: {hex}");
        let rejected = outputs.iter().map(|o| o.rejected.len()).sum::<usize>();
        if rejected > 0 {
            tracing::info!("dropped {rejected} invalid contributions");
        }
    }
    tracing::info!("all runs successful");
    Ok(())
}
