use anyhow::Context;
use clap::Parser;
use mochi_cli::{init_tracing, open_engine, run, Cli, ClientConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ClientConfig::load(cli.config.as_deref())?;
    if let Some(data) = cli.data {
        config = config.with_data_path(data);
    }
    config.remote |= cli.remote;
    init_tracing(&config)?;

    let engine = open_engine(&config)?;
    let output = run(&engine, cli.command)
        .await
        .context("command failed")?;
    print!("{output}");
    Ok(())
}
