mod config;
mod db;
mod error;
mod logging;
mod queries;
mod worker;

use anyhow::Context;
use clap::Parser;
use config::{Cli, Command};
use db::{DryRun, Redshift, Warehouse};
use worker::Worker;

async fn run<W: Warehouse>(command: Command, worker: &mut Worker<W>) -> anyhow::Result<()> {
    match command {
        Command::CreateTables => worker
            .create_tables()
            .await
            .context("creating tables")?,
        Command::Etl => worker.run_etl().await.context("loading tables")?,
        Command::Run => {
            worker.create_tables().await.context("creating tables")?;
            worker.run_etl().await.context("loading tables")?;
        }
        Command::Report => {
            worker.report().await.context("counting rows")?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    logging::init_tracing(&cli.log_level);

    if cli.dry_run {
        let mut worker = Worker::new(DryRun::default(), cli.sources);
        run(cli.command, &mut worker).await?;
        tracing::info!(statements = worker.into_inner().executed, "Dry run complete");
        return Ok(());
    }

    let warehouse = Redshift::connect(&cli.cluster).await?;
    let mut worker = Worker::new(warehouse, cli.sources);
    run(cli.command, &mut worker).await?;
    worker
        .into_inner()
        .close()
        .await
        .context("closing connection")?;

    tracing::info!(command = ?cli.command, "Done");
    Ok(())
}
