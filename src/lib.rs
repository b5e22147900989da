pub mod api;
pub mod cache;
pub mod commands;
pub mod config;
pub mod errors;
pub mod estimate;
pub mod job;
pub mod logging;
pub mod poller;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use errors::Error;

#[derive(Parser)]
#[clap(name = "video_tracker")]
#[clap(about = "Track lesson video generation jobs and their cached status")]
#[clap(version)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Track(commands::track::TrackArgs),
    Resume(commands::resume::ResumeArgs),
    Status(commands::status::StatusArgs),
    Estimate(commands::estimate::EstimateArgs),
    Cache(commands::cache::CacheCommand),
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Track(args) => commands::track::run(args).await,
        Commands::Resume(args) => commands::resume::run(args).await,
        Commands::Status(args) => commands::status::run(args).await,
        Commands::Estimate(args) => commands::estimate::run(args).await,
        Commands::Cache(command) => commands::cache::run(command).await,
    }
}
