use clap::Parser;
use std::process;
use video_tracker::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = video_tracker::run(cli).await {
        eprintln!("Error: {:#}", err);
        process::exit(1);
    }
}
