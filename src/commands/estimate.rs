use super::open_cache;
use crate::cache::SlotKey;
use crate::estimate;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

#[derive(Parser)]
#[clap(about = "Estimate generation time for a narration script")]
pub struct EstimateArgs {
    #[clap(long, help = "Script file; read from stdin when omitted")]
    pub script: Option<PathBuf>,

    #[clap(long, help = "Remember the script as this slot's lesson content")]
    pub slot: Option<SlotKey>,
}

pub async fn run(args: EstimateArgs) -> Result<()> {
    let script = match &args.script {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read script file: {}", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read script from stdin")?;
            buf
        }
    };

    if let Some(slot) = args.slot {
        open_cache()?.save_lesson_content(&slot, &script).await?;
    }

    println!("words:    {}", estimate::word_count(&script));
    println!(
        "expected: {}",
        humantime::format_duration(estimate::expected_duration(&script))
    );
    Ok(())
}
