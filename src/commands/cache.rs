use super::open_cache;
use crate::cache::SlotKey;
use crate::estimate;
use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[clap(about = "Inspect or clean the local status cache")]
pub struct CacheCommand {
    #[clap(subcommand)]
    pub subcommand: CacheSubcommand,
}

#[derive(Subcommand)]
pub enum CacheSubcommand {
    /// Show the cached job record and lesson content for a slot
    Show {
        #[clap(long)]
        slot: SlotKey,
    },
    /// Remove every expired entry
    Purge,
}

pub async fn run(command: CacheCommand) -> Result<()> {
    let cache = open_cache()?;
    match command.subcommand {
        CacheSubcommand::Show { slot } => {
            match cache.load_job_record(&slot).await? {
                Some(cached) => {
                    let record = cached.value;
                    println!("slot:     {}", slot);
                    println!("job:      {}", record.job_id);
                    println!("status:   {} ({})", record.status, record.status.label());
                    println!("progress: {}%", record.progress);
                    if let Some(url) = &record.result_url {
                        println!("video:    {}", url);
                    }
                    if let Some(error) = &record.error {
                        println!("error:    {}", error);
                    }
                    println!("saved:    {}", cached.stored_at.to_rfc3339());
                }
                None => println!("{}: no cached job record", slot),
            }
            match cache.load_lesson_content(&slot).await? {
                Some(content) => println!(
                    "content:  {} words ({:.0}s expected)",
                    estimate::word_count(&content),
                    estimate::expected_duration_secs(&content)
                ),
                None => println!("content:  none"),
            }
        }
        CacheSubcommand::Purge => {
            let removed = cache.purge_stale(Utc::now()).await?;
            println!("removed {} expired entries", removed);
        }
    }
    Ok(())
}
