use super::{load_script, open_cache, progress_bar, report_outcome, track_job};
use crate::api::VideoApiClient;
use crate::cache::SlotKey;
use crate::estimate;
use crate::poller::PollerConfig;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[clap(about = "Poll a video generation job until it finishes")]
pub struct TrackArgs {
    #[clap(help = "Job id returned when generation was requested")]
    pub job_id: String,

    #[clap(long, help = "Narration script used to estimate generation time")]
    pub script: Option<PathBuf>,

    #[clap(long, help = "Lesson slot (course/module/lesson) to record status for")]
    pub slot: Option<SlotKey>,
}

pub async fn run(args: TrackArgs) -> Result<()> {
    let cache = open_cache()?;
    let script = load_script(args.script.as_deref(), args.slot, &cache).await?;
    let expected = estimate::expected_duration_secs(&script);
    println!(
        "Tracking {} (about {:.0}s expected for {} words)",
        args.job_id,
        expected,
        estimate::word_count(&script)
    );

    let client = Arc::new(VideoApiClient::from_config()?);
    let outcome = track_job(
        client,
        cache,
        PollerConfig::from_config()?,
        &args.job_id,
        args.slot,
        expected,
        progress_bar(&args.job_id),
    )
    .await?;
    report_outcome(&args.job_id, &outcome)
}
