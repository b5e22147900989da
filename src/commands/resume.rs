//! Picks up tracking for lessons whose generation was started earlier,
//! from the cached job record or, failing that, the lesson's video info.

use super::{load_script, open_cache, progress_bar, report_outcome, track_job};
use crate::api::VideoApiClient;
use crate::cache::{SlotKey, TtlCache};
use crate::estimate;
use crate::job::{Job, JobStatus, StatusGroup};
use crate::logging::*;
use crate::poller::{FailureReason, Outcome, PollerConfig};
use anyhow::{Result, anyhow, bail};
use clap::Parser;
use futures_util::future::join_all;
use indicatif::{MultiProgress, ProgressBar};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[clap(about = "Resume tracking the video job of one or more lessons")]
pub struct ResumeArgs {
    #[clap(long, required = true, help = "Lesson slot (course/module/lesson), repeatable")]
    pub slot: Vec<SlotKey>,

    #[clap(long, help = "Narration script used to estimate generation time")]
    pub script: Option<PathBuf>,
}

pub async fn run(args: ResumeArgs) -> Result<()> {
    let cache = open_cache()?;
    let client = Arc::new(VideoApiClient::from_config()?);
    let poller_config = PollerConfig::from_config()?;
    let bars = MultiProgress::new();

    let sessions = args.slot.iter().map(|slot| {
        let pb = bars.add(progress_bar(&slot.to_string()));
        resume_slot(
            Arc::clone(&client),
            cache.clone(),
            poller_config.clone(),
            *slot,
            args.script.as_deref(),
            pb,
        )
    });
    let results = join_all(sessions).await;

    let mut failed = 0;
    for (slot, result) in args.slot.iter().zip(results) {
        let reported = result.and_then(|outcome| report_outcome(&slot.to_string(), &outcome));
        if let Err(err) = reported {
            eprintln!("{:#}", err);
            failed += 1;
        }
    }
    if failed > 0 {
        bail!("{} of {} lessons did not finish", failed, args.slot.len());
    }
    Ok(())
}

/// Where the job of a slot stands before any polling.
#[derive(Debug, PartialEq)]
enum Known {
    Finished(Outcome),
    Running { job_id: String, status: JobStatus },
}

fn classify(job: &Job) -> Known {
    match job.status.group() {
        StatusGroup::Succeeded => Known::Finished(Outcome::Success {
            result_url: job.result_url.clone(),
        }),
        StatusGroup::Failed => Known::Finished(Outcome::Failure(FailureReason::Remote {
            status: job.status.clone(),
            message: job.failure_message(),
        })),
        _ => Known::Running {
            job_id: job.job_id.clone(),
            status: job.status.clone(),
        },
    }
}

async fn locate(client: &VideoApiClient, cache: &TtlCache, slot: &SlotKey) -> Result<Known> {
    let log = DEFAULT.new(o!(
        "function" => "resume::locate",
        "slot" => slot.to_string(),
    ));

    match cache.load_job_record(slot).await {
        Ok(Some(cached)) => {
            let record = cached.value;
            debug!(log, "found cached job record";
                "job_id" => &record.job_id,
                "status" => %record.status,
            );
            let mut job = Job::new(record.job_id, record.status);
            job.result_url = record.result_url;
            job.error_message = record.error;
            return Ok(classify(&job));
        }
        Ok(None) => {}
        Err(err) => warn!(log, "failed to read cached job record"; "error" => %err),
    }

    let info = client
        .lesson_video_info(slot)
        .await?
        .ok_or_else(|| anyhow!("{}: no video has been requested for this lesson", slot))?;
    let job_id = info
        .video_id
        .ok_or_else(|| anyhow!("{}: lesson video has no job id", slot))?;
    info!(log, "found lesson video"; "job_id" => &job_id);

    let status = info
        .video_status
        .as_deref()
        .map(JobStatus::parse)
        .unwrap_or(JobStatus::Pending);
    let mut job = Job::new(job_id, status);
    job.result_url = info.video_download_url;
    Ok(classify(&job))
}

pub(crate) async fn resume_slot(
    client: Arc<VideoApiClient>,
    cache: TtlCache,
    poller_config: PollerConfig,
    slot: SlotKey,
    script: Option<&Path>,
    pb: ProgressBar,
) -> Result<Outcome> {
    let (job_id, status) = match locate(&client, &cache, &slot).await? {
        Known::Finished(outcome) => {
            pb.finish_and_clear();
            return Ok(outcome);
        }
        Known::Running { job_id, status } => (job_id, status),
    };

    let script = load_script(script, Some(slot), &cache).await?;
    let expected = estimate::expected_duration_secs(&script);
    info!(DEFAULT, "resuming"; "slot" => slot.to_string(), "job_id" => &job_id, "status" => %status);

    track_job(client, cache, poller_config, &job_id, Some(slot), expected, pb).await
}
