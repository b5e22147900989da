pub mod cache;
pub mod estimate;
pub mod resume;
pub mod status;
pub mod track;


use crate::api::StatusSource;
use crate::cache::{FileStore, SlotKey, TtlCache};
use crate::config;
use crate::logging::*;
use crate::poller::{JobStatusPoller, Outcome, PollerConfig, observer};
use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use tokio::fs;

pub(crate) fn open_cache() -> Result<TtlCache> {
    let dir = config::get("CACHE_DIR")?;
    Ok(TtlCache::new(Arc::new(FileStore::new(dir))))
}

/// Narration script for duration estimation: from `path` when given (and then
/// remembered for the slot), otherwise the slot's cached lesson content.
pub(crate) async fn load_script(
    path: Option<&Path>,
    slot: Option<SlotKey>,
    cache: &TtlCache,
) -> Result<String> {
    let log = DEFAULT.new(o!("function" => "commands::load_script"));

    if let Some(path) = path {
        let script = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read script file: {}", path.display()))?;
        if let Some(slot) = slot
            && let Err(err) = cache.save_lesson_content(&slot, &script).await
        {
            warn!(log, "failed to cache lesson content"; "slot" => slot.to_string(), "error" => %err);
        }
        return Ok(script);
    }

    if let Some(slot) = slot {
        match cache.load_lesson_content(&slot).await {
            Ok(Some(script)) => return Ok(script),
            Ok(None) => debug!(log, "no cached lesson content"; "slot" => slot.to_string()),
            Err(err) => warn!(log, "failed to read lesson content"; "error" => %err),
        }
    }
    Ok(String::new())
}

pub(crate) fn progress_bar(label: &str) -> ProgressBar {
    let pb = ProgressBar::new(100);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{spinner:.green} {prefix} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.set_prefix(label.to_string());
    pb
}

/// Polls `job_id` to a terminal state, drawing progress on `pb`.
/// Ctrl-C cancels the session.
pub(crate) async fn track_job(
    source: Arc<dyn StatusSource>,
    cache: TtlCache,
    poller_config: PollerConfig,
    job_id: &str,
    slot: Option<SlotKey>,
    expected_duration_secs: f64,
    pb: ProgressBar,
) -> Result<Outcome> {
    let poller = JobStatusPoller::new(source, poller_config).with_cache(cache);

    pb.set_message(format!("waiting for {}", job_id));
    let on_update = {
        let pb = pb.clone();
        move |percentage: u8| pb.set_position(u64::from(percentage))
    };
    let on_terminal = {
        let pb = pb.clone();
        move |outcome: &Outcome| match outcome {
            Outcome::Success { .. } => pb.finish_with_message("video ready"),
            Outcome::Failure(reason) => pb.abandon_with_message(reason.to_string()),
            Outcome::Cancelled => pb.abandon_with_message("stopped"),
        }
    };

    let handle = match slot {
        Some(slot) => poller.start_for_slot(
            slot,
            job_id,
            expected_duration_secs,
            observer(on_update, on_terminal),
        ),
        None => poller.start(job_id, expected_duration_secs, observer(on_update, on_terminal)),
    }?;

    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await
        }
    };
    let outcome = handle.wait_or_cancel(ctrl_c).await?;
    if outcome == Outcome::Cancelled {
        pb.abandon_with_message("stopped");
    }
    Ok(outcome)
}

/// Prints the result of a session; failures become errors.
pub(crate) fn report_outcome(label: &str, outcome: &Outcome) -> Result<()> {
    match outcome {
        Outcome::Success { result_url } => {
            match result_url {
                Some(url) => println!("{}: video ready at {}", label, url),
                None => println!("{}: video ready", label),
            }
            Ok(())
        }
        Outcome::Cancelled => {
            println!("{}: stopped tracking", label);
            Ok(())
        }
        Outcome::Failure(reason) if reason.is_timeout() => Err(anyhow!(
            "{}: {}. The job may still finish; run `video_tracker resume` to check again",
            label,
            reason
        )),
        Outcome::Failure(reason) => Err(anyhow!("{}: {}", label, reason)),
    }
}
