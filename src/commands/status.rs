use crate::api::{StatusSource, VideoApiClient};
use crate::job::StatusGroup;
use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[clap(about = "Query the current status of a job once")]
pub struct StatusArgs {
    pub job_id: String,
}

pub async fn run(args: StatusArgs) -> Result<()> {
    let client = VideoApiClient::from_config()?;
    let job = client.fetch_status(&args.job_id).await?;

    println!("job:      {}", job.job_id);
    println!("status:   {} ({})", job.status, job.status.label());
    if let Some(progress) = job.reported_progress {
        println!("progress: {}%", progress);
    }
    if let Some(url) = &job.result_url {
        println!("video:    {}", url);
    }
    if job.status.group() == StatusGroup::Failed {
        println!("error:    {}", job.failure_message());
    }
    Ok(())
}
