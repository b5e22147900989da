use super::*;
use anyhow::Result;

fn client(server: &mockito::Server) -> VideoApiClient {
    VideoApiClient::new(server.url(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_fetch_status_generating() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/video/status/vid_123")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "data": {"status": "generating", "progress": 0}}"#)
        .create_async()
        .await;

    let job = client(&server).fetch_status("vid_123").await?;

    assert_eq!(job.job_id, "vid_123");
    assert_eq!(job.status, JobStatus::Generating);
    assert_eq!(job.reported_progress, Some(0));
    assert_eq!(job.result_url, None);
    Ok(())
}

#[tokio::test]
async fn test_fetch_status_completed_with_url() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/video/status/vid_1")
        .with_status(200)
        .with_body(
            r#"{"success": true, "data": {"status": "completed", "progress": 100.0,
                "download_url": "https://cdn.example/vid_1.mp4"}}"#,
        )
        .create_async()
        .await;

    let job = client(&server).fetch_status("vid_1").await?;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.reported_progress, Some(100));
    assert_eq!(job.result_url.as_deref(), Some("https://cdn.example/vid_1.mp4"));
    Ok(())
}

#[tokio::test]
async fn test_fetch_status_failure_carries_error() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/video/status/vid_2")
        .with_status(200)
        .with_body(r#"{"success": true, "data": {"status": "api_error", "error": "quota exhausted"}}"#)
        .create_async()
        .await;

    let job = client(&server).fetch_status("vid_2").await?;

    assert_eq!(job.status, JobStatus::ApiError);
    assert_eq!(job.failure_message(), "video service API error: quota exhausted");
    Ok(())
}

#[tokio::test]
async fn test_fetch_status_http_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/video/status/vid_3")
        .with_status(500)
        .with_body(r#"{"detail": "boom"}"#)
        .create_async()
        .await;

    let err = client(&server).fetch_status("vid_3").await.unwrap_err();
    assert_eq!(err, QueryError::Http(500));
}

#[tokio::test]
async fn test_fetch_status_malformed_shapes() {
    let mut server = mockito::Server::new_async().await;
    let _no_status = server
        .mock("GET", "/api/video/status/a")
        .with_status(200)
        .with_body(r#"{"success": true, "data": {"progress": 10}}"#)
        .create_async()
        .await;
    let _no_data = server
        .mock("GET", "/api/video/status/b")
        .with_status(200)
        .with_body(r#"{"success": true, "data": null}"#)
        .create_async()
        .await;
    let _not_json = server
        .mock("GET", "/api/video/status/c")
        .with_status(200)
        .with_body("<html>gateway</html>")
        .create_async()
        .await;
    let _rejected = server
        .mock("GET", "/api/video/status/d")
        .with_status(200)
        .with_body(r#"{"success": false, "message": "unknown video"}"#)
        .create_async()
        .await;

    let client = client(&server);
    assert!(matches!(client.fetch_status("a").await, Err(QueryError::Parse(_))));
    assert!(matches!(client.fetch_status("b").await, Err(QueryError::Parse(_))));
    assert!(matches!(client.fetch_status("c").await, Err(QueryError::Parse(_))));
    assert_eq!(
        client.fetch_status("d").await.unwrap_err(),
        QueryError::Rejected("unknown video".to_string())
    );
}

#[tokio::test]
async fn test_fetch_status_network_error() {
    // nothing listens on the discard port
    let client = VideoApiClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
    assert!(matches!(
        client.fetch_status("vid").await,
        Err(QueryError::Network(_))
    ));
}

#[tokio::test]
async fn test_lesson_video_info() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _found = server
        .mock("GET", "/api/video/lesson/12/3/0/info")
        .with_status(200)
        .with_body(
            r#"{"success": true, "data": {"video_id": "vid_7", "video_status": "generating",
                "video_download_url": null}}"#,
        )
        .create_async()
        .await;
    let _missing = server
        .mock("GET", "/api/video/lesson/12/3/1/info")
        .with_status(200)
        .with_body(r#"{"success": true, "data": null, "message": "no video"}"#)
        .create_async()
        .await;

    let client = client(&server);
    let info = client
        .lesson_video_info(&SlotKey::new(12, 3, 0))
        .await?
        .unwrap();
    assert_eq!(info.video_id.as_deref(), Some("vid_7"));
    assert_eq!(info.video_status.as_deref(), Some("generating"));
    assert_eq!(info.video_download_url, None);

    assert_eq!(client.lesson_video_info(&SlotKey::new(12, 3, 1)).await?, None);
    Ok(())
}

#[test]
fn test_base_url_trailing_slash() {
    let client = VideoApiClient::new("http://api.example/", Duration::from_secs(1)).unwrap();
    assert_eq!(client.base_url(), "http://api.example");
}

#[tokio::test]
async fn test_envelope_without_data_field() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _info = server
        .mock("GET", "/api/video/lesson/5/1/0/info")
        .with_status(200)
        .with_body(r#"{"success": true, "message": "no video yet"}"#)
        .create_async()
        .await;
    let _status = server
        .mock("GET", "/api/video/status/vid_9")
        .with_status(200)
        .with_body(r#"{"success": true}"#)
        .create_async()
        .await;

    let client = client(&server);
    assert_eq!(client.lesson_video_info(&SlotKey::new(5, 1, 0)).await?, None);
    assert!(matches!(
        client.fetch_status("vid_9").await,
        Err(QueryError::Parse(_))
    ));
    Ok(())
}
