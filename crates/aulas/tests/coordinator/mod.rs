use std::path::{Path, PathBuf};

use std::sync::atomic::Ordering;

use aulas::{
    coordinator::{Coordinator, DownloadStatus, Origin},
    download::SegmentFetcherPool,
    merge::Remuxer,
    probe::DurationProbe,
};
use tempfile::TempDir;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use crate::{
    media_path,
    remux::{ConcatRemuxer, EmptyRemuxer, FlakyRemuxer, LengthProbe},
    HlsMock, IDENTIFIER,
};

struct Workspace {
    root: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    fn staging_root(&self) -> PathBuf {
        self.root.path().join(".temp")
    }

    fn output(&self) -> PathBuf {
        self.root
            .path()
            .join("Cursos")
            .join("1 - Fundamentos")
            .join("aulinha.mp4")
    }

    fn partial(&self) -> PathBuf {
        self.output().with_file_name("aulinha_partial.mp4")
    }

    fn coordinator<R, P>(
        &self,
        primary: &MockServer,
        secondary: &MockServer,
        remuxer: R,
        probe: P,
    ) -> Coordinator<R, P>
    where
        R: Remuxer + Sync,
        P: DurationProbe + Sync,
    {
        Coordinator::builder(Origin::primary(primary.uri()), Origin::secondary(secondary.uri()))
            .pool(SegmentFetcherPool::builder().retries(0).build())
            .manifest_retries(1)
            .staging_root(self.staging_root())
            .build(remuxer, probe)
    }
}

/// Master playlist with one variant of `segments` segments whose bodies are `body`.
async fn mock_origin(server: &MockServer, segments: usize, body: &str) {
    server
        .mock_master(
            &media_path("playlist.m3u8"),
            &[("720p/video.m3u8", Some((1280, 720)))],
        )
        .await;
    let names: Vec<String> = (0..segments).map(|i| format!("video{i}.ts")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    server
        .mock_media(&media_path("720p/video.m3u8"), &refs)
        .await;
    for name in names.iter() {
        server
            .mock(&media_path(&format!("720p/{name}")), body)
            .await;
    }
}

fn assert_no_leftovers(workspace: &Workspace) {
    assert!(!workspace.staging_root().exists());
    assert!(!workspace.partial().exists());
}

async fn read(path: &Path) -> String {
    tokio::fs::read_to_string(path).await.unwrap()
}

#[tokio::test]
async fn test_primary_success() -> anyhow::Result<()> {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;
    mock_origin(&primary, 3, "primary").await;

    let workspace = Workspace::new();
    let coordinator = workspace.coordinator(&primary, &secondary, ConcatRemuxer::default(), LengthProbe);

    let status = coordinator.download(IDENTIFIER, workspace.output()).await;
    assert_eq!(status, DownloadStatus::Primary);
    assert_eq!(read(&workspace.output()).await, "primary".repeat(3));
    assert_no_leftovers(&workspace);
    assert!(secondary.received_requests().await.unwrap().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_short_primary_falls_back_to_secondary() -> anyhow::Result<()> {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;
    // three one-byte segments probe as three seconds
    mock_origin(&primary, 3, "p").await;

    secondary
        .mock_master(
            &media_path("playlist.m3u8"),
            &[
                ("1080p/video.m3u8", Some((1920, 1080))),
                ("720p/video.m3u8", Some((1280, 720))),
            ],
        )
        .await;
    secondary
        .mock_media(&media_path("720p/video.m3u8"), &["video0.ts", "video1.ts"])
        .await;
    secondary
        .mock(&media_path("720p/video0.ts"), "secondary-0;")
        .await;
    secondary
        .mock(&media_path("720p/video1.ts"), "secondary-1;")
        .await;

    let workspace = Workspace::new();
    let remuxer = ConcatRemuxer::default();
    let coordinator = workspace.coordinator(&primary, &secondary, remuxer.clone(), LengthProbe);

    let status = coordinator.download(IDENTIFIER, workspace.output()).await;
    assert_eq!(status, DownloadStatus::Secondary);
    assert_eq!(
        read(&workspace.output()).await,
        "secondary-0;secondary-1;"
    );
    assert_eq!(remuxer.calls().len(), 2);
    assert_no_leftovers(&workspace);

    Ok(())
}

#[tokio::test]
async fn test_secondary_fallback_variant() -> anyhow::Result<()> {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;
    primary
        .mock_status(&media_path("playlist.m3u8"), 404)
        .await;

    secondary
        .mock_master(
            &media_path("playlist.m3u8"),
            &[("a.m3u8", None), ("b.m3u8", None)],
        )
        .await;
    secondary
        .mock_media(&media_path("1080p/video.m3u8"), &["video0.ts"])
        .await;
    secondary
        .mock(&media_path("1080p/video0.ts"), "long enough output")
        .await;

    let workspace = Workspace::new();
    let coordinator = workspace.coordinator(&primary, &secondary, ConcatRemuxer::default(), LengthProbe);

    let status = coordinator.download(IDENTIFIER, workspace.output()).await;
    assert_eq!(status, DownloadStatus::Secondary);
    assert_eq!(read(&workspace.output()).await, "long enough output");

    Ok(())
}

#[tokio::test]
async fn test_both_origins_fail() -> anyhow::Result<()> {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;
    mock_origin(&primary, 1, "p").await;
    mock_origin(&secondary, 1, "s").await;

    let workspace = Workspace::new();
    let coordinator = workspace.coordinator(&primary, &secondary, ConcatRemuxer::default(), LengthProbe);

    let status = coordinator.download(IDENTIFIER, workspace.output()).await;
    assert_eq!(status, DownloadStatus::Failed);
    assert!(!status.is_success());
    assert!(!workspace.output().exists());
    assert_no_leftovers(&workspace);

    Ok(())
}

#[tokio::test]
async fn test_primary_remux_failure_falls_back() -> anyhow::Result<()> {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;
    mock_origin(&primary, 2, "primary-long-segment").await;
    mock_origin(&secondary, 2, "secondary-long-segment").await;

    let workspace = Workspace::new();
    let remuxer = FlakyRemuxer::failing(1);
    let coordinator = workspace.coordinator(&primary, &secondary, remuxer.clone(), LengthProbe);

    let status = coordinator.download(IDENTIFIER, workspace.output()).await;
    assert_eq!(status, DownloadStatus::Secondary);
    assert_eq!(remuxer.attempts.load(Ordering::SeqCst), 2);
    assert_eq!(
        read(&workspace.output()).await,
        "secondary-long-segment".repeat(2)
    );
    assert!(!secondary.received_requests().await.unwrap().is_empty());
    assert_no_leftovers(&workspace);

    Ok(())
}

#[tokio::test]
async fn test_empty_remux_output_fails_both() -> anyhow::Result<()> {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;
    mock_origin(&primary, 1, "primary-long-segment").await;
    mock_origin(&secondary, 1, "secondary-long-segment").await;

    let workspace = Workspace::new();
    let coordinator = workspace.coordinator(&primary, &secondary, EmptyRemuxer, LengthProbe);

    let status = coordinator.download(IDENTIFIER, workspace.output()).await;
    assert_eq!(status, DownloadStatus::Failed);
    assert!(!secondary.received_requests().await.unwrap().is_empty());
    assert!(!workspace.output().exists());
    assert_no_leftovers(&workspace);

    Ok(())
}

#[tokio::test]
async fn test_second_download_is_noop() -> anyhow::Result<()> {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(media_path("playlist.m3u8")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(crate::media_playlist(&["video0.ts"])),
        )
        .expect(1)
        .mount(&primary)
        .await;
    primary
        .mock(&media_path("video0.ts"), "a lesson that lasts")
        .await;

    let workspace = Workspace::new();
    let coordinator = workspace.coordinator(&primary, &secondary, ConcatRemuxer::default(), LengthProbe);

    let first = coordinator.download(IDENTIFIER, workspace.output()).await;
    assert_eq!(first, DownloadStatus::Primary);
    let second = coordinator.download(IDENTIFIER, workspace.output()).await;
    assert_eq!(second, DownloadStatus::AlreadyExists);
    assert_eq!(read(&workspace.output()).await, "a lesson that lasts");

    Ok(())
}

#[tokio::test]
async fn test_existing_destination_sends_no_request() -> anyhow::Result<()> {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;
    mock_origin(&primary, 1, "unused").await;

    let workspace = Workspace::new();
    tokio::fs::create_dir_all(workspace.output().parent().unwrap()).await?;
    tokio::fs::write(workspace.output(), "already here").await?;

    let coordinator = workspace.coordinator(&primary, &secondary, ConcatRemuxer::default(), LengthProbe);
    let status = coordinator.download(IDENTIFIER, workspace.output()).await;

    assert_eq!(status, DownloadStatus::AlreadyExists);
    assert!(primary.received_requests().await.unwrap().is_empty());
    assert!(secondary.received_requests().await.unwrap().is_empty());
    assert_eq!(read(&workspace.output()).await, "already here");

    Ok(())
}
