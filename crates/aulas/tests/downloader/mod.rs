use std::num::NonZeroU32;

use aulas::{
    AulasError,
    download::{FetchEvent, SegmentFetcherPool},
    hls::{m3u8_rs, MediaPlaylist},
    merge::RemuxAssembler,
    staging::StagingArea,
};
use reqwest::{header::HeaderMap, Url};
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use crate::{
    media_path, media_playlist,
    remux::{ConcatRemuxer, EmptyRemuxer},
    HlsMock,
};

fn parse_playlist(server: &MockServer, segments: &[&str]) -> MediaPlaylist {
    let body = media_playlist(segments);
    let playlist = m3u8_rs::parse_media_playlist_res(body.as_bytes()).unwrap();
    let base = Url::parse(&format!("{}{}", server.uri(), media_path("720p/video.m3u8"))).unwrap();
    MediaPlaylist::new(playlist, base)
}

#[tokio::test]
async fn test_sequence_hint_order() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server.mock(&media_path("720p/video1.ts"), "A").await;
    server.mock(&media_path("720p/video2.ts"), "B").await;
    server.mock(&media_path("720p/video10.ts"), "C").await;
    let playlist = parse_playlist(&server, &["video1.ts", "video10.ts", "video2.ts"]);

    let root = tempfile::tempdir()?;
    let staging_root = root.path().join(".temp");
    let staging = StagingArea::create(&staging_root).await?;

    let report = SegmentFetcherPool::builder()
        .concurrency(NonZeroU32::new(3).unwrap())
        .build()
        .fetch_all(&playlist, &HeaderMap::new(), &staging)
        .await?;
    assert!(report.is_complete());
    assert_eq!(report.succeeded, 3);

    let remuxer = ConcatRemuxer::default();
    let output = root.path().join("aulinha.mp4");
    RemuxAssembler::new(remuxer.clone())
        .assemble(staging, &playlist, &output)
        .await?;

    assert_eq!(
        remuxer.calls(),
        vec![vec!["video1.ts", "video2.ts", "video10.ts"]]
    );
    assert_eq!(tokio::fs::read_to_string(&output).await?, "ABC");
    assert!(!staging_root.exists());

    Ok(())
}

#[tokio::test]
async fn test_empty_output_is_rejected() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server.mock(&media_path("720p/video0.ts"), "A").await;
    let playlist = parse_playlist(&server, &["video0.ts"]);

    let root = tempfile::tempdir()?;
    let staging_root = root.path().join(".temp");
    let staging = StagingArea::create(&staging_root).await?;
    SegmentFetcherPool::builder()
        .build()
        .fetch_all(&playlist, &HeaderMap::new(), &staging)
        .await?;

    let output = root.path().join("aulinha.mp4");
    let result = RemuxAssembler::new(EmptyRemuxer)
        .assemble(staging, &playlist, &output)
        .await;

    assert!(matches!(result, Err(AulasError::RemuxError(_))));
    assert!(!staging_root.exists());

    Ok(())
}

#[tokio::test]
async fn test_one_failed_segment_of_fifty() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let names: Vec<String> = (0..50).map(|i| format!("video{i}.ts")).collect();
    for name in names.iter() {
        if name == "video17.ts" {
            server
                .mock_status(&media_path(&format!("720p/{name}")), 500)
                .await;
        } else {
            server.mock(&media_path(&format!("720p/{name}")), "x").await;
        }
    }
    let segments: Vec<&str> = names.iter().map(String::as_str).collect();
    let playlist = parse_playlist(&server, &segments);

    let root = tempfile::tempdir()?;
    let staging = StagingArea::create(root.path()).await?;
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let report = SegmentFetcherPool::builder()
        .retries(0)
        .events(tx)
        .build()
        .fetch_all(&playlist, &HeaderMap::new(), &staging)
        .await?;

    assert_eq!(report.total, 50);
    assert_eq!(report.succeeded, 49);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].uri, "video17.ts");
    assert!(!report.is_complete());
    assert!(!staging.segment_path("video17.ts").exists());
    assert!(staging.segment_path("video18.ts").exists());

    let mut finished = 0;
    let mut last = None;
    while let Ok(event) = rx.try_recv() {
        if let FetchEvent::SegmentFinished { .. } = event {
            finished += 1;
        }
        last = Some(event);
    }
    assert_eq!(finished, 50);
    assert_eq!(
        last,
        Some(FetchEvent::Finished {
            succeeded: 49,
            failed: 1
        })
    );

    // the remux still runs with the segments that made it
    let remuxer = ConcatRemuxer::default();
    let output = root.path().join("aulinha.mp4");
    RemuxAssembler::new(remuxer)
        .assemble(staging, &playlist, &output)
        .await?;
    assert_eq!(tokio::fs::read(&output).await?.len(), 49);

    Ok(())
}

#[tokio::test]
async fn test_segment_retry() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(media_path("720p/video0.ts")))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    server.mock(&media_path("720p/video0.ts"), "payload").await;
    let playlist = parse_playlist(&server, &["video0.ts"]);

    let root = tempfile::tempdir()?;
    let staging = StagingArea::create(root.path()).await?;

    let report = SegmentFetcherPool::builder()
        .retries(3)
        .build()
        .fetch_all(&playlist, &HeaderMap::new(), &staging)
        .await?;
    assert!(report.is_complete());
    assert_eq!(
        tokio::fs::read_to_string(staging.segment_path("video0.ts")).await?,
        "payload"
    );

    Ok(())
}

#[tokio::test]
async fn test_origin_headers_are_sent() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(media_path("720p/video0.ts")))
        .and(header("referer", "https://app.example.com/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;
    let playlist = parse_playlist(&server, &["video0.ts"]);

    let mut headers = HeaderMap::new();
    headers.insert("referer", "https://app.example.com/".parse()?);

    let root = tempfile::tempdir()?;
    let staging = StagingArea::create(root.path()).await?;
    let report = SegmentFetcherPool::builder()
        .retries(0)
        .build()
        .fetch_all(&playlist, &headers, &staging)
        .await?;
    assert!(report.is_complete());

    Ok(())
}
