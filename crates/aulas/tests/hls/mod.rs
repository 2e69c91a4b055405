use std::sync::Arc;

use aulas::{
    hls::{ManifestResolver, SelectionPolicy, VariantChooser, VariantPlaylist},
    AulasError, HttpClient, MediaSource,
};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use crate::{media_path, HlsMock, IDENTIFIER};

const VARIANTS: &[(&str, Option<(u64, u64)>)] = &[
    ("360p/video.m3u8", Some((640, 360))),
    ("1080p/video.m3u8", Some((1920, 1080))),
    ("720p/video.m3u8", Some((1280, 720))),
];

async fn setup_mock_server() -> (MediaSource, MockServer) {
    let server = MockServer::start().await;
    server
        .mock_master(&media_path("playlist.m3u8"), VARIANTS)
        .await;
    for (uri, _) in VARIANTS {
        let quality = uri.split('/').next().unwrap();
        server
            .mock_media(
                &media_path(uri),
                &[&format!("{quality}-video0.ts"), &format!("{quality}-video1.ts")],
            )
            .await;
    }

    (MediaSource::new(IDENTIFIER, server.uri()), server)
}

fn resolver() -> ManifestResolver {
    ManifestResolver::new(HttpClient::default())
}

#[tokio::test]
async fn test_best_variant() -> anyhow::Result<()> {
    let (source, _server) = setup_mock_server().await;

    let playlist = resolver().resolve(&source, &SelectionPolicy::Best).await?;
    assert!(playlist.base_uri.path().ends_with("/1080p/video.m3u8"));
    assert_eq!(playlist.len(), 2);
    assert_eq!(playlist.segments[0].uri, "1080p-video0.ts");

    Ok(())
}

#[tokio::test]
async fn test_second_best_variant() -> anyhow::Result<()> {
    let (source, _server) = setup_mock_server().await;

    let playlist = resolver()
        .resolve(&source, &SelectionPolicy::SecondBest)
        .await?;
    assert!(playlist.base_uri.path().ends_with("/720p/video.m3u8"));

    Ok(())
}

struct PickFirst;

impl VariantChooser for PickFirst {
    fn choose(&self, _variants: &[VariantPlaylist]) -> Option<usize> {
        Some(1)
    }
}

#[tokio::test]
async fn test_interactive_variant() -> anyhow::Result<()> {
    let (source, _server) = setup_mock_server().await;

    let policy = SelectionPolicy::Interactive(Arc::new(PickFirst));
    let playlist = resolver().resolve(&source, &policy).await?;
    assert!(playlist.base_uri.path().ends_with("/360p/video.m3u8"));

    Ok(())
}

#[tokio::test]
async fn test_media_playlist_at_top_level() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server
        .mock_media(&media_path("playlist.m3u8"), &["video0.ts", "video1.ts"])
        .await;
    let source = MediaSource::new(IDENTIFIER, server.uri());

    let playlist = resolver().resolve(&source, &SelectionPolicy::Best).await?;
    assert_eq!(playlist.len(), 2);
    assert_eq!(
        playlist.segment_url(&playlist.segments[1])?.as_str(),
        format!("{}/{IDENTIFIER}/video1.ts", server.uri())
    );

    Ok(())
}

#[tokio::test]
async fn test_absolute_variant_uri() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let absolute = format!("{}/elsewhere/video.m3u8", server.uri());
    server
        .mock_master(&media_path("playlist.m3u8"), &[(&absolute, Some((1280, 720)))])
        .await;
    server
        .mock_media("/elsewhere/video.m3u8", &["video0.ts"])
        .await;
    let source = MediaSource::new(IDENTIFIER, server.uri());

    let playlist = resolver().resolve(&source, &SelectionPolicy::Best).await?;
    assert_eq!(playlist.base_uri.as_str(), absolute);

    Ok(())
}

#[tokio::test]
async fn test_empty_media_playlist() {
    let server = MockServer::start().await;
    server.mock_media(&media_path("playlist.m3u8"), &[]).await;
    let source = MediaSource::new(IDENTIFIER, server.uri());

    let error = resolver()
        .resolve(&source, &SelectionPolicy::Best)
        .await
        .unwrap_err();
    assert!(matches!(error, AulasError::EmptyPlaylist(_)));
    assert!(error.is_manifest_error());
}

#[tokio::test]
async fn test_manifest_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(media_path("playlist.m3u8")))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&server)
        .await;
    let source = MediaSource::new(IDENTIFIER, server.uri());

    let error = resolver()
        .with_retry(3)
        .resolve(&source, &SelectionPolicy::Best)
        .await
        .unwrap_err();
    assert!(matches!(error, AulasError::M3u8FetchError));
}

#[tokio::test]
async fn test_fallback_variant_without_resolutions() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server
        .mock_master(
            &media_path("playlist.m3u8"),
            &[("stream-a.m3u8", None), ("stream-b.m3u8", None)],
        )
        .await;
    server
        .mock_media(&media_path("1080p/video.m3u8"), &["video0.ts"])
        .await;
    let source = MediaSource::new(IDENTIFIER, server.uri());

    let playlist = resolver()
        .resolve_with_fallback(&source, &SelectionPolicy::SecondBest, Some("1080p/video.m3u8"))
        .await?;
    assert!(playlist.base_uri.path().ends_with("/1080p/video.m3u8"));

    Ok(())
}

#[tokio::test]
async fn test_fallback_variant_ignored_with_resolutions() -> anyhow::Result<()> {
    let (source, _server) = setup_mock_server().await;

    let playlist = resolver()
        .resolve_with_fallback(&source, &SelectionPolicy::SecondBest, Some("1080p/video.m3u8"))
        .await?;
    assert!(playlist.base_uri.path().ends_with("/720p/video.m3u8"));

    Ok(())
}

#[tokio::test]
async fn test_estimate_size() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server
        .mock_media(&media_path("playlist.m3u8"), &["video0.ts", "video1.ts"])
        .await;
    Mock::given(method("HEAD"))
        .and(path(media_path("video0.ts")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 1000]))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path(media_path("video1.ts")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 24]))
        .mount(&server)
        .await;
    let source = MediaSource::new(IDENTIFIER, server.uri());

    let resolver = resolver();
    let playlist = resolver.resolve(&source, &SelectionPolicy::Best).await?;
    assert_eq!(resolver.estimate_size(&source, &playlist).await?, 1024);

    Ok(())
}
