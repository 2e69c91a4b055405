use std::{
    collections::VecDeque,
    num::NonZeroU32,
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use reqwest::{header::HeaderMap, Url};
use tokio::{fs::File, io::AsyncWriteExt, sync::mpsc::UnboundedSender};

use crate::{
    download::{FetchEvent, FetchReport},
    error::AulasResult,
    fetch::fetch_bytes,
    hls::{order_by_sequence_hint, MediaPlaylist, SegmentRef},
    staging::StagingArea,
    util::http::HttpClient,
};

/// A fixed number of workers draining one shared queue of segments into a
/// [StagingArea].
///
/// Workers finish in arbitrary order. The output order is carried by the
/// staged file names and the local playlist, never by completion order.
pub struct SegmentFetcherPool {
    client: HttpClient,
    concurrency: NonZeroU32,
    retries: u32,
    events: Option<UnboundedSender<FetchEvent>>,
}

struct WorkerContext {
    client: HttpClient,
    headers: HeaderMap,
    staging_dir: PathBuf,
    retries: u32,
    events: Option<UnboundedSender<FetchEvent>>,

    queue: Mutex<VecDeque<(SegmentRef, Url)>>,
    total: usize,
    completed: AtomicUsize,
    succeeded: AtomicUsize,
    failed: Mutex<Vec<SegmentRef>>,
}

impl SegmentFetcherPool {
    pub fn builder() -> SegmentFetcherPoolBuilder {
        SegmentFetcherPoolBuilder::new()
    }

    pub fn concurrency(&self) -> NonZeroU32 {
        self.concurrency
    }

    /// Downloads every segment of `playlist` into `staging`.
    ///
    /// A segment that still fails after all retries is reported in
    /// [FetchReport::failed] and does not stop the other workers.
    pub async fn fetch_all(
        &self,
        playlist: &MediaPlaylist,
        headers: &HeaderMap,
        staging: &StagingArea,
    ) -> AulasResult<FetchReport> {
        let mut segments = playlist.segments.clone();
        order_by_sequence_hint(&mut segments, |segment| segment.sequence_hint);

        let total = segments.len();
        let mut queue = VecDeque::with_capacity(total);
        let mut failed = Vec::new();
        for segment in segments {
            match playlist.segment_url(&segment) {
                Ok(url) => queue.push_back((segment, url)),
                Err(e) => {
                    tracing::error!("Invalid segment uri {}: {e}", segment.uri);
                    failed.push(segment);
                }
            }
        }

        let context = Arc::new(WorkerContext {
            client: self.client.clone(),
            headers: headers.clone(),
            staging_dir: staging.path().to_path_buf(),
            retries: self.retries,
            events: self.events.clone(),

            queue: Mutex::new(queue),
            total,
            completed: AtomicUsize::new(failed.len()),
            succeeded: AtomicUsize::new(0),
            failed: Mutex::new(failed),
        });
        context.emit(FetchEvent::Started { total });

        let workers = (self.concurrency.get() as usize).min(total);
        tracing::info!("Start downloading {total} segments with {workers} worker(s).");

        let handles: Vec<_> = (0..workers)
            .map(|_| tokio::spawn(context.clone().run()))
            .collect();
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Segment worker stopped unexpectedly: {e}");
            }
        }

        let failed = std::mem::take(&mut *context.failed.lock().unwrap());
        let succeeded = context.succeeded.load(Ordering::Relaxed);
        if !failed.is_empty() {
            tracing::error!("Failed to download {} segments:", failed.len());
            for segment in failed.iter() {
                tracing::error!("  - {}", segment.uri);
            }
        }
        context.emit(FetchEvent::Finished {
            succeeded,
            failed: failed.len(),
        });

        Ok(FetchReport {
            total,
            succeeded,
            failed,
        })
    }
}

impl WorkerContext {
    async fn run(self: Arc<Self>) {
        loop {
            let next = self.queue.lock().unwrap().pop_front();
            let Some((segment, url)) = next else {
                break;
            };
            let filename = segment.file_name().to_string();

            let mut retries = self.retries;
            let success = loop {
                match self.fetch_segment(&filename, &url).await {
                    Ok(()) => break true,
                    Err(e) if retries == 0 => {
                        tracing::error!(
                            "Processing {filename} failed, max retries exceed, drop. {e}"
                        );
                        break false;
                    }
                    Err(e) => {
                        retries -= 1;
                        tracing::warn!("Processing {filename} failed, retry later. {e}");
                    }
                }
            };

            if success {
                self.succeeded.fetch_add(1, Ordering::Relaxed);
            } else {
                self.failed.lock().unwrap().push(segment);
            }

            let completed = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
            let percentage = completed as f32 / self.total as f32 * 100.;
            tracing::debug!(
                "Processing {filename} finished. ({completed} / {total} or {percentage:.2}%)",
                total = self.total
            );
            self.emit(FetchEvent::SegmentFinished {
                file_name: filename,
                success,
                completed,
                total: self.total,
            });
        }
    }

    async fn fetch_segment(&self, filename: &str, url: &Url) -> AulasResult<()> {
        let bytes = fetch_bytes(&self.client, url.clone(), &self.headers).await?;

        // body is only written once complete, a failed request leaves no file behind
        let mut file = File::create(self.staging_dir.join(filename)).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        Ok(())
    }

    fn emit(&self, event: FetchEvent) {
        if let Some(events) = &self.events {
            _ = events.send(event);
        }
    }
}

pub struct SegmentFetcherPoolBuilder {
    client: HttpClient,
    concurrency: NonZeroU32,
    retries: u32,
    events: Option<UnboundedSender<FetchEvent>>,
}

impl SegmentFetcherPoolBuilder {
    pub fn new() -> Self {
        Self {
            client: HttpClient::default(),
            concurrency: NonZeroU32::new(10).unwrap(),
            retries: 3,
            events: None,
        }
    }

    pub fn client(mut self, client: HttpClient) -> Self {
        self.client = client;
        self
    }

    pub fn concurrency(mut self, concurrency: NonZeroU32) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Receives one [FetchEvent::SegmentFinished] per segment.
    pub fn events(mut self, events: UnboundedSender<FetchEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn build(self) -> SegmentFetcherPool {
        SegmentFetcherPool {
            client: self.client,
            concurrency: self.concurrency,
            retries: self.retries,
            events: self.events,
        }
    }
}

impl Default for SegmentFetcherPoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}
