use aulas::download::FetchEvent;
use tokio::{sync::mpsc::UnboundedReceiver, task::JoinHandle};

/// Logs fetch progress, about every tenth of a playlist.
pub fn spawn_progress_logger(mut events: UnboundedReceiver<FetchEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                FetchEvent::Started { total } => log::info!("Downloading {total} segments."),
                FetchEvent::SegmentFinished {
                    completed, total, ..
                } => {
                    let step = (total / 10).max(1);
                    if completed % step == 0 || completed == total {
                        log::info!("Downloaded segment {completed} of {total}.");
                    }
                }
                FetchEvent::Finished { succeeded, failed } => {
                    if failed > 0 {
                        log::warn!("{succeeded} segments downloaded, {failed} failed.");
                    } else {
                        log::info!("All {succeeded} segments downloaded.");
                    }
                }
            }
        }
    })
}
