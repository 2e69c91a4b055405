use std::{num::NonZeroU32, path::PathBuf, sync::Arc};

use anyhow::bail;
use aulas::{
    coordinator::Coordinator,
    download::SegmentFetcherPool,
    hls::SelectionPolicy,
    merge::FfmpegRemuxer,
    probe::FfprobeDurationProbe,
    DownloadStatus,
};
use aulas_rocketseat::{collect_lessons, LessonTask, RocketseatClient, Specialization};
use clap::Parser;

use crate::{
    commands::{authenticated_client, HttpOptions},
    config::Config,
    progress::spawn_progress_logger,
    prompt::{confirm, read_index, StdinChooser},
};

/// Download every lesson of one or all specializations
#[derive(Parser, Clone, Debug)]
#[clap(visible_alias = "dl")]
pub struct DownloadCommand {
    #[clap(flatten)]
    pub http: HttpOptions,

    /// Specialization number as listed by `courses`, 0 for all of them
    #[clap(short, long)]
    pub specialization: Option<usize>,

    /// Choose the video quality of every lesson and confirm its estimated size
    #[clap(long)]
    pub choose_quality: bool,

    /// Concurrent segment downloads
    #[clap(long, alias = "threads")]
    pub concurrency: Option<NonZeroU32>,

    /// Segment retry limit
    #[clap(long)]
    pub segment_retries: Option<u32>,

    /// Manifest retry limit
    #[clap(long)]
    pub manifest_retries: Option<u32>,

    /// Root directory of the downloaded specializations
    #[clap(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Default)]
struct Summary {
    downloaded: usize,
    skipped: usize,
    failed: usize,
}

impl DownloadCommand {
    pub async fn run(self, mut config: Config) -> anyhow::Result<()> {
        if let Some(concurrency) = self.concurrency {
            config.download.concurrency = concurrency;
        }
        if let Some(retries) = self.segment_retries {
            config.download.segment_retries = retries;
        }
        if let Some(retries) = self.manifest_retries {
            config.download.manifest_retries = retries;
        }
        if let Some(output) = self.output {
            config.paths.output_root = output;
        }

        let client = self.http.into_client(&config)?;
        let platform = authenticated_client(&config, client.clone()).await?;

        let specializations = platform.list_specializations().await?;
        if specializations.is_empty() {
            bail!("no specialization available for this account");
        }
        let selected = select_specializations(specializations, self.specialization)?;

        let chooser = Arc::new(StdinChooser::default());
        let mut primary = config.primary.primary_origin()?;
        if self.choose_quality {
            primary = primary.with_policy(SelectionPolicy::Interactive(chooser.clone()));
        }

        let (events, receiver) = tokio::sync::mpsc::unbounded_channel();
        let progress = spawn_progress_logger(receiver);
        let pool = SegmentFetcherPool::builder()
            .client(client.clone())
            .concurrency(config.download.concurrency)
            .retries(config.download.segment_retries)
            .events(events)
            .build();
        let coordinator = Coordinator::builder(primary, config.secondary.secondary_origin()?)
            .client(client)
            .pool(pool)
            .manifest_retries(config.download.manifest_retries)
            .staging_root(&config.paths.temp_root)
            .min_duration(config.download.min_duration)
            .build(FfmpegRemuxer::new(), FfprobeDurationProbe::new());

        let mut summary = Summary::default();
        for specialization in selected {
            log::info!("Downloading specialization {}.", specialization.title);
            let tasks =
                match collect_lessons(&platform, &config.paths.output_root, &specialization).await {
                    Ok(tasks) => tasks,
                    Err(e) => {
                        log::error!("Failed to list lessons of {}: {e}", specialization.title);
                        continue;
                    }
                };

            for task in tasks {
                if self.choose_quality {
                    chooser.forget();
                }
                process_lesson(
                    &platform,
                    &coordinator,
                    &task,
                    self.choose_quality,
                    &mut summary,
                )
                .await;
            }
        }

        drop(coordinator);
        _ = progress.await;

        log::info!(
            "Finished: {} downloaded, {} skipped, {} failed.",
            summary.downloaded,
            summary.skipped,
            summary.failed
        );
        Ok(())
    }
}

fn select_specializations(
    specializations: Vec<Specialization>,
    choice: Option<usize>,
) -> anyhow::Result<Vec<Specialization>> {
    let choice = match choice {
        Some(choice) if choice <= specializations.len() => choice,
        Some(choice) => bail!(
            "specialization {choice} does not exist, there are {}",
            specializations.len()
        ),
        None => {
            println!("Select a specialization, or 0 for all of them:");
            for (i, specialization) in specializations.iter().enumerate() {
                println!("[{}] - {}", i + 1, specialization.title);
            }
            read_index(">> ", 0, specializations.len())?
        }
    };

    Ok(match choice {
        0 => specializations,
        choice => specializations.into_iter().skip(choice - 1).take(1).collect(),
    })
}

/// Video, description and attachments of one lesson. Failures are logged and counted.
async fn process_lesson(
    platform: &RocketseatClient,
    coordinator: &Coordinator<FfmpegRemuxer, FfprobeDurationProbe>,
    task: &LessonTask,
    confirm_size: bool,
    summary: &mut Summary,
) {
    log::info!("{}", task.label);

    match task.lesson.video_id() {
        Some(video_id) => {
            let proceed = !confirm_size
                || task.video_path().exists()
                || confirm_estimated_size(coordinator, video_id).await;
            if proceed {
                match coordinator.download(video_id, task.video_path()).await {
                    DownloadStatus::AlreadyExists => summary.skipped += 1,
                    DownloadStatus::Primary | DownloadStatus::Secondary => summary.downloaded += 1,
                    DownloadStatus::Failed => {
                        log::error!("Failed to download video of {}.", task.lesson.title());
                        summary.failed += 1;
                    }
                }
            } else {
                log::info!("Download cancelled.");
                summary.skipped += 1;
            }
        }
        None => log::warn!(
            "Unknown lesson type {} of {}, skipping video.",
            task.lesson.kind,
            task.lesson.title()
        ),
    }

    if let Err(e) = task.save_description().await {
        log::error!("Failed to save description of {}: {e}", task.lesson.title());
    }
    if let Err(e) = task.save_attachments(platform).await {
        log::error!("Failed to save attachments of {}: {e}", task.lesson.title());
    }
}

/// Resolves the primary playlist, prints its estimated size and asks to go on.
async fn confirm_estimated_size(
    coordinator: &Coordinator<FfmpegRemuxer, FfprobeDurationProbe>,
    video_id: &str,
) -> bool {
    let primary = coordinator.primary();
    let source = primary.source(video_id);
    let estimated = match coordinator.resolver().resolve(&source, &primary.policy).await {
        Ok(playlist) => coordinator.resolver().estimate_size(&source, &playlist).await,
        Err(e) => Err(e),
    };

    match estimated {
        Ok(size) => {
            println!(
                "Estimated size: {:.2} MB",
                size as f64 / (1024. * 1024.)
            );
            confirm("Continue with the download?").unwrap_or(false)
        }
        Err(e) => {
            log::warn!("Can not estimate the size of {video_id}: {e}");
            true
        }
    }
}
