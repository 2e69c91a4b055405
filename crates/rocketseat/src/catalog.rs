use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;

use crate::{Attachment, JourneyNode, Lesson, RocketseatClient, Specialization};

pub const DEFAULT_OUTPUT_ROOT: &str = "Cursos";
pub const VIDEO_FILE_NAME: &str = "aulinha.mp4";
pub const DESCRIPTION_FILE_NAME: &str = "descricao.txt";

static FORBIDDEN_CHARS_REGEXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[@#$%&*/:^{}<>?"]"#).unwrap());

/// Removes characters that are not allowed in directory names on every platform.
pub fn sanitize(name: &str) -> String {
    FORBIDDEN_CHARS_REGEXP.replace_all(name, "").trim().to_string()
}

/// `{index} - {sanitized name}`
pub fn indexed_name(index: usize, name: &str) -> String {
    format!("{index} - {}", sanitize(name))
}

pub fn attachment_file_name(attachment: &Attachment) -> String {
    format!("{} - {}", sanitize(&attachment.title), attachment.file)
}

/// `<root>/<specialization>/<i - level>`
pub fn level_dir(root: &Path, specialization: &Specialization, index: usize, level: &JourneyNode) -> PathBuf {
    root.join(sanitize(&specialization.title))
        .join(indexed_name(index, &level.title))
}

/// Directory of one lesson below a cluster level.
///
/// The group directory is only added when there is more than one module and
/// more than one group to tell apart.
pub fn cluster_lesson_dir(
    level_dir: &Path,
    module: &str,
    modules_count: usize,
    group: &str,
    groups_count: usize,
    lesson: &str,
) -> PathBuf {
    let module_dir = level_dir.join(module);
    if modules_count == 1 || groups_count == 1 {
        module_dir.join(lesson)
    } else {
        module_dir.join(group).join(lesson)
    }
}

/// One lesson to process, with the directory its files are saved to.
#[derive(Debug, Clone)]
pub struct LessonTask {
    pub save_dir: PathBuf,
    /// Position in the catalog, for logging
    pub label: String,
    pub lesson: Lesson,
}

impl LessonTask {
    pub fn video_path(&self) -> PathBuf {
        self.save_dir.join(VIDEO_FILE_NAME)
    }

    pub fn description_path(&self) -> PathBuf {
        self.save_dir.join(DESCRIPTION_FILE_NAME)
    }

    pub fn attachment_path(&self, attachment: &Attachment) -> PathBuf {
        self.save_dir.join(attachment_file_name(attachment))
    }

    /// Returns whether the lesson has a description.
    pub async fn save_description(&self) -> anyhow::Result<bool> {
        let Some(description) = self.lesson.description() else {
            return Ok(false);
        };
        tokio::fs::create_dir_all(&self.save_dir).await?;
        tokio::fs::write(self.description_path(), description).await?;
        Ok(true)
    }

    /// Downloads attachments that are not saved yet and returns how many were
    /// downloaded. A failed attachment does not stop the others.
    pub async fn save_attachments(&self, client: &RocketseatClient) -> anyhow::Result<usize> {
        let attachments = self.lesson.attachments();
        if attachments.is_empty() {
            return Ok(0);
        }
        tokio::fs::create_dir_all(&self.save_dir).await?;

        let mut downloaded = 0;
        for attachment in attachments {
            let path = self.attachment_path(attachment);
            if path.exists() {
                log::info!("Attachment {} already exists, skipping.", path.display());
                continue;
            }
            match client.download_file(&attachment.file_url, &path).await {
                Ok(()) => {
                    log::info!("Attachment saved: {}", path.display());
                    downloaded += 1;
                }
                Err(e) => log::error!("Failed to download attachment {}: {e}", attachment.title),
            }
        }
        Ok(downloaded)
    }
}

/// Walks every level of `specialization` and lists its lessons in catalog order.
///
/// Unsupported level types are skipped, and so are clusters whose groups
/// can not be loaded.
pub async fn collect_lessons(
    client: &RocketseatClient,
    root: &Path,
    specialization: &Specialization,
) -> anyhow::Result<Vec<LessonTask>> {
    let levels = client.load_journey_nodes(specialization).await?;
    let levels_count = levels.len();
    let mut tasks = Vec::new();

    for (level_index, level) in levels.into_iter().enumerate() {
        let level_index = level_index + 1;
        let level_dir = level_dir(root, specialization, level_index, &level);
        let level_label = format!("Level {level_index}/{levels_count} {}", level.title);

        match level.kind.as_str() {
            "lesson" => match level.lesson {
                Some(lesson) => tasks.push(LessonTask {
                    save_dir: level_dir,
                    label: format!("{level_label} > Lesson 1/1 {}", lesson.title()),
                    lesson,
                }),
                None => log::warn!("{level_label} has no lesson, skipping."),
            },
            "cluster" => {
                let Some(slug) = level.slug.as_deref() else {
                    log::warn!("{level_label} has no slug, skipping.");
                    continue;
                };
                let groups = match client.journey_groups(slug).await {
                    Ok(groups) => groups,
                    Err(e) => {
                        log::error!("Failed to load groups of {level_label}: {e}");
                        continue;
                    }
                };

                // a cluster level is its own single module
                let module = indexed_name(level_index, &level.title);
                let groups_count = groups.len();
                for (group_index, group) in groups.into_iter().enumerate() {
                    let group_index = group_index + 1;
                    let group_name = indexed_name(group_index, &group.title);
                    let lessons_count = group.lessons.len();

                    for (lesson_index, lesson) in group.lessons.into_iter().enumerate() {
                        let lesson_index = lesson_index + 1;
                        tasks.push(LessonTask {
                            save_dir: cluster_lesson_dir(
                                &level_dir,
                                &module,
                                1,
                                &group_name,
                                groups_count,
                                &indexed_name(lesson_index, lesson.title()),
                            ),
                            label: format!(
                                "{level_label} > Group {group_index}/{groups_count} {} > Lesson {lesson_index}/{lessons_count} {}",
                                group.title,
                                lesson.title()
                            ),
                            lesson,
                        });
                    }
                }
            }
            kind => log::warn!("{level_label} has unsupported type {kind}, skipping."),
        }
    }

    Ok(tasks)
}
