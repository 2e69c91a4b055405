use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Specialization {
    pub title: String,
    pub uri: String,
    pub slug: String,
}

#[derive(Deserialize)]
pub(crate) struct CatalogPage {
    pub items: Vec<Specialization>,
}

/// Response of `POST /sessions`
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionResponse {
    /// `bearer`
    #[serde(rename = "type")]
    pub token_type: String,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Account {
    pub name: String,
}

#[derive(Deserialize)]
pub(crate) struct JourneyEnvelope {
    pub journey: Journey,
}

#[derive(Deserialize)]
pub(crate) struct Journey {
    pub nodes: Vec<JourneyNode>,
}

/// One level of a specialization.
#[derive(Deserialize, Debug, Clone)]
pub struct JourneyNode {
    pub title: String,
    /// `lesson`, `cluster`, ...
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub slug: Option<String>,
    /// Only for `lesson` levels
    #[serde(default)]
    pub lesson: Option<Lesson>,
}

/// Response of `GET /journey-nodes/{slug}`
#[derive(Deserialize, Debug)]
pub(crate) struct JourneyNodeDetail {
    pub cluster: Option<Cluster>,
    #[serde(default)]
    pub group: Option<Group>,
}

impl JourneyNodeDetail {
    pub fn into_groups(self) -> Vec<Group> {
        match (self.cluster, self.group) {
            (Some(cluster), _) => cluster.groups,
            (None, Some(group)) => vec![group],
            (None, None) => Vec::new(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub(crate) struct Cluster {
    pub groups: Vec<Group>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Group {
    pub title: String,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Lesson {
    /// `video` is the only kind with media
    #[serde(rename = "type")]
    pub kind: String,
    /// Latest revision of the lesson
    pub last: LessonContent,
}

impl Lesson {
    pub fn title(&self) -> &str {
        &self.last.title
    }

    /// Media identifier of `video` lessons.
    pub fn video_id(&self) -> Option<&str> {
        match self.kind.as_str() {
            "video" => self.last.resource.as_deref(),
            _ => None,
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.last.description.as_deref().filter(|d| !d.is_empty())
    }

    pub fn attachments(&self) -> &[Attachment] {
        self.last.downloads.as_deref().unwrap_or_default()
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct LessonContent {
    pub title: String,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub downloads: Option<Vec<Attachment>>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Attachment {
    pub title: String,
    pub file: String,
    pub file_url: String,
}
