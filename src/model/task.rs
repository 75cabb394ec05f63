use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Workflow status of a task or process.
///
/// A flat enumeration: any status may follow any other, and status only ever
/// changes through an explicit user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "Pendiente")]
    Pending,
    #[serde(rename = "En Progreso")]
    InProgress,
    #[serde(rename = "Completado")]
    Completed,
    #[serde(rename = "Atrasado")]
    Overdue,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Overdue,
    ];

    /// The label stored in the data file and shown to users
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pendiente",
            TaskStatus::InProgress => "En Progreso",
            TaskStatus::Completed => "Completado",
            TaskStatus::Overdue => "Atrasado",
        }
    }

    /// Short English key used on the command line
    pub fn key(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Overdue => "overdue",
        }
    }

    /// Parse either the stored label or the English key, ignoring case.
    pub fn parse(s: &str) -> Option<TaskStatus> {
        let s = s.trim();
        TaskStatus::ALL
            .into_iter()
            .find(|st| st.label().eq_ignore_ascii_case(s) || st.key().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// General process (container) vs specific task (actionable leaf)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Process,
    Specific,
}

impl TaskKind {
    pub fn label(self) -> &'static str {
        match self {
            TaskKind::Process => "Process",
            TaskKind::Specific => "Task",
        }
    }

    pub fn parse(s: &str) -> Option<TaskKind> {
        match s.trim().to_ascii_lowercase().as_str() {
            "process" | "general" | "proceso" => Some(TaskKind::Process),
            "task" | "specific" | "tarea" => Some(TaskKind::Specific),
            _ => None,
        }
    }
}

/// Kind of an attached resource, guessed from its URL when it is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResourceType {
    Pdf,
    Drive,
    Link,
    Video,
    Image,
}

static VIDEO_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-z][a-z0-9+.-]*://)?(?:www\.|m\.)?(?:youtube\.com|youtu\.be|vimeo\.com)(?:[/:?#]|$)")
        .expect("video host pattern")
});

static DRIVE_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-z][a-z0-9+.-]*://)?(?:drive|docs)\.google\.com(?:[/:?#]|$)")
        .expect("drive host pattern")
});

static IMAGE_EXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(?:png|jpe?g|gif|webp|svg|bmp)$").expect("image pattern"));

static VIDEO_EXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(?:mp4|mov|webm|avi|mkv)$").expect("video pattern"));

impl ResourceType {
    /// Guess the resource type from a URL.
    pub fn detect(url: &str) -> ResourceType {
        let lower = url.trim().to_ascii_lowercase();
        // Extension checks ignore the query string and fragment
        let path = lower.split(['?', '#']).next().unwrap_or("");

        if DRIVE_HOST.is_match(&lower) {
            ResourceType::Drive
        } else if VIDEO_HOST.is_match(&lower) || VIDEO_EXT.is_match(path) {
            ResourceType::Video
        } else if path.ends_with(".pdf") {
            ResourceType::Pdf
        } else if IMAGE_EXT.is_match(path) {
            ResourceType::Image
        } else {
            ResourceType::Link
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceType::Pdf => "PDF",
            ResourceType::Drive => "DRIVE",
            ResourceType::Link => "LINK",
            ResourceType::Video => "VIDEO",
            ResourceType::Image => "IMAGE",
        };
        f.write_str(s)
    }
}

/// A document or link attached to a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: ResourceType,
    #[serde(default)]
    pub category: String,
}

impl Resource {
    /// Create a resource, detecting its type from the URL
    pub fn new(id: String, name: String, url: String, category: String) -> Self {
        let kind = ResourceType::detect(&url);
        Resource {
            id,
            name,
            url,
            kind,
            category,
        }
    }
}

/// A node of the task tree: either a general process or a specific task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique across the whole forest, never changes after creation
    pub id: String,
    /// Department tag (a name from the department registry)
    pub department: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default)]
    pub is_specific_task: bool,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
}

impl Task {
    /// Create a pending general process with no dates, assignee or children
    pub fn new(id: impl Into<String>, department: impl Into<String>, title: impl Into<String>) -> Self {
        Task {
            id: id.into(),
            department: department.into(),
            title: title.into(),
            description: None,
            start_date: None,
            end_date: None,
            assignee: None,
            is_specific_task: false,
            status: TaskStatus::Pending,
            subtasks: Vec::new(),
            resources: Vec::new(),
        }
    }

    pub fn kind(&self) -> TaskKind {
        if self.is_specific_task {
            TaskKind::Specific
        } else {
            TaskKind::Process
        }
    }

    pub fn find_resource(&self, resource_id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == resource_id)
    }
}

/// Parse a `YYYY-MM-DD` date from its numeric components.
pub fn parse_ymd(s: &str) -> Option<NaiveDate> {
    let mut parts = s.trim().splitn(3, '-');
    let year = parts.next()?;
    let month = parts.next()?;
    let day = parts.next()?;
    if year.len() != 4 || month.len() != 2 || day.len() != 2 {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_labels_and_keys() {
        assert_eq!(TaskStatus::parse("Pendiente"), Some(TaskStatus::Pending));
        assert_eq!(TaskStatus::parse("en progreso"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("completed"), Some(TaskStatus::Completed));
        assert_eq!(TaskStatus::parse("OVERDUE"), Some(TaskStatus::Overdue));
        assert_eq!(TaskStatus::parse("done"), None);
    }

    #[test]
    fn status_serializes_as_label() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"En Progreso\"");
    }

    #[test]
    fn detect_resource_types() {
        assert_eq!(
            ResourceType::detect("https://drive.google.com/file/d/abc/view"),
            ResourceType::Drive
        );
        assert_eq!(
            ResourceType::detect("https://docs.google.com/document/d/x/report.pdf"),
            ResourceType::Drive
        );
        assert_eq!(
            ResourceType::detect("https://www.youtube.com/watch?v=xyz"),
            ResourceType::Video
        );
        assert_eq!(ResourceType::detect("https://youtu.be/xyz"), ResourceType::Video);
        assert_eq!(
            ResourceType::detect("https://uni.edu/files/Reglamento.PDF?dl=1"),
            ResourceType::Pdf
        );
        assert_eq!(
            ResourceType::detect("https://uni.edu/img/logo.jpeg#top"),
            ResourceType::Image
        );
        assert_eq!(ResourceType::detect("https://uni.edu/clip.mp4"), ResourceType::Video);
        assert_eq!(ResourceType::detect("https://uni.edu/tramites"), ResourceType::Link);
    }

    #[test]
    fn video_host_must_be_the_host() {
        assert_eq!(
            ResourceType::detect("https://uni.edu/youtube.com-policy"),
            ResourceType::Link
        );
    }

    #[test]
    fn task_json_uses_camel_case_and_omits_empty() {
        let mut task = Task::new("t1", "Finanzas", "Cierre");
        task.is_specific_task = true;
        task.start_date = Some("2024-03-01".into());
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["isSpecificTask"], true);
        assert_eq!(json["startDate"], "2024-03-01");
        assert_eq!(json["status"], "Pendiente");
        assert!(json.get("subtasks").is_none());
        assert!(json.get("endDate").is_none());
    }

    #[test]
    fn task_json_minimal_object_deserializes() {
        let task: Task = serde_json::from_str(
            r#"{"id":"p1","department":"Escolares","title":"Altas","status":"Pendiente"}"#,
        )
        .unwrap();
        assert_eq!(task.kind(), TaskKind::Process);
        assert!(task.subtasks.is_empty());
        assert!(task.resources.is_empty());
    }

    #[test]
    fn parse_ymd_components() {
        assert_eq!(parse_ymd("2024-02-29"), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(parse_ymd("2023-02-29"), None);
        assert_eq!(parse_ymd("2024-2-1"), None);
        assert_eq!(parse_ymd("01/02/2024"), None);
        assert_eq!(parse_ymd(""), None);
    }
}
