use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ─── Envelope ───────────────────────────────────────────────────────────────

/// Every endpoint wraps its payload in `{ "data": ... }`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

// ─── Course Tasks ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskType {
    Deadline,
    Test,
    NewTask,
    Lecture,
    /// Any type string the server sends that we don't know about.
    Other(String),
}

impl TaskType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Deadline => "deadline",
            Self::Test => "test",
            Self::NewTask => "newTask",
            Self::Lecture => "lecture",
            Self::Other(s) => s,
        }
    }

    pub fn is_test(&self) -> bool {
        matches!(self, Self::Test)
    }
}

impl From<String> for TaskType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "deadline" => Self::Deadline,
            "test" => Self::Test,
            "newTask" => Self::NewTask,
            "lecture" => Self::Lecture,
            _ => Self::Other(s),
        }
    }
}

impl From<TaskType> for String {
    fn from(t: TaskType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseTask {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    #[serde(default)]
    pub max_score: Option<f64>,
    #[serde(default)]
    pub score_weight: Option<f64>,
    #[serde(default)]
    pub student_start_date: Option<String>,
    #[serde(default)]
    pub student_end_date: Option<String>,
    #[serde(default)]
    pub description_url: Option<String>,
}

// ─── Student Summary ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    pub course_task_id: u64,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub github_pr_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mentor {
    pub id: u64,
    pub name: Option<String>,
    pub github_id: String,
    #[serde(default)]
    pub contacts_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub total_score: f64,
    #[serde(default)]
    pub rank: Option<u64>,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub mentor: Option<Mentor>,
    #[serde(default)]
    pub results: Vec<TaskResult>,
}

/// Task results keyed by course task id.
#[derive(Debug, Clone, Default)]
pub struct TaskResults {
    by_task: HashMap<u64, TaskResult>,
}

impl TaskResults {
    pub fn get(&self, course_task_id: u64) -> Option<&TaskResult> {
        self.by_task.get(&course_task_id)
    }
}

impl FromIterator<TaskResult> for TaskResults {
    /// Later results for the same task replace earlier ones.
    fn from_iter<I: IntoIterator<Item = TaskResult>>(iter: I) -> Self {
        Self {
            by_task: iter.into_iter().map(|r| (r.course_task_id, r)).collect(),
        }
    }
}

// ─── Profile Statistics ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetail {
    pub name: String,
    #[serde(default)]
    pub max_score: Option<f64>,
    #[serde(default)]
    pub score_weight: Option<f64>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub github_pr_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCourseStats {
    pub course_id: u64,
    pub course_name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub total_score: f64,
    #[serde(default)]
    pub rank: Option<u64>,
    #[serde(default)]
    pub tasks: Vec<TaskDetail>,
}

// ─── Course Events ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDescriptor {
    #[serde(rename = "type")]
    pub event_type: String,
    pub name: String,
    #[serde(default)]
    pub description_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseEvent {
    pub id: u64,
    /// ISO-8601 timestamp; empty when the source date was missing.
    #[serde(default)]
    pub date_time: String,
    pub event: EventDescriptor,
}
