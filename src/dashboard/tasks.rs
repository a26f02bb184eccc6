use chrono::{DateTime, TimeZone};

use super::parse_date_time;
use crate::models::{CourseTask, TaskDetail, TaskResults};

#[derive(Debug, Clone, PartialEq)]
pub struct TaskWithResult {
    pub task: CourseTask,
    pub score: Option<f64>,
    pub comment: Option<String>,
    pub github_pr_url: Option<String>,
}

/// Course tasks split by the student's progress. Every task lands in exactly
/// one bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskBuckets {
    /// Tasks with a recorded result.
    pub completed: Vec<TaskWithResult>,
    /// No result and the end date's day is already over.
    pub not_done: Vec<TaskWithResult>,
    /// No result and still open: due today or later, or no usable end date.
    pub future: Vec<TaskWithResult>,
}

impl TaskBuckets {
    pub fn total(&self) -> usize {
        self.completed.len() + self.not_done.len() + self.future.len()
    }
}

/// Classify tasks at day granularity in `now`'s zone.
///
/// `details` are the per-task rows of the student's profile stats for this
/// course; a completed task takes score, comment and PR link from the
/// same-named row when there is one.
pub fn classify_tasks<Tz: TimeZone>(
    tasks: &[CourseTask],
    results: &TaskResults,
    details: &[TaskDetail],
    now: &DateTime<Tz>,
) -> TaskBuckets {
    let today = now.date_naive();
    let tz = now.timezone();
    let mut buckets = TaskBuckets::default();

    for task in tasks {
        if let Some(result) = results.get(task.id) {
            let entry = match details.iter().find(|d| d.name == task.name) {
                Some(detail) => TaskWithResult {
                    task: task.clone(),
                    score: detail.score.or(result.score),
                    comment: detail.comment.clone(),
                    github_pr_url: detail.github_pr_url.clone(),
                },
                None => TaskWithResult {
                    task: task.clone(),
                    score: result.score,
                    comment: result.comment.clone(),
                    github_pr_url: result.github_pr_url.clone(),
                },
            };
            buckets.completed.push(entry);
            continue;
        }

        let end_day = task
            .student_end_date
            .as_deref()
            .and_then(|d| parse_date_time(d, &tz))
            .map(|d| d.date_naive());

        match end_day {
            Some(day) if day < today => buckets.not_done.push(TaskWithResult {
                task: task.clone(),
                score: Some(0.0),
                comment: None,
                github_pr_url: None,
            }),
            _ => buckets.future.push(TaskWithResult {
                task: task.clone(),
                score: None,
                comment: None,
                github_pr_url: None,
            }),
        }
    }

    buckets
}
