use crate::api::{ApiError, DashboardSource};
use crate::models::{CourseEvent, CourseTask, ProfileCourseStats, StudentSummary};

/// Everything the dashboard reads from the server for one course.
#[derive(Debug, Clone, Default)]
pub struct DashboardData {
    /// `None` when the student has no access to the course.
    pub summary: Option<StudentSummary>,
    pub tasks: Vec<CourseTask>,
    pub events: Vec<CourseEvent>,
    /// Statistics across every course the student has taken.
    pub profile_stats: Vec<ProfileCourseStats>,
}

impl DashboardData {
    pub fn course_stats(&self, course_id: u64) -> Option<&ProfileCourseStats> {
        self.profile_stats.iter().find(|s| s.course_id == course_id)
    }
}

/// Run the four dashboard reads concurrently. The first failure fails the
/// whole batch and nothing is returned.
pub async fn fetch_dashboard<S: DashboardSource + ?Sized>(
    source: &S,
    course_id: u64,
    github_id: &str,
) -> Result<DashboardData, ApiError> {
    let (summary, tasks, profile_stats, events) = tokio::try_join!(
        source.student_summary(course_id, github_id),
        source.course_tasks(course_id),
        source.profile_stats(github_id),
        source.course_events(course_id),
    )?;

    tracing::info!(
        course_id,
        has_access = summary.is_some(),
        tasks = tasks.len(),
        events = events.len(),
        "dashboard data fetched"
    );

    Ok(DashboardData {
        summary,
        tasks,
        events,
        profile_stats,
    })
}
