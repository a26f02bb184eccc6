pub mod cards;
pub mod events;
pub mod fetch;
pub mod layout;
pub mod tasks;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};

use crate::models::{CourseEvent, ProfileCourseStats, TaskResults};
use cards::{assemble_cards, Card};
use fetch::DashboardData;
use tasks::TaskBuckets;

// ─── Dashboard ──────────────────────────────────────────────────────────────

/// Fetched data plus everything derived from it for one course.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub course_id: u64,
    pub data: DashboardData,
    pub buckets: TaskBuckets,
    pub upcoming_events: Vec<CourseEvent>,
}

impl Dashboard {
    pub fn build<Tz: TimeZone>(data: DashboardData, course_id: u64, now: &DateTime<Tz>) -> Self {
        let results: TaskResults = data
            .summary
            .as_ref()
            .map(|s| s.results.iter().cloned().collect())
            .unwrap_or_default();
        let details = data
            .course_stats(course_id)
            .map(|s| s.tasks.as_slice())
            .unwrap_or(&[]);

        let buckets = tasks::classify_tasks(&data.tasks, &results, details, now);
        let derived = events::derive_task_events(&data.tasks);
        let upcoming_events = events::merge_upcoming_events(data.events.clone(), derived, now);

        tracing::debug!(
            course_id,
            completed = buckets.completed.len(),
            not_done = buckets.not_done.len(),
            future = buckets.future.len(),
            upcoming = upcoming_events.len(),
            "dashboard derived"
        );

        Self {
            course_id,
            data,
            buckets,
            upcoming_events,
        }
    }

    pub fn has_access(&self) -> bool {
        self.data.summary.is_some()
    }

    pub fn course_stats(&self) -> Option<&ProfileCourseStats> {
        self.data.course_stats(self.course_id)
    }

    pub fn cards(&self, show_count_events: usize) -> Vec<Card> {
        assemble_cards(
            self.data.summary.as_ref(),
            &self.data.tasks,
            &self.buckets,
            &self.upcoming_events,
            show_count_events,
        )
    }
}

// ─── Time helpers ───────────────────────────────────────────────────────────

/// Parse a server timestamp in `tz`.
///
/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.f]` (taken as wall time in
/// `tz`) and a bare `YYYY-MM-DD` (midnight in `tz`). Empty or unrecognised
/// input yields `None`.
pub fn parse_date_time<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(tz));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    tz.from_local_datetime(&naive).earliest()
}

/// Midnight at the start of `now`'s calendar day, in `now`'s zone.
pub fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| now.timezone().from_local_datetime(&midnight).earliest())
        .unwrap_or_else(|| now.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Timelike, Utc};

    #[test]
    fn parses_supported_formats() {
        let tz = FixedOffset::east_opt(3 * 3600).unwrap();

        let rfc = parse_date_time("2024-01-10T20:59:00.000Z", &tz).unwrap();
        assert_eq!(rfc.hour(), 23);

        let naive = parse_date_time("2024-01-10T08:30:00", &tz).unwrap();
        assert_eq!(naive.hour(), 8);

        let date = parse_date_time("2024-01-10", &tz).unwrap();
        assert_eq!(date.hour(), 0);
        assert_eq!(date.date_naive(), NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
    }

    #[test]
    fn empty_and_garbage_do_not_parse() {
        assert!(parse_date_time("", &Utc).is_none());
        assert!(parse_date_time("   ", &Utc).is_none());
        assert!(parse_date_time("next tuesday", &Utc).is_none());
    }

    #[test]
    fn start_of_day_is_local_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 17, 42, 9).unwrap();
        assert_eq!(start_of_day(&now), Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap());
    }
}
