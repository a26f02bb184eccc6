use chrono::{DateTime, TimeZone};

use super::{parse_date_time, start_of_day};
use crate::models::{CourseEvent, CourseTask, EventDescriptor};

const DEADLINE: &str = "deadline";
const TEST: &str = "test";

/// Turn course tasks into calendar events, in task order.
///
/// A non-test task opens with an event of its own type on its start date and
/// closes with a `deadline` event on its end date. A test only gets the
/// closing `test` event. A missing date leaves `date_time` empty.
pub fn derive_task_events(tasks: &[CourseTask]) -> Vec<CourseEvent> {
    let mut events = Vec::with_capacity(tasks.len() * 2);
    for task in tasks {
        if !task.task_type.is_test() {
            events.push(task_event(
                task,
                task.task_type.as_str(),
                task.student_start_date.as_deref(),
            ));
        }
        let closing = if task.task_type.is_test() { TEST } else { DEADLINE };
        events.push(task_event(task, closing, task.student_end_date.as_deref()));
    }
    events
}

fn task_event(task: &CourseTask, event_type: &str, date: Option<&str>) -> CourseEvent {
    CourseEvent {
        id: task.id,
        date_time: date.unwrap_or_default().to_string(),
        event: EventDescriptor {
            event_type: event_type.to_string(),
            name: task.name.clone(),
            description_url: task.description_url.clone(),
        },
    }
}

/// Fetched events followed by derived ones, oldest first, keeping only those
/// after the start of `now`'s day.
///
/// Ordering is by the raw `date_time` string, so ISO-8601 values sort
/// chronologically. Events whose timestamp is empty or unparseable are dropped.
pub fn merge_upcoming_events<Tz: TimeZone>(
    fetched: Vec<CourseEvent>,
    derived: Vec<CourseEvent>,
    now: &DateTime<Tz>,
) -> Vec<CourseEvent> {
    let today = start_of_day(now);
    let tz = now.timezone();

    let mut events = fetched;
    events.extend(derived);
    events.sort_by(|a, b| a.date_time.cmp(&b.date_time));
    events.retain(|e| {
        parse_date_time(&e.date_time, &tz)
            .map(|at| at > today)
            .unwrap_or(false)
    });
    events
}

/// Colour bucket for an event type label.
pub fn is_deadline_like(event_type: &str) -> bool {
    event_type == DEADLINE || event_type == TEST
}
