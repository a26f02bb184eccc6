pub mod event;
pub mod ui;

use crate::api::DashboardSource;
use crate::dashboard::fetch::{fetch_dashboard, DashboardData};
use crate::dashboard::Dashboard;
use crate::preferences::{
    set_show_count_events_on_students_dashboard, show_count_events_on_students_dashboard,
    PreferenceStore,
};
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub const FETCH_ERROR_MESSAGE: &str =
    "Something went wrong while loading the dashboard. Try again later.";
const NOTIFICATION_TTL: Duration = Duration::from_secs(5);

// ─── Notifications ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub raised_at: Instant,
}

// ─── Background results ──────────────────────────────────────────────────────

pub struct FetchOutcome {
    /// Epoch of the fetch that produced this outcome.
    pub epoch: u64,
    pub course_id: u64,
    pub result: Result<DashboardData, String>,
    pub fetched_at: DateTime<Local>,
}

// ─── App State ──────────────────────────────────────────────────────────────

pub struct App {
    source: Arc<dyn DashboardSource>,
    preferences: Box<dyn PreferenceStore>,
    pub github_id: String,
    pub course_ids: Vec<u64>,
    pub course_idx: usize,
    pub running: bool,

    // Data
    pub dashboard: Option<Dashboard>,
    pub show_count_events: usize,

    // Status
    pub loading: bool,
    pub needs_refresh: bool,
    pub notification: Option<Notification>,
    pub synced_at: Option<DateTime<Local>>,

    // Background work. Only the outcome carrying the current epoch is applied.
    fetch_epoch: u64,
    fetch_rx: Option<oneshot::Receiver<FetchOutcome>>,
    fetch_task: Option<JoinHandle<()>>,
    invite_rx: Option<oneshot::Receiver<Result<(), String>>>,

    // Incremented each frame; used to drive the loading spinner.
    pub frame_count: u64,
}

impl App {
    pub fn new(
        source: Arc<dyn DashboardSource>,
        preferences: Box<dyn PreferenceStore>,
        github_id: String,
        course_ids: Vec<u64>,
    ) -> Self {
        let show_count_events = show_count_events_on_students_dashboard(preferences.as_ref());
        Self {
            source,
            preferences,
            github_id,
            course_ids,
            course_idx: 0,
            running: true,
            dashboard: None,
            show_count_events,
            loading: false,
            needs_refresh: false,
            notification: None,
            synced_at: None,
            fetch_epoch: 0,
            fetch_rx: None,
            fetch_task: None,
            invite_rx: None,
            frame_count: 0,
        }
    }

    pub fn current_course_id(&self) -> u64 {
        self.course_ids.get(self.course_idx).copied().unwrap_or_default()
    }

    pub fn course_name(&self) -> Option<&str> {
        self.dashboard
            .as_ref()
            .and_then(|d| d.course_stats())
            .map(|s| s.course_name.as_str())
    }

    // ── Fetch ───────────────────────────────────────────────────────────

    /// Invalidate any in-flight fetch so its outcome can never be applied.
    fn cancel_fetch(&mut self) {
        if let Some(task) = self.fetch_task.take() {
            task.abort();
        }
        self.fetch_rx = None;
        self.fetch_epoch += 1;
        self.loading = false;
    }

    /// Mark a new fetch as in flight and return its epoch.
    fn begin_fetch(&mut self) -> u64 {
        self.cancel_fetch();
        self.loading = true;
        self.fetch_epoch
    }

    /// Spawn the dashboard fetch for the current course. Call
    /// `poll_fetch_result` each frame to collect it.
    pub fn start_fetch(&mut self) {
        let epoch = self.begin_fetch();
        let course_id = self.current_course_id();
        let source = Arc::clone(&self.source);
        let github_id = self.github_id.clone();
        let (tx, rx) = oneshot::channel();
        self.fetch_rx = Some(rx);

        tracing::info!(epoch, course_id, %github_id, "starting dashboard fetch");
        self.fetch_task = Some(tokio::spawn(async move {
            let result = fetch_dashboard(&*source, course_id, &github_id)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(FetchOutcome {
                epoch,
                course_id,
                result,
                fetched_at: Local::now(),
            });
        }));
    }

    /// Check the fetch channel without blocking. Returns `true` when an
    /// outcome was applied.
    pub fn poll_fetch_result(&mut self) -> bool {
        let outcome = match self.fetch_rx.as_mut() {
            None => return false,
            Some(rx) => match rx.try_recv() {
                Ok(o) => o,
                Err(oneshot::error::TryRecvError::Empty) => return false,
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.fetch_rx = None;
                    self.fetch_task = None;
                    self.loading = false;
                    self.notify(NotificationLevel::Error, FETCH_ERROR_MESSAGE);
                    return false;
                }
            },
        };
        self.fetch_rx = None;
        self.fetch_task = None;
        self.apply_fetch_outcome(outcome)
    }

    /// Apply a finished fetch. Outcomes from superseded fetches are dropped.
    pub fn apply_fetch_outcome(&mut self, outcome: FetchOutcome) -> bool {
        if outcome.epoch != self.fetch_epoch {
            tracing::debug!(
                stale = outcome.epoch,
                current = self.fetch_epoch,
                "dropping stale dashboard fetch"
            );
            return false;
        }
        self.loading = false;

        match outcome.result {
            Ok(data) => {
                self.dashboard = Some(Dashboard::build(data, outcome.course_id, &outcome.fetched_at));
                self.synced_at = Some(outcome.fetched_at);
            }
            Err(e) => {
                tracing::error!(course_id = outcome.course_id, "dashboard fetch failed: {e}");
                self.notify(NotificationLevel::Error, FETCH_ERROR_MESSAGE);
            }
        }
        true
    }

    // ── Courses ─────────────────────────────────────────────────────────

    pub fn next_course(&mut self) {
        if self.course_ids.len() > 1 {
            self.switch_course((self.course_idx + 1) % self.course_ids.len());
        }
    }

    pub fn prev_course(&mut self) {
        let len = self.course_ids.len();
        if len > 1 {
            self.switch_course((self.course_idx + len - 1) % len);
        }
    }

    fn switch_course(&mut self, idx: usize) {
        self.cancel_fetch();
        self.course_idx = idx;
        self.dashboard = None;
        self.synced_at = None;
        self.needs_refresh = true;
    }

    // ── Event count preference ──────────────────────────────────────────

    pub fn change_show_count_events(&mut self, delta: isize) {
        let count = self.show_count_events.saturating_add_signed(delta).max(1);
        if count == self.show_count_events {
            return;
        }
        self.show_count_events = count;
        if let Err(e) = set_show_count_events_on_students_dashboard(self.preferences.as_mut(), count)
        {
            tracing::warn!("failed to save event count preference: {e:#}");
            self.notify(NotificationLevel::Error, format!("Could not save preference: {e}"));
        }
    }

    // ── Repository invite ───────────────────────────────────────────────

    pub fn start_invite(&mut self) {
        if self.invite_rx.is_some() {
            return;
        }
        let course_id = self.current_course_id();
        let source = Arc::clone(&self.source);
        let github_id = self.github_id.clone();
        let (tx, rx) = oneshot::channel();
        self.invite_rx = Some(rx);
        self.notify(NotificationLevel::Info, "Sending repository invite…");

        tokio::spawn(async move {
            let result = source
                .invite_to_repository(course_id, &github_id)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(result);
        });
    }

    pub fn poll_invite_result(&mut self) -> bool {
        let result = match self.invite_rx.as_mut() {
            None => return false,
            Some(rx) => match rx.try_recv() {
                Ok(r) => r,
                Err(oneshot::error::TryRecvError::Empty) => return false,
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.invite_rx = None;
                    return false;
                }
            },
        };
        self.invite_rx = None;
        match result {
            Ok(()) => {
                tracing::info!(course_id = self.current_course_id(), "repository invite sent");
                self.notify(
                    NotificationLevel::Info,
                    "Invite sent. Check your GitHub notifications.",
                );
                self.needs_refresh = true;
            }
            Err(e) => {
                tracing::warn!("repository invite failed: {e}");
                self.notify(NotificationLevel::Error, format!("Invite failed: {e}"));
            }
        }
        true
    }

    // ── Notifications ───────────────────────────────────────────────────

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notification = Some(Notification {
            level,
            message: message.into(),
            raised_at: Instant::now(),
        });
    }

    pub fn expire_notification(&mut self, now: Instant) {
        if self
            .notification
            .as_ref()
            .is_some_and(|n| now.duration_since(n.raised_at) >= NOTIFICATION_TTL)
        {
            self.notification = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::fetch::fake::{self, FakeSource};
    use crate::preferences::{MemoryPreferenceStore, SHOW_COUNT_EVENTS_KEY};
    use std::sync::atomic::Ordering;

    fn app_with(source: FakeSource, preferences: MemoryPreferenceStore) -> App {
        App::new(
            Arc::new(source),
            Box::new(preferences),
            "student".into(),
            vec![11, 22],
        )
    }

    fn app() -> App {
        app_with(FakeSource::default(), MemoryPreferenceStore::default())
    }

    fn outcome(epoch: u64, result: Result<DashboardData, String>) -> FetchOutcome {
        FetchOutcome {
            epoch,
            course_id: 11,
            result,
            fetched_at: Local::now(),
        }
    }

    fn data() -> DashboardData {
        DashboardData {
            summary: Some(fake::summary()),
            tasks: vec![fake::task(1, "2020-02-01"), fake::task(2, "2999-01-01")],
            ..Default::default()
        }
    }

    #[test]
    fn reads_event_count_preference_on_start() {
        let mut prefs = MemoryPreferenceStore::default();
        prefs.set(SHOW_COUNT_EVENTS_KEY, "3").unwrap();
        assert_eq!(app_with(FakeSource::default(), prefs).show_count_events, 3);
        assert_eq!(app().show_count_events, 1);
    }

    #[test]
    fn stale_outcome_is_dropped() {
        let mut app = app();
        let first = app.begin_fetch();
        let second = app.begin_fetch();

        assert!(!app.apply_fetch_outcome(outcome(first, Ok(data()))));
        assert!(app.loading);
        assert!(app.dashboard.is_none());

        assert!(app.apply_fetch_outcome(outcome(second, Ok(data()))));
        assert!(!app.loading);
        let dashboard = app.dashboard.as_ref().unwrap();
        assert!(dashboard.has_access());
        assert_eq!(dashboard.buckets.completed.len(), 1);
        assert_eq!(dashboard.buckets.future.len(), 1);
    }

    #[test]
    fn failed_fetch_clears_loading_and_notifies() {
        let mut app = app();
        let epoch = app.begin_fetch();
        assert!(app.apply_fetch_outcome(outcome(epoch, Err("HTTP 500".into()))));

        assert!(!app.loading);
        assert!(app.dashboard.is_none());
        let n = app.notification.as_ref().unwrap();
        assert_eq!(n.level, NotificationLevel::Error);
        assert_eq!(n.message, FETCH_ERROR_MESSAGE);
    }

    #[test]
    fn failed_refresh_keeps_previous_state() {
        let mut app = app();
        let epoch = app.begin_fetch();
        app.apply_fetch_outcome(outcome(epoch, Ok(data())));
        let epoch = app.begin_fetch();
        app.apply_fetch_outcome(outcome(epoch, Err("timeout".into())));

        assert!(app.dashboard.as_ref().is_some_and(|d| d.has_access()));
    }

    #[test]
    fn event_count_changes_are_persisted() {
        let mut app = app();
        app.change_show_count_events(2);
        assert_eq!(app.show_count_events, 3);
        assert_eq!(show_count_events_on_students_dashboard(app.preferences.as_ref()), 3);

        app.change_show_count_events(-10);
        assert_eq!(app.show_count_events, 1);
        assert_eq!(show_count_events_on_students_dashboard(app.preferences.as_ref()), 1);
    }

    #[test]
    fn switching_course_resets_and_requests_fetch() {
        let mut app = app();
        let epoch = app.begin_fetch();
        app.apply_fetch_outcome(outcome(epoch, Ok(data())));

        app.next_course();
        assert_eq!(app.current_course_id(), 22);
        assert!(app.dashboard.is_none());
        assert!(app.needs_refresh);

        app.next_course();
        assert_eq!(app.current_course_id(), 11);
        app.prev_course();
        assert_eq!(app.current_course_id(), 22);
    }

    #[test]
    fn switching_course_invalidates_in_flight_fetch() {
        let mut app = app();
        let epoch = app.begin_fetch();
        app.next_course();

        assert!(!app.apply_fetch_outcome(outcome(epoch, Ok(data()))));
        assert!(app.dashboard.is_none());
        assert!(!app.loading);
    }

    #[test]
    fn notifications_expire() {
        let mut app = app();
        app.notify(NotificationLevel::Info, "hello");
        let raised = app.notification.as_ref().unwrap().raised_at;

        app.expire_notification(raised + Duration::from_secs(1));
        assert!(app.notification.is_some());
        app.expire_notification(raised + NOTIFICATION_TTL);
        assert!(app.notification.is_none());
    }

    async fn settle(mut poll: impl FnMut() -> bool) {
        for _ in 0..200 {
            if poll() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("background task never finished");
    }

    #[tokio::test]
    async fn background_fetch_populates_dashboard() {
        let source = FakeSource {
            summary: Some(fake::summary()),
            tasks: vec![fake::task(1, "2020-02-01")],
            ..Default::default()
        };
        let mut app = app_with(source, MemoryPreferenceStore::default());

        app.start_fetch();
        assert!(app.loading);
        settle(|| app.poll_fetch_result()).await;

        assert!(!app.loading);
        assert!(app.synced_at.is_some());
        assert!(app.dashboard.as_ref().is_some_and(|d| d.has_access()));
    }

    #[tokio::test]
    async fn background_fetch_without_access() {
        let mut app = app();
        app.start_fetch();
        settle(|| app.poll_fetch_result()).await;

        assert!(!app.loading);
        assert!(app.dashboard.as_ref().is_some_and(|d| !d.has_access()));
        assert!(app.notification.is_none());
    }

    #[tokio::test]
    async fn invite_success_requests_refresh() {
        let source = Arc::new(FakeSource::default());
        let mut app = App::new(
            source.clone(),
            Box::new(MemoryPreferenceStore::default()),
            "student".into(),
            vec![11],
        );

        app.start_invite();
        settle(|| app.poll_invite_result()).await;

        assert_eq!(source.invites.load(Ordering::SeqCst), 1);
        assert!(app.needs_refresh);
        assert_eq!(app.notification.as_ref().unwrap().level, NotificationLevel::Info);
    }

    #[tokio::test]
    async fn invite_failure_is_reported() {
        let source = FakeSource {
            fail_invite: true,
            ..Default::default()
        };
        let mut app = app_with(source, MemoryPreferenceStore::default());

        app.start_invite();
        settle(|| app.poll_invite_result()).await;

        assert!(!app.needs_refresh);
        assert_eq!(app.notification.as_ref().unwrap().level, NotificationLevel::Error);
    }
}
