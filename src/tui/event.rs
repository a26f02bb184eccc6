use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use std::time::Duration;

use super::App;

pub fn poll_event(timeout: Duration) -> anyhow::Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

pub fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match (code, modifiers) {
        (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            app.running = false;
        }
        (KeyCode::Tab, _) | (KeyCode::Right, KeyModifiers::SHIFT) => app.next_course(),
        (KeyCode::BackTab, _) | (KeyCode::Left, KeyModifiers::SHIFT) => app.prev_course(),
        (KeyCode::Char('+') | KeyCode::Char('='), _) => app.change_show_count_events(1),
        (KeyCode::Char('-'), _) => app.change_show_count_events(-1),
        (KeyCode::Char('i'), _) if !app.loading => {
            if app.dashboard.as_ref().is_some_and(|d| d.has_access()) {
                app.start_invite();
            }
        }
        (KeyCode::Char('r'), _) if !app.loading => {
            app.needs_refresh = true;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::fetch::fake::FakeSource;
    use crate::preferences::MemoryPreferenceStore;
    use std::sync::Arc;

    fn app() -> App {
        App::new(
            Arc::new(FakeSource::default()),
            Box::new(MemoryPreferenceStore::default()),
            "student".into(),
            vec![1, 2, 3],
        )
    }

    #[test]
    fn quit_keys_stop_the_app() {
        let mut a = app();
        handle_key(&mut a, KeyCode::Char('q'), KeyModifiers::NONE);
        assert!(!a.running);

        let mut a = app();
        handle_key(&mut a, KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(!a.running);
    }

    #[test]
    fn tab_cycles_courses() {
        let mut a = app();
        handle_key(&mut a, KeyCode::Tab, KeyModifiers::NONE);
        assert_eq!(a.current_course_id(), 2);
        handle_key(&mut a, KeyCode::BackTab, KeyModifiers::SHIFT);
        handle_key(&mut a, KeyCode::BackTab, KeyModifiers::SHIFT);
        assert_eq!(a.current_course_id(), 3);
    }

    #[test]
    fn plus_and_minus_adjust_event_count() {
        let mut a = app();
        handle_key(&mut a, KeyCode::Char('+'), KeyModifiers::NONE);
        handle_key(&mut a, KeyCode::Char('='), KeyModifiers::NONE);
        assert_eq!(a.show_count_events, 3);
        handle_key(&mut a, KeyCode::Char('-'), KeyModifiers::NONE);
        assert_eq!(a.show_count_events, 2);
    }

    #[test]
    fn refresh_is_ignored_while_loading() {
        let mut a = app();
        a.loading = true;
        handle_key(&mut a, KeyCode::Char('r'), KeyModifiers::NONE);
        assert!(!a.needs_refresh);

        a.loading = false;
        handle_key(&mut a, KeyCode::Char('r'), KeyModifiers::NONE);
        assert!(a.needs_refresh);
    }

    #[test]
    fn invite_needs_access() {
        let mut a = app();
        handle_key(&mut a, KeyCode::Char('i'), KeyModifiers::NONE);
        assert!(a.notification.is_none());
    }
}
