use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::{App, NotificationLevel};
use crate::dashboard::cards::Card;
use crate::dashboard::events::is_deadline_like;
use crate::dashboard::layout::{column_width, masonry};
use crate::dashboard::{parse_date_time, Dashboard};
use crate::models::CourseEvent;
use chrono::Local;

const ACCENT: Color = Color::Cyan;
const HEADER_BG: Color = Color::DarkGray;
const DIM: Color = Color::DarkGray;
const GOOD: Color = Color::Green;
const WARN: Color = Color::Yellow;
const BAD: Color = Color::Red;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];
/// How many missed tasks the task card lists by name.
const MISSED_PREVIEW: usize = 3;

// ─── Main render ────────────────────────────────────────────────────────────

pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_clock(f, chunks[0]);

    match &app.dashboard {
        Some(dashboard) if dashboard.has_access() => {
            render_cards(f, dashboard, app.show_count_events, chunks[1]);
        }
        _ if app.loading => {}
        _ => render_no_access(f, chunks[1]),
    }

    if app.loading {
        render_loading(f, app, chunks[1]);
    }

    render_status_bar(f, app, chunks[2]);
}

// ─── Header ─────────────────────────────────────────────────────────────────

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let course = app
        .course_name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("Course {}", app.current_course_id()));
    let position = format!("  ({}/{})", app.course_idx + 1, app.course_ids.len().max(1));

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {course}"),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled(position, Style::default().fg(DIM)),
        Span::styled(format!("  @{}", app.github_id), Style::default().fg(ACCENT)),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .title(" Student Dashboard ")
            .title_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
    );

    f.render_widget(header, area);
}

// ─── Clock ──────────────────────────────────────────────────────────────────

fn render_clock(f: &mut Frame, header_area: Rect) {
    let time_str = format!(" {} ", Local::now().format("%a %b %d  %H:%M:%S"));
    let clock_width = time_str.len() as u16;
    let clock_area = Rect {
        x: header_area.right().saturating_sub(clock_width),
        y: header_area.y,
        width: clock_width.min(header_area.width),
        height: 1,
    };
    f.render_widget(
        Paragraph::new(time_str).style(Style::default().fg(ACCENT)),
        clock_area,
    );
}

// ─── Status Bar ─────────────────────────────────────────────────────────────

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let (message, color) = match &app.notification {
        Some(n) => (
            n.message.clone(),
            match n.level {
                NotificationLevel::Info => GOOD,
                NotificationLevel::Error => BAD,
            },
        ),
        None if app.loading => ("Loading…".to_string(), WARN),
        None => (String::new(), Color::White),
    };

    let sync_hint = app
        .synced_at
        .map(|t| format!("  synced {}", t.format("%b %d %H:%M")))
        .unwrap_or_default();

    let status = Paragraph::new(Line::from(vec![
        Span::styled(" ", Style::default()),
        Span::styled(message, Style::default().fg(color)),
        Span::styled(
            format!(
                "  q:quit  Tab:course  r:refresh  +/-:events  i:invite{}  ",
                sync_hint
            ),
            Style::default().fg(DIM),
        ),
    ]))
    .style(Style::default().bg(HEADER_BG));

    f.render_widget(status, area);
}

// ─── Loading / No access ────────────────────────────────────────────────────

fn render_loading(f: &mut Frame, app: &App, area: Rect) {
    let popup = centered(area, 30, 3);
    let spinner = SPINNER[(app.frame_count as usize / 2) % SPINNER.len()];
    let text = Paragraph::new(format!("{spinner} Loading dashboard…"))
        .alignment(Alignment::Center)
        .style(Style::default().fg(WARN))
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(Clear, popup);
    f.render_widget(text, popup);
}

fn render_no_access(f: &mut Frame, area: Rect) {
    let popup = centered(area, 60, 6);
    let text = Paragraph::new(vec![
        Line::from(Span::styled(
            "No access",
            Style::default().fg(BAD).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("You have no access to this course, or the user does not exist."),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(text, popup);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

// ─── Cards ──────────────────────────────────────────────────────────────────

fn render_cards(f: &mut Frame, dashboard: &Dashboard, show_count_events: usize, area: Rect) {
    let inner_width = column_width(area.width).saturating_sub(2) as usize;
    let cards: Vec<(Card, Vec<Line<'static>>)> = dashboard
        .cards(show_count_events)
        .into_iter()
        .map(|card| {
            let lines = card_lines(&card, inner_width);
            (card, lines)
        })
        .collect();

    let heights: Vec<u16> = cards.iter().map(|(_, lines)| lines.len() as u16 + 2).collect();
    let rects = masonry(area, &heights);

    for ((card, lines), rect) in cards.into_iter().zip(rects) {
        if rect.height == 0 {
            continue;
        }
        let widget = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", card.title()))
                .title_style(Style::default().fg(ACCENT)),
        );
        f.render_widget(widget, rect);
    }
}

fn card_lines(card: &Card, width: usize) -> Vec<Line<'static>> {
    match card {
        Card::MainStats(stats) => vec![
            stat_line(
                "Total score",
                format!("{:.1} / {:.1}", stats.total_score, stats.max_course_score),
                ACCENT,
            ),
            stat_line(
                "Position",
                stats.rank.map(|r| format!("#{r}")).unwrap_or_else(|| "-".into()),
                Color::White,
            ),
            if stats.is_active {
                stat_line("Status", "Active".into(), GOOD)
            } else {
                stat_line("Status", "Inactive".into(), BAD)
            },
        ],
        Card::Repository { url } => match url {
            Some(url) => vec![
                Line::from(Span::styled(truncate(url, width), Style::default().fg(ACCENT))),
                Line::from(""),
                hint("i: resend invite"),
            ],
            None => vec![
                Line::from("No repository yet"),
                Line::from(""),
                hint("i: send repository invite"),
            ],
        },
        Card::Mentor(mentor) => {
            let mut lines = vec![Line::from(Span::styled(
                truncate(mentor.name.as_deref().unwrap_or(&mentor.github_id), width),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ))];
            lines.push(Line::from(Span::styled(
                truncate(&format!("github: {}", mentor.github_id), width),
                Style::default().fg(DIM),
            )));
            if let Some(ref email) = mentor.contacts_email {
                lines.push(Line::from(Span::styled(
                    truncate(email, width),
                    Style::default().fg(DIM),
                )));
            }
            lines
        }
        Card::TaskStats(buckets) => {
            let mut lines = vec![
                stat_line(
                    "Completed",
                    format!("{} / {}", buckets.completed.len(), buckets.total()),
                    GOOD,
                ),
                stat_line("Not done", buckets.not_done.len().to_string(), BAD),
                stat_line("Future", buckets.future.len().to_string(), WARN),
            ];
            if !buckets.not_done.is_empty() {
                lines.push(Line::from(""));
                for missed in buckets.not_done.iter().take(MISSED_PREVIEW) {
                    lines.push(Line::from(Span::styled(
                        truncate(&format!("✗ {}", missed.task.name), width),
                        Style::default().fg(BAD),
                    )));
                }
                let rest = buckets.not_done.len().saturating_sub(MISSED_PREVIEW);
                if rest > 0 {
                    lines.push(hint(&format!("…and {rest} more")));
                }
            }
            lines
        }
        Card::NextEvents { events, show_count } => {
            let mut lines: Vec<Line<'static>> = if events.is_empty() {
                vec![Line::from(Span::styled(
                    "No upcoming events",
                    Style::default().fg(DIM),
                ))]
            } else {
                events.iter().map(|e| event_line(e, width)).collect()
            };
            lines.push(Line::from(""));
            lines.push(hint(&format!("+/-: showing {show_count}")));
            lines
        }
    }
}

fn stat_line(label: &str, value: String, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:<12}"), Style::default().fg(DIM)),
        Span::styled(value, Style::default().fg(color).add_modifier(Modifier::BOLD)),
    ])
}

fn hint(text: &str) -> Line<'static> {
    Line::from(Span::styled(text.to_string(), Style::default().fg(DIM)))
}

fn event_line(event: &CourseEvent, width: usize) -> Line<'static> {
    let when = parse_date_time(&event.date_time, &Local)
        .map(|d| d.format("%b %d %H:%M").to_string())
        .unwrap_or_else(|| event.date_time.clone());
    let kind = format!("[{}] ", event.event.event_type);
    let type_color = if is_deadline_like(&event.event.event_type) { BAD } else { ACCENT };

    let used = UnicodeWidthStr::width(when.as_str()) + 2 + UnicodeWidthStr::width(kind.as_str());
    Line::from(vec![
        Span::styled(format!("{when}  "), Style::default().fg(DIM)),
        Span::styled(kind, Style::default().fg(type_color)),
        Span::styled(
            truncate(&event.event.name, width.saturating_sub(used)),
            Style::default().fg(Color::White),
        ),
    ])
}

/// Cut `s` to at most `max` display cells, marking the cut with `…`.
fn truncate(s: &str, max: usize) -> String {
    if UnicodeWidthStr::width(s) <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::fetch::fake::{self, FakeSource};
    use crate::dashboard::fetch::DashboardData;
    use crate::preferences::MemoryPreferenceStore;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    fn app(dashboard: Option<Dashboard>) -> App {
        let mut app = App::new(
            Arc::new(FakeSource::default()),
            Box::new(MemoryPreferenceStore::default()),
            "student".into(),
            vec![11],
        );
        app.dashboard = dashboard;
        app
    }

    fn screen(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn truncates_by_display_width() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly", 7), "exactly");
        assert_eq!(truncate("overflowing", 6), "overf…");
        assert_eq!(truncate("日本語テキスト", 5), "日本…");
        assert_eq!(truncate("anything", 0), "");
    }

    #[test]
    fn renders_cards_for_accessible_student() {
        let data = DashboardData {
            summary: Some(fake::summary()),
            tasks: vec![fake::task(1, "2020-02-01"), fake::task(2, "2020-03-01")],
            ..Default::default()
        };
        let dashboard = Dashboard::build(data, 11, &Local::now());
        let out = screen(&app(Some(dashboard)), 200, 40);

        assert!(out.contains("Main Stats"));
        assert!(out.contains("Repository"));
        assert!(out.contains("Tasks"));
        assert!(out.contains("Next Events"));
        assert!(!out.contains("Mentor"));
        assert!(!out.contains("No access"));
    }

    #[test]
    fn renders_no_access_without_summary() {
        let dashboard = Dashboard::build(DashboardData::default(), 11, &Local::now());
        let out = screen(&app(Some(dashboard)), 120, 30);
        assert!(out.contains("No access"));
        assert!(!out.contains("Main Stats"));
    }

    #[test]
    fn loading_overlay_while_fetching() {
        let mut a = app(None);
        a.loading = true;
        let out = screen(&a, 120, 30);
        assert!(out.contains("Loading dashboard"));
        assert!(!out.contains("No access"));
    }
}
