use crate::models::{CourseEvent, CourseTask, Mentor, StudentSummary};

use super::tasks::TaskBuckets;

// ─── Cards ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct MainStats {
    pub total_score: f64,
    pub max_course_score: f64,
    pub rank: Option<u64>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Card {
    MainStats(MainStats),
    /// Always shown; `None` until the student's repository exists.
    Repository { url: Option<String> },
    Mentor(Mentor),
    TaskStats(TaskBuckets),
    /// Always shown, trimmed to the configured count.
    NextEvents {
        events: Vec<CourseEvent>,
        show_count: usize,
    },
}

impl Card {
    pub fn title(&self) -> &'static str {
        match self {
            Self::MainStats(_) => "Main Stats",
            Self::Repository { .. } => "Repository",
            Self::Mentor(_) => "Mentor",
            Self::TaskStats(_) => "Tasks",
            Self::NextEvents { .. } => "Next Events",
        }
    }
}

/// Build the dashboard's cards in display order.
///
/// Cards whose data is missing are left out, except the repository and
/// next-events cards which are always present.
pub fn assemble_cards(
    summary: Option<&StudentSummary>,
    tasks: &[CourseTask],
    buckets: &TaskBuckets,
    upcoming: &[CourseEvent],
    show_count_events: usize,
) -> Vec<Card> {
    let mut cards = Vec::with_capacity(5);

    if let Some(summary) = summary {
        cards.push(Card::MainStats(MainStats {
            total_score: summary.total_score,
            max_course_score: max_course_score(tasks),
            rank: summary.rank,
            is_active: summary.is_active,
        }));
    }

    cards.push(Card::Repository {
        url: summary.and_then(|s| s.repository.clone()),
    });

    if let Some(mentor) = summary.and_then(|s| s.mentor.clone()) {
        cards.push(Card::Mentor(mentor));
    }

    if !tasks.is_empty() {
        cards.push(Card::TaskStats(buckets.clone()));
    }

    cards.push(Card::NextEvents {
        events: upcoming.iter().take(show_count_events).cloned().collect(),
        show_count: show_count_events,
    });

    cards
}

/// Highest reachable score: Σ maxScore × scoreWeight.
pub fn max_course_score(tasks: &[CourseTask]) -> f64 {
    tasks
        .iter()
        .map(|t| t.max_score.unwrap_or(0.0) * t.score_weight.unwrap_or(1.0))
        .sum()
}
