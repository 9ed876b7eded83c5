//! Progress aggregation for dashboards and reports.
//!
//! Everything here is built from [`CompletionTracker::derive_status`], so totals
//! always agree with what the per-assignment views show.
//!
//! Listings split on the due date relative to the caller's `now`: open assignments
//! (due today or later) come soonest-deadline first, closed ones most recently
//! closed first.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::completion::CompletionTracker;
use super::error::{AssignmentError, AssignmentResult};
use super::roster::{parse_assignment_row, ASSIGNMENT_COLUMNS};
use super::types::{Assignment, CompletionState};

/// Completion figures for one assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentProgress {
    pub assignment_id: Uuid,
    pub total: u32,
    pub completed_count: u32,
    /// Rounded percentage, 0 for an empty roster
    pub percent: u8,
}

/// An assignment with display names and progress, for coach listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentSummary {
    pub assignment: Assignment,
    pub test_name: String,
    pub group_name: String,
    pub progress: AssignmentProgress,
}

/// Coach listing split into open and closed assignments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignmentListing {
    /// Due today or later, soonest first
    pub active: Vec<AssignmentSummary>,
    /// Past due, most recent first
    pub history: Vec<AssignmentSummary>,
    /// Assignments left out because their test definition is gone
    pub skipped: Vec<Uuid>,
}

/// Progress rolled up over several assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressCard {
    /// Group code or test id the card is keyed on
    pub key: String,
    pub title: String,
    pub assignments: u32,
    pub total: u32,
    pub completed_count: u32,
    pub percent: u8,
}

/// Dashboard cards plus the assignments that could not be counted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardCards {
    pub cards: Vec<ProgressCard>,
    pub skipped: Vec<Uuid>,
}

/// One of an athlete's assignments with the athlete's own state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteAssignment {
    pub assignment: Assignment,
    pub test_name: String,
    pub state: CompletionState,
}

/// An athlete's assignments split into open and closed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AthleteAssignments {
    pub active: Vec<AthleteAssignment>,
    pub history: Vec<AthleteAssignment>,
    pub skipped: Vec<Uuid>,
}

/// `round(completed / total * 100)`, with an empty total counting as 0%.
pub fn completion_percent(completed: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (f64::from(completed) / f64::from(total) * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}

/// Split items into (active, history) around `today`.
///
/// Active items (due on or after `today`) are sorted ascending by due date,
/// history items descending. Sorting is stable, so equal due dates keep input order.
pub fn split_by_due<T, F>(items: Vec<T>, today: NaiveDate, due_on: F) -> (Vec<T>, Vec<T>)
where
    F: Fn(&T) -> NaiveDate,
{
    let (mut active, mut history): (Vec<T>, Vec<T>) =
        items.into_iter().partition(|item| due_on(item) >= today);

    active.sort_by_key(|item| due_on(item));
    history.sort_by(|a, b| due_on(b).cmp(&due_on(a)));

    (active, history)
}

/// Assignment row joined with display names.
struct NamedAssignment {
    assignment: Assignment,
    test_name: Option<String>,
    group_name: String,
}

/// Aggregates completion across assignments.
pub struct ProgressAggregator<'a> {
    conn: &'a Connection,
}

impl<'a> ProgressAggregator<'a> {
    /// Create a new progress aggregator with a database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Progress for each assignment, in the order given.
    ///
    /// Fails with [`AssignmentError::NotFound`] if any assignment is missing.
    pub fn aggregate(&self, assignment_ids: &[Uuid]) -> AssignmentResult<Vec<AssignmentProgress>> {
        let tracker = CompletionTracker::new(self.conn);

        assignment_ids
            .iter()
            .map(|&assignment_id| {
                let status = tracker.derive_status(assignment_id)?;
                let total = status.total() as u32;
                let completed_count = status.completed.len() as u32;

                Ok(AssignmentProgress {
                    assignment_id,
                    total,
                    completed_count,
                    percent: completion_percent(completed_count, total),
                })
            })
            .collect()
    }

    /// A coach's assignments with progress, split into active and history.
    pub fn listing(&self, coach_id: Uuid, now: DateTime<Utc>) -> AssignmentResult<AssignmentListing> {
        let (summaries, skipped) = self.summaries(coach_id)?;
        let (active, history) = split_by_due(summaries, now.date_naive(), |s| s.assignment.due_on);

        Ok(AssignmentListing {
            active,
            history,
            skipped,
        })
    }

    /// Dashboard cards, one per group.
    pub fn by_group(&self, coach_id: Uuid) -> AssignmentResult<DashboardCards> {
        self.cards(coach_id, |s| {
            (s.assignment.group_code.clone(), s.group_name.clone())
        })
    }

    /// Dashboard cards, one per test definition.
    pub fn by_test(&self, coach_id: Uuid) -> AssignmentResult<DashboardCards> {
        self.cards(coach_id, |s| (s.assignment.test_id.to_string(), s.test_name.clone()))
    }

    /// An athlete's rostered assignments with their own completion state.
    pub fn assignments_for_athlete(
        &self,
        athlete_id: Uuid,
        now: DateTime<Utc>,
    ) -> AssignmentResult<AthleteAssignments> {
        let rows = self.query_named(
            "JOIN assignment_rosters ar ON ar.assignment_id = a.id
             WHERE ar.athlete_id = ?1",
            athlete_id,
        )?;

        let mut items = Vec::with_capacity(rows.len());
        let mut skipped = Vec::new();
        for row in rows {
            let Some(test_name) = row.test_name else {
                tracing::warn!(
                    assignment_id = %row.assignment.id,
                    test_id = %row.assignment.test_id,
                    "Skipping assignment whose test definition was deleted"
                );
                skipped.push(row.assignment.id);
                continue;
            };

            let submitted: bool = self.conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM results WHERE assignment_id = ?1 AND athlete_id = ?2)",
                params![row.assignment.id.to_string(), athlete_id.to_string()],
                |r| r.get(0),
            )?;

            items.push(AthleteAssignment {
                assignment: row.assignment,
                test_name,
                state: if submitted {
                    CompletionState::Completed
                } else {
                    CompletionState::Pending
                },
            });
        }

        let (active, history) = split_by_due(items, now.date_naive(), |a| a.assignment.due_on);
        Ok(AthleteAssignments {
            active,
            history,
            skipped,
        })
    }

    fn cards<K>(&self, coach_id: Uuid, key: K) -> AssignmentResult<DashboardCards>
    where
        K: Fn(&AssignmentSummary) -> (String, String),
    {
        let (summaries, skipped) = self.summaries(coach_id)?;

        let mut buckets: BTreeMap<String, ProgressCard> = BTreeMap::new();
        for summary in &summaries {
            let (card_key, title) = key(summary);
            let card = buckets.entry(card_key.clone()).or_insert_with(|| ProgressCard {
                key: card_key,
                title,
                assignments: 0,
                total: 0,
                completed_count: 0,
                percent: 0,
            });
            card.assignments += 1;
            card.total += summary.progress.total;
            card.completed_count += summary.progress.completed_count;
        }

        let mut cards: Vec<ProgressCard> = buckets
            .into_values()
            .map(|mut card| {
                card.percent = completion_percent(card.completed_count, card.total);
                card
            })
            .collect();
        cards.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));

        Ok(DashboardCards { cards, skipped })
    }

    /// A coach's assignments with names and progress; deleted tests are skipped
    /// and reported.
    fn summaries(&self, coach_id: Uuid) -> AssignmentResult<(Vec<AssignmentSummary>, Vec<Uuid>)> {
        let rows = self.query_named("WHERE a.coach_id = ?1", coach_id)?;

        let mut summaries = Vec::with_capacity(rows.len());
        let mut skipped = Vec::new();
        for row in rows {
            let Some(test_name) = row.test_name else {
                tracing::warn!(
                    assignment_id = %row.assignment.id,
                    test_id = %row.assignment.test_id,
                    "Skipping assignment whose test definition was deleted"
                );
                skipped.push(row.assignment.id);
                continue;
            };

            let progress = self
                .aggregate(&[row.assignment.id])?
                .pop()
                .ok_or(AssignmentError::NotFound(row.assignment.id))?;

            summaries.push(AssignmentSummary {
                assignment: row.assignment,
                test_name,
                group_name: row.group_name,
                progress,
            });
        }

        Ok((summaries, skipped))
    }

    /// Assignments joined with test and group names, newest first.
    fn query_named(&self, filter: &str, id: Uuid) -> AssignmentResult<Vec<NamedAssignment>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ASSIGNMENT_COLUMNS}, t.name, g.name
             FROM assignments a
             LEFT JOIN test_definitions t ON t.id = a.test_id
             JOIN groups g ON g.code = a.group_code
             {filter}
             ORDER BY a.assigned_on DESC"
        ))?;

        let rows = stmt.query_map(params![id.to_string()], |row| {
            Ok(NamedAssignment {
                assignment: parse_assignment_row(row)?,
                test_name: row.get(6)?,
                group_name: row.get(7)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(AssignmentError::from)
    }
}
