//! Exercise log service: appending entries and computing log views.
//!
//! Filtering rules for [`ExerciseLog::get_log`]:
//! - Filtering only happens if at least one of `from`, `to`, `limit` is given
//! - An unparsable `from` means no lower bound
//! - An unparsable `to` means "now", not "no upper bound"
//! - Both bounds are inclusive; entries are never re-ordered
//! - `limit` keeps the first N filtered entries when positive

use crate::date::{format_canonical, parse_date, render_stored};
use crate::directory::UserDirectory;
use crate::{
    Error, ExerciseEntry, ExerciseSummary, LogQuery, LogView, NewExercise, Result, UserId,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;

#[derive(Clone)]
pub struct ExerciseLog {
    directory: UserDirectory,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl ExerciseLog {
    /// Users are resolved and updated through `directory`
    pub fn new(directory: UserDirectory, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self { directory, clock }
    }

    /// Append an exercise to a user's log
    ///
    /// Any lookup failure, including an unknown user, is reported as
    /// [`Error::Update`] and nothing is appended.
    pub async fn append_exercise(
        &self,
        user_id: &UserId,
        exercise: NewExercise,
    ) -> Result<ExerciseSummary> {
        let entry = ExerciseEntry {
            description: exercise.description,
            duration: exercise.duration,
            date: exercise
                .date
                .unwrap_or_else(|| format_canonical(self.clock.utc())),
        };

        let updated = match self.directory.record_exercise(user_id, entry.clone()).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                let cause = Error::NotFound(format!("no user with id {}", user_id));
                tracing::warn!("Exercise append rejected: {}", cause);
                return Err(Error::update(cause));
            }
            Err(e) => {
                tracing::error!("Exercise append failed for {}: {}", user_id, e);
                return Err(Error::update(e));
            }
        };

        tracing::info!(
            "Appended exercise for {} ({} total)",
            user_id,
            updated.exercises.len()
        );

        Ok(ExerciseSummary {
            username: updated.username,
            description: entry.description,
            duration: entry.duration,
            id: user_id.clone(),
            date: render_stored(&entry.date),
        })
    }

    /// A user's exercise log, optionally filtered and limited
    pub async fn get_log(&self, user_id: &UserId, query: &LogQuery) -> Result<LogView> {
        let user = self
            .directory
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| Error::NotFound("Cannot find userId".into()))?;

        let count = user.exercises.len();
        let entries = if query.is_empty() {
            user.exercises
        } else {
            filter_entries(user.exercises, query, self.clock.utc())
        };

        let log = entries
            .into_iter()
            .map(|entry| ExerciseEntry {
                date: render_stored(&entry.date),
                ..entry
            })
            .collect();

        Ok(LogView {
            username: user.username,
            id: user_id.clone(),
            count,
            log,
        })
    }
}

/// Apply the date range and limit of `query` to `entries`
pub fn filter_entries(
    entries: Vec<ExerciseEntry>,
    query: &LogQuery,
    now: DateTime<Utc>,
) -> Vec<ExerciseEntry> {
    let from = query
        .from
        .as_deref()
        .and_then(parse_date)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let to = query.to.as_deref().and_then(parse_date).unwrap_or(now);

    let in_range = entries.into_iter().filter(|entry| {
        // Unparsable stored dates never satisfy a range
        parse_date(&entry.date).is_some_and(|date| from <= date && date <= to)
    });

    match query.limit.as_deref().map(parse_limit) {
        Some(limit) if limit > 0 => in_range.take(limit as usize).collect(),
        _ => in_range.collect(),
    }
}

/// Parse the leading integer of `text`, the way a lenient int parse would
///
/// `"2abc"` is 2, `" -3"` is -3; no leading digits yields 0.
pub fn parse_limit(text: &str) -> i64 {
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    let value = digits.parse::<i64>().unwrap_or(if digits.is_empty() {
        0
    } else {
        i64::MAX
    });

    if negative {
        -value
    } else {
        value
    }
}
