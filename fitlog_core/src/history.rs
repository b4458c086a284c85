//! History snapshots built from the journals.
//!
//! The engines take plain slices; this module turns journal files into the
//! newest-first, duplicate-free snapshots they expect.

use crate::journal::{read_nutrition_logs, read_workouts, JournalEntry};
use crate::{NutritionLog, Result, WorkoutRecord};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::path::Path;

/// Dated journal entries that can be ordered into a history
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

impl Dated for WorkoutRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for NutritionLog {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Order journal entries newest first and drop repeated ids
///
/// Entries on the same date keep reverse append order, so the most recently
/// logged comes first. For a repeated id the first occurrence in the journal
/// wins.
pub fn newest_first<T: JournalEntry + Dated>(entries: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut unique: Vec<T> = entries
        .into_iter()
        .filter(|entry| {
            let fresh = seen.insert(entry.entry_id().to_string());
            if !fresh {
                tracing::warn!("Ignoring duplicate journal id {}", entry.entry_id());
            }
            fresh
        })
        .collect();

    unique.reverse();
    unique.sort_by(|a, b| b.date().cmp(&a.date()));
    unique
}

/// Load the full workout history, newest first
pub fn load_workout_history(path: &Path) -> Result<Vec<WorkoutRecord>> {
    let history = newest_first(read_workouts(path)?);
    tracing::info!("Loaded {} workouts", history.len());
    Ok(history)
}

/// Load all nutrition logs, newest first
pub fn load_nutrition_history(path: &Path) -> Result<Vec<NutritionLog>> {
    let logs = newest_first(read_nutrition_logs(path)?);
    tracing::info!("Loaded {} nutrition logs", logs.len());
    Ok(logs)
}

/// Entries logged on a given date
pub fn on_date<T: Dated>(entries: &[T], date: NaiveDate) -> Vec<&T> {
    entries.iter().filter(|e| e.date() == date).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::{EntrySink, Journal};

    fn workout(id: &str, day: u32) -> WorkoutRecord {
        WorkoutRecord {
            id: id.into(),
            date: NaiveDate::from_ymd_opt(2024, 7, day).unwrap(),
            workout_type: "Swim".into(),
            duration: 30,
            calories: 300,
            completed: true,
            details: None,
        }
    }

    #[test]
    fn test_sorted_newest_first() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("workouts.jsonl");

        let mut journal = Journal::new(&path);
        // Logged out of date order
        journal.append(&workout("mid", 5)).unwrap();
        journal.append(&workout("old", 1)).unwrap();
        journal.append(&workout("new", 9)).unwrap();

        let ids: Vec<_> = load_workout_history(&path)
            .unwrap()
            .into_iter()
            .map(|w| w.id)
            .collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_same_day_latest_logged_first() {
        let history = newest_first(vec![workout("first", 3), workout("second", 3)]);
        assert_eq!(history[0].id, "second");
        assert_eq!(history[1].id, "first");
    }

    #[test]
    fn test_duplicate_ids_dropped() {
        let mut dup = workout("x", 4);
        dup.duration = 99;
        let history = newest_first(vec![workout("x", 2), dup, workout("y", 3)]);

        assert_eq!(history.len(), 2);
        let x = history.iter().find(|w| w.id == "x").unwrap();
        assert_eq!(x.duration, 30);
    }

    #[test]
    fn test_on_date() {
        let history = vec![workout("a", 1), workout("b", 2), workout("c", 2)];
        let day = NaiveDate::from_ymd_opt(2024, 7, 2).unwrap();
        let ids: Vec<_> = on_date(&history, day).iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_missing_journal_is_empty_history() {
        let temp_dir = tempfile::tempdir().unwrap();
        let history = load_workout_history(&temp_dir.path().join("none.jsonl")).unwrap();
        assert!(history.is_empty());
    }
}
