//! Per-day aggregation of workouts and nutrition for calendar views.

use crate::nutrition::MacroTotals;
use crate::{NutritionLog, WorkoutRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Activity and intake totals for one calendar day
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct DaySummary {
    pub workouts: usize,
    pub minutes: u64,
    pub calories_burned: u64,
    pub intake: MacroTotals,
    pub meals: usize,
}

impl DaySummary {
    fn add_workout(&mut self, record: &WorkoutRecord) {
        self.workouts += 1;
        self.minutes += u64::from(record.duration);
        self.calories_burned += u64::from(record.calories);
    }

    fn add_meal(&mut self, log: &NutritionLog) {
        self.meals += 1;
        self.intake.calories += log.calories;
        self.intake.protein += log.protein;
        self.intake.carbs += log.carbs;
        self.intake.fat += log.fat;
    }

    pub fn is_active(&self) -> bool {
        self.workouts > 0
    }
}

/// Group workouts and meals by date
///
/// Only days with at least one entry appear in the map.
pub fn aggregate_by_day(
    workouts: &[WorkoutRecord],
    meals: &[NutritionLog],
) -> BTreeMap<NaiveDate, DaySummary> {
    let mut days: BTreeMap<NaiveDate, DaySummary> = BTreeMap::new();

    for record in workouts {
        days.entry(record.date).or_default().add_workout(record);
    }
    for log in meals {
        days.entry(log.date).or_default().add_meal(log);
    }

    days
}

/// Summary for a single date (empty summary when nothing was logged)
pub fn summarize_day(
    date: NaiveDate,
    workouts: &[WorkoutRecord],
    meals: &[NutritionLog],
) -> DaySummary {
    let mut summary = DaySummary::default();
    workouts
        .iter()
        .filter(|w| w.date == date)
        .for_each(|w| summary.add_workout(w));
    meals
        .iter()
        .filter(|m| m.date == date)
        .for_each(|m| summary.add_meal(m));
    summary
}

/// Consecutive active days ending at `today`
///
/// A day without workouts yet does not break the streak if yesterday was
/// active.
pub fn current_streak(workouts: &[WorkoutRecord], today: NaiveDate) -> u32 {
    let active: std::collections::HashSet<NaiveDate> = workouts.iter().map(|w| w.date).collect();

    let mut day = if active.contains(&today) {
        today
    } else {
        match today.pred_opt() {
            Some(d) => d,
            None => return 0,
        }
    };

    let mut streak = 0;
    while active.contains(&day) {
        streak += 1;
        day = match day.pred_opt() {
            Some(d) => d,
            None => break,
        };
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, day).unwrap()
    }

    fn workout(id: &str, day: u32, duration: u32, calories: u32) -> WorkoutRecord {
        WorkoutRecord {
            id: id.into(),
            date: date(day),
            workout_type: "Cycle".into(),
            duration,
            calories,
            completed: true,
            details: None,
        }
    }

    fn meal(id: &str, day: u32, calories: f64) -> NutritionLog {
        NutritionLog {
            id: id.into(),
            date: date(day),
            name: "Bowl".into(),
            calories,
            protein: 30.0,
            carbs: 50.0,
            fat: 15.0,
            meal_type: None,
        }
    }

    #[test]
    fn test_aggregate_by_day() {
        let workouts = vec![
            workout("a", 1, 30, 200),
            workout("b", 1, 15, 100),
            workout("c", 3, 60, 500),
        ];
        let meals = vec![meal("m1", 1, 600.0), meal("m2", 2, 400.0)];

        let days = aggregate_by_day(&workouts, &meals);
        assert_eq!(days.len(), 3);

        let first = &days[&date(1)];
        assert_eq!(first.workouts, 2);
        assert_eq!(first.minutes, 45);
        assert_eq!(first.calories_burned, 300);
        assert_eq!(first.meals, 1);
        assert_eq!(first.intake.calories, 600.0);

        let second = &days[&date(2)];
        assert!(!second.is_active());
        assert_eq!(second.intake.protein, 30.0);
    }

    #[test]
    fn test_summarize_empty_day() {
        let summary = summarize_day(date(20), &[], &[]);
        assert_eq!(summary, DaySummary::default());
    }

    #[test]
    fn test_current_streak() {
        let workouts = vec![
            workout("a", 10, 20, 0),
            workout("b", 11, 20, 0),
            workout("c", 12, 20, 0),
            workout("d", 8, 20, 0),
        ];
        assert_eq!(current_streak(&workouts, date(12)), 3);
        // Today not logged yet
        assert_eq!(current_streak(&workouts, date(13)), 3);
        assert_eq!(current_streak(&workouts, date(15)), 0);
        assert_eq!(current_streak(&[], date(15)), 0);
    }
}
