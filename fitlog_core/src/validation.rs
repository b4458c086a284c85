//! Input validation for profiles, workouts and nutrition logs.
//!
//! The target and gamification engines accept any input and never fail.
//! These checks run at the persistence boundary instead, before anything
//! is written to the store or a journal.

use crate::{Error, NutritionLog, Result, TargetsMode, UserProfile, WorkoutRecord};
use std::collections::HashSet;

fn positive(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{} must be a positive number, got {}",
            field, value
        )))
    }
}

fn non_negative(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{} must not be negative, got {}",
            field, value
        )))
    }
}

/// Reject profiles the BMR formula cannot sensibly use
pub fn validate_profile(profile: &UserProfile) -> Result<()> {
    positive("weight", profile.weight)?;
    positive("height", profile.height)?;
    if profile.age == 0 {
        return Err(Error::Validation("age must be at least 1".into()));
    }

    if let TargetsMode::Override(targets) = profile.targets {
        let fields = [
            ("calories", targets.calories),
            ("protein", targets.protein),
            ("carbs", targets.carbs),
            ("fat", targets.fat),
        ];
        for (field, value) in fields {
            if value < 0 {
                return Err(Error::Validation(format!(
                    "override {} must not be negative, got {}",
                    field, value
                )));
            }
        }
    }

    Ok(())
}

/// Reject malformed workout records
///
/// Checks: non-empty id and type, set numbers start at 1 and are unique
/// per exercise, set weights are finite and non-negative.
pub fn validate_workout(record: &WorkoutRecord) -> Result<()> {
    if record.id.trim().is_empty() {
        return Err(Error::Validation("workout id must not be empty".into()));
    }
    if record.workout_type.trim().is_empty() {
        return Err(Error::Validation("workout type must not be empty".into()));
    }

    for exercise in record.details.iter().flatten() {
        if exercise.exercise_name.trim().is_empty() {
            return Err(Error::Validation("exercise name must not be empty".into()));
        }

        let mut seen = HashSet::new();
        for set in &exercise.sets {
            if set.set_number == 0 {
                return Err(Error::Validation(format!(
                    "{}: set numbers start at 1",
                    exercise.exercise_name
                )));
            }
            if !seen.insert(set.set_number) {
                return Err(Error::Validation(format!(
                    "{}: duplicate set number {}",
                    exercise.exercise_name, set.set_number
                )));
            }
            non_negative("set weight", set.weight)?;
        }
    }

    Ok(())
}

/// Reject nutrition logs with missing names or negative macros
pub fn validate_nutrition_log(log: &NutritionLog) -> Result<()> {
    if log.id.trim().is_empty() {
        return Err(Error::Validation("meal id must not be empty".into()));
    }
    if log.name.trim().is_empty() {
        return Err(Error::Validation("meal name must not be empty".into()));
    }
    non_negative("calories", log.calories)?;
    non_negative("protein", log.protein)?;
    non_negative("carbs", log.carbs)?;
    non_negative("fat", log.fat)?;
    Ok(())
}
