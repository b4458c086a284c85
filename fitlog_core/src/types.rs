//! Core domain types for the fitlog system.
//!
//! This module defines the fundamental types used throughout the system:
//! - User profile and nutrition targets
//! - Workout records with per-exercise set logs
//! - Nutrition logs
//! - Gamification output (levels and badges)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Profile Types
// ============================================================================

/// Gender used by the BMR formula
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

/// Self-reported activity level
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    /// Little or no exercise
    Sedentary,
    /// Light exercise 1-3 days/week
    Light,
    /// Moderate exercise 3-5 days/week
    #[default]
    Moderate,
    /// Hard exercise 6-7 days/week
    Active,
    /// Very hard exercise or a physical job
    VeryActive,
}

/// Body composition goal
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    LoseWeight,
    #[default]
    Maintain,
    GainMuscle,
}

/// Daily calorie and macro targets (kcal and grams)
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MacroTargets {
    pub calories: i32,
    pub protein: i32,
    pub carbs: i32,
    pub fat: i32,
}

/// How daily targets are obtained for a profile
///
/// `Override` always wins: its values are returned as-is and the formula
/// is never consulted.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TargetsMode {
    #[default]
    Formula,
    Override(MacroTargets),
}

/// User profile captured during onboarding
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Body weight in kg
    pub weight: f64,
    /// Height in cm
    pub height: f64,
    /// Age in years
    pub age: u32,
    pub gender: Gender,
    #[serde(default)]
    pub activity_level: ActivityLevel,
    #[serde(default)]
    pub goal: Goal,
    #[serde(default)]
    pub targets: TargetsMode,
}

// ============================================================================
// Workout Types
// ============================================================================

/// A single set performed for an exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseSetLog {
    pub set_number: u32,
    /// Load in kg (0 for bodyweight)
    pub weight: f64,
    pub reps: u32,
    pub completed: bool,
}

/// All sets performed for one exercise within a workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseLog {
    pub exercise_name: String,
    pub sets: Vec<ExerciseSetLog>,
}

/// A finished workout session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutRecord {
    pub id: String,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub workout_type: String,
    /// Minutes
    pub duration: u32,
    /// Estimated kcal burned
    pub calories: u32,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ExerciseLog>>,
}

impl WorkoutRecord {
    /// Iterate every set in the record, across all exercises
    pub fn sets(&self) -> impl Iterator<Item = &ExerciseSetLog> {
        self.details
            .iter()
            .flatten()
            .flat_map(|exercise| exercise.sets.iter())
    }
}

// ============================================================================
// Nutrition Types
// ============================================================================

/// Meal slot for a nutrition log
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

/// A logged food item with estimated macros
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NutritionLog {
    pub id: String,
    pub date: NaiveDate,
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal_type: Option<MealType>,
}

// ============================================================================
// Gamification Types
// ============================================================================

/// Achievement unlocked from cumulative workout history
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    FirstStep,
    Consistent,
    Veteran,
    Heavy,
    Elite,
}

impl Badge {
    /// All badges in display order
    pub const ALL: [Badge; 5] = [
        Badge::FirstStep,
        Badge::Consistent,
        Badge::Veteran,
        Badge::Heavy,
        Badge::Elite,
    ];

    /// Stable identifier
    pub fn id(&self) -> &'static str {
        match self {
            Badge::FirstStep => "first_step",
            Badge::Consistent => "consistent",
            Badge::Veteran => "veteran",
            Badge::Heavy => "heavy",
            Badge::Elite => "elite",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Badge::FirstStep => "First Step",
            Badge::Consistent => "Consistent",
            Badge::Veteran => "Veteran",
            Badge::Heavy => "Heavy Lifter",
            Badge::Elite => "Elite",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Badge::FirstStep => "Completed your first workout",
            Badge::Consistent => "Logged 10 workouts",
            Badge::Veteran => "Logged 50 workouts",
            Badge::Heavy => "Lifted 10,000 kg of total volume",
            Badge::Elite => "Earned more than 5,000 XP",
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Derived engagement state for a workout history
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GamificationSummary {
    pub total_xp: u64,
    pub level: u32,
    /// Progress through the current level, 0-100
    pub progress_percent: f64,
    pub badges: Vec<Badge>,
    /// Cumulative XP at which the next level starts
    pub next_level_xp: u64,
    pub current_xp: u64,
    /// Sum of weight x reps over completed, loaded sets
    pub total_volume: f64,
    pub workout_count: usize,
}

// ============================================================================
// String Parsing (CLI and config input)
// ============================================================================

impl FromStr for Gender {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            other => Err(crate::Error::Validation(format!("Unknown gender: {}", other))),
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "light" => Ok(ActivityLevel::Light),
            "moderate" => Ok(ActivityLevel::Moderate),
            "active" => Ok(ActivityLevel::Active),
            "very_active" => Ok(ActivityLevel::VeryActive),
            other => Err(crate::Error::Validation(format!(
                "Unknown activity level: {}",
                other
            ))),
        }
    }
}

impl FromStr for Goal {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "lose_weight" | "lose" => Ok(Goal::LoseWeight),
            "maintain" => Ok(Goal::Maintain),
            "gain_muscle" | "gain" => Ok(Goal::GainMuscle),
            other => Err(crate::Error::Validation(format!("Unknown goal: {}", other))),
        }
    }
}

impl FromStr for MealType {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            "snack" => Ok(MealType::Snack),
            other => Err(crate::Error::Validation(format!("Unknown meal type: {}", other))),
        }
    }
}
