//! Daily calorie and macro targets.
//!
//! Targets come from one of two places:
//! - A user override stored on the profile (returned untouched)
//! - The Mifflin-St Jeor BMR, scaled by activity and adjusted for the goal
//!
//! Macro split of the adjusted calories: 30% protein, 45% carbs, 25% fat,
//! at 4/4/9 kcal per gram.

use crate::{ActivityLevel, Gender, Goal, MacroTargets, NutritionLog, TargetsMode, UserProfile};
use serde::{Deserialize, Serialize};

/// Targets used when no profile has been set up yet
pub const FALLBACK_TARGETS: MacroTargets = MacroTargets {
    calories: 2000,
    protein: 150,
    carbs: 200,
    fat: 60,
};

const PROTEIN_SHARE: f64 = 0.30;
const CARBS_SHARE: f64 = 0.45;
const FAT_SHARE: f64 = 0.25;

const KCAL_PER_GRAM_PROTEIN: f64 = 4.0;
const KCAL_PER_GRAM_CARBS: f64 = 4.0;
const KCAL_PER_GRAM_FAT: f64 = 9.0;

impl ActivityLevel {
    /// TDEE multiplier applied to BMR
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }
}

impl Goal {
    /// Daily kcal added to (or removed from) TDEE
    pub fn calorie_adjustment(&self) -> i32 {
        match self {
            Goal::LoseWeight => -500,
            Goal::Maintain => 0,
            Goal::GainMuscle => 300,
        }
    }
}

/// Basal metabolic rate (kcal/day), Mifflin-St Jeor
pub fn basal_metabolic_rate(profile: &UserProfile) -> f64 {
    let base = 10.0 * profile.weight + 6.25 * profile.height - 5.0 * f64::from(profile.age);
    match profile.gender {
        Gender::Male => base + 5.0,
        Gender::Female => base - 161.0,
    }
}

/// Compute daily targets for a profile
///
/// An override on the profile takes absolute precedence. Without a profile
/// the [`FALLBACK_TARGETS`] are returned. Input is not validated here; see
/// [`crate::validation::validate_profile`].
pub fn compute_targets(profile: Option<&UserProfile>) -> MacroTargets {
    let profile = match profile {
        Some(profile) => profile,
        None => return FALLBACK_TARGETS,
    };

    if let TargetsMode::Override(targets) = profile.targets {
        return targets;
    }

    let bmr = basal_metabolic_rate(profile);
    let tdee = (bmr * profile.activity_level.multiplier()).round() as i32;
    let calories = tdee + profile.goal.calorie_adjustment();

    tracing::debug!(
        "Computed targets: bmr={:.2}, tdee={}, adjusted={}",
        bmr,
        tdee,
        calories
    );

    macro_split(calories)
}

/// Split a calorie budget into macro grams
pub fn macro_split(calories: i32) -> MacroTargets {
    let kcal = f64::from(calories);
    MacroTargets {
        calories,
        protein: (kcal * PROTEIN_SHARE / KCAL_PER_GRAM_PROTEIN).round() as i32,
        carbs: (kcal * CARBS_SHARE / KCAL_PER_GRAM_CARBS).round() as i32,
        fat: (kcal * FAT_SHARE / KCAL_PER_GRAM_FAT).round() as i32,
    }
}

/// Consumed macros summed over a set of nutrition logs
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MacroTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl MacroTotals {
    pub fn from_logs<'a, I>(logs: I) -> Self
    where
        I: IntoIterator<Item = &'a NutritionLog>,
    {
        logs.into_iter().fold(Self::default(), |acc, log| MacroTotals {
            calories: acc.calories + log.calories,
            protein: acc.protein + log.protein,
            carbs: acc.carbs + log.carbs,
            fat: acc.fat + log.fat,
        })
    }
}

/// A day's intake measured against its targets
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NutritionProgress {
    pub targets: MacroTargets,
    pub consumed: MacroTotals,
    /// Target minus consumed; negative when over target
    pub remaining: MacroTotals,
}

/// Compare consumed macros from `logs` against `targets`
///
/// The caller decides which logs belong to the day.
pub fn nutrition_progress<'a, I>(targets: MacroTargets, logs: I) -> NutritionProgress
where
    I: IntoIterator<Item = &'a NutritionLog>,
{
    let consumed = MacroTotals::from_logs(logs);
    let remaining = MacroTotals {
        calories: f64::from(targets.calories) - consumed.calories,
        protein: f64::from(targets.protein) - consumed.protein,
        carbs: f64::from(targets.carbs) - consumed.carbs,
        fat: f64::from(targets.fat) - consumed.fat,
    };

    NutritionProgress {
        targets,
        consumed,
        remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn profile(gender: Gender, activity_level: ActivityLevel, goal: Goal) -> UserProfile {
        UserProfile {
            name: None,
            weight: 70.0,
            height: 175.0,
            age: 30,
            gender,
            activity_level,
            goal,
            targets: TargetsMode::Formula,
        }
    }

    #[test]
    fn test_reference_male_moderate_maintain() {
        let p = profile(Gender::Male, ActivityLevel::Moderate, Goal::Maintain);
        assert!((basal_metabolic_rate(&p) - 1648.75).abs() < 1e-9);

        let targets = compute_targets(Some(&p));
        assert_eq!(
            targets,
            MacroTargets {
                calories: 2556,
                protein: 192,
                carbs: 288,
                fat: 71,
            }
        );
    }

    #[test]
    fn test_female_bmr_offset() {
        let p = profile(Gender::Female, ActivityLevel::Sedentary, Goal::Maintain);
        // 700 + 1093.75 - 150 - 161
        assert!((basal_metabolic_rate(&p) - 1482.75).abs() < 1e-9);
        // round(1482.75 * 1.2) = round(1779.3)
        assert_eq!(compute_targets(Some(&p)).calories, 1779);
    }

    #[test]
    fn test_goal_adjustments() {
        let maintain = compute_targets(Some(&profile(
            Gender::Male,
            ActivityLevel::Moderate,
            Goal::Maintain,
        )));
        let lose = compute_targets(Some(&profile(
            Gender::Male,
            ActivityLevel::Moderate,
            Goal::LoseWeight,
        )));
        let gain = compute_targets(Some(&profile(
            Gender::Male,
            ActivityLevel::Moderate,
            Goal::GainMuscle,
        )));

        assert_eq!(lose.calories, maintain.calories - 500);
        assert_eq!(gain.calories, maintain.calories + 300);
        // Macros follow the adjusted calories
        assert_eq!(lose, macro_split(2056));
    }

    #[test]
    fn test_activity_multipliers_are_increasing() {
        let levels = [
            ActivityLevel::Sedentary,
            ActivityLevel::Light,
            ActivityLevel::Moderate,
            ActivityLevel::Active,
            ActivityLevel::VeryActive,
        ];
        for pair in levels.windows(2) {
            assert!(pair[0].multiplier() < pair[1].multiplier());
        }
        assert_eq!(ActivityLevel::VeryActive.multiplier(), 1.9);
    }

    #[test]
    fn test_override_is_returned_verbatim() {
        let custom = MacroTargets {
            calories: 1234,
            protein: 1,
            carbs: 2,
            fat: 3,
        };
        let mut p = profile(Gender::Female, ActivityLevel::Active, Goal::GainMuscle);
        p.targets = TargetsMode::Override(custom);
        assert_eq!(compute_targets(Some(&p)), custom);
    }

    #[test]
    fn test_no_profile_uses_fallback() {
        assert_eq!(compute_targets(None), FALLBACK_TARGETS);
        assert_eq!(FALLBACK_TARGETS.calories, 2000);
    }

    #[test]
    fn test_deterministic() {
        let p = profile(Gender::Female, ActivityLevel::Light, Goal::LoseWeight);
        assert_eq!(compute_targets(Some(&p)), compute_targets(Some(&p)));
    }

    #[test]
    fn test_nutrition_progress() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let log = |calories, protein| NutritionLog {
            id: format!("m{}", calories),
            date,
            name: "Meal".into(),
            calories,
            protein,
            carbs: 10.0,
            fat: 5.0,
            meal_type: None,
        };
        let logs = vec![log(500.0, 40.0), log(700.0, 30.0)];

        let progress = nutrition_progress(FALLBACK_TARGETS, &logs);
        assert_eq!(progress.consumed.calories, 1200.0);
        assert_eq!(progress.consumed.protein, 70.0);
        assert_eq!(progress.remaining.calories, 800.0);
        assert_eq!(progress.remaining.carbs, 180.0);

        let empty = nutrition_progress(FALLBACK_TARGETS, std::iter::empty::<&NutritionLog>());
        assert_eq!(empty.consumed, MacroTotals::default());
    }
}
