//! Experience points, levels and badges derived from workout history.
//!
//! Nothing here is persisted. The summary is recomputed from whatever
//! history snapshot is passed in, so deleting a workout can lower XP and
//! drop badges while adding one never does.
//!
//! XP rules, per workout record:
//! - 5 XP per minute of duration
//! - 100 XP for the session itself
//! - floor(weight x reps / 100) XP for every completed set with a load
//!
//! Level `n` starts at `50 * (n - 1)^2` XP, so each level costs 100 XP more
//! than the one before it.

use crate::{Badge, GamificationSummary, WorkoutRecord};

const XP_PER_MINUTE: u64 = 5;
const XP_PER_SESSION: u64 = 100;
const VOLUME_PER_XP: f64 = 100.0;
const LEVEL_XP_SCALE: u64 = 50;

const CONSISTENT_WORKOUTS: usize = 10;
const VETERAN_WORKOUTS: usize = 50;
const HEAVY_VOLUME: f64 = 10_000.0;
const ELITE_XP: u64 = 5_000;

/// Volume lifted in a record: sum of weight x reps over completed,
/// loaded sets
pub fn record_volume(record: &WorkoutRecord) -> f64 {
    record
        .sets()
        .filter(|set| set.completed && set.weight > 0.0)
        .map(|set| set.weight * f64::from(set.reps))
        .sum()
}

/// XP earned by a single record
pub fn record_xp(record: &WorkoutRecord) -> u64 {
    let set_xp: u64 = record
        .sets()
        .filter(|set| set.completed && set.weight > 0.0)
        .map(|set| (set.weight * f64::from(set.reps) / VOLUME_PER_XP).floor() as u64)
        .sum();

    u64::from(record.duration) * XP_PER_MINUTE + XP_PER_SESSION + set_xp
}

/// Level reached at `total_xp` (level 1 at zero XP)
pub fn level_for_xp(total_xp: u64) -> u32 {
    ((total_xp as f64 / LEVEL_XP_SCALE as f64).sqrt().floor() as u32) + 1
}

/// XP needed to reach `level`
pub fn level_threshold(level: u32) -> u64 {
    let steps = u64::from(level.saturating_sub(1));
    LEVEL_XP_SCALE * steps * steps
}

/// Where a given XP total sits within its level
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelProgress {
    pub level: u32,
    pub prev_level_xp: u64,
    pub next_level_xp: u64,
    pub progress_percent: f64,
}

impl LevelProgress {
    pub fn from_xp(total_xp: u64) -> Self {
        let level = level_for_xp(total_xp);
        let prev_level_xp = level_threshold(level);
        let next_level_xp = level_threshold(level + 1);

        let span = (next_level_xp - prev_level_xp) as f64;
        let earned = total_xp.saturating_sub(prev_level_xp) as f64;
        let progress_percent = (100.0 * earned / span).min(100.0);

        Self {
            level,
            prev_level_xp,
            next_level_xp,
            progress_percent,
        }
    }
}

/// Badges earned for the given cumulative totals, in display order
pub fn badges_for(workout_count: usize, total_volume: f64, total_xp: u64) -> Vec<Badge> {
    Badge::ALL
        .iter()
        .copied()
        .filter(|badge| match badge {
            Badge::FirstStep => workout_count >= 1,
            Badge::Consistent => workout_count >= CONSISTENT_WORKOUTS,
            Badge::Veteran => workout_count >= VETERAN_WORKOUTS,
            Badge::Heavy => total_volume >= HEAVY_VOLUME,
            Badge::Elite => total_xp > ELITE_XP,
        })
        .collect()
}

/// Compute XP, level and badges for a workout history
///
/// Record order does not matter. Every record counts as one session,
/// regardless of its `completed` flag.
pub fn compute_gamification(history: &[WorkoutRecord]) -> GamificationSummary {
    let (total_xp, total_volume) = history.iter().fold((0u64, 0.0f64), |(xp, volume), record| {
        (xp + record_xp(record), volume + record_volume(record))
    });

    let progress = LevelProgress::from_xp(total_xp);
    let badges = badges_for(history.len(), total_volume, total_xp);

    tracing::debug!(
        "Gamification: {} workouts, {} XP, level {}, {} badges",
        history.len(),
        total_xp,
        progress.level,
        badges.len()
    );

    GamificationSummary {
        total_xp,
        level: progress.level,
        progress_percent: progress.progress_percent,
        badges,
        next_level_xp: progress.next_level_xp,
        current_xp: total_xp,
        total_volume,
        workout_count: history.len(),
    }
}
