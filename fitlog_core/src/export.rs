//! CSV export of workout history for external charting.
//!
//! One row per workout, with the XP and lifted volume the gamification
//! engine credits it with.

use crate::gamification::{record_volume, record_xp};
use crate::{Result, WorkoutRecord};
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    date: String,
    #[serde(rename = "type")]
    workout_type: String,
    duration: u32,
    calories: u32,
    completed: bool,
    exercises: usize,
    sets: usize,
    volume: f64,
    xp: u64,
}

impl From<&WorkoutRecord> for CsvRow {
    fn from(record: &WorkoutRecord) -> Self {
        CsvRow {
            id: record.id.clone(),
            date: record.date.format("%Y-%m-%d").to_string(),
            workout_type: record.workout_type.clone(),
            duration: record.duration,
            calories: record.calories,
            completed: record.completed,
            exercises: record.details.as_ref().map_or(0, |d| d.len()),
            sets: record.sets().count(),
            volume: record_volume(record),
            xp: record_xp(record),
        }
    }
}

/// Write `records` to a CSV file, replacing any existing file
///
/// Returns the number of rows written. The header row is always present,
/// even for an empty history.
pub fn export_workouts_csv(records: &[WorkoutRecord], csv_path: &Path) -> Result<usize> {
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(csv_path)?;

    writer.write_record([
        "id",
        "date",
        "type",
        "duration",
        "calories",
        "completed",
        "exercises",
        "sets",
        "volume",
        "xp",
    ])?;
    for record in records {
        writer.serialize(CsvRow::from(record))?;
    }

    writer.flush()?;
    tracing::info!("Exported {} workouts to {:?}", records.len(), csv_path);
    Ok(records.len())
}
