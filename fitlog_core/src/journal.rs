//! Append-only JSON Lines journals for workouts and meals.
//!
//! Each entry is one line. Appends and deletes take an exclusive lock,
//! reads take a shared lock. Deleting an entry rewrites the journal without
//! it through a temp file and an atomic rename.

use crate::{Error, NutritionLog, Result, WorkoutRecord};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Anything stored in a journal, keyed by a unique id
pub trait JournalEntry: Serialize + DeserializeOwned {
    fn entry_id(&self) -> &str;
}

impl JournalEntry for WorkoutRecord {
    fn entry_id(&self) -> &str {
        &self.id
    }
}

impl JournalEntry for NutritionLog {
    fn entry_id(&self) -> &str {
        &self.id
    }
}

/// Sink for newly created entries
pub trait EntrySink<T: JournalEntry> {
    fn append(&mut self, entry: &T) -> Result<()>;
}

/// JSONL journal file with file locking
///
/// Locks are taken on a sibling `<journal>.lock` file rather than the journal
/// itself, since `remove` renames a new file over the journal path.
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    /// Create a journal handle for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Open the lock file and take a shared or exclusive lock on it
    ///
    /// The lock is released when the returned file is dropped.
    fn lock(&self, exclusive: bool) -> Result<File> {
        self.ensure_parent_dir()?;
        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .open(self.lock_path())?;
        if exclusive {
            lock.lock_exclusive()?;
        } else {
            lock.lock_shared()?;
        }
        Ok(lock)
    }

    /// Read every parseable entry in file order
    ///
    /// Lines that fail to parse are logged and skipped.
    pub fn read_all<T: JournalEntry>(&self) -> Result<Vec<T>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let lock = self.lock(false)?;
        let file = File::open(&self.path)?;

        let reader = BufReader::new(&file);
        let mut entries = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<T>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!(
                        "Skipping unreadable entry in {:?} at line {}: {}",
                        self.path,
                        line_num + 1,
                        e
                    );
                }
            }
        }

        lock.unlock()?;
        tracing::debug!("Read {} entries from {:?}", entries.len(), self.path);
        Ok(entries)
    }

    /// Remove the entry with `id`, returning it
    ///
    /// Unparseable lines are kept as-is so a delete never loses data it
    /// could not read.
    pub fn remove<T: JournalEntry>(&mut self, id: &str) -> Result<T> {
        if !self.path.exists() {
            return Err(Error::NotFound(id.to_string()));
        }

        let lock = self.lock(true)?;
        let file = File::open(&self.path)?;

        let mut kept = Vec::new();
        let mut removed = None;
        for line_result in BufReader::new(&file).lines() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            if removed.is_none() {
                if let Ok(entry) = serde_json::from_str::<T>(&line) {
                    if entry.entry_id() == id {
                        removed = Some(entry);
                        continue;
                    }
                }
            }
            kept.push(line);
        }

        let removed = removed.ok_or_else(|| Error::NotFound(id.to_string()))?;

        let parent = self
            .path
            .parent()
            .ok_or_else(|| Error::Other(format!("journal path {:?} has no parent", self.path)))?;
        let mut temp = NamedTempFile::new_in(parent)?;
        for line in &kept {
            temp.write_all(line.as_bytes())?;
            temp.write_all(b"\n")?;
        }
        temp.flush()?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        lock.unlock()?;
        tracing::info!("Removed entry {} from {:?}", id, self.path);
        Ok(removed)
    }

    fn contains_id<T: JournalEntry>(&self, file: &File, id: &str) -> Result<bool> {
        let mut ids = HashSet::new();
        for line_result in BufReader::new(file).lines() {
            let line = line_result?;
            if let Ok(entry) = serde_json::from_str::<T>(&line) {
                ids.insert(entry.entry_id().to_string());
            }
        }
        Ok(ids.contains(id))
    }

    /// Whether the file is empty or its last byte is a newline
    fn ends_with_newline(mut file: &File) -> Result<bool> {
        let len = file.metadata()?.len();
        if len == 0 {
            return Ok(true);
        }
        file.seek(SeekFrom::Start(len - 1))?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last)?;
        Ok(last[0] == b'\n')
    }
}

impl<T: JournalEntry> EntrySink<T> for Journal {
    /// Append an entry, rejecting ids already present
    ///
    /// A torn last line left by a crash is terminated first so the new
    /// entry lands on its own line.
    fn append(&mut self, entry: &T) -> Result<()> {
        let lock = self.lock(true)?;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        if self.contains_id::<T>(&file, entry.entry_id())? {
            return Err(Error::DuplicateId(entry.entry_id().to_string()));
        }

        let mut writer = std::io::BufWriter::new(&file);
        if !Self::ends_with_newline(&file)? {
            tracing::warn!("Terminating partial last line in {:?}", self.path);
            writer.write_all(b"\n")?;
        }
        let line = serde_json::to_string(entry)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);
        file.sync_all()?;

        lock.unlock()?;

        tracing::debug!("Appended entry {} to {:?}", entry.entry_id(), self.path);
        Ok(())
    }
}

/// Read all workout records from a journal file
pub fn read_workouts(path: &Path) -> Result<Vec<WorkoutRecord>> {
    Journal::new(path).read_all()
}

/// Read all nutrition logs from a journal file
pub fn read_nutrition_logs(path: &Path) -> Result<Vec<NutritionLog>> {
    Journal::new(path).read_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn workout(id: &str) -> WorkoutRecord {
        WorkoutRecord {
            id: id.into(),
            date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            workout_type: "Run".into(),
            duration: 25,
            calories: 220,
            completed: true,
            details: None,
        }
    }

    #[test]
    fn test_append_and_read_single_entry() {
        crate::logging::init_test();
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("workouts.jsonl");

        let mut journal = Journal::new(&path);
        journal.append(&workout("w1")).unwrap();

        let records = read_workouts(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0], workout("w1"));
    }

    #[test]
    fn test_append_rejects_duplicate_id() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("workouts.jsonl");

        let mut journal = Journal::new(&path);
        journal.append(&workout("w1")).unwrap();
        let result = journal.append(&workout("w1"));
        assert!(matches!(result, Err(Error::DuplicateId(id)) if id == "w1"));

        assert_eq!(read_workouts(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_read_missing_journal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let records = read_workouts(&temp_dir.path().join("nonexistent.jsonl")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("workouts.jsonl");

        let good = serde_json::to_string(&workout("ok")).unwrap();
        std::fs::write(&path, format!("{{ broken\n{}\n{{\"id\":", good)).unwrap();

        let records = read_workouts(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "ok");
    }

    #[test]
    fn test_remove_entry() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("workouts.jsonl");

        let mut journal = Journal::new(&path);
        for id in ["a", "b", "c"] {
            journal.append(&workout(id)).unwrap();
        }

        let removed: WorkoutRecord = journal.remove("b").unwrap();
        assert_eq!(removed.id, "b");

        let ids: Vec<_> = read_workouts(&path)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a", "c"]);

        let missing = journal.remove::<WorkoutRecord>("b");
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_remove_keeps_unreadable_lines() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("workouts.jsonl");

        let line = serde_json::to_string(&workout("a")).unwrap();
        std::fs::write(&path, format!("garbage\n{}\n", line)).unwrap();

        let mut journal = Journal::new(&path);
        journal.remove::<WorkoutRecord>("a").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "garbage\n");
    }

    #[test]
    fn test_append_after_partial_line() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("workouts.jsonl");

        let good = serde_json::to_string(&workout("w1")).unwrap();
        std::fs::write(&path, format!("{}\n{{\"id\":\"partial", good)).unwrap();

        Journal::new(&path).append(&workout("w2")).unwrap();

        let ids: Vec<_> = read_workouts(&path)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["w1", "w2"]);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("{\"id\":\"partial\n"));
    }

    #[test]
    fn test_remove_and_append_race_keeps_new_entry() {
        use std::thread;
        use std::time::Duration;

        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("workouts.jsonl");

        for round in 0..10 {
            let old_id = format!("old{}", round);
            let new_id = format!("new{}", round);
            Journal::new(&path).append(&workout(&old_id)).unwrap();

            // Hold the writer lock so both threads queue up behind it
            let held = Journal::new(&path).lock(true).unwrap();

            let remover = {
                let path = path.clone();
                thread::spawn(move || {
                    Journal::new(&path).remove::<WorkoutRecord>(&old_id).unwrap();
                })
            };
            let appender = {
                let path = path.clone();
                let record = workout(&new_id);
                thread::spawn(move || {
                    Journal::new(&path).append(&record).unwrap();
                })
            };

            thread::sleep(Duration::from_millis(20));
            drop(held);
            remover.join().unwrap();
            appender.join().unwrap();

            let ids: Vec<_> = read_workouts(&path)
                .unwrap()
                .into_iter()
                .map(|r| r.id)
                .collect();
            assert!(ids.contains(&format!("new{}", round)), "lost append: {:?}", ids);
            assert!(!ids.contains(&format!("old{}", round)));
        }
    }

    #[test]
    fn test_meal_journal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("meals.jsonl");

        let log = NutritionLog {
            id: "m1".into(),
            date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            name: "Chicken salad".into(),
            calories: 450.0,
            protein: 38.0,
            carbs: 20.0,
            fat: 22.0,
            meal_type: Some(crate::MealType::Lunch),
        };
        Journal::new(&path).append(&log).unwrap();

        let logs = read_nutrition_logs(&path).unwrap();
        assert_eq!(logs, vec![log]);
    }
}
