#![forbid(unsafe_code)]

//! Core domain model and business logic for fitlog.
//!
//! This crate provides:
//! - Domain types (profile, workouts, nutrition logs, badges)
//! - Nutrition target calculator
//! - Gamification engine (XP, levels, badges)
//! - Input validation
//! - Persistence (key-value store, JSONL journals, CSV export)
//! - Calendar aggregation

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod nutrition;
pub mod gamification;
pub mod validation;
pub mod store;
pub mod journal;
pub mod history;
pub mod calendar;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use nutrition::{compute_targets, nutrition_progress, FALLBACK_TARGETS};
pub use gamification::compute_gamification;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use journal::{EntrySink, Journal};
pub use history::{load_nutrition_history, load_workout_history};
pub use calendar::{aggregate_by_day, summarize_day, DaySummary};
pub use export::export_workouts_csv;
