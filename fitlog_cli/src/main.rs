use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use fitlog_core::calendar::current_streak;
use fitlog_core::history::on_date;
use fitlog_core::store::{self, add_day_counter, day_counter, set_day_counter};
use fitlog_core::validation::{validate_nutrition_log, validate_profile, validate_workout};
use fitlog_core::*;
use std::path::{Path, PathBuf};

const WATER: &str = "water";
const STEPS: &str = "steps";

#[derive(Parser)]
#[command(name = "fitlog")]
#[command(about = "Workout and nutrition tracker with XP and badges", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or update the user profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Show daily targets, or choose how they are computed
    Targets {
        #[command(subcommand)]
        action: Option<TargetsAction>,
    },

    /// Log, list or delete workouts
    Workout {
        #[command(subcommand)]
        action: WorkoutAction,
    },

    /// Log or delete nutrition entries
    Meal {
        #[command(subcommand)]
        action: MealAction,
    },

    /// Track water intake
    Water {
        #[command(subcommand)]
        action: WaterAction,
    },

    /// Track step count
    Steps {
        #[command(subcommand)]
        action: StepsAction,
    },

    /// Show XP, level and badges
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one calendar day
    Day {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show recent days with any activity or meals
    Calendar {
        /// How many days back from today to include
        #[arg(long, default_value_t = 7)]
        days: u32,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a config file with default settings
    InitConfig {
        /// Destination (defaults to the platform config path)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Export workout history to CSV
    Export {
        /// Output file
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Save the profile (keeps the current targets mode)
    Set {
        /// Body weight in kg
        #[arg(long)]
        weight: f64,
        /// Height in cm
        #[arg(long)]
        height: f64,
        /// Age in years
        #[arg(long)]
        age: u32,
        /// male or female
        #[arg(long)]
        gender: Gender,
        /// sedentary, light, moderate, active, very_active
        #[arg(long, default_value = "moderate")]
        activity: ActivityLevel,
        /// lose_weight, maintain, gain_muscle
        #[arg(long, default_value = "maintain")]
        goal: Goal,
        #[arg(long)]
        name: Option<String>,
    },
    /// Print the saved profile
    Show,
}

#[derive(Subcommand)]
enum TargetsAction {
    /// Use fixed targets instead of the formula
    Override {
        #[arg(long)]
        calories: i32,
        #[arg(long)]
        protein: i32,
        #[arg(long)]
        carbs: i32,
        #[arg(long)]
        fat: i32,
    },
    /// Compute targets from the profile again
    Formula,
}

#[derive(Subcommand)]
enum WorkoutAction {
    /// Log a finished workout
    Log {
        /// Workout label, e.g. "Push Day"
        #[arg(long = "type")]
        workout_type: String,
        /// Minutes
        #[arg(long)]
        duration: u32,
        /// Estimated kcal burned
        #[arg(long, default_value_t = 0)]
        calories: u32,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// A completed set as "Exercise:WEIGHTxREPS", repeatable
        #[arg(long = "set")]
        sets: Vec<String>,
    },
    /// List workouts, newest first
    List {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Delete a workout by id
    Delete { id: String },
}

#[derive(Subcommand)]
enum MealAction {
    /// Log a food item
    Log {
        #[arg(long)]
        name: String,
        #[arg(long)]
        calories: f64,
        #[arg(long)]
        protein: f64,
        #[arg(long)]
        carbs: f64,
        #[arg(long)]
        fat: f64,
        /// breakfast, lunch, dinner, snack
        #[arg(long)]
        meal_type: Option<MealType>,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Delete a nutrition entry by id
    Delete { id: String },
}

#[derive(Subcommand)]
enum WaterAction {
    /// Add water in ml
    Add {
        ml: u64,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum StepsAction {
    /// Set the step count for a day
    Set {
        steps: u64,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

/// Files under the data directory
struct DataPaths {
    workouts: PathBuf,
    meals: PathBuf,
    store: PathBuf,
}

impl DataPaths {
    fn new(data_dir: &Path) -> Self {
        Self {
            workouts: data_dir.join("workouts.jsonl"),
            meals: data_dir.join("meals.jsonl"),
            store: data_dir.join("store.json"),
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    fitlog_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let paths = DataPaths::new(&data_dir);
    tracing::debug!("Using data directory {:?}", data_dir);

    match cli.command {
        Commands::Profile { action } => cmd_profile(&paths, action, &config),
        Commands::Targets { action } => cmd_targets(&paths, action, &config),
        Commands::Workout { action } => cmd_workout(&paths, action, &config),
        Commands::Meal { action } => cmd_meal(&paths, action, &config),
        Commands::Water {
            action: WaterAction::Add { ml, date },
        } => {
            let date = date.unwrap_or_else(today);
            let mut store = JsonFileStore::new(&paths.store);
            let total = add_day_counter(&mut store, WATER, date, ml)?;
            println!("✓ Water on {}: {} ml", date, total);
            Ok(())
        }
        Commands::Steps {
            action: StepsAction::Set { steps, date },
        } => {
            let date = date.unwrap_or_else(today);
            let mut store = JsonFileStore::new(&paths.store);
            set_day_counter(&mut store, STEPS, date, steps)?;
            println!("✓ Steps on {}: {}", date, steps);
            Ok(())
        }
        Commands::Stats { json } => cmd_stats(&paths, json),
        Commands::Day { date, json } => cmd_day(&paths, date.unwrap_or_else(today), json),
        Commands::Calendar { days, json } => cmd_calendar(&paths, days, json),
        Commands::InitConfig { path, force } => {
            let path = path
                .or_else(Config::default_config_path)
                .ok_or_else(|| Error::Config("no config directory on this platform".into()))?;
            if path.exists() && !force {
                return Err(Error::Config(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )));
            }
            Config::default().save_to(&path)?;
            println!("✓ Wrote default config to {}", path.display());
            Ok(())
        }
        Commands::Export { out } => {
            let history = load_workout_history(&paths.workouts)?;
            let count = export_workouts_csv(&history, &out)?;
            println!("✓ Exported {} workouts to {}", count, out.display());
            Ok(())
        }
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Apply the configured validation policy
///
/// Strict mode turns a failed check into an error; otherwise it is logged
/// and the input is saved as given.
fn check(result: Result<()>, config: &Config) -> Result<()> {
    match result {
        Err(e) if !config.validation.strict => {
            tracing::warn!("Saving despite failed validation: {}", e);
            Ok(())
        }
        other => other,
    }
}

fn cmd_profile(paths: &DataPaths, action: ProfileAction, config: &Config) -> Result<()> {
    let mut store = JsonFileStore::new(&paths.store);

    match action {
        ProfileAction::Set {
            weight,
            height,
            age,
            gender,
            activity,
            goal,
            name,
        } => {
            let targets = store::load_profile(&store)?
                .map(|p| p.targets)
                .unwrap_or_default();
            let profile = UserProfile {
                name,
                weight,
                height,
                age,
                gender,
                activity_level: activity,
                goal,
                targets,
            };
            check(validate_profile(&profile), config)?;
            store::save_profile(&mut store, &profile)?;

            println!("✓ Profile saved");
            display_targets(&compute_targets(Some(&profile)), &profile.targets);
            Ok(())
        }
        ProfileAction::Show => {
            match store::load_profile(&store)? {
                Some(profile) => display_profile(&profile),
                None => println!("No profile yet. Run `fitlog profile set` to create one."),
            }
            Ok(())
        }
    }
}

fn cmd_targets(paths: &DataPaths, action: Option<TargetsAction>, config: &Config) -> Result<()> {
    let mut store = JsonFileStore::new(&paths.store);
    let profile = store::load_profile(&store)?;

    let mode = match action {
        None => {
            let mode = profile.as_ref().map(|p| p.targets).unwrap_or_default();
            if profile.is_none() {
                println!("No profile yet, showing default targets.");
            }
            display_targets(&compute_targets(profile.as_ref()), &mode);
            return Ok(());
        }
        Some(TargetsAction::Override {
            calories,
            protein,
            carbs,
            fat,
        }) => TargetsMode::Override(MacroTargets {
            calories,
            protein,
            carbs,
            fat,
        }),
        Some(TargetsAction::Formula) => TargetsMode::Formula,
    };

    let mut profile = profile.ok_or_else(|| {
        Error::NotFound("profile (run `fitlog profile set` first)".into())
    })?;
    profile.targets = mode;
    check(validate_profile(&profile), config)?;
    store::save_profile(&mut store, &profile)?;

    println!("✓ Targets updated");
    display_targets(&compute_targets(Some(&profile)), &profile.targets);
    Ok(())
}

fn cmd_workout(paths: &DataPaths, action: WorkoutAction, config: &Config) -> Result<()> {
    match action {
        WorkoutAction::Log {
            workout_type,
            duration,
            calories,
            date,
            sets,
        } => {
            let record = WorkoutRecord {
                id: new_id(),
                date: date.unwrap_or_else(today),
                workout_type,
                duration,
                calories,
                completed: true,
                details: parse_set_specs(&sets)?,
            };
            check(validate_workout(&record), config)?;

            let before = compute_gamification(&load_workout_history(&paths.workouts)?);
            Journal::new(&paths.workouts).append(&record)?;
            let after = compute_gamification(&load_workout_history(&paths.workouts)?);

            println!("✓ Workout logged ({})", record.id);
            println!("  +{} XP", gamification::record_xp(&record));
            if after.level > before.level {
                println!("  ⬆ Level up! You are now level {}", after.level);
            }
            for badge in after.badges.iter().filter(|b| !before.badges.contains(b)) {
                println!("  🏅 Badge unlocked: {} ({})", badge.label(), badge.description());
            }
            Ok(())
        }
        WorkoutAction::List { limit } => {
            let history = load_workout_history(&paths.workouts)?;
            if history.is_empty() {
                println!("No workouts logged yet.");
                return Ok(());
            }

            let limit = limit.unwrap_or(config.display.history_limit);
            for record in history.iter().take(limit) {
                println!(
                    "{}  {:<20} {:>4} min {:>5} kcal  +{} XP  [{}]",
                    record.date,
                    record.workout_type,
                    record.duration,
                    record.calories,
                    gamification::record_xp(record),
                    record.id
                );
            }
            if history.len() > limit {
                println!("… {} more", history.len() - limit);
            }
            Ok(())
        }
        WorkoutAction::Delete { id } => {
            let removed: WorkoutRecord = Journal::new(&paths.workouts).remove(&id)?;
            println!(
                "✓ Deleted workout {} ({} on {})",
                removed.id, removed.workout_type, removed.date
            );
            Ok(())
        }
    }
}

fn cmd_meal(paths: &DataPaths, action: MealAction, config: &Config) -> Result<()> {
    match action {
        MealAction::Log {
            name,
            calories,
            protein,
            carbs,
            fat,
            meal_type,
            date,
        } => {
            let log = NutritionLog {
                id: new_id(),
                date: date.unwrap_or_else(today),
                name,
                calories,
                protein,
                carbs,
                fat,
                meal_type,
            };
            check(validate_nutrition_log(&log), config)?;
            Journal::new(&paths.meals).append(&log)?;

            println!("✓ Meal logged ({})", log.id);
            Ok(())
        }
        MealAction::Delete { id } => {
            let removed: NutritionLog = Journal::new(&paths.meals).remove(&id)?;
            println!("✓ Deleted meal {} ({})", removed.id, removed.name);
            Ok(())
        }
    }
}

fn cmd_stats(paths: &DataPaths, json: bool) -> Result<()> {
    let history = load_workout_history(&paths.workouts)?;
    let summary = compute_gamification(&history);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  LEVEL {}", summary.level);
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!(
        "  {} {:.0}%",
        progress_bar(summary.progress_percent),
        summary.progress_percent
    );
    println!(
        "  XP: {} (next level at {})",
        summary.current_xp, summary.next_level_xp
    );
    println!("  Workouts: {}", summary.workout_count);
    println!("  Volume: {:.0} kg", summary.total_volume);
    println!("  Streak: {} days", current_streak(&history, today()));
    println!();

    if summary.badges.is_empty() {
        println!("  No badges yet. Log a workout to earn your first!");
    } else {
        println!("  Badges:");
        for badge in &summary.badges {
            println!("    🏅 {} - {}", badge.label(), badge.description());
        }
    }
    println!();
    Ok(())
}

fn cmd_day(paths: &DataPaths, date: NaiveDate, json: bool) -> Result<()> {
    let store = JsonFileStore::new(&paths.store);
    let profile = store::load_profile(&store)?;
    let workouts = load_workout_history(&paths.workouts)?;
    let meals = load_nutrition_history(&paths.meals)?;

    let summary = summarize_day(date, &workouts, &meals);
    let progress = nutrition_progress(
        compute_targets(profile.as_ref()),
        on_date(&meals, date).into_iter(),
    );
    let water = day_counter(&store, WATER, date)?;
    let steps = day_counter(&store, STEPS, date)?;

    if json {
        let value = serde_json::json!({
            "date": date,
            "summary": summary,
            "nutrition": progress,
            "water_ml": water,
            "steps": steps,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("\n{}", date.format("%A, %B %-d %Y"));
    println!();
    println!(
        "  Workouts: {} ({} min, {} kcal burned)",
        summary.workouts, summary.minutes, summary.calories_burned
    );
    for record in on_date(&workouts, date) {
        println!("    • {} ({} min)", record.workout_type, record.duration);
    }
    println!();
    println!(
        "  Calories: {:.0} / {} kcal ({:.0} left)",
        progress.consumed.calories, progress.targets.calories, progress.remaining.calories
    );
    println!(
        "  Protein:  {:.0} / {} g",
        progress.consumed.protein, progress.targets.protein
    );
    println!(
        "  Carbs:    {:.0} / {} g",
        progress.consumed.carbs, progress.targets.carbs
    );
    println!(
        "  Fat:      {:.0} / {} g",
        progress.consumed.fat, progress.targets.fat
    );
    println!();
    println!("  Water: {} ml", water);
    println!("  Steps: {}", steps);
    println!();
    Ok(())
}

fn cmd_calendar(paths: &DataPaths, days: u32, json: bool) -> Result<()> {
    let workouts = load_workout_history(&paths.workouts)?;
    let meals = load_nutrition_history(&paths.meals)?;

    let end = today();
    let start = end - chrono::Duration::days(i64::from(days.saturating_sub(1)));
    let by_day = aggregate_by_day(&workouts, &meals);
    let window: Vec<_> = by_day.range(start..=end).collect();

    if json {
        let value: serde_json::Map<String, serde_json::Value> = window
            .iter()
            .map(|(date, summary)| -> Result<(String, serde_json::Value)> {
                Ok((date.to_string(), serde_json::to_value(summary)?))
            })
            .collect::<Result<_>>()?;
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if window.is_empty() {
        println!("Nothing logged between {} and {}.", start, end);
        return Ok(());
    }

    for (date, summary) in window {
        let marker = if summary.is_active() { "●" } else { "○" };
        println!(
            "{} {}  {} workouts, {} min, {:.0} kcal eaten",
            marker,
            date.format("%a %Y-%m-%d"),
            summary.workouts,
            summary.minutes,
            summary.intake.calories
        );
    }
    println!("\n  Streak: {} days", current_streak(&workouts, end));
    Ok(())
}

/// Parse repeated `Exercise:WEIGHTxREPS` specs into exercise logs
///
/// Sets for the same exercise are grouped in the order given and numbered
/// from 1.
fn parse_set_specs(specs: &[String]) -> Result<Option<Vec<ExerciseLog>>> {
    if specs.is_empty() {
        return Ok(None);
    }

    let mut exercises: Vec<ExerciseLog> = Vec::new();
    for spec in specs {
        let (name, load) = spec
            .rsplit_once(':')
            .ok_or_else(|| Error::Validation(format!("Set must look like Name:WEIGHTxREPS, got {}", spec)))?;
        let (weight, reps) = load
            .to_lowercase()
            .split_once('x')
            .map(|(w, r)| (w.trim().to_string(), r.trim().to_string()))
            .ok_or_else(|| Error::Validation(format!("Set must look like Name:WEIGHTxREPS, got {}", spec)))?;

        let weight: f64 = weight
            .parse()
            .map_err(|_| Error::Validation(format!("Invalid weight in set {}", spec)))?;
        let reps: u32 = reps
            .parse()
            .map_err(|_| Error::Validation(format!("Invalid reps in set {}", spec)))?;
        let name = name.trim();

        let exercise = match exercises.iter().position(|e| e.exercise_name == name) {
            Some(index) => &mut exercises[index],
            None => {
                exercises.push(ExerciseLog {
                    exercise_name: name.to_string(),
                    sets: Vec::new(),
                });
                let last = exercises.len() - 1;
                &mut exercises[last]
            }
        };
        let set_number = exercise.sets.len() as u32 + 1;
        exercise.sets.push(ExerciseSetLog {
            set_number,
            weight,
            reps,
            completed: true,
        });
    }

    Ok(Some(exercises))
}

fn progress_bar(percent: f64) -> String {
    const WIDTH: usize = 20;
    let filled = ((percent / 100.0) * WIDTH as f64).round().clamp(0.0, WIDTH as f64) as usize;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(WIDTH - filled))
}

fn display_profile(profile: &UserProfile) {
    if let Some(ref name) = profile.name {
        println!("  Name: {}", name);
    }
    println!("  Weight: {} kg", profile.weight);
    println!("  Height: {} cm", profile.height);
    println!("  Age: {}", profile.age);
    println!("  Gender: {:?}", profile.gender);
    println!("  Activity: {:?}", profile.activity_level);
    println!("  Goal: {:?}", profile.goal);
    println!("  BMR: {:.0} kcal", nutrition::basal_metabolic_rate(profile));
    display_targets(&compute_targets(Some(profile)), &profile.targets);
}

fn display_targets(targets: &MacroTargets, mode: &TargetsMode) {
    let source = match mode {
        TargetsMode::Formula => "formula",
        TargetsMode::Override(_) => "custom",
    };
    println!("  Daily targets ({}):", source);
    println!("    Calories: {} kcal", targets.calories);
    println!("    Protein:  {} g", targets.protein);
    println!("    Carbs:    {} g", targets.carbs);
    println!("    Fat:      {} g", targets.fat);
}
