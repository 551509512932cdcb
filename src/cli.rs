//! Terminal front end: parses a command, drives the planner once and renders
//! the resulting day.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dialoguer::{theme::ColorfulTheme, Confirm};
use serde::Serialize;

use crate::config::resolve_data_dir;
use crate::dates::{display_label, Clock, SystemClock};
use crate::events::{PlannerEvent, StatePayload};
use crate::models::{DayPart, PreferenceKey, Preferences, Priority, TaskDraft, TaskId, TaskPatch};
use crate::planner::{CommandResult, Planner, PlannerCtx, PlannerError};
use crate::storage::{FileStore, KeyValueStore};

#[derive(Debug, Parser)]
#[command(
    name = "daily-focus",
    version,
    about = "Plan the day, tick off required tasks, keep the streak going"
)]
pub struct Cli {
    /// Directory holding the store and logs
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
    /// Day to work on (YYYY-MM-DD); defaults to today
    #[arg(long, global = true)]
    pub date: Option<String>,
    /// Move the working day by this many days
    #[arg(long, global = true, default_value_t = 0, allow_hyphen_values = true)]
    pub shift: i64,
    /// Print results as JSON
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,
    /// Answer yes to confirmation prompts
    #[arg(short = 'y', long, global = true, default_value_t = false)]
    pub yes: bool,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the working day
    Show,
    Add {
        title: String,
        #[arg(long, default_value = "morning", value_parser = parse_part)]
        part: DayPart,
        /// HH:MM
        #[arg(long)]
        time: Option<String>,
        #[arg(long, default_value = "medium", value_parser = parse_priority)]
        priority: Priority,
        /// Counts towards the streak
        #[arg(long, default_value_t = false)]
        required: bool,
    },
    Toggle {
        id: TaskId,
    },
    Delete {
        id: TaskId,
    },
    /// Revise a task; it is re-created at the end of the day unless --in-place is given
    Edit {
        id: TaskId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, value_parser = parse_part)]
        part: Option<DayPart>,
        #[arg(long, conflicts_with = "clear_time")]
        time: Option<String>,
        #[arg(long, default_value_t = false)]
        clear_time: bool,
        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,
        #[arg(long)]
        required: Option<bool>,
        #[arg(long, default_value_t = false)]
        in_place: bool,
    },
    Streak {
        #[command(subcommand)]
        command: Option<StreakCommands>,
    },
    Prefs {
        #[command(subcommand)]
        command: Option<PrefsCommands>,
    },
    /// Write every stored key to daily_focus_backup.json
    Export {
        /// Target directory; defaults to <data dir>/exports
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Delete all tasks, the streak and preferences
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum StreakCommands {
    Reset,
}

#[derive(Debug, Subcommand)]
pub enum PrefsCommands {
    Toggle {
        #[arg(value_parser = parse_preference)]
        key: PreferenceKey,
    },
}

fn parse_part(value: &str) -> Result<DayPart, String> {
    value.parse()
}

fn parse_priority(value: &str) -> Result<Priority, String> {
    value.parse()
}

fn parse_preference(value: &str) -> Result<PreferenceKey, String> {
    value.parse()
}

struct CliCtx {
    assume_yes: bool,
    quiet: bool,
}

impl PlannerCtx for CliCtx {
    fn emit(&self, event: PlannerEvent) {
        match &event {
            PlannerEvent::StreakIncreased(streak) if !self.quiet => {
                println!("Streak increased! 🔥 {} day(s)", streak.count);
            }
            _ => log::debug!("event {}", event.name()),
        }
    }

    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        match Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()
        {
            Ok(answer) => answer,
            Err(err) => {
                log::warn!("confirmation unavailable, treating as no: {err}");
                false
            }
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let data_dir = match resolve_data_dir(cli.data_dir.as_deref()) {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    // Logging is optional; the planner still works without it.
    let _logger = match crate::logging::init_logging(&data_dir) {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("logging disabled: {err}");
            None
        }
    };

    let store = match FileStore::open(data_dir.clone()) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("cannot open store at {}: {err}", data_dir.display());
            return ExitCode::FAILURE;
        }
    };
    let mut planner = Planner::new(store, SystemClock);
    let ctx = CliCtx {
        assume_yes: cli.yes,
        quiet: cli.json,
    };

    if let Err(err) = select_day(&mut planner, &ctx, &cli) {
        return report(&cli, Err::<(), _>(err));
    }

    let show = Commands::Show;
    let command = cli.command.as_ref().unwrap_or(&show);
    match execute(&mut planner, &ctx, command, &data_dir) {
        Ok(Outcome::Day) => {
            let payload = planner.snapshot();
            if cli.json {
                print_json(&CommandResult::from(Ok::<_, PlannerError>(payload)));
            } else {
                render_day(&planner, &payload);
            }
            ExitCode::SUCCESS
        }
        Ok(Outcome::Declined) => {
            if cli.json {
                print_json(&CommandResult::from(Ok::<_, PlannerError>(false)));
            } else {
                println!("Cancelled.");
            }
            ExitCode::SUCCESS
        }
        Ok(Outcome::NotFound(id)) => report(&cli, Ok(format!("No task with id {id}."))),
        Ok(Outcome::Preferences(prefs)) => {
            if cli.json {
                print_json(&CommandResult::from(Ok::<_, PlannerError>(prefs)));
            } else {
                render_preferences(&prefs);
            }
            ExitCode::SUCCESS
        }
        Ok(Outcome::Message(message)) => report(&cli, Ok(message)),
        Err(err) => report(&cli, Err::<(), _>(err)),
    }
}

enum Outcome {
    Day,
    Declined,
    NotFound(TaskId),
    Preferences(Preferences),
    Message(String),
}

fn select_day<S: KeyValueStore, C: Clock>(
    planner: &mut Planner<S, C>,
    ctx: &CliCtx,
    cli: &Cli,
) -> Result<(), PlannerError> {
    if let Some(date) = &cli.date {
        planner.set_date_key(ctx, date)?;
    }
    if cli.shift != 0 {
        planner.change_date(ctx, cli.shift);
    }
    Ok(())
}

fn execute<S: KeyValueStore, C: Clock>(
    planner: &mut Planner<S, C>,
    ctx: &CliCtx,
    command: &Commands,
    data_dir: &std::path::Path,
) -> Result<Outcome, PlannerError> {
    let outcome = match command {
        Commands::Show => Outcome::Day,
        Commands::Add {
            title,
            part,
            time,
            priority,
            required,
        } => {
            let draft = TaskDraft {
                title: title.clone(),
                part: *part,
                time: time.clone(),
                priority: *priority,
                required: *required,
            };
            planner.add_task(ctx, draft)?;
            Outcome::Day
        }
        Commands::Toggle { id } => match planner.toggle_task(ctx, *id)? {
            Some(_) => Outcome::Day,
            None => Outcome::NotFound(*id),
        },
        Commands::Delete { id } => {
            if !planner.tasks().iter().any(|task| task.id == *id) {
                Outcome::NotFound(*id)
            } else if planner.delete_task(ctx, *id)? {
                Outcome::Day
            } else {
                Outcome::Declined
            }
        }
        Commands::Edit {
            id,
            title,
            part,
            time,
            clear_time,
            priority,
            required,
            in_place,
        } => {
            let patch = TaskPatch {
                title: title.clone(),
                part: *part,
                time: if *clear_time {
                    Some(None)
                } else {
                    time.clone().map(Some)
                },
                priority: *priority,
                required: *required,
            };
            let revised = if *in_place {
                planner.update_task(ctx, *id, &patch)?
            } else {
                planner.edit_task(ctx, *id, &patch)?
            };
            match revised {
                Some(_) => Outcome::Day,
                None => Outcome::NotFound(*id),
            }
        }
        Commands::Streak { command: None } => {
            let streak = planner.streak();
            let last = streak
                .last_date
                .map(|date| date.to_string())
                .unwrap_or_else(|| "never".to_string());
            Outcome::Message(format!("Streak: {} (last counted: {last})", streak.count))
        }
        Commands::Streak {
            command: Some(StreakCommands::Reset),
        } => {
            if planner.reset_streak(ctx)? {
                Outcome::Message("Streak reset to 0.".to_string())
            } else {
                Outcome::Declined
            }
        }
        Commands::Prefs { command: None } => Outcome::Preferences(planner.preferences()),
        Commands::Prefs {
            command: Some(PrefsCommands::Toggle { key }),
        } => Outcome::Preferences(planner.toggle_preference(ctx, *key)?),
        Commands::Export { out } => {
            let dir = out.clone().unwrap_or_else(|| data_dir.join("exports"));
            let path = planner.export_to(&dir)?;
            Outcome::Message(format!("Exported to {}", path.display()))
        }
        Commands::Clear => {
            if planner.clear_all(ctx)? {
                Outcome::Message("All data cleared.".to_string())
            } else {
                Outcome::Declined
            }
        }
    };
    Ok(outcome)
}

fn report<T: Serialize>(cli: &Cli, result: Result<T, PlannerError>) -> ExitCode {
    let failed = result.is_err();
    let result = CommandResult::from(result);
    if cli.json {
        print_json(&result);
    } else if let Some(error) = &result.error {
        eprintln!("{error}");
    } else if let Some(data) = &result.data {
        if let Ok(serde_json::Value::String(text)) = serde_json::to_value(data) {
            println!("{text}");
        }
    }
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("json error: {err}"),
    }
}

fn render_day<S: KeyValueStore, C: Clock>(planner: &Planner<S, C>, payload: &StatePayload) {
    let compact = planner.preferences().compact;
    println!("{}", display_label(planner.current_date()));
    println!(
        "Progress ({}%)  {}/{} Tasks  Streak: {}",
        payload.progress.percent, payload.progress.done, payload.progress.total, payload.streak.count
    );
    for part in DayPart::ALL {
        let tasks: Vec<_> = payload.tasks.iter().filter(|task| task.part == part).collect();
        if compact && tasks.is_empty() {
            continue;
        }
        if !compact {
            println!();
        }
        println!("{part}");
        for task in tasks {
            let mark = if task.done { "x" } else { " " };
            let mut badges = Vec::new();
            if task.required {
                badges.push("REQ".to_string());
            }
            if let Some(time) = &task.time {
                badges.push(time.clone());
            }
            badges.push(task.priority.to_string());
            println!("  [{mark}] {}  ({})  #{}", task.title, badges.join(", "), task.id);
        }
    }
}

fn render_preferences(prefs: &Preferences) {
    for key in PreferenceKey::ALL {
        let state = if prefs.get(key) { "on" } else { "off" };
        println!("{key}: {state}");
    }
}
