use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::dates::{day_key, parse_day_key, Clock};
use crate::events::{PlannerEvent, StatePayload};
use crate::models::{
    DayProgress, PreferenceKey, Preferences, Streak, Task, TaskDraft, TaskId, TaskPatch,
};
use crate::state::PlannerState;
use crate::storage::{
    export_json, load_json_or_default, save_json, write_export, KeyValueStore, StorageError,
    PREFS_KEY,
};
use crate::streak::{self, StreakTransition};
use crate::tasks;

pub const CONFIRM_REMOVE_TASK: &str = "Remove task?";
pub const CONFIRM_RESET_STREAK: &str = "Reset streak to 0?";
pub const CONFIRM_CLEAR_ALL: &str = "Clear all data?";

#[derive(Debug)]
pub enum PlannerError {
    EmptyTitle,
    InvalidTime(String),
    InvalidDate(String),
    Storage(StorageError),
}

impl std::fmt::Display for PlannerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlannerError::EmptyTitle => write!(f, "Title is required"),
            PlannerError::InvalidTime(value) => {
                write!(f, "invalid time `{value}`, expected HH:MM")
            }
            PlannerError::InvalidDate(value) => {
                write!(f, "invalid date `{value}`, expected YYYY-MM-DD")
            }
            PlannerError::Storage(err) => write!(f, "storage error: {err}"),
        }
    }
}

impl std::error::Error for PlannerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlannerError::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StorageError> for PlannerError {
    fn from(value: StorageError) -> Self {
        PlannerError::Storage(value)
    }
}

/// Envelope for front ends that print or ship results as JSON.
#[derive(Debug, serde::Serialize)]
pub struct CommandResult<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

fn ok<T>(data: T) -> CommandResult<T> {
    CommandResult {
        ok: true,
        data: Some(data),
        error: None,
    }
}

fn err<T>(message: &str) -> CommandResult<T> {
    CommandResult {
        ok: false,
        data: None,
        error: Some(message.to_string()),
    }
}

impl<T> From<Result<T, PlannerError>> for CommandResult<T> {
    fn from(value: Result<T, PlannerError>) -> Self {
        match value {
            Ok(data) => ok(data),
            Err(error) => err(&error.to_string()),
        }
    }
}

/// The presentation layer as seen from the planner: somewhere to send
/// notifications and someone to ask before destructive actions.
pub trait PlannerCtx {
    fn emit(&self, event: PlannerEvent);
    fn confirm(&self, prompt: &str) -> bool;
}

pub struct Planner<S, C> {
    store: S,
    clock: C,
    state: PlannerState,
}

impl<S: KeyValueStore, C: Clock> Planner<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        let streak = streak::load(&store);
        let preferences: Preferences = load_json_or_default(&store, PREFS_KEY);
        let state = PlannerState::new(clock.today(), streak, preferences);
        Self {
            store,
            clock,
            state,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn current_date(&self) -> NaiveDate {
        self.state.current_date()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.tasks_for(self.current_date())
    }

    pub fn tasks_for(&self, date: NaiveDate) -> Vec<Task> {
        tasks::load_day(&self.store, date)
    }

    pub fn progress(&self) -> DayProgress {
        DayProgress::of(&self.tasks())
    }

    pub fn streak(&self) -> &Streak {
        self.state.streak()
    }

    pub fn preferences(&self) -> Preferences {
        self.state.preferences()
    }

    pub fn snapshot(&self) -> StatePayload {
        let tasks = self.tasks();
        StatePayload {
            date: day_key(self.current_date()),
            progress: DayProgress::of(&tasks),
            tasks,
            streak: self.streak().clone(),
        }
    }

    fn emit_state(&self, ctx: &impl PlannerCtx) {
        ctx.emit(PlannerEvent::StateUpdated(self.snapshot()));
    }

    pub fn set_date(&mut self, ctx: &impl PlannerCtx, date: NaiveDate) -> NaiveDate {
        self.state.set_current_date(date);
        self.emit_state(ctx);
        date
    }

    pub fn set_date_key(
        &mut self,
        ctx: &impl PlannerCtx,
        key: &str,
    ) -> Result<NaiveDate, PlannerError> {
        let date = parse_day_key(key).ok_or_else(|| PlannerError::InvalidDate(key.to_string()))?;
        Ok(self.set_date(ctx, date))
    }

    pub fn change_date(&mut self, ctx: &impl PlannerCtx, offset: i64) -> NaiveDate {
        let date = self.state.shift_current_date(offset);
        self.emit_state(ctx);
        date
    }

    pub fn go_to_today(&mut self, ctx: &impl PlannerCtx) -> NaiveDate {
        let today = self.today();
        self.set_date(ctx, today)
    }

    /// Persists the full list for `date`, then re-evaluates the streak against it.
    /// If the streak cannot be written, the previous list is put back.
    pub fn save_tasks(
        &mut self,
        ctx: &impl PlannerCtx,
        date: NaiveDate,
        tasks: &[Task],
    ) -> Result<StreakTransition, PlannerError> {
        let previous = self.tasks_for(date);
        tasks::save_day(&mut self.store, date, tasks)?;
        let progress = DayProgress::of(tasks);
        log::debug!(
            "tasks saved date={} done={} total={}",
            day_key(date),
            progress.done,
            progress.total
        );

        let (transition, next) = streak::evaluate(self.streak(), date, tasks, self.today());
        if transition.advanced() {
            if let Err(err) = streak::save(&mut self.store, &next) {
                if let Err(restore_err) = tasks::save_day(&mut self.store, date, &previous) {
                    log::error!(
                        "tasks restore failed date={} err={restore_err}",
                        day_key(date)
                    );
                }
                return Err(err.into());
            }
            log::info!(
                "streak {:?} count={} date={}",
                transition,
                next.count,
                day_key(date)
            );
            self.state.update_streak(next.clone());
            ctx.emit(PlannerEvent::StreakIncreased(next));
        }
        self.emit_state(ctx);
        Ok(transition)
    }

    pub fn add_task(
        &mut self,
        ctx: &impl PlannerCtx,
        draft: TaskDraft,
    ) -> Result<Task, PlannerError> {
        let date = self.current_date();
        let mut tasks = self.tasks_for(date);
        let task = tasks::append(&mut tasks, draft, self.clock.now_millis())?;
        self.save_tasks(ctx, date, &tasks)?;
        Ok(task)
    }

    /// Flips `done`. Unknown ids are a no-op and persist nothing.
    pub fn toggle_task(
        &mut self,
        ctx: &impl PlannerCtx,
        id: TaskId,
    ) -> Result<Option<Task>, PlannerError> {
        let date = self.current_date();
        let mut tasks = self.tasks_for(date);
        let Some(task) = tasks::toggle_done(&mut tasks, id) else {
            log::debug!("toggle ignored, no task id={id}");
            return Ok(None);
        };
        self.save_tasks(ctx, date, &tasks)?;
        Ok(Some(task))
    }

    /// Returns `false` when the user declines or the id is unknown.
    pub fn delete_task(&mut self, ctx: &impl PlannerCtx, id: TaskId) -> Result<bool, PlannerError> {
        if !ctx.confirm(CONFIRM_REMOVE_TASK) {
            return Ok(false);
        }
        let date = self.current_date();
        let mut tasks = self.tasks_for(date);
        if tasks::remove(&mut tasks, id).is_none() {
            return Ok(false);
        }
        self.save_tasks(ctx, date, &tasks)?;
        Ok(true)
    }

    /// Revises a task by recreating it: the result has a new id and sits at the
    /// end of the day. Done in one step, so a rejected revision changes nothing.
    pub fn edit_task(
        &mut self,
        ctx: &impl PlannerCtx,
        id: TaskId,
        patch: &TaskPatch,
    ) -> Result<Option<Task>, PlannerError> {
        let date = self.current_date();
        let mut tasks = self.tasks_for(date);
        let Some(task) = tasks::recreate(&mut tasks, id, patch, self.clock.now_millis())? else {
            return Ok(None);
        };
        self.save_tasks(ctx, date, &tasks)?;
        Ok(Some(task))
    }

    /// Revises a task where it stands, keeping its id, position and `done`.
    pub fn update_task(
        &mut self,
        ctx: &impl PlannerCtx,
        id: TaskId,
        patch: &TaskPatch,
    ) -> Result<Option<Task>, PlannerError> {
        let date = self.current_date();
        let mut tasks = self.tasks_for(date);
        let Some(task) = tasks::update_in_place(&mut tasks, id, patch)? else {
            return Ok(None);
        };
        self.save_tasks(ctx, date, &tasks)?;
        Ok(Some(task))
    }

    pub fn reset_streak(&mut self, ctx: &impl PlannerCtx) -> Result<bool, PlannerError> {
        if !ctx.confirm(CONFIRM_RESET_STREAK) {
            return Ok(false);
        }
        let cleared = Streak::default();
        streak::save(&mut self.store, &cleared)?;
        log::info!("streak reset previous_count={}", self.streak().count);
        self.state.update_streak(cleared);
        self.emit_state(ctx);
        Ok(true)
    }

    pub fn toggle_preference(
        &mut self,
        ctx: &impl PlannerCtx,
        key: PreferenceKey,
    ) -> Result<Preferences, PlannerError> {
        let previous = self.state.preferences();
        let next = self.state.toggle_preference(key);
        if let Err(error) = save_json(&mut self.store, PREFS_KEY, &next) {
            self.state.update_preferences(previous);
            return Err(error.into());
        }
        log::debug!("preference toggled key={key} value={}", next.get(key));
        ctx.emit(PlannerEvent::PreferencesChanged(next));
        Ok(next)
    }

    /// Wipes every persisted key and starts over from defaults on today.
    pub fn clear_all(&mut self, ctx: &impl PlannerCtx) -> Result<bool, PlannerError> {
        if !ctx.confirm(CONFIRM_CLEAR_ALL) {
            return Ok(false);
        }
        let removed = self.store.keys().len();
        self.store.clear()?;
        self.state.reset(self.today());
        log::info!("all data cleared keys={removed}");
        ctx.emit(PlannerEvent::DataCleared);
        ctx.emit(PlannerEvent::PreferencesChanged(self.preferences()));
        self.emit_state(ctx);
        Ok(true)
    }

    pub fn export_all(&self) -> Result<String, PlannerError> {
        Ok(export_json(&self.store)?)
    }

    pub fn export_to(&self, dir: &Path) -> Result<PathBuf, PlannerError> {
        let path = write_export(&self.store, dir)?;
        log::info!("exported path={}", path.display());
        Ok(path)
    }
}
