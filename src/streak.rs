use chrono::NaiveDate;

use crate::dates::yesterday;
use crate::models::{Streak, Task};
use crate::storage::{load_json_or_default, save_json, KeyValueStore, StorageError, STREAK_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakTransition {
    /// The saved day has no required tasks; it can neither extend nor break a streak.
    NoRequiredTasks,
    /// Only saves of today's list count.
    NotToday,
    Incomplete,
    AlreadyCounted,
    /// Yesterday was counted, so the run continues.
    Extended,
    /// Gap (or first ever qualifying day): the run starts over at one.
    Restarted,
}

impl StreakTransition {
    pub fn advanced(self) -> bool {
        matches!(self, StreakTransition::Extended | StreakTransition::Restarted)
    }
}

/// Evaluates the save of `tasks` for `date` against `streak`. Returns the
/// transition and the streak that results from it.
pub fn evaluate(
    streak: &Streak,
    date: NaiveDate,
    tasks: &[Task],
    today: NaiveDate,
) -> (StreakTransition, Streak) {
    let mut required = tasks.iter().filter(|task| task.required).peekable();
    if required.peek().is_none() {
        return (StreakTransition::NoRequiredTasks, streak.clone());
    }
    if date != today {
        return (StreakTransition::NotToday, streak.clone());
    }
    if !required.all(|task| task.done) {
        return (StreakTransition::Incomplete, streak.clone());
    }
    if streak.last_date == Some(today) {
        return (StreakTransition::AlreadyCounted, streak.clone());
    }

    let (transition, count) = if streak.last_date == Some(yesterday(today)) {
        (StreakTransition::Extended, streak.count.saturating_add(1))
    } else {
        (StreakTransition::Restarted, 1)
    };
    (
        transition,
        Streak {
            count,
            last_date: Some(today),
        },
    )
}

pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Streak {
    load_json_or_default(store, STREAK_KEY)
}

pub fn save<S: KeyValueStore + ?Sized>(store: &mut S, streak: &Streak) -> Result<(), StorageError> {
    save_json(store, STREAK_KEY, streak)
}
