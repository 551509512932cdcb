use chrono::NaiveDate;

use crate::dates::add_days;
use crate::models::{PreferenceKey, Preferences, Streak};

/// In-memory side of the planner: what is being looked at and the two
/// singletons read on every render.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerState {
    current_date: NaiveDate,
    streak: Streak,
    preferences: Preferences,
}

impl PlannerState {
    pub fn new(today: NaiveDate, streak: Streak, preferences: Preferences) -> Self {
        Self {
            current_date: today,
            streak,
            preferences,
        }
    }

    pub fn current_date(&self) -> NaiveDate {
        self.current_date
    }

    pub fn set_current_date(&mut self, date: NaiveDate) {
        self.current_date = date;
    }

    pub fn shift_current_date(&mut self, offset: i64) -> NaiveDate {
        self.current_date = add_days(self.current_date, offset);
        self.current_date
    }

    pub fn streak(&self) -> &Streak {
        &self.streak
    }

    pub fn update_streak(&mut self, streak: Streak) {
        self.streak = streak;
    }

    pub fn preferences(&self) -> Preferences {
        self.preferences
    }

    pub fn toggle_preference(&mut self, key: PreferenceKey) -> Preferences {
        self.preferences.toggle(key);
        self.preferences
    }

    pub fn update_preferences(&mut self, preferences: Preferences) {
        self.preferences = preferences;
    }

    /// Back to a first-launch state on `today`.
    pub fn reset(&mut self, today: NaiveDate) {
        *self = Self::new(today, Streak::default(), Preferences::default());
    }
}
