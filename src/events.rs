use serde::Serialize;

use crate::models::{DayProgress, Preferences, Streak, Task};

pub const EVENT_STATE_UPDATED: &str = "state_updated";
pub const EVENT_STREAK_INCREASED: &str = "streak_increased";
pub const EVENT_PREFERENCES_CHANGED: &str = "preferences_changed";
pub const EVENT_DATA_CLEARED: &str = "data_cleared";

/// Everything needed to redraw the day view.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatePayload {
    pub date: String,
    pub tasks: Vec<Task>,
    pub progress: DayProgress,
    pub streak: Streak,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum PlannerEvent {
    StateUpdated(StatePayload),
    StreakIncreased(Streak),
    /// Visual effects should be re-applied from the new record.
    PreferencesChanged(Preferences),
    DataCleared,
}

impl PlannerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PlannerEvent::StateUpdated(_) => EVENT_STATE_UPDATED,
            PlannerEvent::StreakIncreased(_) => EVENT_STREAK_INCREASED,
            PlannerEvent::PreferencesChanged(_) => EVENT_PREFERENCES_CHANGED,
            PlannerEvent::DataCleared => EVENT_DATA_CLEARED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_match_serialized_tags() {
        let events = [
            PlannerEvent::StateUpdated(StatePayload {
                date: "2024-01-10".to_string(),
                tasks: Vec::new(),
                progress: DayProgress::default(),
                streak: Streak::default(),
            }),
            PlannerEvent::StreakIncreased(Streak::default()),
            PlannerEvent::PreferencesChanged(Preferences::default()),
            PlannerEvent::DataCleared,
        ];
        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["event"], event.name());
        }
    }
}
