use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Creation timestamp in milliseconds; doubles as the task identifier.
pub type TaskId = i64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum DayPart {
    #[default]
    Morning,
    Afternoon,
    Evening,
}

impl DayPart {
    pub const ALL: [DayPart; 3] = [DayPart::Morning, DayPart::Afternoon, DayPart::Evening];

    pub fn label(self) -> &'static str {
        match self {
            DayPart::Morning => "Morning",
            DayPart::Afternoon => "Afternoon",
            DayPart::Evening => "Evening",
        }
    }
}

impl fmt::Display for DayPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DayPart {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "morning" => Ok(DayPart::Morning),
            "afternoon" => Ok(DayPart::Afternoon),
            "evening" => Ok(DayPart::Evening),
            other => Err(format!("unknown day part `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub part: DayPart,
    // Older records store an empty string when no time was picked.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub time: Option<String>,
    pub priority: Priority,
    pub required: bool,
    pub done: bool,
}

impl Task {
    /// The user-editable fields of this task, as they would be typed into the add form.
    pub fn to_draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.clone(),
            part: self.part,
            time: self.time.clone(),
            priority: self.priority,
            required: self.required,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TaskDraft {
    pub title: String,
    pub part: DayPart,
    pub time: Option<String>,
    pub priority: Priority,
    pub required: bool,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, part: DayPart) -> Self {
        Self {
            title: title.into(),
            part,
            ..Self::default()
        }
    }
}

/// Field replacements for edit/update. `None` keeps the current value;
/// `time: Some(None)` clears the time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub part: Option<DayPart>,
    pub time: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub required: Option<bool>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }

    pub fn apply_to_draft(&self, draft: &mut TaskDraft) {
        if let Some(title) = &self.title {
            draft.title = title.clone();
        }
        if let Some(part) = self.part {
            draft.part = part;
        }
        if let Some(time) = &self.time {
            draft.time = time.clone();
        }
        if let Some(priority) = self.priority {
            draft.priority = priority;
        }
        if let Some(required) = self.required {
            draft.required = required;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Streak {
    pub count: u32,
    pub last_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceKey {
    DarkMode,
    Animation,
    Sound,
    Compact,
}

impl PreferenceKey {
    pub const ALL: [PreferenceKey; 4] = [
        PreferenceKey::DarkMode,
        PreferenceKey::Animation,
        PreferenceKey::Sound,
        PreferenceKey::Compact,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PreferenceKey::DarkMode => "darkMode",
            PreferenceKey::Animation => "animation",
            PreferenceKey::Sound => "sound",
            PreferenceKey::Compact => "compact",
        }
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PreferenceKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized: String = value
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "darkmode" | "dark" => Ok(PreferenceKey::DarkMode),
            "animation" => Ok(PreferenceKey::Animation),
            "sound" => Ok(PreferenceKey::Sound),
            "compact" => Ok(PreferenceKey::Compact),
            _ => Err(format!("unknown preference `{}`", value.trim())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default = "default_true")]
    pub dark_mode: bool,
    #[serde(default = "default_true")]
    pub animation: bool,
    #[serde(default = "default_true")]
    pub sound: bool,
    #[serde(default)]
    pub compact: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            dark_mode: true,
            animation: true,
            sound: true,
            compact: false,
        }
    }
}

impl Preferences {
    pub fn get(&self, key: PreferenceKey) -> bool {
        match key {
            PreferenceKey::DarkMode => self.dark_mode,
            PreferenceKey::Animation => self.animation,
            PreferenceKey::Sound => self.sound,
            PreferenceKey::Compact => self.compact,
        }
    }

    pub fn set(&mut self, key: PreferenceKey, value: bool) {
        let field = match key {
            PreferenceKey::DarkMode => &mut self.dark_mode,
            PreferenceKey::Animation => &mut self.animation,
            PreferenceKey::Sound => &mut self.sound,
            PreferenceKey::Compact => &mut self.compact,
        };
        *field = value;
    }

    /// Flips one field and returns its new value.
    pub fn toggle(&mut self, key: PreferenceKey) -> bool {
        let next = !self.get(key);
        self.set(key, next);
        next
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct DayProgress {
    pub done: usize,
    pub total: usize,
    pub percent: u8,
}

impl DayProgress {
    pub fn of(tasks: &[Task]) -> Self {
        let total = tasks.len();
        let done = tasks.iter().filter(|task| task.done).count();
        let percent = if total == 0 {
            0
        } else {
            ((done as f64 / total as f64) * 100.0).round() as u8
        };
        Self {
            done,
            total,
            percent,
        }
    }
}

fn default_true() -> bool {
    true
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|time| !time.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_task(id: TaskId, done: bool) -> Task {
        Task {
            id,
            title: format!("task-{id}"),
            part: DayPart::Morning,
            time: None,
            priority: Priority::Medium,
            required: false,
            done,
        }
    }

    #[test]
    fn preferences_default_values() {
        let prefs = Preferences::default();
        assert!(prefs.dark_mode);
        assert!(prefs.animation);
        assert!(prefs.sound);
        assert!(!prefs.compact);
    }

    #[test]
    fn preferences_serde_applies_defaults_for_missing_fields() {
        let prefs: Preferences =
            serde_json::from_str(r#"{ "sound": false }"#).expect("prefs should deserialize");
        assert!(prefs.dark_mode);
        assert!(prefs.animation);
        assert!(!prefs.sound);
        assert!(!prefs.compact);

        let value = serde_json::to_value(prefs).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
              "darkMode": true,
              "animation": true,
              "sound": false,
              "compact": false
            })
        );
    }

    #[test]
    fn preferences_toggle_flips_only_the_named_field() {
        let mut prefs = Preferences::default();
        assert!(prefs.toggle(PreferenceKey::Compact));
        assert!(!prefs.toggle(PreferenceKey::DarkMode));
        assert!(prefs.compact);
        assert!(!prefs.dark_mode);
        assert!(prefs.animation);
        assert!(prefs.sound);
    }

    #[test]
    fn preference_key_parses_loose_spellings() {
        assert_eq!("darkMode".parse::<PreferenceKey>(), Ok(PreferenceKey::DarkMode));
        assert_eq!("dark-mode".parse::<PreferenceKey>(), Ok(PreferenceKey::DarkMode));
        assert_eq!("dark_mode".parse::<PreferenceKey>(), Ok(PreferenceKey::DarkMode));
        assert_eq!(" Sound ".parse::<PreferenceKey>(), Ok(PreferenceKey::Sound));
        assert!("volume".parse::<PreferenceKey>().is_err());
    }

    #[test]
    fn streak_uses_camel_case_layout() {
        let streak = Streak {
            count: 3,
            last_date: NaiveDate::from_ymd_opt(2024, 1, 10),
        };
        let value = serde_json::to_value(&streak).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "count": 3, "lastDate": "2024-01-10" })
        );

        let empty: Streak = serde_json::from_str(r#"{"count":0,"lastDate":null}"#).unwrap();
        assert_eq!(empty, Streak::default());
    }

    #[test]
    fn task_reads_the_browser_layout_and_empty_time() {
        let json = r#"
        {
          "id": 1704873600000,
          "title": "Read chapter 3",
          "part": "Afternoon",
          "time": "",
          "priority": "High",
          "required": true,
          "done": false
        }
        "#;

        let task: Task = serde_json::from_str(json).expect("task should deserialize");
        assert_eq!(task.id, 1704873600000);
        assert_eq!(task.part, DayPart::Afternoon);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.time, None);
        assert!(task.required);

        let with_time: Task =
            serde_json::from_str(&json.replace(r#""time": """#, r#""time": "08:30""#)).unwrap();
        assert_eq!(with_time.time.as_deref(), Some("08:30"));
    }

    #[test]
    fn part_and_priority_parse_case_insensitively() {
        assert_eq!("EVENING".parse::<DayPart>(), Ok(DayPart::Evening));
        assert_eq!("low".parse::<Priority>(), Ok(Priority::Low));
        assert!("noon".parse::<DayPart>().is_err());
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn patch_overrides_only_present_fields() {
        let mut draft = TaskDraft::new("Write", DayPart::Morning);
        draft.time = Some("07:00".to_string());
        let patch = TaskPatch {
            title: Some("Write report".to_string()),
            time: Some(None),
            ..TaskPatch::default()
        };
        assert!(!patch.is_empty());
        patch.apply_to_draft(&mut draft);
        assert_eq!(draft.title, "Write report");
        assert_eq!(draft.time, None);
        assert_eq!(draft.part, DayPart::Morning);
        assert_eq!(draft.priority, Priority::Medium);
        assert!(TaskPatch::default().is_empty());
    }

    #[test]
    fn progress_rounds_to_nearest_percent() {
        assert_eq!(DayProgress::of(&[]), DayProgress::default());
        let tasks = vec![make_task(1, true), make_task(2, false), make_task(3, false)];
        assert_eq!(DayProgress::of(&tasks).percent, 33);
        let tasks = vec![make_task(1, true), make_task(2, true), make_task(3, false)];
        let progress = DayProgress::of(&tasks);
        assert_eq!(progress.done, 2);
        assert_eq!(progress.total, 3);
        assert_eq!(progress.percent, 67);
    }
}
