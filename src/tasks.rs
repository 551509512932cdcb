//! Day task lists: one ordered list per calendar day, stored under `tasks_<day>`.
//!
//! The list helpers here only touch the `Vec<Task>` they are given; loading,
//! saving and the follow-up streak check are sequenced by the planner.

use chrono::{NaiveDate, NaiveTime};

use crate::models::{Task, TaskDraft, TaskId, TaskPatch};
use crate::planner::PlannerError;
use crate::storage::{load_json_or_default, save_json, tasks_key, KeyValueStore, StorageError};

const TIME_FORMAT: &str = "%H:%M";

/// Persisted list for `date`; missing or unreadable data reads as an empty day.
pub fn load_day<S: KeyValueStore + ?Sized>(store: &S, date: NaiveDate) -> Vec<Task> {
    load_json_or_default(store, &tasks_key(date))
}

/// Replaces the whole list for `date`. An empty list drops the key.
pub fn save_day<S: KeyValueStore + ?Sized>(
    store: &mut S,
    date: NaiveDate,
    tasks: &[Task],
) -> Result<(), StorageError> {
    let key = tasks_key(date);
    if tasks.is_empty() {
        return store.remove(&key);
    }
    save_json(store, &key, tasks)
}

/// Creation timestamp, bumped past any id already in the list.
pub fn next_task_id(tasks: &[Task], now_millis: i64) -> TaskId {
    let mut candidate = now_millis;
    while tasks.iter().any(|task| task.id == candidate) {
        candidate += 1;
    }
    candidate
}

pub fn normalize_draft(mut draft: TaskDraft) -> Result<TaskDraft, PlannerError> {
    let title = draft.title.trim();
    if title.is_empty() {
        return Err(PlannerError::EmptyTitle);
    }
    draft.title = title.to_string();
    draft.time = normalize_time(draft.time.as_deref())?;
    Ok(draft)
}

fn normalize_time(time: Option<&str>) -> Result<Option<String>, PlannerError> {
    let Some(time) = time.map(str::trim).filter(|time| !time.is_empty()) else {
        return Ok(None);
    };
    NaiveTime::parse_from_str(time, TIME_FORMAT)
        .map(|parsed| Some(parsed.format(TIME_FORMAT).to_string()))
        .map_err(|_| PlannerError::InvalidTime(time.to_string()))
}

pub fn build_task(draft: TaskDraft, id: TaskId) -> Result<Task, PlannerError> {
    let draft = normalize_draft(draft)?;
    Ok(Task {
        id,
        title: draft.title,
        part: draft.part,
        time: draft.time,
        priority: draft.priority,
        required: draft.required,
        done: false,
    })
}

pub fn append(
    tasks: &mut Vec<Task>,
    draft: TaskDraft,
    now_millis: i64,
) -> Result<Task, PlannerError> {
    let task = build_task(draft, next_task_id(tasks, now_millis))?;
    tasks.push(task.clone());
    Ok(task)
}

pub fn toggle_done(tasks: &mut [Task], id: TaskId) -> Option<Task> {
    let task = tasks.iter_mut().find(|task| task.id == id)?;
    task.done = !task.done;
    Some(task.clone())
}

pub fn remove(tasks: &mut Vec<Task>, id: TaskId) -> Option<Task> {
    let index = tasks.iter().position(|task| task.id == id)?;
    Some(tasks.remove(index))
}

/// Edit by delete-and-recreate: the revised task gets a fresh id, lands at the
/// end of the list and starts undone. Nothing changes if the revision is
/// rejected.
pub fn recreate(
    tasks: &mut Vec<Task>,
    id: TaskId,
    patch: &TaskPatch,
    now_millis: i64,
) -> Result<Option<Task>, PlannerError> {
    let Some(original) = tasks.iter().find(|task| task.id == id) else {
        return Ok(None);
    };
    let mut draft = original.to_draft();
    patch.apply_to_draft(&mut draft);
    // Allocated while the original is still listed, so the ids always differ.
    let new_id = next_task_id(tasks, now_millis);
    let replacement = build_task(draft, new_id)?;

    tasks.retain(|task| task.id != id);
    tasks.push(replacement.clone());
    Ok(Some(replacement))
}

/// Applies `patch` to the task in place; id, position and `done` are kept.
pub fn update_in_place(
    tasks: &mut [Task],
    id: TaskId,
    patch: &TaskPatch,
) -> Result<Option<Task>, PlannerError> {
    let Some(task) = tasks.iter_mut().find(|task| task.id == id) else {
        return Ok(None);
    };
    let mut draft = task.to_draft();
    patch.apply_to_draft(&mut draft);
    let draft = normalize_draft(draft)?;

    task.title = draft.title;
    task.part = draft.part;
    task.time = draft.time;
    task.priority = draft.priority;
    task.required = draft.required;
    Ok(Some(task.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DayPart, Priority};
    use crate::storage::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_task(id: TaskId, title: &str) -> Task {
        Task {
            id,
            title: title.to_string(),
            part: DayPart::Morning,
            time: None,
            priority: Priority::Medium,
            required: false,
            done: false,
        }
    }

    #[test]
    fn unsaved_day_lists_empty() {
        let store = MemoryStore::new();
        assert!(load_day(&store, date(2024, 1, 10)).is_empty());
        assert!(load_day(&store, date(1999, 12, 31)).is_empty());
    }

    #[test]
    fn corrupt_day_lists_empty() {
        let mut store = MemoryStore::new();
        store
            .set("tasks_2024-01-10", r#"[{"id":"x"}]"#.to_string())
            .unwrap();
        assert!(load_day(&store, date(2024, 1, 10)).is_empty());
    }

    #[test]
    fn save_then_load_preserves_order_and_fields() {
        let mut store = MemoryStore::new();
        let mut second = make_task(2, "second");
        second.part = DayPart::Evening;
        second.time = Some("21:15".to_string());
        second.priority = Priority::High;
        second.required = true;
        second.done = true;
        let tasks = vec![make_task(9, "first"), second, make_task(1, "third")];

        save_day(&mut store, date(2024, 1, 10), &tasks).unwrap();
        assert_eq!(load_day(&store, date(2024, 1, 10)), tasks);
        assert!(load_day(&store, date(2024, 1, 11)).is_empty());
    }

    #[test]
    fn saving_an_empty_day_drops_its_key() {
        let mut store = MemoryStore::new();
        save_day(&mut store, date(2024, 1, 10), &[make_task(1, "a")]).unwrap();
        save_day(&mut store, date(2024, 1, 10), &[]).unwrap();
        assert!(store.keys().is_empty());
    }

    #[test]
    fn append_rejects_blank_titles_without_touching_the_list() {
        let mut tasks = vec![make_task(1, "a")];
        let res = append(&mut tasks, TaskDraft::new("   ", DayPart::Morning), 5);
        assert!(matches!(res, Err(PlannerError::EmptyTitle)));
        assert_eq!(tasks, vec![make_task(1, "a")]);
    }

    #[test]
    fn append_trims_title_and_normalizes_time() {
        let mut tasks = Vec::new();
        let mut draft = TaskDraft::new("  Gym  ", DayPart::Evening);
        draft.time = Some("7:05".to_string());
        let task = append(&mut tasks, draft, 100).unwrap();
        assert_eq!(task.title, "Gym");
        assert_eq!(task.time.as_deref(), Some("07:05"));
        assert!(!task.done);
        assert_eq!(tasks, vec![task]);

        let mut bad = TaskDraft::new("Gym", DayPart::Evening);
        bad.time = Some("25:00".to_string());
        assert!(matches!(
            append(&mut tasks, bad, 200),
            Err(PlannerError::InvalidTime(_))
        ));
        assert_eq!(tasks.len(), 1);

        let mut blank_time = TaskDraft::new("Read", DayPart::Evening);
        blank_time.time = Some(" ".to_string());
        assert_eq!(append(&mut tasks, blank_time, 300).unwrap().time, None);
    }

    #[test]
    fn ids_skip_past_collisions() {
        let tasks = vec![make_task(100, "a"), make_task(101, "b")];
        assert_eq!(next_task_id(&tasks, 100), 102);
        assert_eq!(next_task_id(&tasks, 50), 50);
    }

    #[test]
    fn toggle_done_flips_and_ignores_unknown_ids() {
        let mut tasks = vec![make_task(1, "a"), make_task(2, "b")];
        let toggled = toggle_done(&mut tasks, 2).unwrap();
        assert!(toggled.done);
        assert!(tasks[1].done);
        assert!(!toggle_done(&mut tasks, 2).unwrap().done);

        let before = tasks.clone();
        assert!(toggle_done(&mut tasks, 42).is_none());
        assert_eq!(tasks, before);
    }

    #[test]
    fn remove_drops_only_the_matching_task() {
        let mut tasks = vec![make_task(1, "a"), make_task(2, "b"), make_task(3, "c")];
        assert_eq!(remove(&mut tasks, 2).unwrap().title, "b");
        assert!(remove(&mut tasks, 2).is_none());
        let ids: Vec<_> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn recreate_assigns_new_id_and_moves_to_end() {
        let mut tasks = vec![make_task(1, "a"), make_task(2, "b"), make_task(3, "c")];
        tasks[0].done = true;
        let patch = TaskPatch {
            title: Some("a, revised".to_string()),
            priority: Some(Priority::High),
            ..TaskPatch::default()
        };

        // Clock reading equal to the original id still yields a distinct id.
        let edited = recreate(&mut tasks, 1, &patch, 1).unwrap().unwrap();
        assert_ne!(edited.id, 1);
        assert_eq!(edited.title, "a, revised");
        assert_eq!(edited.priority, Priority::High);
        assert!(!edited.done);
        let ids: Vec<_> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 3, edited.id]);
    }

    #[test]
    fn recreate_rejection_and_missing_id_leave_list_intact() {
        let mut tasks = vec![make_task(1, "a"), make_task(2, "b")];
        let before = tasks.clone();
        let blank = TaskPatch {
            title: Some(String::new()),
            ..TaskPatch::default()
        };
        assert!(matches!(
            recreate(&mut tasks, 1, &blank, 10),
            Err(PlannerError::EmptyTitle)
        ));
        assert_eq!(tasks, before);

        assert!(recreate(&mut tasks, 9, &TaskPatch::default(), 10)
            .unwrap()
            .is_none());
        assert_eq!(tasks, before);
    }

    #[test]
    fn update_in_place_keeps_id_position_and_done() {
        let mut tasks = vec![make_task(1, "a"), make_task(2, "b")];
        tasks[0].done = true;
        let patch = TaskPatch {
            part: Some(DayPart::Afternoon),
            time: Some(Some("13:00".to_string())),
            required: Some(true),
            ..TaskPatch::default()
        };
        let updated = update_in_place(&mut tasks, 1, &patch).unwrap().unwrap();
        assert_eq!(updated.id, 1);
        assert!(updated.done);
        assert_eq!(tasks[0], updated);
        assert_eq!(tasks[0].part, DayPart::Afternoon);
        assert_eq!(tasks[0].time.as_deref(), Some("13:00"));
        assert!(tasks[0].required);

        let bad = TaskPatch {
            time: Some(Some("noon".to_string())),
            ..TaskPatch::default()
        };
        assert!(update_in_place(&mut tasks, 2, &bad).is_err());
        assert_eq!(tasks[1], make_task(2, "b"));
        assert!(update_in_place(&mut tasks, 5, &patch).unwrap().is_none());
    }
}
