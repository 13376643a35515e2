//src/engine.rs
use crate::catalog::MuscleGroup;
use crate::store::{DailyLog, DayPatch, ExercisesPatch, LoggedSet, StorePatch, WorkoutStore};

/// The most recent prior weight lifted for an exercise, used for the
/// progressive-overload hint ("last time you lifted X kg").
#[derive(Debug, Clone, PartialEq)]
pub struct PreviousPerformance {
    pub weight: f64,
    pub date: String,
}

/// Builds the merge patch for logging one set on the given date.
///
/// Returns `None` as a guarded no-op when the trimmed name is empty, the
/// weight is not a positive finite number, or the group is `Rest` (rest
/// days never accumulate sets). Otherwise the patch overwrites the day's
/// `date`, `day_of_week` and `muscle_group`, union-appends a freshly
/// constructed [`LoggedSet`], and union-appends the name into the group's
/// templates. Repeated appends on one date overwrite the day's group each
/// time; `exercises` accumulates across all of them.
///
/// The patch is self-contained and carries the generated set id, so a
/// replayed write merges as the same element. Delivery is the caller's
/// concern.
pub fn append_set(
    date_key: &str,
    group: MuscleGroup,
    day_of_week: &str,
    name: &str,
    weight: f64,
) -> Option<StorePatch> {
    let name = name.trim();
    if name.is_empty() || !weight.is_finite() || weight <= 0.0 || group == MuscleGroup::Rest {
        return None;
    }

    let mut patch = StorePatch::default();
    patch.workouts.insert(
        date_key.to_string(),
        DayPatch {
            date: Some(date_key.to_string()),
            day_of_week: Some(day_of_week.to_string()),
            muscle_group: Some(group),
            exercises: Some(ExercisesPatch::Union(vec![LoggedSet::new(name, weight)])),
        },
    );
    patch.templates.insert(group, vec![name.to_string()]);
    Some(patch)
}

/// Builds the merge patch for removing a set by id from one day's log.
///
/// Returns `None` when no log exists for `date_key`. An id that is not
/// present yields a patch that changes nothing. Removal is a full-array
/// replace; it cannot be expressed as a union. Templates are never
/// touched.
pub fn delete_set(store: &WorkoutStore, date_key: &str, set_id: &str) -> Option<StorePatch> {
    let day = store.workouts.get(date_key)?;
    let remaining: Vec<LoggedSet> = day
        .exercises
        .iter()
        .filter(|set| set.id != set_id)
        .cloned()
        .collect();

    let mut patch = StorePatch::default();
    patch.workouts.insert(
        date_key.to_string(),
        DayPatch {
            exercises: Some(ExercisesPatch::Replace(remaining)),
            ..DayPatch::default()
        },
    );
    Some(patch)
}

/// Past daily logs for one muscle group, most recent first.
///
/// Logs with no exercises and logs of other groups are dropped. Date keys
/// are canonical `YYYY-MM-DD`, so lexicographic order is date order. The
/// store is not mutated; a fresh sequence is produced per call.
pub fn history_for_group(store: &WorkoutStore, group: MuscleGroup) -> Vec<&DailyLog> {
    let mut logs: Vec<&DailyLog> = store
        .workouts
        .values()
        .filter(|log| log.muscle_group == group && !log.exercises.is_empty())
        .collect();
    logs.sort_by(|a, b| b.date.cmp(&a.date));
    logs
}

/// The most recent prior occurrence of `exercise_name` in the group's
/// history, skipping the day currently being edited.
///
/// Returns `None` for an empty name or when no qualifying log exists —
/// including when the only match is the excluded day itself.
pub fn previous_performance(
    store: &WorkoutStore,
    group: MuscleGroup,
    exercise_name: &str,
    exclude_date_key: &str,
) -> Option<PreviousPerformance> {
    if exercise_name.is_empty() {
        return None;
    }
    for log in history_for_group(store, group) {
        if log.date == exclude_date_key {
            continue;
        }
        if let Some(set) = log
            .exercises
            .iter()
            .find(|set| set.exercise_name == exercise_name)
        {
            return Some(PreviousPerformance {
                weight: set.weight,
                date: log.date.clone(),
            });
        }
    }
    None
}
