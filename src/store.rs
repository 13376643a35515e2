//src/store.rs
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::catalog::MuscleGroup;

/// Generates an opaque unique identifier for a logged set. Random v4 UUIDs
/// make collisions negligible over the lifetime of an account. No ordering
/// semantics.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// One performed exercise instance. Immutable once created; deletion by id
/// is the only permitted mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedSet {
    pub id: String,
    pub exercise_name: String,
    /// Kilograms. Entered from a fixed increment list in the UI but not
    /// constrained to it here.
    pub weight: f64,
    /// Creation instant, informational only. Never used for ordering.
    pub logged_at: DateTime<Utc>,
}

impl LoggedSet {
    pub fn new(exercise_name: &str, weight: f64) -> Self {
        Self {
            id: new_id(),
            exercise_name: exercise_name.to_string(),
            weight,
            logged_at: Utc::now(),
        }
    }
}

/// The record for one calendar date, stored under its own `date` as key.
/// `muscle_group` reflects the group selected at the time of the last
/// append; `exercises` preserves insertion order and keeps accumulating
/// even when the active group changes mid-day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DailyLog {
    pub date: String,
    /// Fixed at the moment the day is first created, display only.
    pub day_of_week: String,
    pub muscle_group: MuscleGroup,
    pub exercises: Vec<LoggedSet>,
}

/// The full per-user document: daily logs keyed by `YYYY-MM-DD` date, plus
/// every custom exercise name ever logged per muscle group. Template lists
/// only grow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkoutStore {
    pub workouts: BTreeMap<String, DailyLog>,
    pub templates: BTreeMap<MuscleGroup, Vec<String>>,
}

/// Decodes an arbitrary fetched document into the strict store shape.
/// Missing or malformed pieces default to empty rather than failing, so
/// the rest of the crate never handles partial input. A daily log missing
/// its `date` field is backfilled from its key.
pub fn decode(raw: &Value) -> WorkoutStore {
    let mut store = WorkoutStore::default();
    if let Some(days) = raw.get("workouts").and_then(Value::as_object) {
        for (key, value) in days {
            match serde_json::from_value::<DailyLog>(value.clone()) {
                Ok(mut day) => {
                    if day.date.is_empty() {
                        day.date = key.clone();
                    }
                    store.workouts.insert(key.clone(), day);
                }
                Err(err) => warn!(date = %key, %err, "skipping malformed daily log"),
            }
        }
    }
    if let Some(groups) = raw.get("templates").and_then(Value::as_object) {
        for (key, value) in groups {
            let Ok(group) = key.parse::<MuscleGroup>() else {
                warn!(group = %key, "skipping templates for unknown muscle group");
                continue;
            };
            match serde_json::from_value::<Vec<String>>(value.clone()) {
                Ok(names) => {
                    store.templates.insert(group, names);
                }
                Err(err) => warn!(group = %key, %err, "skipping malformed template list"),
            }
        }
    }
    store
}

/// Strategies for merging a day's `exercises` array.
#[derive(Debug, Clone, PartialEq)]
pub enum ExercisesPatch {
    /// Append each set whose id is not already present. Replaying the same
    /// patch is a no-op, and concurrently appended sets survive.
    Union(Vec<LoggedSet>),
    /// Replace the whole array. Removal cannot be expressed as a union.
    Replace(Vec<LoggedSet>),
}

/// Field-level updates for one daily log. Scalar fields overwrite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayPatch {
    pub date: Option<String>,
    pub day_of_week: Option<String>,
    pub muscle_group: Option<MuscleGroup>,
    pub exercises: Option<ExercisesPatch>,
}

/// A merge patch against one user's document. Dates and template groups
/// not named in the patch are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorePatch {
    pub workouts: BTreeMap<String, DayPatch>,
    pub templates: BTreeMap<MuscleGroup, Vec<String>>,
}

impl WorkoutStore {
    /// Merges a patch into the store. Template names always append-unique;
    /// they are never removed.
    pub fn apply(&mut self, patch: &StorePatch) {
        for (key, day_patch) in &patch.workouts {
            let day = self.workouts.entry(key.clone()).or_insert_with(|| DailyLog {
                date: key.clone(),
                ..DailyLog::default()
            });
            if let Some(date) = &day_patch.date {
                day.date = date.clone();
            }
            if let Some(day_of_week) = &day_patch.day_of_week {
                day.day_of_week = day_of_week.clone();
            }
            if let Some(group) = day_patch.muscle_group {
                day.muscle_group = group;
            }
            match &day_patch.exercises {
                Some(ExercisesPatch::Union(sets)) => {
                    for set in sets {
                        if !day.exercises.iter().any(|existing| existing.id == set.id) {
                            day.exercises.push(set.clone());
                        }
                    }
                }
                Some(ExercisesPatch::Replace(sets)) => day.exercises = sets.clone(),
                None => {}
            }
        }
        for (group, names) in &patch.templates {
            let stored = self.templates.entry(*group).or_default();
            for name in names {
                if !stored.iter().any(|existing| existing == name) {
                    stored.push(name.clone());
                }
            }
        }
    }
}
