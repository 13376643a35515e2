//src/catalog.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{Display, EnumIter, EnumString};

/// Weight picker steps in kilograms. Informational only; the model accepts
/// any positive weight.
pub const WEIGHT_INCREMENTS: [f64; 24] = [
    2.5, 5.0, 7.5, 10.0, 12.5, 15.0, 17.5, 20.0, 22.5, 25.0, 27.5, 30.0, 32.5, 35.0, 37.5, 40.0,
    45.0, 50.0, 55.0, 60.0, 70.0, 80.0, 90.0, 100.0,
];

/// Training category a day can target. `Rest` is the sentinel for days
/// without training; it has no default exercises and its days never
/// accumulate sets.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
pub enum MuscleGroup {
    Biceps,
    Triceps,
    Chest,
    Shoulder,
    Back,
    Leg,
    #[default]
    Rest,
}

/// Static catalog of default exercise names per muscle group.
pub fn default_exercises(group: MuscleGroup) -> &'static [&'static str] {
    match group {
        MuscleGroup::Biceps => &["Barbell Curl", "Hammer Curl", "Preacher Curl"],
        MuscleGroup::Triceps => &["Tricep Pushdown", "Skullcrushers", "Dips"],
        MuscleGroup::Chest => &["Bench Press", "Incline Dumbbell Press", "Cable Flyes"],
        MuscleGroup::Shoulder => &["Overhead Press", "Lateral Raises", "Face Pulls"],
        MuscleGroup::Back => &["Pull Ups", "Lat Pulldown", "Barbell Row"],
        MuscleGroup::Leg => &["Squat", "Leg Press", "Romanian Deadlift"],
        MuscleGroup::Rest => &[],
    }
}

/// Names selectable for a group: the default catalog first, in catalog
/// order, then the user's stored customs in their stored order,
/// deduplicated on first sight. Does not mutate `templates`.
pub fn available_exercises(
    group: MuscleGroup,
    templates: &BTreeMap<MuscleGroup, Vec<String>>,
) -> Vec<String> {
    let mut names: Vec<String> = default_exercises(group)
        .iter()
        .map(|name| (*name).to_string())
        .collect();
    if let Some(customs) = templates.get(&group) {
        for custom in customs {
            if !names.iter().any(|name| name == custom) {
                names.push(custom.clone());
            }
        }
    }
    names
}
