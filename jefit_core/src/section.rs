//! Section state machine for the export file.
//!
//! An export is a flat concatenation of unrelated tables. Each table starts
//! with a header row that names its columns; one of those column names is a
//! marker token identifying the table. Data rows follow until a blank row.

use csv::StringRecord;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

/// A logical table within the export
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Section {
    Settings,
    Routines,
    WorkoutSessions,
    ExerciseLogs,
    CardioLogs,
    Notes,
}

/// How many data rows a section reads after its header
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Consumption {
    /// Exactly one data row
    Single,
    /// Rows until a blank terminator
    UntilBlank,
}

/// Marker token per section, in detection priority order
pub const MARKERS: [(&str, Section); 6] = [
    ("mass", Section::Settings),
    ("rest_day", Section::Routines),
    ("workout_time", Section::WorkoutSessions),
    ("belongsession", Section::ExerciseLogs),
    ("speed", Section::CardioLogs),
    ("mynote", Section::Notes),
];

static MARKER_LOOKUP: Lazy<HashMap<&'static str, (usize, Section)>> = Lazy::new(|| {
    MARKERS
        .iter()
        .enumerate()
        .map(|(priority, (token, section))| (*token, (priority, *section)))
        .collect()
});

/// Fixed 0-based column offsets for every section
pub mod columns {
    pub mod settings {
        pub const MASS: usize = 8;
    }

    pub mod routines {
        pub const ID: usize = 4;
        pub const NAME: usize = 5;
    }

    pub mod sessions {
        pub const ID: usize = 1;
        pub const ROUTINE_ID: usize = 4;
        pub const START_EPOCH: usize = 12;
    }

    pub mod exercise_logs {
        pub const LOGS: usize = 4;
        pub const EXERCISE_NAME: usize = 9;
        pub const SESSION_ID: usize = 11;
    }

    /// The cardio date lives in the last column, whatever the row width
    pub mod cardio {
        pub const ID: usize = 3;
        pub const EXERCISE_ID: usize = 5;
        pub const DURATION: usize = 8;
        pub const DISTANCE: usize = 10;
    }

    pub mod notes {
        pub const EXERCISE_ID: usize = 4;
        pub const TEXT: usize = 6;
        pub const DATE: usize = 8;
    }
}

impl Section {
    /// Detect which section a header row opens.
    ///
    /// A row matches when any of its fields equals a marker token exactly.
    /// If several markers are present, the one listed first in [`MARKERS`] wins.
    pub fn detect(record: &StringRecord) -> Option<Section> {
        record
            .iter()
            .filter_map(|field| MARKER_LOOKUP.get(field))
            .min_by_key(|(priority, _)| *priority)
            .map(|(_, section)| *section)
    }

    /// The marker token that opens this section
    pub fn marker(self) -> &'static str {
        MARKERS
            .iter()
            .find(|(_, section)| *section == self)
            .map(|(token, _)| *token)
            .unwrap_or_default()
    }

    pub fn consumption(self) -> Consumption {
        match self {
            Section::Settings => Consumption::Single,
            _ => Consumption::UntilBlank,
        }
    }

    /// Columns a data row must reach for this section
    pub fn required_width(self) -> usize {
        use columns::*;
        let max_column = match self {
            Section::Settings => settings::MASS,
            Section::Routines => routines::NAME,
            Section::WorkoutSessions => sessions::START_EPOCH,
            Section::ExerciseLogs => exercise_logs::SESSION_ID,
            Section::CardioLogs => cardio::DISTANCE,
            Section::Notes => notes::DATE,
        };
        max_column + 1
    }

    pub fn name(self) -> &'static str {
        match self {
            Section::Settings => "settings",
            Section::Routines => "routines",
            Section::WorkoutSessions => "workout sessions",
            Section::ExerciseLogs => "exercise logs",
            Section::CardioLogs => "cardio logs",
            Section::Notes => "notes",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parser position between and within sections
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Outside any section; rows are scanned for markers
    Idle,
    /// Header consumed, reading data rows of the section
    InSection(Section),
}

impl State {
    /// Transition taken on a non-blank row while idle
    pub fn on_header(record: &StringRecord) -> State {
        match Section::detect(record) {
            Some(section) => State::InSection(section),
            None => State::Idle,
        }
    }

    /// Transition taken after a data row has been consumed
    pub fn after_data(self) -> State {
        match self {
            State::InSection(section) if section.consumption() == Consumption::Single => {
                State::Idle
            }
            other => other,
        }
    }

    /// Transition taken on a blank row
    pub fn on_blank(self) -> State {
        State::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    #[test]
    fn test_detect_each_marker() {
        for (token, section) in MARKERS {
            let row = record(&["_id", token, "other"]);
            assert_eq!(Section::detect(&row), Some(section));
            assert_eq!(section.marker(), token);
        }
    }

    #[test]
    fn test_detect_requires_exact_field() {
        assert_eq!(Section::detect(&record(&["body_mass", "massive"])), None);
        assert_eq!(Section::detect(&record(&["Speed"])), None);
        assert_eq!(Section::detect(&record(&[""])), None);
    }

    #[test]
    fn test_detect_prefers_table_order() {
        let row = record(&["mynote", "speed", "rest_day"]);
        assert_eq!(Section::detect(&row), Some(Section::Routines));
    }

    #[test]
    fn test_required_width() {
        assert_eq!(Section::Settings.required_width(), 9);
        assert_eq!(Section::WorkoutSessions.required_width(), 13);
        assert_eq!(Section::ExerciseLogs.required_width(), 12);
        assert_eq!(Section::CardioLogs.required_width(), 11);
    }

    #[test]
    fn test_transitions() {
        let header = record(&["_id", "mass"]);
        let state = State::on_header(&header);
        assert_eq!(state, State::InSection(Section::Settings));
        assert_eq!(state.after_data(), State::Idle);

        let state = State::InSection(Section::Notes);
        assert_eq!(state.after_data(), state);
        assert_eq!(state.on_blank(), State::Idle);

        assert_eq!(State::on_header(&record(&["### PROFILE ###"])), State::Idle);
    }
}
