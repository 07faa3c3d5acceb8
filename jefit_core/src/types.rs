//! Core domain types for a parsed JEFIT export.
//!
//! Identifiers are kept verbatim as strings; the only converted value is a
//! session's start time, which arrives as a Unix epoch.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ============================================================================
// Records
// ============================================================================

/// Profile settings (first settings row only)
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Settings {
    pub mass: String,
}

/// A workout routine. Sessions are referenced by id in read order and owned
/// by [`ParsedExport::sessions`].
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Routine {
    pub id: String,
    pub name: String,
    pub session_ids: Vec<String>,
}

impl Routine {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            session_ids: Vec::new(),
        }
    }
}

/// One logged workout
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct WorkoutSession {
    pub id: String,
    /// Routine the session claims to belong to; may name a deleted routine
    pub routine_id: String,
    pub start_epoch: i64,
    /// Start time rendered as `DD/MM/YYYY HH:MM`
    pub start_time: String,
    pub exercises: Vec<ExerciseLog>,
    pub cardio_logs: Vec<CardioLog>,
}

/// Sets logged for one exercise within a session
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ExerciseLog {
    pub exercise_name: String,
    /// Raw log tokens, in source order
    pub logs: Vec<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct CardioLog {
    pub id: String,
    pub exercise_id: String,
    pub duration: String,
    pub distance: String,
    pub date: String,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Note {
    pub exercise_id: String,
    pub text: String,
    pub date: String,
}

// ============================================================================
// Parse result
// ============================================================================

/// Everything recovered from one export file
#[derive(Clone, Debug, Default, Serialize)]
pub struct ParsedExport {
    pub settings: Option<Settings>,
    pub routines: BTreeMap<String, Routine>,
    pub sessions: BTreeMap<String, WorkoutSession>,
    pub cardio_logs: Vec<CardioLog>,
    pub notes: Vec<Note>,
}

/// Collection sizes of a [`ParsedExport`]
#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
pub struct ExportSummary {
    pub has_settings: bool,
    pub routines: usize,
    pub sessions: usize,
    pub orphan_sessions: usize,
    pub exercise_logs: usize,
    pub cardio_logs: usize,
    pub notes: usize,
}

impl ParsedExport {
    /// Sessions owned by a routine, in the order they were read
    pub fn routine_sessions(&self, routine_id: &str) -> Vec<&WorkoutSession> {
        self.routines
            .get(routine_id)
            .map(|routine| {
                routine
                    .session_ids
                    .iter()
                    .filter_map(|id| self.sessions.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Sessions that no routine owns
    pub fn orphan_sessions(&self) -> impl Iterator<Item = &WorkoutSession> {
        let owned: BTreeSet<&str> = self
            .routines
            .values()
            .flat_map(|routine| routine.session_ids.iter().map(String::as_str))
            .collect();
        self.sessions
            .values()
            .filter(move |session| !owned.contains(session.id.as_str()))
    }

    pub fn summary(&self) -> ExportSummary {
        ExportSummary {
            has_settings: self.settings.is_some(),
            routines: self.routines.len(),
            sessions: self.sessions.len(),
            orphan_sessions: self.orphan_sessions().count(),
            exercise_logs: self.sessions.values().map(|s| s.exercises.len()).sum(),
            cardio_logs: self.cardio_logs.len(),
            notes: self.notes.len(),
        }
    }

    /// Render a routine header followed by its sessions
    pub fn render_routine(&self, routine: &Routine) -> String {
        let mut out = format!("{}: {}:\n", routine.id, routine.name);
        for session in self.routine_sessions(&routine.id) {
            out.push_str(&format!("\t{}\n", session));
        }
        out
    }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mass: {}", self.mass)
    }
}

impl fmt::Display for WorkoutSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Workout session at {}:", self.start_time)?;
        for exercise in &self.exercises {
            writeln!(f, "\t{}", exercise)?;
        }
        for cardio in &self.cardio_logs {
            writeln!(f, "\t{}", cardio)?;
        }
        Ok(())
    }
}

impl fmt::Display for ExerciseLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [{}]", self.exercise_name, self.logs.join(", "))
    }
}

impl fmt::Display for CardioLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} seconds, {} meters",
            self.exercise_id, self.duration, self.distance
        )
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.exercise_id, self.text)
    }
}

impl fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Settings:        {}",
            if self.has_settings { "present" } else { "absent" }
        )?;
        writeln!(f, "Routines:        {}", self.routines)?;
        writeln!(
            f,
            "Sessions:        {} ({} without routine)",
            self.sessions, self.orphan_sessions
        )?;
        writeln!(f, "Exercise logs:   {}", self.exercise_logs)?;
        writeln!(f, "Cardio logs:     {}", self.cardio_logs)?;
        write!(f, "Notes:           {}", self.notes)
    }
}
