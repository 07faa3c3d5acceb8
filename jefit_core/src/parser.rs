//! Section-demultiplexing parser for JEFIT CSV exports.
//!
//! The export is read once, top to bottom. Outside a section every row is
//! checked for a marker token; a marker row is the section's header, and the
//! rows after it are decoded by that section's consumer until a blank row
//! (or, for settings, after a single row). Records are linked as they are
//! read: sessions to routines, exercise logs to sessions by id, and cardio
//! logs to every session whose start time contains the log's date.

use crate::clock::{format_epoch, Zone};
use crate::config::{DanglingPolicy, ParserConfig};
use crate::reader::{Row, RowReader};
use crate::section::{columns, Consumption, Section, State};
use crate::{
    CardioLog, Error, ExerciseLog, Note, ParsedExport, Result, Routine, Settings, WorkoutSession,
};
use csv::StringRecord;
use fs2::FileExt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Knobs controlling edge-case behaviour of the parser
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// Zone used to render session start times
    pub timezone: Zone,
    pub dangling_sessions: DanglingPolicy,
    /// Reject unmarked non-blank rows outside sections instead of skipping them
    pub strict_sections: bool,
    /// Treat end of input as the terminator of a section that read at least one row
    pub eof_terminates_section: bool,
}

impl From<&ParserConfig> for ParserOptions {
    fn from(config: &ParserConfig) -> Self {
        Self {
            timezone: config.timezone,
            dangling_sessions: config.dangling_sessions,
            strict_sections: config.strict_sections,
            eof_terminates_section: config.eof_terminates_section,
        }
    }
}

/// Split a raw exercise log string into tokens.
///
/// Trailing separators are dropped first, so `"10,135,0,"` and `"10,135,0"`
/// both yield `["10", "135", "0"]`. An empty string yields no tokens.
pub fn split_logs(raw: &str) -> Vec<String> {
    let trimmed = raw.trim_end_matches(',');
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split(',').map(str::to_string).collect()
}

/// Parser for a complete export
#[derive(Clone, Debug, Default)]
pub struct ExportParser {
    options: ParserOptions,
}

impl ExportParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parse an export file, holding a shared lock on it while reading
    pub fn parse_path(&self, path: &Path) -> Result<ParsedExport> {
        let file = File::open(path)?;
        file.lock_shared()?;
        tracing::debug!("Parsing export {:?}", path);

        let result = self.parse_buffered(BufReader::new(&file));

        file.unlock()?;
        result
    }

    pub fn parse_reader<R: Read>(&self, reader: R) -> Result<ParsedExport> {
        self.parse_buffered(BufReader::new(reader))
    }

    pub fn parse_str(&self, input: &str) -> Result<ParsedExport> {
        self.parse_buffered(input.as_bytes())
    }

    fn parse_buffered<R: BufRead>(&self, input: R) -> Result<ParsedExport> {
        let mut rows = RowReader::new(input);
        let mut builder = ExportBuilder::new(self.options);
        let mut state = State::Idle;
        let mut last_line = 0;
        let mut consumed = 0usize;

        loop {
            let row = rows.next_row()?;
            if let Some(row) = &row {
                last_line = row.line();
            }

            match (state, row) {
                (State::Idle, None) => break,

                (State::InSection(section), None) => {
                    if self.options.eof_terminates_section
                        && consumed > 0
                        && section.consumption() == Consumption::UntilBlank
                    {
                        tracing::debug!(
                            "Input ended inside {} section after {} rows",
                            section,
                            consumed
                        );
                        break;
                    }
                    return Err(Error::TruncatedSection {
                        section,
                        line: last_line,
                    });
                }

                (State::Idle, Some(Row::Blank { .. })) => {}

                (State::Idle, Some(Row::Record { line, record })) => {
                    state = State::on_header(&record);
                    match state {
                        State::InSection(section) => {
                            tracing::debug!("Entering {} section at line {}", section, line);
                            consumed = 0;
                        }
                        State::Idle if self.options.strict_sections => {
                            return Err(Error::UnknownSection { line });
                        }
                        State::Idle => {
                            tracing::trace!("Skipping unmarked row at line {}", line);
                        }
                    }
                }

                (State::InSection(section), Some(Row::Blank { line })) => {
                    if section.consumption() == Consumption::Single {
                        return Err(Error::MissingDataRow { section, line });
                    }
                    tracing::debug!("Leaving {} section after {} rows", section, consumed);
                    state = state.on_blank();
                }

                (State::InSection(section), Some(Row::Record { line, record })) => {
                    builder.consume(section, line, &record)?;
                    consumed += 1;
                    state = state.after_data();
                    if state == State::Idle {
                        tracing::debug!("Leaving {} section after {} rows", section, consumed);
                    }
                }
            }
        }

        let export = builder.finish();
        let summary = export.summary();
        tracing::info!(
            "Parsed export: {} routines, {} sessions, {} exercise logs, {} cardio logs, {} notes",
            summary.routines,
            summary.sessions,
            summary.exercise_logs,
            summary.cardio_logs,
            summary.notes
        );
        if summary.orphan_sessions > 0 {
            tracing::warn!(
                "{} sessions reference routines missing from the export",
                summary.orphan_sessions
            );
        }

        Ok(export)
    }
}

/// Accumulates records and links them as rows arrive
struct ExportBuilder {
    options: ParserOptions,
    export: ParsedExport,
}

impl ExportBuilder {
    fn new(options: ParserOptions) -> Self {
        Self {
            options,
            export: ParsedExport::default(),
        }
    }

    fn finish(self) -> ParsedExport {
        self.export
    }

    /// Decode one data row of `section`
    fn consume(&mut self, section: Section, line: usize, record: &StringRecord) -> Result<()> {
        let width = section.required_width();
        if record.len() < width {
            return Err(Error::MalformedRow {
                section,
                line,
                column: width - 1,
                len: record.len(),
            });
        }

        match section {
            Section::Settings => self.settings(record),
            Section::Routines => self.routine(record),
            Section::WorkoutSessions => self.session(line, record)?,
            Section::ExerciseLogs => self.exercise_log(line, record)?,
            Section::CardioLogs => self.cardio_log(record),
            Section::Notes => self.note(record),
        }
        Ok(())
    }

    fn settings(&mut self, record: &StringRecord) {
        if self.export.settings.is_some() {
            tracing::warn!("Ignoring repeated settings row");
            return;
        }
        self.export.settings = Some(Settings {
            mass: record[columns::settings::MASS].to_string(),
        });
    }

    fn routine(&mut self, record: &StringRecord) {
        let routine = Routine::new(
            &record[columns::routines::ID],
            &record[columns::routines::NAME],
        );
        if self.export.routines.contains_key(&routine.id) {
            tracing::warn!("Routine {} appears twice; keeping the later row", routine.id);
        }
        self.export.routines.insert(routine.id.clone(), routine);
    }

    fn session(&mut self, line: usize, record: &StringRecord) -> Result<()> {
        use columns::sessions::*;

        let raw_epoch = &record[START_EPOCH];
        let invalid = || Error::InvalidTimestamp {
            section: Section::WorkoutSessions,
            line,
            value: raw_epoch.to_string(),
        };
        let start_epoch: i64 = raw_epoch.trim().parse().map_err(|_| invalid())?;
        let start_time = format_epoch(start_epoch, self.options.timezone).ok_or_else(invalid)?;

        let session = WorkoutSession {
            id: record[ID].to_string(),
            routine_id: record[ROUTINE_ID].to_string(),
            start_epoch,
            start_time,
            exercises: Vec::new(),
            cardio_logs: Vec::new(),
        };

        match self.export.routines.get_mut(&session.routine_id) {
            Some(routine) => {
                if !routine.session_ids.contains(&session.id) {
                    routine.session_ids.push(session.id.clone());
                }
            }
            None => tracing::debug!(
                "Session {} references unknown routine {}",
                session.id,
                session.routine_id
            ),
        }

        if self.export.sessions.contains_key(&session.id) {
            tracing::warn!("Session {} appears twice; keeping the later row", session.id);
        }
        self.export.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    fn exercise_log(&mut self, line: usize, record: &StringRecord) -> Result<()> {
        use columns::exercise_logs::*;

        let session_id = &record[SESSION_ID];
        let log = ExerciseLog {
            exercise_name: record[EXERCISE_NAME].to_string(),
            logs: split_logs(&record[LOGS]),
        };

        match self.export.sessions.get_mut(session_id) {
            Some(session) => session.exercises.push(log),
            None => match self.options.dangling_sessions {
                DanglingPolicy::Error => {
                    return Err(Error::DanglingReference {
                        section: Section::ExerciseLogs,
                        line,
                        kind: "workout session",
                        id: session_id.to_string(),
                    });
                }
                DanglingPolicy::Drop => tracing::warn!(
                    "Dropping {} log at line {}: session {} does not exist",
                    log.exercise_name,
                    line,
                    session_id
                ),
            },
        }
        Ok(())
    }

    fn cardio_log(&mut self, record: &StringRecord) {
        use columns::cardio::*;

        let log = CardioLog {
            id: record[ID].to_string(),
            exercise_id: record[EXERCISE_ID].to_string(),
            duration: record[DURATION].to_string(),
            distance: record[DISTANCE].to_string(),
            date: record[record.len() - 1].to_string(),
        };

        // Substring match: an empty date matches every session
        for session in self.export.sessions.values_mut() {
            if session.start_time.contains(&log.date) {
                session.cardio_logs.push(log.clone());
            }
        }

        self.export.cardio_logs.push(log);
    }

    fn note(&mut self, record: &StringRecord) {
        use columns::notes::*;

        self.export.notes.push(Note {
            exercise_id: record[EXERCISE_ID].to_string(),
            text: record[TEXT].to_string(),
            date: record[DATE].to_string(),
        });
    }
}
