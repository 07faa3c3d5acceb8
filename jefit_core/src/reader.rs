//! Logical row reader.
//!
//! The `csv` crate silently skips empty lines, but blank rows are the section
//! terminators of the export format. This reader walks physical lines itself,
//! joins lines that sit inside a quoted field, and hands each logical row to
//! `csv` for field splitting.

use crate::Result;
use csv::{ReaderBuilder, StringRecord, Terminator};
use std::io::BufRead;

const BOM: char = '\u{feff}';

/// One logical row of the export
#[derive(Clone, Debug, PartialEq)]
pub enum Row {
    /// Structurally empty row: no fields, or a single empty field
    Blank { line: usize },
    /// A row with content
    Record { line: usize, record: StringRecord },
}

impl Row {
    /// 1-based physical line the row starts on
    pub fn line(&self) -> usize {
        match self {
            Row::Blank { line } | Row::Record { line, .. } => *line,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Row::Blank { .. })
    }
}

/// Iterator over the logical rows of a CSV source
pub struct RowReader<R> {
    inner: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> RowReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line: 0,
            buf: String::new(),
        }
    }

    /// Read the next logical row, or `None` at end of input
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        let mut text = String::new();
        let mut start_line = 0;

        loop {
            self.buf.clear();
            let read = self.inner.read_line(&mut self.buf)?;
            if read == 0 {
                break;
            }
            self.line += 1;

            let mut physical = self.buf.trim_end_matches(['\n', '\r']);
            if self.line == 1 {
                physical = physical.strip_prefix(BOM).unwrap_or(physical);
            }

            if text.is_empty() && start_line == 0 {
                start_line = self.line;
            } else {
                text.push('\n');
            }
            text.push_str(physical);

            if !has_open_quote(&text) {
                break;
            }
        }

        if start_line == 0 {
            return Ok(None);
        }

        let row = if text.trim().is_empty() {
            Row::Blank { line: start_line }
        } else {
            let record = split_fields(&text)?;
            if is_structurally_empty(&record) {
                Row::Blank { line: start_line }
            } else {
                Row::Record {
                    line: start_line,
                    record,
                }
            }
        };

        Ok(Some(row))
    }
}

impl<R: BufRead> Iterator for RowReader<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

/// Whether `text` ends inside a quoted field.
///
/// A quote only opens a field when it is the field's first character; a
/// quote anywhere else in an unquoted field is literal text. Inside a quoted
/// field `""` is an escaped quote and a lone `"` closes the field.
fn has_open_quote(text: &str) -> bool {
    let mut in_quotes = false;
    let mut field_start = true;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            continue;
        }

        match c {
            '"' if field_start => {
                in_quotes = true;
                field_start = false;
            }
            ',' | '\n' => field_start = true,
            _ => field_start = false,
        }
    }

    in_quotes
}

/// Split one logical row. Only `\n` terminates a record, and the joined text
/// carries `\n` only inside quoted fields, so exactly one record is read.
fn split_fields(text: &str) -> Result<StringRecord> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .terminator(Terminator::Any(b'\n'))
        .from_reader(text.as_bytes());

    let mut record = StringRecord::new();
    if !reader.read_record(&mut record)? {
        record.clear();
    }
    Ok(record)
}

fn is_structurally_empty(record: &StringRecord) -> bool {
    match record.len() {
        0 => true,
        1 => record[0].is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(input: &str) -> Vec<Row> {
        RowReader::new(input.as_bytes())
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_blank_lines_are_reported() {
        let rows = rows("a,b\n\nc,d\n");
        assert_eq!(rows.len(), 3);
        assert!(!rows[0].is_blank());
        assert_eq!(rows[1], Row::Blank { line: 2 });
        assert_eq!(rows[2].line(), 3);
    }

    #[test]
    fn test_crlf_and_whitespace_lines() {
        let rows = rows("a,b\r\n  \r\n\"\"\r\n");
        assert_eq!(rows.len(), 3);
        assert!(rows[1].is_blank());
        assert!(rows[2].is_blank());
    }

    #[test]
    fn test_commas_only_row_is_data() {
        let rows = rows(",,\n");
        match &rows[0] {
            Row::Record { record, .. } => assert_eq!(record.len(), 3),
            other => panic!("Expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_quoted_fields() {
        let rows = rows("1,\"10,135,0,\",\"say \"\"hi\"\"\"\n");
        match &rows[0] {
            Row::Record { record, .. } => {
                assert_eq!(&record[1], "10,135,0,");
                assert_eq!(&record[2], "say \"hi\"");
            }
            other => panic!("Expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_multiline_quoted_field_keeps_line_numbers() {
        let rows = rows("a,\"first\nsecond\"\nb,c\n");
        assert_eq!(rows.len(), 2);
        match &rows[0] {
            Row::Record { line, record } => {
                assert_eq!(*line, 1);
                assert_eq!(&record[1], "first\nsecond");
            }
            other => panic!("Expected record, got {:?}", other),
        }
        assert_eq!(rows[1].line(), 3);
    }

    #[test]
    fn test_quote_inside_unquoted_field_is_literal() {
        let rows = rows("n1,used 5\" plate,x\n\nnext,row\n");
        assert_eq!(rows.len(), 3);
        match &rows[0] {
            Row::Record { line, record } => {
                assert_eq!(*line, 1);
                assert_eq!(&record[1], "used 5\" plate");
                assert_eq!(&record[2], "x");
            }
            other => panic!("Expected record, got {:?}", other),
        }
        assert_eq!(rows[1], Row::Blank { line: 2 });
        assert_eq!(rows[2].line(), 3);
    }

    #[test]
    fn test_stray_quotes_on_separate_rows_stay_separate() {
        let rows = rows("a,5\" bar\nb,ok\nc,6\" bar\n\n");
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].line(), 1);
        assert_eq!(rows[1].line(), 2);
        assert_eq!(rows[2].line(), 3);
        assert!(rows[3].is_blank());
    }

    #[test]
    fn test_lone_carriage_return_does_not_split_row() {
        let rows = rows("a,b\rc,d\n");
        assert_eq!(rows.len(), 1);
        match &rows[0] {
            Row::Record { record, .. } => assert_eq!(&record[1], "b\rc"),
            other => panic!("Expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_bom_is_stripped() {
        let rows = rows("\u{feff}mass,x\n");
        match &rows[0] {
            Row::Record { record, .. } => assert_eq!(&record[0], "mass"),
            other => panic!("Expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_last_line_without_newline() {
        let rows = rows("a,b\nc,d");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].line(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(rows("").is_empty());
    }
}
