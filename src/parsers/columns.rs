//! Declared column layouts for whitespace-separated command output
//!
//! Each source declares the columns it reads once, in a `Schema`. Rows that
//! do not have the columns a schema needs are rejected here with a
//! `SkipReason` instead of being indexed blindly by the caller.

/// Why a row contributed no fact
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("blank line")]
    Blank,

    #[error("header, footer or other non-data line")]
    NotDataRow,

    #[error("expected at least {expected} columns, found {found}")]
    TooFewColumns { expected: usize, found: usize },

    #[error("expected {expected} columns, found {found}")]
    ColumnCount { expected: usize, found: usize },

    #[error("no owning process in column '{0}'")]
    NoProcess(String),

    #[error("address '{0}' has no port")]
    NoPort(String),

    #[error("protocol '{0}' not collected")]
    Protocol(String),

    #[error("connection state '{0}' not collected")]
    State(String),
}

/// A row that was skipped, with its 1-based line number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub line: usize,
    pub reason: SkipReason,
}

/// Output of one parser: the facts plus the rows it could not use
#[derive(Debug, Clone, Default)]
pub struct Parsed<T> {
    pub facts: T,
    pub skipped: Vec<SkippedRow>,
}

impl<T> Parsed<T> {
    pub fn new(facts: T) -> Self {
        Self { facts, skipped: Vec::new() }
    }

    pub fn skip(&mut self, line: usize, reason: SkipReason) {
        self.skipped.push(SkippedRow { line, reason });
    }

    /// Rows skipped for something other than being blank or decoration
    pub fn malformed(&self) -> usize {
        self.skipped
            .iter()
            .filter(|s| !matches!(s.reason, SkipReason::Blank | SkipReason::NotDataRow))
            .count()
    }
}

/// One named column of a source format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub index: usize,
    pub name: &'static str,
}

impl Column {
    pub const fn new(index: usize, name: &'static str) -> Self {
        Self { index, name }
    }
}

/// Column layout of one source format
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    /// Source name for log messages
    pub source: &'static str,
    /// Every column the parser reads
    pub columns: &'static [Column],
}

impl Schema {
    /// Minimum number of columns a row needs
    pub const fn width(&self) -> usize {
        let mut max = 0;
        let mut i = 0;
        while i < self.columns.len() {
            if self.columns[i].index + 1 > max {
                max = self.columns[i].index + 1;
            }
            i += 1;
        }
        max
    }

    /// Split `line` and check it is wide enough for every declared column
    pub fn split<'a>(&self, line: &'a str) -> Result<Row<'a>, SkipReason> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            return Err(SkipReason::Blank);
        }
        if fields.len() < self.width() {
            return Err(SkipReason::TooFewColumns {
                expected: self.width(),
                found: fields.len(),
            });
        }
        Ok(Row { schema: *self, fields })
    }
}

/// A row that satisfied its schema's width
#[derive(Debug)]
pub struct Row<'a> {
    schema: Schema,
    fields: Vec<&'a str>,
}

impl<'a> Row<'a> {
    /// Value of a declared column
    pub fn get(&self, column: Column) -> &'a str {
        debug_assert!(
            self.schema.columns.contains(&column),
            "column '{}' not declared in {} schema",
            column.name,
            self.schema.source
        );
        self.fields.get(column.index).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[&'a str] {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: Column = Column::new(0, "name");
    const STATE: Column = Column::new(2, "state");
    const PID: Column = Column::new(5, "pid");

    const TEST: Schema = Schema {
        source: "test",
        columns: &[NAME, STATE],
    };

    #[test]
    fn test_schema_width() {
        assert_eq!(TEST.width(), 3);
    }

    #[test]
    fn test_split_reads_declared_columns() {
        let row = TEST.split("ssh loaded active running").unwrap();
        assert_eq!(row.get(NAME), "ssh");
        assert_eq!(row.get(STATE), "active");
        assert_eq!(row.len(), 4);
    }

    #[test]
    fn test_split_too_narrow() {
        assert_eq!(
            TEST.split("ssh loaded").unwrap_err(),
            SkipReason::TooFewColumns { expected: 3, found: 2 }
        );
        assert_eq!(TEST.split("   \t").unwrap_err(), SkipReason::Blank);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "not declared")]
    fn test_undeclared_column_panics_in_debug() {
        let row = TEST.split("a b c").unwrap();
        row.get(PID);
    }

    #[test]
    fn test_malformed_count_ignores_decoration() {
        let mut parsed = Parsed::new(());
        parsed.skip(1, SkipReason::NotDataRow);
        parsed.skip(2, SkipReason::Blank);
        parsed.skip(3, SkipReason::NoProcess("-".into()));
        assert_eq!(parsed.malformed(), 1);
        assert_eq!(parsed.skipped.len(), 3);
    }
}
