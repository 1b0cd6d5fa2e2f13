//! Named-column row access.
//!
//! The crate does not own tabular I/O; callers hand rows in through the
//! [`Table`] trait, which is the narrow contract the prompt builder needs:
//! a row count, a schema check, and per-row lookup of a named column as
//! text. [`MemoryTable`] is a simple owned implementation for callers that
//! already have their rows in memory.

/// Read access to a table of rows with named columns.
///
/// Values are coerced to text by the implementation; the prompt builder
/// inserts them verbatim.
pub trait Table: Send + Sync {
    /// Number of rows.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the table's schema contains the named column.
    fn has_column(&self, name: &str) -> bool;

    /// The text value at `(row, column)`, or `None` if the column is absent.
    fn value(&self, row: usize, column: &str) -> Option<String>;
}

/// An owned, row-major in-memory table.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl MemoryTable {
    /// Create an empty table with the given column names.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Values are positional, matching the column order;
    /// missing trailing values read back as absent.
    pub fn push_row<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(values.into_iter().map(Into::into).collect());
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl Table for MemoryTable {
    fn len(&self) -> usize {
        self.rows.len()
    }

    fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    fn value(&self, row: usize, column: &str) -> Option<String> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(col).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MemoryTable {
        let mut table = MemoryTable::new(["name", "age"]);
        table.push_row(["Ada", "30"]);
        table.push_row(["Grace", "36"]);
        table
    }

    #[test]
    fn reports_length_and_schema() {
        let table = sample();
        assert_eq!(table.len(), 2);
        assert!(!table.is_empty());
        assert!(table.has_column("name"));
        assert!(!table.has_column("email"));
    }

    #[test]
    fn looks_up_values_by_row_and_column() {
        let table = sample();
        assert_eq!(table.value(0, "name").as_deref(), Some("Ada"));
        assert_eq!(table.value(1, "age").as_deref(), Some("36"));
    }

    #[test]
    fn absent_column_or_row_is_none() {
        let table = sample();
        assert_eq!(table.value(0, "email"), None);
        assert_eq!(table.value(9, "name"), None);
    }

    #[test]
    fn short_row_reads_back_as_absent() {
        let mut table = MemoryTable::new(["a", "b"]);
        table.push_row(["only-a"]);
        assert_eq!(table.value(0, "a").as_deref(), Some("only-a"));
        assert_eq!(table.value(0, "b"), None);
    }
}
