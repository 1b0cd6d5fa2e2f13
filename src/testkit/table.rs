//! Builders for in-memory test tables.

use crate::domain::MemoryTable;

/// Build a table from column names and rows of values.
pub fn table(columns: &[&str], rows: &[&[&str]]) -> MemoryTable {
    let mut table = MemoryTable::new(columns.iter().copied());
    for row in rows {
        table.push_row(row.iter().copied());
    }
    table
}

/// A single-column question table with `n` numbered questions.
pub fn questions(n: usize) -> MemoryTable {
    let mut table = MemoryTable::new(["question"]);
    for i in 0..n {
        table.push_row([format!("question {i}")]);
    }
    table
}
