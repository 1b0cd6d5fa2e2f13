//! Prompt template compilation and rendering.
//!
//! A template is a string with `{{column}}` placeholders, e.g.
//! `"Hello {{name}}, you are {{age}}."`. Compilation splits it once into
//! alternating literal segments and column references; rendering against a
//! row concatenates the literals with the referenced row values inserted in
//! place. Compilation happens once per prediction call, rendering once per
//! row.

use crate::domain::table::Table;
use crate::error::{ConfigError, Error, Result};

/// A compiled prompt template.
///
/// Invariant: `segments.len() == columns.len() + 1`. Rendering emits
/// `segments[0], row[columns[0]], segments[1], row[columns[1]], ...`
/// finishing with the trailing literal segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSpec {
    segments: Vec<String>,
    columns: Vec<String>,
}

impl TemplateSpec {
    /// Compile a template string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MalformedTemplate`] if the string contains no
    /// `{{column}}` placeholders; template mode makes no sense without at
    /// least one column reference, and the caller should use a question
    /// column instead.
    pub fn compile(template: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut columns = Vec::new();
        let mut rest = template;

        while let Some(open) = rest.find("{{") {
            let after = &rest[open + 2..];
            // An unterminated "{{" is literal text, not a placeholder.
            let Some(close) = after.find("}}") else {
                break;
            };
            segments.push(rest[..open].to_string());
            columns.push(after[..close].to_string());
            rest = &after[close + 2..];
        }
        segments.push(rest.to_string());

        if columns.is_empty() {
            return Err(ConfigError::MalformedTemplate.into());
        }
        Ok(Self { segments, columns })
    }

    /// Column names referenced by the template, in order of appearance.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Render the template against one row of the table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingColumn`] if a referenced column is absent
    /// from the row. The caller fails the whole call on the first offending
    /// row; a partially substituted prompt would corrupt the completion.
    pub fn render(&self, table: &dyn Table, row: usize) -> Result<String> {
        let mut out = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            out.push_str(segment);
            if let Some(column) = self.columns.get(i) {
                let value = table.value(row, column).ok_or_else(|| Error::MissingColumn {
                    column: column.clone(),
                    row,
                })?;
                out.push_str(&value);
            }
        }
        Ok(out)
    }
}
