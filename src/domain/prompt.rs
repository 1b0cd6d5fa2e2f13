//! Prompt construction for a batch of rows.
//!
//! A [`PromptSet`] is the ordered list of fully-rendered prompt strings for
//! every row of the input table, built according to the configured
//! [`PromptMode`]. Order is the contract for matching completions back to
//! rows, so the builder covers every row exactly once in row order.

use crate::config::PromptConfig;
use crate::domain::table::Table;
use crate::domain::template::TemplateSpec;
use crate::error::{ConfigError, Error, Result};

/// A single rendered prompt plus its original row index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    row: usize,
    text: String,
}

impl Prompt {
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// The ordered prompts for one prediction call.
#[derive(Debug, Clone, Default)]
pub struct PromptSet {
    prompts: Vec<Prompt>,
}

impl PromptSet {
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Prompt> {
        self.prompts.iter()
    }

    /// All prompt texts in order, as owned strings for a request body.
    pub fn texts(&self) -> Vec<String> {
        self.prompts.iter().map(|p| p.text.clone()).collect()
    }

    /// The prompts in `range`, as owned strings for a request body.
    pub fn slice_texts(&self, start: usize, len: usize) -> Vec<String> {
        self.prompts[start..start + len]
            .iter()
            .map(|p| p.text.clone())
            .collect()
    }
}

/// How a row becomes a prompt.
///
/// Exactly one mode applies per prediction call; mode selection is validated
/// before any prompt is built.
#[derive(Debug, Clone)]
pub enum PromptMode {
    /// Render a compiled `{{column}}` template per row.
    Template(TemplateSpec),
    /// `"Context: {context}\nQuestion: {question}\nAnswer: "` per row.
    QuestionContext { question: String, context: String },
    /// The question column's value, verbatim.
    Question { question: String },
}

impl PromptMode {
    /// Select and validate the mode from configuration.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::AmbiguousPromptMode`] if both or neither of
    ///   `prompt_template` and `question_column` are set.
    /// - [`ConfigError::ContextWithoutQuestion`] if `context_column` is set
    ///   without `question_column`.
    /// - [`ConfigError::MalformedTemplate`] if the template has no
    ///   placeholders.
    pub fn from_config(config: &PromptConfig) -> Result<Self> {
        match (&config.prompt_template, &config.question_column) {
            (Some(_), Some(_)) | (None, None) => Err(ConfigError::AmbiguousPromptMode.into()),
            (Some(template), None) => {
                if config.context_column.is_some() {
                    return Err(ConfigError::ContextWithoutQuestion.into());
                }
                Ok(Self::Template(TemplateSpec::compile(template)?))
            }
            (None, Some(question)) => match &config.context_column {
                Some(context) => Ok(Self::QuestionContext {
                    question: question.clone(),
                    context: context.clone(),
                }),
                None => Ok(Self::Question {
                    question: question.clone(),
                }),
            },
        }
    }

    /// Columns the mode requires the table schema to contain up front.
    ///
    /// Template references are checked lazily at render time instead, where
    /// the offending row index is known.
    fn required_columns(&self) -> Vec<&str> {
        match self {
            Self::Template(_) => Vec::new(),
            Self::QuestionContext { question, context } => vec![question, context],
            Self::Question { question } => vec![question],
        }
    }
}

/// Build the ordered [`PromptSet`] covering every row of `table`.
///
/// Question and context columns are validated against the schema before any
/// row is rendered, so misconfiguration fails before any API spend.
///
/// # Errors
///
/// Returns [`ConfigError::MissingTableColumn`] for an absent question or
/// context column, or [`Error::MissingColumn`] for the first row a template
/// reference cannot be resolved against.
pub fn build_prompts(table: &dyn Table, mode: &PromptMode) -> Result<PromptSet> {
    for column in mode.required_columns() {
        if !table.has_column(column) {
            return Err(ConfigError::MissingTableColumn {
                column: column.to_string(),
            }
            .into());
        }
    }

    let mut prompts = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        let text = match mode {
            PromptMode::Template(spec) => spec.render(table, row)?,
            PromptMode::QuestionContext { question, context } => {
                let c = column_value(table, row, context)?;
                let q = column_value(table, row, question)?;
                format!("Context: {c}\nQuestion: {q}\nAnswer: ")
            }
            PromptMode::Question { question } => column_value(table, row, question)?,
        };
        prompts.push(Prompt { row, text });
    }
    Ok(PromptSet { prompts })
}

fn column_value(table: &dyn Table, row: usize, column: &str) -> Result<String> {
    table.value(row, column).ok_or_else(|| Error::MissingColumn {
        column: column.to_string(),
        row,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::MemoryTable;

    fn qa_table() -> MemoryTable {
        let mut table = MemoryTable::new(["question", "context"]);
        table.push_row(["What is 2+2?", "Arithmetic."]);
        table.push_row(["Capital of France?", "Geography."]);
        table
    }

    fn config(
        template: Option<&str>,
        question: Option<&str>,
        context: Option<&str>,
    ) -> PromptConfig {
        PromptConfig {
            prompt_template: template.map(String::from),
            question_column: question.map(String::from),
            context_column: context.map(String::from),
        }
    }

    #[test]
    fn question_mode_uses_value_verbatim() {
        let mode = PromptMode::from_config(&config(None, Some("question"), None)).unwrap();
        let prompts = build_prompts(&qa_table(), &mode).unwrap();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts.iter().next().unwrap().text(), "What is 2+2?");
    }

    #[test]
    fn question_context_mode_uses_fixed_layout() {
        let mode =
            PromptMode::from_config(&config(None, Some("question"), Some("context"))).unwrap();
        let prompts = build_prompts(&qa_table(), &mode).unwrap();
        assert_eq!(
            prompts.iter().next().unwrap().text(),
            "Context: Arithmetic.\nQuestion: What is 2+2?\nAnswer: "
        );
    }

    #[test]
    fn template_mode_renders_each_row() {
        let mode =
            PromptMode::from_config(&config(Some("Q: {{question}}"), None, None)).unwrap();
        let prompts = build_prompts(&qa_table(), &mode).unwrap();
        let texts: Vec<_> = prompts.iter().map(|p| p.text().to_string()).collect();
        assert_eq!(texts, vec!["Q: What is 2+2?", "Q: Capital of France?"]);
    }

    #[test]
    fn prompts_carry_row_indices_in_order() {
        let mode = PromptMode::from_config(&config(None, Some("question"), None)).unwrap();
        let prompts = build_prompts(&qa_table(), &mode).unwrap();
        let rows: Vec<_> = prompts.iter().map(Prompt::row).collect();
        assert_eq!(rows, vec![0, 1]);
    }

    #[test]
    fn both_template_and_question_is_ambiguous() {
        let err =
            PromptMode::from_config(&config(Some("{{q}}"), Some("question"), None)).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::AmbiguousPromptMode)
        ));
    }

    #[test]
    fn neither_template_nor_question_is_ambiguous() {
        let err = PromptMode::from_config(&config(None, None, None)).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::AmbiguousPromptMode)
        ));
    }

    #[test]
    fn context_without_question_is_rejected() {
        let err =
            PromptMode::from_config(&config(Some("{{q}}"), None, Some("context"))).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::ContextWithoutQuestion)
        ));
    }

    #[test]
    fn missing_question_column_fails_before_rendering() {
        let mode = PromptMode::from_config(&config(None, Some("query"), None)).unwrap();
        let err = build_prompts(&qa_table(), &mode).unwrap_err();
        match err {
            Error::Config(ConfigError::MissingTableColumn { column }) => {
                assert_eq!(column, "query");
            }
            other => panic!("expected MissingTableColumn, got {other:?}"),
        }
    }

    #[test]
    fn empty_table_builds_empty_set() {
        let table = MemoryTable::new(["question"]);
        let mode = PromptMode::from_config(&config(None, Some("question"), None)).unwrap();
        let prompts = build_prompts(&table, &mode).unwrap();
        assert!(prompts.is_empty());
    }
}
