//! Service-agnostic domain logic: templates, prompts, batches, usage.

mod batch;
mod prompt;
mod table;
mod template;
mod usage;

pub use batch::{plan, Batch};
pub use prompt::{build_prompts, Prompt, PromptMode, PromptSet};
pub use table::{MemoryTable, Table};
pub use template::TemplateSpec;
pub use usage::Usage;
