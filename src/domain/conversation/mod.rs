//! Conversation module - prompt wording and reply interpretation.

mod intent;
mod prompts;
pub mod replies;

pub use intent::{classify, Intent};
pub use prompts::{clarifying_prompt, field_prompt, render_template, summary_prompt, REASK_PREFIX};
