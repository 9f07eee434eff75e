//! Schema module - validation generated from category configuration.

mod rule;
#[allow(clippy::module_inception)]
mod schema;

pub use rule::ValidationRule;
pub use schema::{CategorySchema, FieldError, FieldSchema, SchemaViolations};
