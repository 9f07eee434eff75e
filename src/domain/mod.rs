//! Domain layer containing the intake rules and types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, error codes, state machine)
//! - `session` - Intake session aggregate, stage machine and partial updates
//! - `category` - Category configuration model and keyword detection
//! - `extraction` - Value normalization, pattern extraction, AI response parsing
//! - `schema` - Validation rules generated from category configuration
//! - `lead` - Payload assembly and marketplace formatting
//! - `conversation` - Prompt rendering and confirmation intent

pub mod category;
pub mod conversation;
pub mod extraction;
pub mod foundation;
pub mod lead;
pub mod schema;
pub mod session;
