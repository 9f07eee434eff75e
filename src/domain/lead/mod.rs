//! Lead module - the marketplace-ready record.

mod format;
mod payload;

pub use format::{format_date, format_for_marketplace, format_phone, DateFormat, PhoneFormat};
pub use payload::{LeadPayload, SubmissionContext};
