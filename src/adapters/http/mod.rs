//! HTTP adapters - REST API implementations.

pub mod intake;

pub use intake::{app_router, intake_routes, IntakeHandlers};
