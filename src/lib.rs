//! Lead Intake - conversational lead qualification for a legal directory
//!
//! A visitor describes their situation in free text. The engine detects the
//! legal category, collects the fields that category's marketplace requires
//! one turn at a time, asks for confirmation and submits the assembled lead.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
