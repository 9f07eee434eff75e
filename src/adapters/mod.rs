//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the application to external systems:
//! - `ai` - OpenAI-compatible completions, mock and disabled providers
//! - `catalog` - category document sources (YAML file, in-memory)
//! - `geocoding` - Zippopotam.us postal-code lookup and a mock
//! - `http` - axum routes for the intake widget
//! - `marketplace` - HTTP lead marketplace and a mock
//! - `storage` - in-memory and PostgreSQL session stores

pub mod ai;
pub mod catalog;
pub mod geocoding;
pub mod http;
pub mod marketplace;
pub mod storage;
