//! Session store adapters.

mod in_memory_session_store;
mod postgres_session_store;

pub use in_memory_session_store::InMemorySessionStore;
pub use postgres_session_store::PostgresSessionStore;
