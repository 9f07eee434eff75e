//! Category source adapters.

mod in_memory_source;
mod yaml_source;

pub use in_memory_source::InMemoryCategorySource;
pub use yaml_source::YamlCategorySource;
