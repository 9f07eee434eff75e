//! Category module - static per-category configuration and detection.

mod config;
mod detection;
mod errors;

pub use config::{
    CategoryConfig, CategoryConfigSet, ConversationStep, FieldDefinition, FieldSource, FieldType,
    MarketplaceRouting, SubCategory,
};
pub use detection::{
    detect_by_keywords, match_category, match_sub_category, Confidence, Detection,
    MIN_SUB_CATEGORY_SCORE, OTHER_SUB_CATEGORY,
};
pub use errors::CatalogError;
