//! Treatment recommendations
//!
//! - `document`: the disease/crop/region knowledge document
//! - `resolver`: crop and region fallback over a loaded document

pub mod document;
pub mod resolver;

pub use document::{KnowledgeDocument, OrderedMap, RecommendationFields, GENERAL_REGION};
pub use resolver::{resolve, ResolvedRecommendation};
