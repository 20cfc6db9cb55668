//! Product recommendations for shoppers and restock advice for owners.
//!
//! Store data is summarized into a bounded text context, wrapped in a
//! role-specific prompt and handed to a [`RecommendationGenerator`]. The
//! reply is parsed leniently: malformed output becomes an empty list.

pub mod context;
pub mod error;
pub mod generator;
pub mod response;
pub mod service;

pub use context::{ContextBuilder, ContextLimits, format_client_context, format_owner_context};
pub use error::{RecommendError, Result};
pub use generator::{RecommendationGenerator, StaticGenerator, build_prompt};
pub use response::{
    ClientRecommendation, OwnerRecommendation, Priority, RecommendRole, RecommendationKind,
    RecommendationResponse, Recommendations, parse_recommendations, strip_code_fence,
};
pub use service::RecommendationService;
