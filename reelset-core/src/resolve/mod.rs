//! Per-collection resolvers for posters and summaries.

pub mod collection_ref;
pub mod poster;
pub mod summary;

pub use collection_ref::resolve_collection_ref;
pub use poster::{PosterOutcome, PosterResolver, PosterSettings};
pub use summary::{SummaryOutcome, SummaryResolver};
