//! Service modules for the metadata reconciliation engine

pub mod candidate_aggregator;
pub mod candidate_scorer;
pub mod confidence;
pub mod cover_resolver;
pub mod merge_engine;
pub mod provenance;
pub mod review;

pub use candidate_aggregator::{derive_temp_ref, CandidateAggregator};
pub use cover_resolver::{CoverResolver, HttpCoverResolver, NullCoverResolver};
pub use merge_engine::MergeEngine;
pub use review::TrackDiff;
