//! # Larmvakt Merge Pipeline
//!
//! The real-time aggregator tails the alert store and republishes a
//! time-ordered, dedup'd stream; the merge service folds that stream (and,
//! at run end, the exported snapshot) into a combined per-source-kind
//! severity timeline. Rendering technology beyond this data contract is
//! out of scope.

pub mod aggregator;
pub mod merge;

pub use aggregator::Aggregator;
pub use merge::{MergeError, MergeService, MergedView, SeverityCounts};
