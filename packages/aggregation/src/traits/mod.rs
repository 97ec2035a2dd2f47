//! Core trait abstractions for the aggregation library.
//!
//! Applications implement these to plug their data sources into the
//! pipeline.

pub mod fetcher;
