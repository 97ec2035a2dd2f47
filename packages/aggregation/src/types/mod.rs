//! Data types for the aggregation library.

pub mod artifact;
pub mod config;
pub mod record;
