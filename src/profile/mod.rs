//! Data profiling primitives for understanding sample metadata.

mod metadata;

pub use metadata::{profile_metadata, ColumnKind, ColumnProfile, MetadataProfile};
