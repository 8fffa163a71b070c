//! Per-source-type connector implementations.

pub mod object_store;
pub mod relational;
