//! Infrastructure layer: document store adapters, batched writes and the
//! inventory deduction services built on them.

pub mod batch;
pub mod catalog;
pub mod config;
pub mod deduction;
pub mod store;
