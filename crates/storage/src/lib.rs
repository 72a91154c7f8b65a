//! Storage abstraction and implementations for Ember.
//!
//! This crate provides a trait-based store interface with a JSON-file
//! reference implementation and an in-memory backend for tests.

#![warn(missing_docs)]

pub mod json_store;
pub mod memory_store;
pub mod trait_;

pub use json_store::JsonStore;
pub use memory_store::MemoryStore;
pub use trait_::{Result, Store, StoreError};
