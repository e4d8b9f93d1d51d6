#![doc = "codeclarity-core: document lifecycle library for codeclarity."]

//! This crate contains the storage-side logic for merge request documentation and
//! release notes: naming, bucket resolution, deduplication, release aggregation and
//! relocation of per-commit documents. Concrete network clients live in the CLI crate.
//!
//! # Usage
//! Construct an [`contract::ObjectStore`] implementation (for example
//! [`memory::MemoryObjectStore`]) and drive the workflows in [`publish`].

pub mod aggregate;
pub mod bucket;
pub mod codec;
pub mod contract;
pub mod error;
pub mod guard;
pub mod memory;
pub mod publish;
pub mod relocate;
pub mod request;
pub mod store;

pub use error::{Result, StoreError};
