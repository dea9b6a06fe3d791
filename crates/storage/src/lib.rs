//! Data handle implementations for taskwire.
//!
//! This crate provides the storage backends behind the
//! [`DataHandle`](taskwire_core::DataHandle) trait: an embedded in-memory
//! value and a value persisted as a JSON document.

#![warn(missing_docs)]

pub mod memory;
#[cfg(feature = "json")]
pub mod json_file;

pub use memory::InMemoryDataHandle;
#[cfg(feature = "json")]
pub use json_file::JsonFileDataHandle;
