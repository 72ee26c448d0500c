//! Core types for the metadata store.
//!
//! Every entry in the store is a pair of a validated string key and an
//! arbitrary JSON document. This crate owns the rules that make a key valid
//! and the shapes that the repository, service, and HTTP layers exchange.
//!
//! # Modules
//!
//! - [`error`]: [`KeyError`], the reason a key was rejected
//! - [`key`]: [`validate_key`] and the [`MetadataKey`] newtype
//! - [`entry`]: [`MetadataEntry`] and [`PartialDocument`]

pub mod entry;
pub mod error;
pub mod key;

pub use entry::{MetadataEntry, PartialDocument};
pub use error::KeyError;
pub use key::{validate_key, MetadataKey};
