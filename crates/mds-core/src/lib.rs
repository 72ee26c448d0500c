//! Metadata repository and service.
//!
//! The [`MetadataService`] is the entry point for every operation: it
//! validates keys, then delegates to a [`MetadataRepository`], which runs each
//! operation as one value-store transaction and translates storage signals
//! into the [`MetadataError`] taxonomy.
//!
//! Partial updates are a shallow merge (see [`merge`]): top-level fields of
//! the partial document overwrite or extend the stored document, nested
//! values are replaced wholesale. The read and the write of a merge share one
//! transaction, so concurrent merges on the same key never lose an update.

pub mod error;
pub mod factory;
pub mod merge;
pub mod repository;
pub mod service;

pub use error::{BodyError, MetadataError, MetadataResult};
pub use factory::MetadataFactory;
pub use merge::{into_object, shallow_merge};
pub use repository::{MetadataRepository, StoreRepository};
pub use service::MetadataService;
