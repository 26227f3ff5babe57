//! In-memory implementation of the document store.
//!
//! Mirrors the MongoDB semantics closely enough to run the import passes,
//! aggregations and projections without a database, for tests and dry runs.

mod store;

pub use store::InMemoryFacilityStore;
