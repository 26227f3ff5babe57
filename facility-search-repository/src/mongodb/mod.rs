//! MongoDB implementation of the facility document store.
//!
//! This module provides a concrete implementation of `FacilityStore` backed by
//! a single MongoDB collection holding one nested document per facility.

mod pipelines;
mod store;

pub use store::MongoFacilityStore;
