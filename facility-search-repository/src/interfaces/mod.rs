//! Interface definitions for the storage backends.
//!
//! This module defines the abstract `FacilityStore` and `SearchIndexProvider`
//! traits that allow for dependency injection and swappable backends.

mod facility_store;
mod search_index_provider;

pub use facility_store::{FacilityStore, FacilityStream};
pub use search_index_provider::SearchIndexProvider;
