//! OpenSearch backend for facility and town search.
//!
//! Request bodies are built in [`queries`] and responses read in [`response`],
//! both as plain JSON so they can be tested without a cluster.

mod index_config;
mod provider;
pub mod queries;
pub mod response;

pub use index_config::IndexConfig;
pub use provider::OpenSearchProvider;
