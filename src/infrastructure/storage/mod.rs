//! Storage adapters for askdocs.
//!
//! Exposes the embedded sled-backed vector index that answers
//! nearest-neighbour queries for the retriever.

pub mod sled_store;

pub use sled_store::SledVectorStore;
