//! Core trait abstractions for the extraction engine.
//!
//! These define the seams applications implement to provide documents,
//! model backends, embeddings and storage.

pub mod document;
pub mod index;
pub mod model;
pub mod store;
