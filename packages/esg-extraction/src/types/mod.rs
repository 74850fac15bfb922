//! Data types for the extraction engine.

pub mod config;
pub mod context;
pub mod indicator;
pub mod result;
pub mod run;
