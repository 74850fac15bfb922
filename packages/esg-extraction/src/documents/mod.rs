//! Document source implementations.
//!
//! Available backends:
//! - `InMemorySource` - Pages held in memory (always available)
//! - `PdfSource` - PDF files via `pdf-extract` (requires `pdf` feature)

pub mod memory;

#[cfg(feature = "pdf")]
pub mod pdf;

pub use memory::{InMemoryDocument, InMemorySource};

#[cfg(feature = "pdf")]
pub use pdf::PdfSource;
