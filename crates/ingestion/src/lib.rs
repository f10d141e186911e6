//! DocQA Ingestion
//!
//! Turns uploaded or on-disk documents into plain text ready for chunking.

pub mod errors;
pub mod extract;
pub mod pdf;

pub use errors::IngestionError;
pub use extract::{
    extract_file, extractor_for, extractor_for_path, sniff_extractor, PdfExtractor,
    PlainTextExtractor, TextExtractor,
};
