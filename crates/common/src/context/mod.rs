//! Document context handling
//!
//! Long documents are answered window by window:
//! - Word-window chunking with overlap
//! - Per-chunk QA calls with best-answer selection

mod chunker;
mod resolver;

pub use chunker::{chunk, chunk_with, Chunk, Chunks};
pub use resolver::{
    resolve_best_answer, CandidateAnswer, ChunkedQaResolver, Resolution, ResolverOptions,
};
