//! Chunked parallel decoder.
//!
//! This crate provides a multi-threaded execution model for copybook-rs.
//! The input is split into contiguous runs of lines, each run is decoded on
//! its own worker thread against the same shared layout, and the results
//! are stitched back together in input order. Output is identical to the
//! sequential driver for every error policy.

pub mod chunk;
pub mod executor;

pub use chunk::{Chunk, NumberedLine, Split, split_chunks};
pub use executor::decode_parallel;
