//! # Glacis Parallel
//!
//! Parallel processing strategies for the glacier pipeline.
//!
//! This crate provides:
//! - `ProcessingMode`: sequential, rayon global pool, or a sized pool
//! - `TileIterator`: non-overlapping tiles for memory-bounded reductions

pub mod strategy;
pub mod tiled;

pub use strategy::{ParallelStrategy, ProcessingMode};
pub use tiled::{Tile, TileIterator};
