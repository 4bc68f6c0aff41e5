//! Causal Reorder Module
//!
//! Reshapes a raw CamFlow log so that every vertex precedes the edges that
//! reference it, and edges follow ascending `relation_id`.
//!
//! Memory: all edges are held until the log ends (no bounded-memory variant).

pub mod sorter;


pub use sorter::{reorder, reorder_file, reorder_str, ReorderReport};
