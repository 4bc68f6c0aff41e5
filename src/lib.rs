//! provflow - cross-namespace flow analysis for CamFlow/SPADE provenance logs

pub mod config;
pub mod constants;
pub mod error;
pub mod logic;

pub use error::{ProvError, ProvResult};
