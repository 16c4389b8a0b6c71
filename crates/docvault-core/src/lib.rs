//! Core types, traits, and configurations for DocVault

pub mod config;
pub mod types;

// Re-export specific items to avoid ambiguity
pub use config::*;
pub use types::*;
