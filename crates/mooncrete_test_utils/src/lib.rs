//! # Mooncrete Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Fixtures and recording collaborators
//! - Determinism test harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
