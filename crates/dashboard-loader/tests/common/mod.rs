//! Shared test utilities for dashboard-loader integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated runs with temporary output and manifest trees
//! - `ConfigMapBuilder` for creating resources and manifests programmatically

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
