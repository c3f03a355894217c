//! Testing utilities and mock implementations
//!
//! This module provides mock implementations for testing dispatch and
//! pipeline behavior without running agent HTTP servers.

pub mod mocks;

pub use mocks::*;
