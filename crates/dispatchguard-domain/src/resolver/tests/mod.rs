//! Tests for the check resolver chain.
//!
//! Organized by functionality:
//! - Dispatch throttling admission and pacing
//! - Delegation transparency
//! - Shutdown behavior
//! - Chain assembly


#[cfg(test)]
mod builder_tests;
