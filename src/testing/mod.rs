//! Headless testing support.
//!
//! [`Harness`] mounts a component without any host UI and records the output
//! of every render, so state sequences can be asserted exactly.

pub mod harness;

pub use harness::Harness;
