//! Test utilities shared by unit and integration tests
//!
//! Fixtures build established channels and unlocked accounts; mocks stand in
//! for the channel crypto backend and the remote runtime.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
