//! Test utilities and fixtures for market history testing
//!
//! - rstest fixtures for assets, ledgers and factories
//! - seeded factories for mirrored fills and block streams
//! - logging and block helpers

pub mod fixtures;
pub mod helpers;

pub use factories::*;
pub use fixtures::*;
pub use helpers::*;
