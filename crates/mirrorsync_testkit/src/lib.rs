//! # MirrorSync Testkit
//!
//! Test utilities for MirrorSync.
//!
//! This crate provides:
//! - A sample schema covering every node kind and dirty policy
//! - Property-based edit generators using proptest
//! - A loopback harness for sender/receiver convergence checks
//! - Golden test utilities for wire format verification
//! - Fuzz targets for decoding and applying untrusted messages
//! - Wire vectors with their canonical encodings
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mirrorsync_testkit::prelude::*;
//!
//! #[test]
//! fn replicas_converge() {
//!     let mut link = Loopback::new(game_context("s"), blank_game_context("r")).unwrap();
//!     link.sender.get_mut::<Player>("alice").unwrap().set_name("al".into());
//!     link.tick().unwrap();
//!     link.assert_converged();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod fuzz;
pub mod generators;
pub mod golden;
pub mod harness;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::fuzz::*;
    pub use crate::generators::*;
    pub use crate::harness::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
pub use golden::*;
pub use harness::*;
pub use vectors::*;
