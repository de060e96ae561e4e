//! End-to-end export tests.
//!
//! The standard template is built in memory (`common::standard_template`),
//! written to xlsx bytes, exported with the built-in spec and adapter, and
//! the output is read back from the sink.

mod adapter;
mod common;
mod export;

pub use common::*;
