//! End-to-end tests for vsheet-xlsx.
//!
//! Fixtures are built in memory by `common::TemplateBuilder`, which writes the
//! kind of package a spreadsheet application produces (shared strings, a
//! calculation chain, shared formulas, extension attributes), then the tests
//! load it, edit it and inspect what comes back out.

mod common;
mod roundtrip;
mod template;

pub use common::*;
