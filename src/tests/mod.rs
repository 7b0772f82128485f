//! Crate-internal test suites.

mod property;
