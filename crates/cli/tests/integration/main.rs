//! End-to-end tests of the j2v8-build binary.

mod build_tests;
mod cache_tests;
mod common;
mod preset_tests;
