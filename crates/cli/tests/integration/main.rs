//! CLI integration tests for jsbuild.

mod common;

mod auto_tests;
mod clean_tests;
mod config_tests;
mod info_tests;
mod once_tests;
#[cfg(unix)]
mod test_tests;
