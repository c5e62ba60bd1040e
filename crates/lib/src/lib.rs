//! jsbuild-lib: build pipeline for a compile-to-JavaScript toolchain
//!
//! This crate provides everything behind the `jsbuild` command:
//! - `config`: the TOML build description and its named targets
//! - `compile`: the token-level compiler with `advanced` renaming
//! - `externs`: declarations that keep external symbols from being renamed
//! - `build`: single passes and the `once`/`watch` entry point
//! - `watch`: per-target watch sessions with debounced recompilation

pub mod build;
pub mod clean;
pub mod compile;
pub mod config;
pub mod consts;
pub mod error;
pub mod externs;
pub mod hooks;
pub mod util;
pub mod watch;
