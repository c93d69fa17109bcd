//! sfxlib - self-extractor decompressor module library builder
//!
//! Builds the packed libraries of Plus/4 self-extractor decompressor stubs:
//! one compiled module per mode index, located at run time through a header
//! table of `(offset, length)` pairs. Also reads such libraries back for
//! inspection and module extraction.

// Enforce strict code quality and reliability
#![deny(
    // Safety
    unsafe_code,

    // Correctness
    missing_debug_implementations,
    unreachable_pub,

    // Future compatibility
    future_incompatible,

    // Rust 2018 idioms
    rust_2018_idioms,
)]
#![warn(
    // Error handling best practices
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::unimplemented,
    clippy::todo,

    // Performance
    clippy::inefficient_to_string,
    clippy::large_enum_variant,

    // Code clarity and maintainability
    clippy::cognitive_complexity,
    clippy::too_many_arguments,
    clippy::type_complexity,

    // Best practices
    clippy::clone_on_ref_ptr,
    clippy::wildcard_imports,
    clippy::enum_glob_use,
    clippy::if_not_else,
    clippy::single_match_else,
    clippy::needless_continue,
    clippy::explicit_iter_loop,
    clippy::explicit_into_iter_loop,
)]
#![allow(
    missing_docs,  // Field-level docs are only kept where they add something
)]

pub mod api;
pub mod exceptions;
pub mod exit_codes;
pub mod logger;
pub mod sfx;
pub mod utils;
pub mod version;

// Re-export main API functions
pub use api::{
    BuildOptions, LibrarySummary, build_families, build_family, extract_module, inspect_library,
};
pub use exceptions::SfxError;

// Re-export pipeline types for advanced usage
pub use sfx::{Family, ModeIndex, RunAddress, VariantConfig};
