//! Artloader - asynchronous album artwork loading.
//!
//! This crate fetches artwork off the UI thread through a bounded queue and a
//! fixed worker pool, keeps recent renditions in an LRU cache, renders
//! reflections for large artwork and hands results back to the UI thread
//! for staleness-checked delivery.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing the loader and its adapters.
pub mod infrastructure;
/// Presentation layer containing the artwork consumer targets.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "artloader";
