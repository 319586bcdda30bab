//! Burrow core: scanning, caching, and the navigation engine.
//!
//! This crate contains all business logic with zero UI dependencies.
//!
//! # Modules
//!
//! - [`model`]: scan data model and size formatting.
//! - [`scanner`]: bounded size estimation and parallel directory scans.
//! - [`cache`]: persistent two-tier scan cache.
//! - [`nav`]: the interactive navigation state machine.
//! - [`patterns`]: fixed skip and cleanable name sets.
//! - [`config`]: tunable limits and cache policy.
pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod nav;
pub mod patterns;
pub mod scanner;
