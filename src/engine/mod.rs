//! Engine Module
//!
//! Wraps the session logic for hosts: profile store boundary, snapshots,
//! transcripts and an async runtime.
//!
//! ## Module Structure
//!
//! - `profile`: Player profile and the `ProfileStore` trait
//! - `session`: `GameEngine`, the single entry point per stimulus
//! - `snapshot`: Read-only state view for the presentation layer
//! - `runtime`: tokio task with command queue, tick timer and event fan-out

pub mod profile;
pub mod session;
pub mod snapshot;
pub mod runtime;

pub use profile::{Profile, ProfileStore};
pub use session::GameEngine;
pub use snapshot::EngineSnapshot;
pub use runtime::{spawn_engine, EngineHandle, RuntimeConfig, RuntimeError};
