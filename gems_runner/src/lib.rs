//! Headless runner for GEMS environments.
//!
//! An environment is a YAML file of views, objects and rules. Each rule pairs
//! a trigger with an optional condition and an action, all written as single
//! constant-argument calls that `gems_expr` vets before the [`engine`] binds
//! them to native handlers. Rendering and media are left to the host through
//! the traits in [`host`]; [`host_bridge::RecordingHost`] records every
//! request instead, which is what the `gems_run` binary and the tests use.

pub mod cli;
pub mod clock;
pub mod data_log;
pub mod engine;
pub mod environment;
pub mod host;
pub mod host_bridge;
pub mod input;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod variables;
