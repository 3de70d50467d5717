//! rnm-setup library exports for testing.
//!
//! The binary is a thin CLI over [`commands`]; the stages, the pipeline and
//! the command runner are public so integration tests can drive them with a
//! scripted [`process::Runner`].

pub mod audio;
pub mod commands;
pub mod config;
pub mod env_mutation;
pub mod error;
pub mod invocation;
pub mod logging;
pub mod pipeline;
pub mod process;
pub mod stages;
pub mod timing;
