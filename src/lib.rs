// ABOUTME: Library root for labforge - exposes the build pipeline and its parts.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod remote;
pub mod steps;
pub mod types;
