//! # lexflow
//!
//! Application layer for the Lexflow deadline engine: configuration loading,
//! the redb case store, the HTTP API and the CLI.
//!
//! All I/O, clocks and logging live here; `lexflow-core` stays pure.

pub mod api;
pub mod cli;
pub mod config;
pub mod store;
