//! # System Module
//!
//! The procedure's stage vocabulary and its adjacency table.
//!
//! Both are pure data; the workflow service in [`crate::workflow`] is the
//! only place that interprets them.

mod stage;

pub use stage::*;
