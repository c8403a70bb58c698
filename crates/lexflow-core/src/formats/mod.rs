//! # Formats Module
//!
//! Binary snapshot encoding for case state.

mod persistence;

pub use persistence::*;
