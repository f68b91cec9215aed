//! Weighted cluster selection.

pub mod entropy;
pub mod selector;
