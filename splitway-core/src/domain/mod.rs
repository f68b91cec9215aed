//! Domain models shared by the selector, the control plane and reporting.

pub mod service;
pub mod store;
pub mod weights;
