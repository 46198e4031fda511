//! Adapter implementations for audit recording.

pub mod memory;
pub mod postgres;
