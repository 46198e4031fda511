//! Adapter implementations for organization persistence.

pub mod memory;
pub mod postgres;
