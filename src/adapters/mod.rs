//! Adapters - implementations of the ports.

pub mod csv;
pub mod memory;
pub mod postgres;
pub mod storage;
