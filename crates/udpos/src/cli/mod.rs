//! Command implementations.

pub mod config;
pub mod tag;
pub mod tagset;
