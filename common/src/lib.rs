//! Types and configuration shared by the QP Archive client crates.

pub mod config;
pub mod error;
pub mod protocol;
