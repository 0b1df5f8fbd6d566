//! Common library for the TubeMind backend
//!
//! This crate provides shared functionality used across the services:
//! settings, database connectivity, the Redis client and error handling.

pub mod cache;
pub mod database;
pub mod error;
pub mod settings;

pub use settings::AppConfig;
