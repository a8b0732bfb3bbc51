//! services/api/src/lib.rs
//!
//! The HTTP service around `lehrjournal_core`: configuration, the Postgres
//! and PDF adapters, and the axum router.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
