//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate session, validation, mutation and sync calls into
//!   use-case level APIs.
//! - Keep UI/FFI layers decoupled from individual engine modules.

pub mod grid_service;
