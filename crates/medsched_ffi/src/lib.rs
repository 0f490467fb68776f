//! Flutter-facing shell surface for the medsched grid engine.
//!
//! The UI drives the core exclusively through [`api`]; transport and
//! authentication stay on the Dart side.

pub mod api;
