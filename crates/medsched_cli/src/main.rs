//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `medsched_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    // Tiny probe to validate core crate wiring independently from the
    // Flutter/FFI runtime setup.
    println!("medsched_core ping={}", medsched_core::ping());
    println!("medsched_core version={}", medsched_core::core_version());
}
