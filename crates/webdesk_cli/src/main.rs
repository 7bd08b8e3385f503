//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `webdesk_core` linkage
//!   independently from the browser/wasm runtime setup.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("webdesk_core ping={}", webdesk_core::ping());
    println!("webdesk_core version={}", webdesk_core::core_version());
}
