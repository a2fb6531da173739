// tests/integration/main.rs
//! End-to-end tests against the public API.

mod encoding;
mod isogeny_engine;
mod key_exchange;
