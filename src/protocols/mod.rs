// src/protocols/mod.rs
//! Key generation and shared-secret derivation.

pub mod key_exchange;
pub mod keys;
