//! Inbound data clients.
//!
//! One submodule per external API:
//! - `remo` — Nature Remo Cloud device listing (temperature source).

pub mod remo;
