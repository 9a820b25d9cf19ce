//! Deterministic random number generation

mod xorshift;

pub use xorshift::RngManager;
