//! xorshift64* random number generator
//!
//! Fast, high-quality PRNG suitable for simulation work.
//!
//! # Determinism
//!
//! Same seed → same sequence. The whole run is reproducible because every
//! stochastic quantity in the simulation (task durations, rework draws) is
//! sampled from a single `RngManager` owned by the event loop, in the order
//! the loop fires.

use serde::{Deserialize, Serialize};

/// Deterministic random number generator using xorshift64*
///
/// # Example
/// ```
/// use assembly_simulator_core::RngManager;
///
/// let mut rng = RngManager::new(12345);
/// let p = rng.next_f64();           // [0.0, 1.0)
/// let d = rng.normal(30.0, 2.0);    // Gaussian draw
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngManager {
    state: u64,
}

impl RngManager {
    /// Create a new RNG with the given seed.
    ///
    /// A zero seed is remapped to 1 (xorshift requires non-zero state).
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate the next random u64 value, advancing the internal state.
    pub fn next(&mut self) -> u64 {
        // xorshift64* algorithm
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Generate a random f64 in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let value = self.next();
        (value >> 11) as f64 * (1.0 / ((1u64 << 53) as f64))
    }

    /// Sample a normally distributed value via the Box–Muller transform.
    ///
    /// Consumes exactly two draws from the underlying stream.
    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        // ln(0) would produce an infinite magnitude; shift the first draw
        // into (0.0, 1.0].
        let u1 = 1.0 - self.next_f64();
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
        mean + std_dev * z
    }

    /// Bernoulli draw: true with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Current internal state (for diagnostics).
    pub fn get_state(&self) -> u64 {
        self.state
    }
}
