//! Numerical constants used by the PIC loop.
//!
//! All quantities are in normalized units: c = 1, time in 1/ω_p, length in
//! c/ω_p and density in units of the reference density.

/// Particle buffers grow in blocks of this many particles.
pub const PARTICLE_BLOCK: usize = 1024;

/// Species are sorted by cell index every this many iterations.
pub const SORT_INTERVAL: u64 = 16;

/// Number of particles handled by one rayon task during push and deposit.
pub const CHUNK_SIZE: usize = 4096;

/// Seed used when a configuration does not name one.
pub const DEFAULT_SEED: u64 = 0x5eed_0f_e11d;

pub use std::f64::consts::PI;
