//! The relaxation engine: atomic distance cells, the lock-free edge-relax
//! operators, the driver that runs a configured variant to quiescence, the
//! serial baseline, and the post-run verifier.

pub mod distance;
pub mod driver;
pub mod relax;
pub mod serial;
pub mod verify;

pub use driver::{run_sssp, SsspResult};

#[cfg(test)]
mod tests;
