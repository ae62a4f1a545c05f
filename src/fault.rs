// SPDX-License-Identifier: PMPL-1.0-or-later
//! Probability-controlled fault injection.
//!
//! One random decision per dispatched request: with probability
//! `fraction_404` the dispatcher short-circuits with a synthetic 404
//! instead of invoking a handler, which exercises the retry logic of the
//! client under test. Tests that need determinism either keep the fraction
//! at zero or seed the random source explicitly.

use std::cell::RefCell;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

pub struct FaultInjector {
    fraction_404: f64,
    rng: RefCell<StdRng>,
}

impl FaultInjector {
    /// Injector that never faults.
    pub fn disabled() -> Self {
        Self::new(0.0)
    }

    /// Injector with a process-local random source. The fraction is
    /// clamped to `[0, 1]`.
    pub fn new(fraction_404: f64) -> Self {
        Self {
            fraction_404: fraction_404.clamp(0.0, 1.0),
            rng: RefCell::new(StdRng::from_entropy()),
        }
    }

    /// Injector with a fixed seed, for reproducible failure sequences.
    pub fn seeded(fraction_404: f64, seed: u64) -> Self {
        Self {
            fraction_404: fraction_404.clamp(0.0, 1.0),
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn fraction(&self) -> f64 {
        self.fraction_404
    }

    /// Draw the per-request decision.
    pub fn should_fault(&self) -> bool {
        if self.fraction_404 <= 0.0 {
            return false;
        }
        let draw: f64 = self.rng.borrow_mut().gen();
        let fault = draw < self.fraction_404;
        if fault {
            debug!(draw, fraction = self.fraction_404, "injecting synthetic 404");
        }
        fault
    }
}

impl Default for FaultInjector {
    fn default() -> Self {
        Self::disabled()
    }
}
