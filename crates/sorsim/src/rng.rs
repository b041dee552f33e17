// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Seeded pseudo-random helper driving every probabilistic draw in the
//! simulation: patient profile, triage color, specialist choice, outcome,
//! and every service-time duration.
//!
//! One seed drives the whole run so a run is reproducible end to end.
//! Draws happen from many concurrent actors, so the
//! generator sits behind a small synchronous lock; no draw ever spans an
//! `.await`, so a plain `std::sync::Mutex` is the right tool here.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::{Outcome, Specialist, TriageColor, SPECIALIST_COUNT};

pub struct SimRng {
    inner: Mutex<StdRng>,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self { inner: Mutex::new(StdRng::seed_from_u64(seed)) }
    }

    fn with_rng<R>(&self, f: impl FnOnce(&mut StdRng) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    /// Inclusive range over `u64`.
    pub fn range_u64(&self, lo: u64, hi_inclusive: u64) -> u64 {
        if hi_inclusive <= lo {
            return lo;
        }
        self.with_rng(|rng| rng.random_range(lo..=hi_inclusive))
    }

    /// `true` with probability `pct_of_100 / 100`.
    pub fn percent(&self, pct_of_100: u8) -> bool {
        self.range_u64(0, 99) < pct_of_100 as u64
    }

    /// Age uniform in `[1, 90]`.
    pub fn patient_age(&self) -> u8 {
        self.range_u64(1, 90) as u8
    }

    /// VIP with the configured probability.
    pub fn is_vip(&self, vip_pct: u8) -> bool {
        self.percent(vip_pct)
    }

    /// Uniform choice over the six specialist types.
    pub fn specialist(&self) -> Specialist {
        Specialist(self.range_u64(0, (SPECIALIST_COUNT - 1) as u64) as u8)
    }

    /// Cumulative-cutoff color draw; cutoffs configurable, default
    /// Red 10 / Yellow 35 / Green 55 out of 100.
    pub fn triage_color(&self, red_pct: u8, yellow_pct: u8) -> TriageColor {
        let draw = self.range_u64(0, 99);
        if draw < red_pct as u64 {
            TriageColor::Red
        } else if draw < (red_pct as u64 + yellow_pct as u64) {
            TriageColor::Yellow
        } else {
            TriageColor::Green
        }
    }

    /// Threshold outcome draw out of 1000; defaults home [0,850),
    /// ward [850,995), other [995,1000).
    pub fn outcome(&self, home_per_mille: u32, ward_per_mille: u32) -> Outcome {
        let draw = self.range_u64(0, 999) as u32;
        if draw < home_per_mille {
            Outcome::Home
        } else if draw < ward_per_mille {
            Outcome::Ward
        } else {
            Outcome::Other
        }
    }

    /// Uniform millisecond duration in `[lo, hi]`, scaled by the caller.
    pub fn duration_ms(&self, lo: u64, hi: u64) -> u64 {
        self.range_u64(lo, hi)
    }
}

#[cfg(test)]
#[path = "rng_tests.rs"]
mod tests;
