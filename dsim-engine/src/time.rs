// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Simulation time.
//!
//! Time is a floating point number of nanoseconds. Helpers convert from
//! coarser units.

use std::cmp::Ordering;

/// A point in (or a duration of) simulated time, in nanoseconds.
pub type SimTime = f64;

/// One simulated second.
pub const ONE_SEC: SimTime = 1e9;

/// The time reported when nothing is pending.
pub const INFINITY: SimTime = f64::INFINITY;

#[must_use]
pub const fn nanos(v: f64) -> SimTime {
    v
}

#[must_use]
pub const fn micros(v: f64) -> SimTime {
    v * 1e3
}

#[must_use]
pub const fn millis(v: f64) -> SimTime {
    v * 1e6
}

#[must_use]
pub const fn secs(v: f64) -> SimTime {
    v * ONE_SEC
}

/// A totally ordered wrapper used to key ordered collections by time.
#[derive(Clone, Copy, Debug)]
pub struct TimeKey(pub SimTime);

impl PartialEq for TimeKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TimeKey {}

impl PartialOrd for TimeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}
