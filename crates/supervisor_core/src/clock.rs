//! Clock relay.
//!
//! On every scheduling tick the relay advances the scene by one basic time
//! step and reports the simulated time to publish. Ticks are independent:
//! there is no catching up on missed ticks and no retry.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::scene::SceneStore;

/// A simulated timestamp split into whole seconds and nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SimTime {
    pub sec: i32,
    pub nanosec: u32,
}

impl SimTime {
    /// Build a timestamp from seconds. Negative and non-finite inputs clamp
    /// to zero.
    #[must_use]
    pub fn from_secs_f64(seconds: f64) -> Self {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Self::default();
        }
        let whole = seconds.floor();
        let mut sec = whole as i32;
        let mut nanosec = ((seconds - whole) * 1e9).round() as u32;
        if nanosec >= 1_000_000_000 {
            sec += 1;
            nanosec -= 1_000_000_000;
        }
        Self { sec, nanosec }
    }

    #[must_use]
    pub fn as_secs_f64(self) -> f64 {
        f64::from(self.sec) + f64::from(self.nanosec) / 1e9
    }
}

/// The result of one clock tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockTick {
    /// The scene advanced; publish this time.
    Time(SimTime),
    /// The simulator is terminating; publish nothing.
    Terminated,
}

#[derive(Debug)]
pub struct ClockRelay {
    /// Step size passed to the scene, in milliseconds.
    timestep_ms: u32,
    /// Number of ticks that advanced the scene.
    ticks: u64,
    /// Last published time.
    last: SimTime,
    /// Whether the shutdown notice has been logged.
    terminated: bool,
}

impl ClockRelay {
    /// Create a relay stepping the scene by `timestep_ms` per tick.
    #[must_use]
    pub fn new(timestep_ms: u32) -> Self {
        Self {
            timestep_ms,
            ticks: 0,
            last: SimTime::default(),
            terminated: false,
        }
    }

    #[must_use]
    pub fn timestep_ms(&self) -> u32 {
        self.timestep_ms
    }

    /// Returns the number of ticks that advanced the scene.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Returns `true` once a step has signalled termination.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Step the scene once and return the time to publish.
    pub fn tick<S: SceneStore + ?Sized>(&mut self, scene: &mut S) -> ClockTick {
        if scene.step(self.timestep_ms) < 0 {
            if !self.terminated {
                info!("simulation is shutting down");
                self.terminated = true;
            }
            return ClockTick::Terminated;
        }

        self.ticks += 1;
        // Published time never goes backwards.
        self.last = self.last.max(SimTime::from_secs_f64(scene.time()));
        ClockTick::Time(self.last)
    }
}
