//! Integer model ticks and the nested timestep intervals of the driver.
//!
//! One tick is 1e-5 of the characteristic timescale `TIME0`, i.e. 0.01 s of
//! real time, so configured real-time intervals convert to integers without
//! losing the exact divisibility the nested stepping relies on.

use crate::constants as c;
use crate::errors::SdmError;

/// Dimensionless time per model tick.
const DIMLESS_PER_TICK: f64 = 1e-5;

/// Convert a real-time interval [s] into a whole number of model ticks.
pub fn realtime2step(seconds: f64) -> u64 {
    (seconds / c::TIME0 / DIMLESS_PER_TICK).round() as u64
}

/// Real time [s] of a number of model ticks.
pub fn step2realtime(ticks: u64) -> f64 {
    ticks as f64 * DIMLESS_PER_TICK * c::TIME0
}

/// Dimensionless time of a number of model ticks.
pub fn step2dimlesstime(ticks: u64) -> f64 {
    ticks as f64 * DIMLESS_PER_TICK
}

/// The configured timestep intervals, each a positive whole number of
/// ticks: coupling with external dynamics, spatial transport, condensation
/// and collision microphysics, observer callbacks, and the end of the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timesteps {
    pub couplstep: u64,
    pub motionstep: u64,
    pub condstep: u64,
    pub collstep: u64,
    pub obsstep: u64,
    pub t_end: u64,
}

impl Timesteps {
    pub fn new(
        couplstep: u64,
        motionstep: u64,
        condstep: u64,
        collstep: u64,
        obsstep: u64,
        t_end: u64,
    ) -> Result<Self, SdmError> {
        let tsteps = Self {
            couplstep,
            motionstep,
            condstep,
            collstep,
            obsstep,
            t_end,
        };
        for (name, value) in [
            ("coupl", couplstep),
            ("motion", motionstep),
            ("cond", condstep),
            ("coll", collstep),
            ("obs", obsstep),
            ("end", t_end),
        ] {
            if value == 0 {
                return Err(SdmError::Config(format!(
                    "timestep '{}' is zero model ticks; every interval must be at least one \
                     tick (0.01 s)",
                    name
                )));
            }
        }
        Ok(tsteps)
    }

    /// Build from real-time intervals in seconds.
    pub fn from_realtimes(
        coupl: f64,
        motion: f64,
        cond: f64,
        coll: f64,
        obs: f64,
        end: f64,
    ) -> Result<Self, SdmError> {
        Self::new(
            realtime2step(coupl),
            realtime2step(motion),
            realtime2step(cond),
            realtime2step(coll),
            realtime2step(obs),
            realtime2step(end),
        )
    }

    /// Smallest next multiple of any configured interval strictly after
    /// `t`, capped at the end of the run.
    pub fn next_due(&self, t: u64) -> u64 {
        let next = |interval: u64| (t / interval + 1) * interval;
        let soonest = next(self.couplstep)
            .min(next(self.motionstep))
            .min(next(self.condstep))
            .min(next(self.collstep))
            .min(next(self.obsstep));
        soonest.min(self.t_end)
    }

    pub fn on_coupl(&self, t: u64) -> bool {
        t % self.couplstep == 0
    }

    pub fn on_motion(&self, t: u64) -> bool {
        t % self.motionstep == 0
    }

    pub fn on_cond(&self, t: u64) -> bool {
        t % self.condstep == 0
    }

    pub fn on_coll(&self, t: u64) -> bool {
        t % self.collstep == 0
    }

    pub fn on_obs(&self, t: u64) -> bool {
        t % self.obsstep == 0
    }
}
