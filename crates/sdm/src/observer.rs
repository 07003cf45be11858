//! Observer contract: at-step callbacks receiving read-only views of the
//! gridboxes and the global super-droplet array.

use crate::errors::SdmError;
use crate::gridbox::Gridbox;
use crate::superdrop::Superdrop;

/// A consumer of simulation state at observation steps. Observers never
/// mutate engine state; they only record it.
pub trait Observer {
    /// Called once before timestepping begins, with the initial state.
    fn at_start(
        &mut self,
        _gridboxes: &[Gridbox],
        _superdrops: &[Superdrop],
    ) -> Result<(), SdmError> {
        Ok(())
    }

    /// Called at every observation tick `t`.
    fn at_step(
        &mut self,
        t: u64,
        gridboxes: &[Gridbox],
        superdrops: &[Superdrop],
    ) -> Result<(), SdmError>;

    /// Called once after the run ends, to flush any buffered output.
    fn finalize(&mut self) -> Result<(), SdmError> {
        Ok(())
    }
}

/// Observer that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn at_step(
        &mut self,
        _t: u64,
        _gridboxes: &[Gridbox],
        _superdrops: &[Superdrop],
    ) -> Result<(), SdmError> {
        Ok(())
    }
}

/// Observer logging a one-line progress summary per observation step.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn at_step(
        &mut self,
        t: u64,
        gridboxes: &[Gridbox],
        superdrops: &[Superdrop],
    ) -> Result<(), SdmError> {
        let in_domain = superdrops.iter().filter(|d| !d.is_inert()).count();
        log::info!(
            "t = {:.1}s: {} live super-droplets across {} gridboxes",
            crate::timesteps::step2realtime(t),
            in_domain,
            gridboxes.len()
        );
        Ok(())
    }
}

/// The 0th, 1st and 2nd moments of the real-droplet mass distribution:
/// total droplet count, total mass and total squared mass.
pub fn mass_moments(superdrops: &[Superdrop]) -> (f64, f64, f64) {
    let mut mom0 = 0.0;
    let mut mom1 = 0.0;
    let mut mom2 = 0.0;
    for drop in superdrops.iter().filter(|d| !d.is_inert()) {
        let xi = drop.xi as f64;
        let mass = drop.mass();
        mom0 += xi;
        mom1 += xi * mass;
        mom2 += xi * mass * mass;
    }
    (mom0, mom1, mom2)
}
