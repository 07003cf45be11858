//! Contract for two-way coupling with an external dynamics solver.
//!
//! The engine only ever reads and writes gridbox thermodynamic state
//! through this interface: `state` pulls a provider's view of one gridbox
//! at a coupling step (receive), `update` hands back the
//! microphysics-altered state (send). A provider advances its own model in
//! `run` between coupling steps.

use crate::errors::SdmError;
use crate::gridbox::State;

/// Thermodynamic state of one gridbox as held by a dynamics provider.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DynamicsState {
    pub press: f64,
    pub temp: f64,
    pub qvap: f64,
    pub qcond: f64,
    pub wvel: (f64, f64),
    pub uvel: (f64, f64),
    pub vvel: (f64, f64),
}

/// An external dynamics solver coupled to the engine.
pub trait CoupledDynamics {
    /// Called once before the first step.
    fn prepare(&mut self) -> Result<(), SdmError> {
        Ok(())
    }

    /// Advance the provider's own state from tick `t` to `t_next`.
    fn run(&mut self, _t: u64, _t_next: u64) -> Result<(), SdmError> {
        Ok(())
    }

    /// The provider's current state for one gridbox, or `None` to leave
    /// the gridbox untouched at this coupling step.
    fn state(&self, gbx_index: u32) -> Option<DynamicsState>;

    /// Receive the microphysics-altered state of one gridbox.
    fn update(&mut self, _gbx_index: u32, _state: &State) {}
}

/// Provider that never exchanges anything; gridbox states evolve under
/// microphysics alone.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullDynamics;

impl CoupledDynamics for NullDynamics {
    fn state(&self, _gbx_index: u32) -> Option<DynamicsState> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_dynamics_leaves_state_alone() {
        let mut dynamics = NullDynamics;
        dynamics.prepare().unwrap();
        dynamics.run(0, 100).unwrap();
        assert!(dynamics.state(0).is_none());
    }
}
