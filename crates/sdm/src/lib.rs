//! Super-Droplet Method (SDM) cloud microphysics engine.
//!
//! A population of computational particles ("super-droplets", each standing
//! in for many identical real droplets) is advanced through a Cartesian
//! gridbox domain by condensation/evaporation, stochastic
//! collision-coalescence/breakup and wind-driven motion, coupled to
//! per-gridbox thermodynamic state via a nested-timestep driver.
//!
//! # Example
//!
//! A 0-D collision box model with the Golovin kernel:
//!
//! ```
//! use sdm::collisions::{CollisionConfig, Collisions};
//! use sdm::gridbox::{Gridbox, State};
//! use sdm::maps::{BoundaryCondition, CartesianMaps};
//! use sdm::superdrop::{SoluteProperties, Superdrop};
//! use sdm::{Simulation, Timesteps};
//!
//! let maps = CartesianMaps::uniform(
//!     [1, 1, 1],
//!     [1.0, 1.0, 1.0],
//!     [BoundaryCondition::Finite; 3],
//! )
//! .unwrap();
//! let gridboxes = vec![Gridbox::new(0, State::new(1.0, 1.0, 1.0, 0.0, 0.0))];
//!
//! let solute = SoluteProperties::default();
//! let superdrops: Vec<Superdrop> = (0..128)
//!     .map(|i| Superdrop::new(0, 0.5, 0.5, 0.5, 1_000_000, 20.0, 1.0, solute, i))
//!     .collect();
//!
//! // 10 s of simulated time with 1 s collision steps
//! let timesteps = Timesteps::from_realtimes(10.0, 10.0, 10.0, 1.0, 10.0, 10.0).unwrap();
//! let mut sim = Simulation::new(maps, gridboxes, superdrops, timesteps, 42).unwrap();
//! sim.collisions = Some(Collisions::new(CollisionConfig::default()).unwrap());
//!
//! sim.run().unwrap();
//! ```

pub mod collisions;
pub mod condensation;
pub mod constants;
pub mod coupling;
pub mod errors;
pub mod gridbox;
pub mod kernels;
pub mod maps;
pub mod motion;
pub mod observer;
pub mod superdrop;
pub mod thermo;
pub mod timesteps;
pub mod transport;

pub use collisions::{CollisionConfig, Collisions};
pub use condensation::{Condensation, CondensationConfig};
pub use coupling::{CoupledDynamics, NullDynamics};
pub use errors::SdmError;
pub use gridbox::{Gridbox, State};
pub use kernels::CollisionKernel;
pub use maps::{BoundaryCondition, CartesianMaps};
pub use motion::{PredCorrMotion, TerminalVelocity};
pub use observer::Observer;
pub use superdrop::{SoluteProperties, Superdrop, OUTSIDE_DOMAIN};
pub use timesteps::Timesteps;

/// The SDM engine: the gridded domain, the global super-droplet array and
/// the processes advancing them, stepped by the nested-timestep driver.
///
/// The driver exclusively owns the gridbox vector and the particle array;
/// processes receive borrowed views for the duration of a phase. Within
/// one tick the phases run in a fixed order: receive coupled dynamics,
/// condensation, collisions, motion with transport bookkeeping, send
/// coupled dynamics, observers.
pub struct Simulation {
    pub maps: CartesianMaps,
    pub gridboxes: Vec<Gridbox>,
    pub superdrops: Vec<Superdrop>,
    pub timesteps: Timesteps,
    /// Condensation/evaporation process, if enabled
    pub condensation: Option<Condensation>,
    /// Collision-coalescence/breakup process, if enabled
    pub collisions: Option<Collisions>,
    /// Super-droplet motion, if enabled
    pub motion: Option<PredCorrMotion>,
    /// External dynamics provider
    pub dynamics: Box<dyn CoupledDynamics>,
    pub observers: Vec<Box<dyn Observer>>,
    /// Seed from which every per-(gridbox, tick) random stream derives
    pub seed: u64,
    t: u64,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("maps", &self.maps)
            .field("gridboxes", &self.gridboxes)
            .field("superdrops", &self.superdrops)
            .field("timesteps", &self.timesteps)
            .field("condensation", &self.condensation)
            .field("collisions", &self.collisions)
            .field("motion", &self.motion)
            .field("dynamics", &"<dyn CoupledDynamics>")
            .field("observers", &format!("<{} observer(s)>", self.observers.len()))
            .field("seed", &self.seed)
            .field("t", &self.t)
            .finish()
    }
}

impl Simulation {
    /// Assemble a simulation, validating the initial conditions and
    /// establishing the sort/span invariant of the particle array.
    ///
    /// Microphysics and motion start disabled; enable them by setting the
    /// corresponding fields. The dynamics provider defaults to
    /// [`NullDynamics`].
    pub fn new(
        maps: CartesianMaps,
        gridboxes: Vec<Gridbox>,
        superdrops: Vec<Superdrop>,
        timesteps: Timesteps,
        seed: u64,
    ) -> Result<Self, SdmError> {
        if gridboxes.len() != maps.ngbxs() {
            return Err(SdmError::Init(format!(
                "{} gridboxes supplied but the domain has {}",
                gridboxes.len(),
                maps.ngbxs()
            )));
        }
        for (i, gbx) in gridboxes.iter().enumerate() {
            if gbx.index as usize != i {
                return Err(SdmError::Init(format!(
                    "gridbox at position {} has index {}; gridboxes must be supplied in \
                     index order",
                    i, gbx.index
                )));
            }
        }
        for drop in &superdrops {
            if drop.gbx_index == OUTSIDE_DOMAIN {
                continue;
            }
            if drop.gbx_index as usize >= maps.ngbxs() {
                return Err(SdmError::Init(format!(
                    "super-droplet {} claims gridbox {} outside the domain of {} gridboxes",
                    drop.id,
                    drop.gbx_index,
                    maps.ngbxs()
                )));
            }
            if !maps.contains(drop.gbx_index, drop.coord3, drop.coord1, drop.coord2) {
                return Err(SdmError::Init(format!(
                    "super-droplet {} at ({:.4e}, {:.4e}, {:.4e}) lies outside its gridbox {}",
                    drop.id, drop.coord3, drop.coord1, drop.coord2, drop.gbx_index
                )));
            }
            if drop.xi == 0 {
                return Err(SdmError::Init(format!(
                    "super-droplet {} has zero multiplicity",
                    drop.id
                )));
            }
        }

        let mut sim = Self {
            maps,
            gridboxes,
            superdrops,
            timesteps,
            condensation: None,
            collisions: None,
            motion: None,
            dynamics: Box::new(NullDynamics),
            observers: Vec::new(),
            seed,
            t: 0,
        };
        transport::sort_supers(&mut sim.superdrops);
        transport::set_spans(&mut sim.gridboxes, &sim.superdrops)?;
        Ok(sim)
    }

    /// Current model tick.
    pub fn time(&self) -> u64 {
        self.t
    }

    /// Run from the current tick to the end of the configured run.
    pub fn run(&mut self) -> Result<(), SdmError> {
        log::info!(
            "timestepping {} super-droplets in {} gridboxes to t = {:.1}s",
            self.superdrops.len(),
            self.gridboxes.len(),
            timesteps::step2realtime(self.timesteps.t_end)
        );

        self.dynamics.prepare()?;
        for obs in &mut self.observers {
            obs.at_start(&self.gridboxes, &self.superdrops)?;
        }

        loop {
            self.step_phases()?;
            if self.t >= self.timesteps.t_end {
                break;
            }
            let t_next = self.timesteps.next_due(self.t);
            self.dynamics.run(self.t, t_next)?;
            self.t = t_next;
        }

        for obs in &mut self.observers {
            obs.finalize()?;
        }
        log::info!("run complete at t = {:.1}s", timesteps::step2realtime(self.t));
        Ok(())
    }

    /// Enact every phase due at the current tick, in driver order.
    fn step_phases(&mut self) -> Result<(), SdmError> {
        let t = self.t;

        if self.timesteps.on_coupl(t) {
            self.receive_dynamics();
        }

        if self.timesteps.on_cond(t) {
            if let Some(cond) = &self.condensation {
                let delt = timesteps::step2dimlesstime(self.timesteps.condstep);
                cond.run(delt, &mut self.gridboxes, &mut self.superdrops)?;
            }
        }

        if self.timesteps.on_coll(t) {
            if let Some(coll) = &self.collisions {
                let delt = timesteps::step2realtime(self.timesteps.collstep);
                coll.run(t, self.seed, delt, &self.gridboxes, &mut self.superdrops)?;
            }
        }

        if self.timesteps.on_motion(t) {
            if let Some(m) = &self.motion {
                let delt = timesteps::step2dimlesstime(self.timesteps.motionstep);
                motion::move_superdrops(
                    &self.maps,
                    &mut self.gridboxes,
                    &mut self.superdrops,
                    m,
                    delt,
                )?;
            }
        }

        if self.timesteps.on_coupl(t) {
            self.send_dynamics();
        }

        if self.timesteps.on_obs(t) {
            for obs in &mut self.observers {
                obs.at_step(t, &self.gridboxes, &self.superdrops)?;
            }
        }

        Ok(())
    }

    /// Overwrite gridbox states with the provider's view (receive).
    fn receive_dynamics(&mut self) {
        for gbx in &mut self.gridboxes {
            if let Some(d) = self.dynamics.state(gbx.index) {
                let state = &mut gbx.state;
                state.press = d.press;
                state.temp = d.temp;
                state.qvap = d.qvap;
                state.qcond = d.qcond;
                state.wvel = d.wvel;
                state.uvel = d.uvel;
                state.vvel = d.vvel;
            }
        }
    }

    /// Hand the microphysics-altered states back to the provider (send).
    fn send_dynamics(&mut self) {
        for gbx in &self.gridboxes {
            self.dynamics.update(gbx.index, &gbx.state);
        }
    }
}
