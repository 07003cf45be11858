//! Application layer of the super-droplet cloud model: configuration
//! loading, binary initial-condition readers, the chunked-array output
//! store and the run assembly around the [`sdm`] engine.

pub mod config;
pub mod dynamics;
pub mod init;
pub mod observers;
pub mod zarr;

use std::path::Path;

use sdm::collisions::{CollisionConfig, Collisions};
use sdm::condensation::Condensation;
use sdm::motion::PredCorrMotion;
use sdm::observer::LogObserver;
use sdm::superdrop::SoluteProperties;
use sdm::{NullDynamics, SdmError, Simulation};

use config::{Config, DynamicsConfig};
use dynamics::FromFileDynamics;
use observers::{MassMomentsObserver, StateObserver, SuperdropObserver, TimeObserver};
use zarr::ZarrStore;

/// Random seed of a run. Fixed so identical configurations reproduce
/// bit-identical output arrays.
const RUN_SEED: u64 = 2023;

/// Load the configuration, assemble the simulation and run it to the end,
/// writing the output dataset.
pub fn run(config_path: &Path) -> Result<(), SdmError> {
    let config = Config::load(config_path)?;

    let maps = init::read_gridfile(
        &config.inputfiles.grid,
        config.domain.ndims,
        config.boundary_conditions()?,
    )?;
    let gridboxes = init::make_gridboxes(&maps, &config.initthermo);
    let superdrops = init::read_initsupers(
        &config.inputfiles.initsupers,
        config.domain.totnsupers,
        SoluteProperties::default(),
    )?;

    let timesteps = config.timesteps()?;
    let mut sim = Simulation::new(maps, gridboxes, superdrops, timesteps, RUN_SEED)?;

    if config.physics.condensation.enabled {
        sim.condensation = Some(Condensation::new(config.condensation_config()));
    }
    if config.physics.collisions.enabled {
        sim.collisions = Some(Collisions::new(CollisionConfig {
            kernel: config.collision_kernel(),
            terminalv: config.physics.collisions.terminalv.to_engine(),
            do_breakup: config.physics.collisions.do_breakup,
            nfrags: config.physics.collisions.nfrags,
        })?);
    }
    // 0-D box models have no transport
    if config.domain.nspacedims > 0 {
        sim.motion = Some(PredCorrMotion::new(
            config.physics.collisions.terminalv.to_engine(),
        ));
    }

    sim.dynamics = match &config.dynamics {
        DynamicsConfig::Null => Box::new(NullDynamics),
        DynamicsConfig::Fromfile { thermofile } => Box::new(FromFileDynamics::new(
            thermofile,
            config.domain.ngbxs,
            timesteps.couplstep,
        )?),
    };

    let store = ZarrStore::create(&config.outputdata.zarrbasedir)?;
    let maxchunk = config.domain.maxchunk;
    sim.observers = vec![
        Box::new(TimeObserver::new(&store, maxchunk)?),
        Box::new(StateObserver::new(&store, maxchunk, config.domain.ngbxs)?),
        Box::new(MassMomentsObserver::new(&store, maxchunk, config.domain.ngbxs)?),
        Box::new(SuperdropObserver::new(&store, maxchunk)?),
        Box::new(LogObserver),
    ];

    sim.run()
}
