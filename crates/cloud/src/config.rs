//! Run configuration: YAML file with keyed sections for timesteps, domain,
//! physics, input files, output data and the coupled dynamics kind.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use sdm::condensation::CondensationConfig;
use sdm::constants as c;
use sdm::kernels::CollisionKernel;
use sdm::maps::BoundaryCondition;
use sdm::motion::TerminalVelocity;
use sdm::{SdmError, Timesteps};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub timesteps: TimestepsConfig,
    pub domain: DomainConfig,
    pub physics: PhysicsConfig,
    pub inputfiles: InputFilesConfig,
    pub outputdata: OutputDataConfig,
    pub dynamics: DynamicsConfig,
    /// Uniform initial thermodynamic state of every gridbox, overridden by
    /// the dynamics provider at coupling steps.
    #[serde(default)]
    pub initthermo: InitThermoConfig,
}

/// Step intervals in seconds of real time.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimestepsConfig {
    pub coupl: f64,
    pub motion: f64,
    pub cond: f64,
    pub coll: f64,
    pub obs: f64,
    pub end: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainConfig {
    /// Number of active spatial dimensions (0 to 3)
    pub nspacedims: u32,
    /// Gridboxes per direction `[ndim3, ndim1, ndim2]`
    pub ndims: [usize; 3],
    /// Total gridboxes; must equal the product of `ndims`
    pub ngbxs: usize,
    /// Total super-droplets expected from the initial-conditions file
    pub totnsupers: usize,
    /// Chunk length of the output arrays
    pub maxchunk: usize,
    /// Boundary treatment per direction
    #[serde(default = "default_boundary3")]
    pub boundary3: BoundaryKind,
    #[serde(default = "default_boundary12")]
    pub boundary1: BoundaryKind,
    #[serde(default = "default_boundary12")]
    pub boundary2: BoundaryKind,
}

fn default_boundary3() -> BoundaryKind {
    BoundaryKind::Finite
}

fn default_boundary12() -> BoundaryKind {
    BoundaryKind::Periodic
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryKind {
    Finite,
    Periodic,
    Reflective,
}

impl BoundaryKind {
    fn to_engine(self, direction: &str) -> Result<BoundaryCondition, SdmError> {
        match self {
            BoundaryKind::Finite => Ok(BoundaryCondition::Finite),
            BoundaryKind::Periodic => Ok(BoundaryCondition::Periodic),
            BoundaryKind::Reflective => Err(SdmError::Config(format!(
                "reflective walls are not supported for the {} direction of this domain \
                 configuration; use finite or periodic",
                direction
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhysicsConfig {
    pub condensation: CondensationSection,
    pub collisions: CollisionsSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CondensationSection {
    /// Run condensation at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub do_alter_thermo: bool,
    pub niters: usize,
    pub rtol: f64,
    pub atol: f64,
    /// Largest condensation sub-timestep, in seconds
    pub subdelt_max: f64,
    /// Halving floor of the sub-timestep, in seconds
    pub subdelt_min: f64,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollisionsSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub kernel: KernelKind,
    /// Golovin kernel coefficient; ignored by the other kernels
    #[serde(default = "default_golovin_b")]
    pub golovin_b: f64,
    #[serde(default = "default_terminalv")]
    pub terminalv: TerminalVelocityKind,
    #[serde(default)]
    pub do_breakup: bool,
    /// Expected fragments per real-droplet collision-breakup
    #[serde(default = "default_nfrags")]
    pub nfrags: f64,
}

fn default_golovin_b() -> f64 {
    1.5e3
}

fn default_terminalv() -> TerminalVelocityKind {
    TerminalVelocityKind::Simmel
}

fn default_nfrags() -> f64 {
    5.0
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KernelKind {
    Golovin,
    Long,
    Lowlist,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TerminalVelocityKind {
    Null,
    Rogersyau,
    Simmel,
}

impl TerminalVelocityKind {
    pub fn to_engine(self) -> TerminalVelocity {
        match self {
            TerminalVelocityKind::Null => TerminalVelocity::Null,
            TerminalVelocityKind::Rogersyau => TerminalVelocity::RogersYau,
            TerminalVelocityKind::Simmel => TerminalVelocity::Simmel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputFilesConfig {
    /// Binary super-droplet initial conditions
    pub initsupers: PathBuf,
    /// Binary gridbox bounds
    pub grid: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputDataConfig {
    /// Directory of the chunked array dataset
    pub zarrbasedir: PathBuf,
}

/// External dynamics provider, a closed set of kinds.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DynamicsConfig {
    /// No exchange; gridbox states evolve under microphysics alone.
    Null,
    /// Replay per-gridbox thermodynamic profiles from a binary file at
    /// each coupling step.
    Fromfile { thermofile: PathBuf },
}

/// Initial gridbox thermodynamics in real units (Pa, K, kg/kg).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InitThermoConfig {
    pub press: f64,
    pub temp: f64,
    pub qvap: f64,
    pub qcond: f64,
}

impl Default for InitThermoConfig {
    fn default() -> Self {
        Self {
            press: c::P0,
            temp: c::TEMP0,
            qvap: 0.0,
            qcond: 0.0,
        }
    }
}

impl Config {
    /// Load and validate a YAML configuration file.
    pub fn load(path: &Path) -> Result<Self, SdmError> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&text)
            .map_err(|e| SdmError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), SdmError> {
        if self.domain.nspacedims > 3 {
            return Err(SdmError::Config(format!(
                "nspacedims must be 0 to 3, got {}",
                self.domain.nspacedims
            )));
        }
        let product: usize = self.domain.ndims.iter().product();
        if product != self.domain.ngbxs {
            return Err(SdmError::Config(format!(
                "ngbxs = {} does not match ndims {:?} (product {})",
                self.domain.ngbxs, self.domain.ndims, product
            )));
        }
        if self.domain.totnsupers == 0 {
            return Err(SdmError::Config("totnsupers must be positive".into()));
        }
        if self.domain.maxchunk == 0 {
            return Err(SdmError::Config("maxchunk must be positive".into()));
        }
        // fail early on unsupported walls rather than at map construction
        self.boundary_conditions()?;
        Ok(())
    }

    /// Timestep intervals converted to model ticks.
    pub fn timesteps(&self) -> Result<Timesteps, SdmError> {
        Timesteps::from_realtimes(
            self.timesteps.coupl,
            self.timesteps.motion,
            self.timesteps.cond,
            self.timesteps.coll,
            self.timesteps.obs,
            self.timesteps.end,
        )
    }

    /// Boundary condition per direction, rejecting unsupported kinds.
    pub fn boundary_conditions(&self) -> Result<[BoundaryCondition; 3], SdmError> {
        Ok([
            self.domain.boundary3.to_engine("coord3")?,
            self.domain.boundary1.to_engine("coord1")?,
            self.domain.boundary2.to_engine("coord2")?,
        ])
    }

    /// Condensation settings with sub-timesteps made dimensionless.
    pub fn condensation_config(&self) -> CondensationConfig {
        let section = &self.physics.condensation;
        CondensationConfig {
            do_alter_thermo: section.do_alter_thermo,
            niters: section.niters,
            rtol: section.rtol,
            atol: section.atol,
            subdelt_max: section.subdelt_max / c::TIME0,
            subdelt_min: section.subdelt_min / c::TIME0,
        }
    }

    /// The configured collision kernel.
    pub fn collision_kernel(&self) -> CollisionKernel {
        match self.physics.collisions.kernel {
            KernelKind::Golovin => CollisionKernel::Golovin {
                b: self.physics.collisions.golovin_b,
            },
            KernelKind::Long => CollisionKernel::Long,
            KernelKind::Lowlist => CollisionKernel::LowList,
        }
    }
}
