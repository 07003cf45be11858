//! Physical constants and the dimensionless unit system.
//!
//! ## Scale Conventions
//!
//! All engine state is dimensionless. A quantity is made dimensionless by
//! dividing by its characteristic scale:
//!
//! 1. **Velocity** by `W0` (1 m/s), **time** by `TIME0` (1000 s),
//!    **coordinates** by `COORD0 = W0 * TIME0` (1 km)
//! 2. **Droplet radii** by `R0` (1 micron), **pressure** by `P0` (1000 hPa),
//!    **temperature** by `TEMP0` (273.15 K)
//! 3. **Densities** by `RHO0 = P0 / (CP0 * TEMP0)`
//!
//! Constants carrying dimensions keep an explicit unit suffix
//! (`LATENT_V_JKG`, `RHO_L_KGM3`); the plain name is the dimensionless form
//! used throughout the engine (`LATENT_V`, `RHO_L`).

// =============================================================================
// CHARACTERISTIC SCALES
// =============================================================================

/// Characteristic velocity (m/s)
pub const W0: f64 = 1.0;

/// Characteristic timescale (s)
pub const TIME0: f64 = 1000.0;

/// Characteristic coordinate length (m)
pub const COORD0: f64 = W0 * TIME0;

/// Characteristic gridbox volume (m^3)
pub const VOL0: f64 = COORD0 * COORD0 * COORD0;

/// Characteristic droplet radius (m)
pub const R0: f64 = 1e-6;

/// Characteristic pressure (Pa)
pub const P0: f64 = 100000.0;

/// Characteristic temperature (K)
pub const TEMP0: f64 = 273.15;

/// Characteristic heat capacity (J/kg/K), = dry air at constant pressure
pub const CP0: f64 = CP_DRY_JKGK;

/// Characteristic molar mass (kg/mol), = dry air
pub const MR0: f64 = MR_DRY_KGMOL;

/// Characteristic density (kg/m^3)
pub const RHO0: f64 = P0 / (CP0 * TEMP0);

/// Scale of the condensation-diffusion factors
pub const F0: f64 = TIME0 / (RHO0 * R0 * R0);

/// Converts a dimensionless droplet mass into grams
pub const MASS0_GRAMS: f64 = RHO0 * R0 * R0 * R0 * 1000.0;

// =============================================================================
// DIMENSIONED CONSTANTS
// =============================================================================

/// Universal molar gas constant (J/mol/K)
pub const RGAS_UNIV_JMOLK: f64 = 8.314462618;

/// Molecular mass of water (kg/mol)
pub const MR_WATER_KGMOL: f64 = 0.01801528;

/// Molecular mass of dry air (kg/mol)
pub const MR_DRY_KGMOL: f64 = 0.028966216;

/// Specific gas constant for water vapour (J/kg/K)
pub const RGAS_V_JKGK: f64 = RGAS_UNIV_JMOLK / MR_WATER_KGMOL;

/// Specific latent heat of vapourisation of water (J/kg), IAPWS97 at 273.15 K
pub const LATENT_V_JKG: f64 = 2500930.0;

/// Specific heat capacity of dry air at constant pressure (J/kg/K)
pub const CP_DRY_JKGK: f64 = 1004.64;

/// Specific heat capacity of water vapour (J/kg/K), IAPWS97 at 273.15 K
pub const CP_V_JKGK: f64 = 1865.01;

/// Specific heat capacity of liquid water (J/kg/K)
pub const C_L_JKGK: f64 = 4192.664;

/// Density of dry air (kg/m^3), at 300 K
pub const RHO_DRY_KGM3: f64 = 1.177;

/// Density of liquid water (kg/m^3)
pub const RHO_L_KGM3: f64 = 1000.0;

/// Density of dry aerosol (kg/m^3), NaCl
pub const RHO_SOL_KGM3: f64 = 2077.0;

/// Molecular mass of aerosol (kg/mol), NaCl
pub const MR_SOL_KGMOL: f64 = 0.058443;

/// Degree of ionic dissociation (van't Hoff factor), NaCl
pub const IONIC: f64 = 2.0;

// =============================================================================
// DIMENSIONLESS FORMS
// =============================================================================

/// Ratio of water to dry-air molecular mass
pub const MR_RATIO: f64 = MR_WATER_KGMOL / MR_DRY_KGMOL;

/// Dimensionless heat capacity of dry air
pub const CP_DRY: f64 = CP_DRY_JKGK / CP0;

/// Dimensionless heat capacity of water vapour
pub const CP_V: f64 = CP_V_JKGK / CP0;

/// Dimensionless heat capacity of liquid water
pub const C_L: f64 = C_L_JKGK / CP0;

/// Dimensionless latent heat of vapourisation
pub const LATENT_V: f64 = LATENT_V_JKG / (TEMP0 * CP0);

/// Dimensionless density of dry air
pub const RHO_DRY: f64 = RHO_DRY_KGM3 / RHO0;

/// Dimensionless density of liquid water
pub const RHO_L: f64 = RHO_L_KGM3 / RHO0;

/// Dimensionless density of solute
pub const RHO_SOL: f64 = RHO_SOL_KGM3 / RHO0;

/// Dimensionless molecular mass of solute
pub const MR_SOL: f64 = MR_SOL_KGMOL / MR0;
