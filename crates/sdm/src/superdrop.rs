//! Super-droplet representation: one computational particle standing in for
//! `xi` identical real droplets.
//!
//! Equation references [X.YY] are to "An Introduction To Clouds From The
//! Microscale to Climate", Lohmann, Luond and Mahrt.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::constants as c;

/// Sentinel gridbox index marking a super-droplet that has left the domain.
pub const OUTSIDE_DOMAIN: u32 = u32::MAX;

/// Properties of the solute dissolved in every droplet. A single immutable
/// record is shared (by value) across the whole population.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SoluteProperties {
    /// Dimensionless density of the solute
    pub rho_sol: f64,
    /// Dimensionless molecular mass of the solute
    pub mr_sol: f64,
    /// Degree of ionic dissociation (van't Hoff factor)
    pub ionic: f64,
}

impl Default for SoluteProperties {
    /// NaCl aerosol.
    fn default() -> Self {
        Self {
            rho_sol: c::RHO_SOL,
            mr_sol: c::MR_SOL,
            ionic: c::IONIC,
        }
    }
}

/// A super-droplet: spatial coordinates, current gridbox, multiplicity and
/// droplet attributes. Radii, solute mass and coordinates are dimensionless.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Superdrop {
    /// Index of the gridbox containing this droplet, or [`OUTSIDE_DOMAIN`]
    pub gbx_index: u32,
    /// Vertical coordinate (unused directions stay at 0)
    pub coord3: f64,
    /// First horizontal coordinate
    pub coord1: f64,
    /// Second horizontal coordinate
    pub coord2: f64,
    /// Multiplicity: number of real droplets represented
    pub xi: u64,
    /// Droplet radius
    pub radius: f64,
    /// Mass of dissolved solute per real droplet
    pub m_sol: f64,
    /// Shared solute properties
    pub solute: SoluteProperties,
    /// Unique identity, assigned once at creation
    pub id: u64,
}

impl Superdrop {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        gbx_index: u32,
        coord3: f64,
        coord1: f64,
        coord2: f64,
        xi: u64,
        radius: f64,
        m_sol: f64,
        solute: SoluteProperties,
        id: u64,
    ) -> Self {
        Self {
            gbx_index,
            coord3,
            coord1,
            coord2,
            xi,
            radius,
            m_sol,
            solute,
            id,
        }
    }

    /// Spherical volume of the droplet.
    pub fn vol(&self) -> f64 {
        4.0 / 3.0 * PI * self.radius.powi(3)
    }

    /// Total droplet mass (water plus dry aerosol).
    pub fn mass(&self) -> f64 {
        let sol = self.m_sol * (1.0 - c::RHO_L / self.solute.rho_sol);
        4.0 / 3.0 * PI * c::RHO_L * self.radius.powi(3) + sol
    }

    /// Radius the droplet would have if it were entirely solute.
    pub fn dry_radius(&self) -> f64 {
        (3.0 * self.m_sol / (4.0 * PI * self.solute.rho_sol)).powf(1.0 / 3.0)
    }

    /// `a` in the Kelvin curvature factor `exp(a/r)`, eqn [6.24].
    pub fn akohler_factor(&self, temp: f64) -> f64 {
        const AKOH: f64 = 3.3e-7 / (c::TEMP0 * c::R0);
        AKOH / temp
    }

    /// `b` in the Raoult solute factor `1 - b/r^3`, eqn [6.22].
    pub fn bkohler_factor(&self) -> f64 {
        const BKOH: f64 = 4.3e-6 * c::RHO0 / c::MR0;
        BKOH * self.m_sol * self.solute.ionic / self.solute.mr_sol
    }

    /// Update the radius to `new_radius` clamped at the dry radius and
    /// return the resulting change. Droplets never shrink below the size of
    /// their dry aerosol.
    pub fn change_radius(&mut self, new_radius: f64) -> f64 {
        let old = self.radius;
        self.radius = self.dry_radius().max(new_radius);
        self.radius - old
    }

    /// A droplet with zero multiplicity or outside the domain takes no
    /// further part in microphysics or motion; it is retained in the global
    /// array for reporting only.
    pub fn is_inert(&self) -> bool {
        self.xi == 0 || self.gbx_index == OUTSIDE_DOMAIN
    }

    /// Equilibrium (wet) radius at supersaturation ratio `s_ratio`, the
    /// root of the Kohler polynomial, eqn [7.28] = 0, found by
    /// Newton-Raphson from the current radius. Used when checking or
    /// generating initial conditions.
    pub fn equilibrium_wetradius(&self, s_ratio: f64, temp: f64) -> Result<f64, String> {
        const MAXITERS: usize = 100;
        const RTOL: f64 = 1e-8;
        const ATOL: f64 = 1e-8;

        let akoh = self.akohler_factor(temp);
        let bkoh = self.bkohler_factor();

        let polynomial =
            |z: f64| -> f64 { (s_ratio - 1.0) * z.powi(3) - akoh * z.powi(2) + bkoh };

        let mut ziter = self.radius;
        for _ in 0..MAXITERS {
            let ode = polynomial(ziter);
            let odederiv = 3.0 * (s_ratio - 1.0) * ziter.powi(2) - 2.0 * akoh * ziter;
            ziter -= ode / odederiv;

            let new_ode = polynomial(ziter);
            if (new_ode - ode).abs() < RTOL * new_ode.abs() + ATOL {
                return Ok(ziter);
            }
        }

        Err(format!(
            "wet radius Newton-Raphson did not converge within {} iterations",
            MAXITERS
        ))
    }
}
