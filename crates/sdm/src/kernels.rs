//! Collision kernels: the pair-wise rate `K(a, b)` and the efficiencies
//! entering the probability that two (real) droplets collide and coalesce.
//!
//! The pair probability follows Shima et al. 2009 eqn 3,
//! `prob = K(a, b) * delt / volume`, with the kernel selected at
//! configuration time.

use std::f64::consts::PI;

use crate::constants as c;
use crate::motion::TerminalVelocity;
use crate::superdrop::Superdrop;

/// Pair-wise collision kernel, a closed set chosen by configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CollisionKernel {
    /// Golovin 1963 sum-of-volumes kernel `K = b (V_a + V_b)`.
    Golovin { b: f64 },
    /// Long's hydrodynamic (gravitational) kernel in the formulation of
    /// Simmel et al. 2002, with coalescence efficiency 1.
    Long,
    /// As [`CollisionKernel::Long`] but with the coalescence efficiency of
    /// Low and List 1982(a).
    LowList,
}

impl Default for CollisionKernel {
    fn default() -> Self {
        CollisionKernel::Golovin { b: 1.5e3 }
    }
}

impl CollisionKernel {
    /// Probability that a pair of real droplets collide (and coalesce or
    /// break up) during real time `delt` [s] within real volume
    /// `volume` [m^3].
    pub fn pair_probability(
        &self,
        drop1: &Superdrop,
        drop2: &Superdrop,
        terminalv: TerminalVelocity,
        delt: f64,
        volume: f64,
    ) -> f64 {
        let delt_delvol = delt / volume;
        match self {
            CollisionKernel::Golovin { b } => {
                let prob_jk_const = b * c::R0.powi(3);
                let golovins_kernel = prob_jk_const * (drop1.vol() + drop2.vol());
                golovins_kernel * delt_delvol
            }
            CollisionKernel::Long | CollisionKernel::LowList => {
                hydrodynamic_probability(drop1, drop2, terminalv, long_collision_efficiency)
                    * delt_delvol
            }
        }
    }

    /// Efficiency with which a collision results in coalescence rather
    /// than breakup. Unity except for the Low and List kernel.
    pub fn coalescence_efficiency(
        &self,
        drop1: &Superdrop,
        drop2: &Superdrop,
        terminalv: TerminalVelocity,
    ) -> f64 {
        match self {
            CollisionKernel::Golovin { .. } | CollisionKernel::Long => 1.0,
            CollisionKernel::LowList => lowlist_coalescence_efficiency(drop1, drop2, terminalv),
        }
    }
}

/// Hydrodynamic kernel `K = eff * pi (r1 + r2)^2 |vt1 - vt2|` in real
/// units [m^3/s].
fn hydrodynamic_probability(
    drop1: &Superdrop,
    drop2: &Superdrop,
    terminalv: TerminalVelocity,
    eff: fn(&Superdrop, &Superdrop) -> f64,
) -> f64 {
    let prob_jk_const = PI * c::R0 * c::R0 * c::W0;
    let sumr = drop1.radius + drop2.radius;
    let vdiff = (terminalv.velocity(drop1) - terminalv.velocity(drop2)).abs();
    eff(drop1, drop2) * prob_jk_const * sumr * sumr * vdiff
}

/// Long's collision efficiency as given by equations 12 and 13 of Simmel
/// et al. 2002: unity once the larger droplet exceeds 50 microns, else a
/// quadratic fit floored at 0.001.
fn long_collision_efficiency(drop1: &Superdrop, drop2: &Superdrop) -> f64 {
    const RLIM: f64 = 5e-5 / c::R0;
    const COLLEFF_LIM: f64 = 0.001;
    const A1: f64 = 4.5e4 * c::R0 * c::R0;
    const A2: f64 = 3e-4 / c::R0;

    let smallr = drop1.radius.min(drop2.radius);
    let bigr = drop1.radius.max(drop2.radius);

    if bigr < RLIM {
        (A1 * bigr * bigr * (1.0 - A2 / smallr)).max(COLLEFF_LIM)
    } else {
        1.0
    }
}

/// Collision kinetic energy of a droplet pair, Low and List 1982(a)
/// eqn 3.1, in [J].
fn collision_kinetic_energy(r1: f64, r2: f64, terminalv1: f64, terminalv2: f64) -> f64 {
    let r0cubed = c::R0 * c::R0 * c::R0;
    let cke_const = r0cubed * 2.0 / 3.0 * c::RHO_L_KGM3 * PI * c::W0;

    let r1cubed = r1 * r1 * r1;
    let r1_r2cubed = (r1 / r2).powi(3);
    let rratio = r1cubed / (1.0 + r1_r2cubed);

    let vdiff = terminalv1 - terminalv2;
    cke_const * rratio * vdiff * vdiff
}

/// Surface tension of water [J/m^2].
const SIGMA: f64 = 7.28e-2;

/// Total surface energy of a droplet pair, eqn 4.2 of Low and List
/// 1982(a), in [J].
fn total_surface_energy(r1: f64, r2: f64) -> f64 {
    let surf_const = 4.0 * SIGMA * PI * c::R0 * c::R0;
    surf_const * (r1 * r1 + r2 * r2)
}

/// Surface energy of the coalesced spherical equivalent of a droplet pair,
/// eqn 4.3 of Low and List 1982(a), in [J].
fn coalesced_surface_energy(r1: f64, r2: f64) -> f64 {
    let surf_const = 4.0 * SIGMA * PI * c::R0 * c::R0;
    let rcubed_sum = r1 * r1 * r1 + r2 * r2 * r2;
    surf_const * rcubed_sum.powf(2.0 / 3.0)
}

/// Coalescence efficiency from equations 4.5 and 4.6 of Low and List
/// 1982(a): an exponential in the total collision energy over the
/// coalesced surface energy, times a droplet size-ratio factor; zero above
/// the energy cutoff.
fn lowlist_coalescence_efficiency(
    drop1: &Superdrop,
    drop2: &Superdrop,
    terminalv: TerminalVelocity,
) -> f64 {
    const ACONST: f64 = 0.778;
    const BCONST: f64 = -2.62e6; // [J^-2]
    const ENERGY_LIM: f64 = 5e-6; // [J]

    let (r1, r2) = (drop1.radius, drop2.radius);
    let cke = collision_kinetic_energy(
        r1,
        r2,
        terminalv.velocity(drop1),
        terminalv.velocity(drop2),
    );
    let surf_t = total_surface_energy(r1, r2);
    let surf_c = coalesced_surface_energy(r1, r2);
    let etot = cke + surf_t - surf_c;

    if etot < ENERGY_LIM {
        let exponent = BCONST * SIGMA * etot * etot / surf_c;
        let rsmall = r1.min(r2);
        let rbig = r1.max(r2);
        let alpha = 1.0 + rsmall / rbig;
        ACONST / (alpha * alpha) * exponent.exp()
    } else {
        0.0
    }
}
