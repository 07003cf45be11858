//! Condensation / evaporation: diffusional growth and shrinking of
//! super-droplets, implicitly sub-stepped, with the latent-heat and vapour
//! feedback onto the host gridbox state.
//!
//! The radius ODE `dr/dt = (s - 1 - a/r + b/r^3) / (fkl + fdl)/r` is
//! timestepped implicitly as the root of the polynomial `g(z) = 0` with
//! `z = r^2` (Shima et al. 2009 section 5.1.2), solved by Newton-Raphson.
//! Thermodynamics are fixed over the substep, so every droplet of a gridbox
//! sees the same supersaturation (explicit in state, implicit in radius).

use std::f64::consts::PI;

use rayon::prelude::*;

use crate::constants as c;
use crate::errors::SdmError;
use crate::gridbox::{Gridbox, State};
use crate::superdrop::Superdrop;
use crate::thermo;
use crate::transport;

/// Tuning of the implicit sub-stepped integration.
#[derive(Clone, Copy, Debug)]
pub struct CondensationConfig {
    /// Feed latent heat and vapour changes back into the gridbox state.
    pub do_alter_thermo: bool,
    /// Maximum Newton-Raphson iterations per solve.
    pub niters: usize,
    /// Relative tolerance of the convergence test.
    pub rtol: f64,
    /// Absolute tolerance of the convergence test.
    pub atol: f64,
    /// Largest sub-timestep (dimensionless).
    pub subdelt_max: f64,
    /// Floor for sub-timestep halving; going below it is a convergence
    /// failure.
    pub subdelt_min: f64,
}

impl Default for CondensationConfig {
    fn default() -> Self {
        Self {
            do_alter_thermo: true,
            niters: 50,
            rtol: 1e-8,
            atol: 1e-8,
            subdelt_max: 1e-3,
            subdelt_min: 1e-6,
        }
    }
}

/// Constants of the growth ODE, fixed over one integration.
#[derive(Clone, Copy, Debug)]
struct OdeConstants {
    s_ratio: f64,
    akoh: f64,
    bkoh: f64,
    /// Liquid density times the sum of the heat and vapour diffusion
    /// factors, the denominator of the growth ODE.
    ffactor: f64,
}

/// Implicit-Euler integrator for the radius-squared growth polynomial.
#[derive(Clone, Copy, Debug)]
struct ImplicitEuler {
    niters: usize,
    rtol: f64,
    atol: f64,
}

impl ImplicitEuler {
    /// Integrate the ODE over `subdelt` from previous radius `rprev`,
    /// returning the new radius, or `None` if no root was converged upon
    /// within the iteration limit.
    fn solve(&self, ode: &OdeConstants, subdelt: f64, rprev: f64) -> Option<f64> {
        let mut ziter = self.initial_guess(ode, rprev);
        let mut converged = false;

        for _ in 0..self.niters.max(2) {
            let g = self.gfunc(ode, subdelt, rprev, ziter);
            let gderiv = self.gfunc_derivative(ode, subdelt, ziter);
            ziter = (ziter * (1.0 - g / gderiv)).max(1e-8);

            let g_new = self.gfunc(ode, subdelt, rprev, ziter);
            converged = g_new.abs() <= self.rtol * g.abs() + self.atol;
            if converged {
                break;
            }
        }

        converged.then(|| ziter.sqrt())
    }

    /// Reasonable starting `ziter`: the previous radius squared, except for
    /// droplets past their activation supersaturation, which jump to a
    /// large (1 mm) guess as in SCALE-SDM.
    fn initial_guess(&self, ode: &OdeConstants, rprev: f64) -> f64 {
        let s_act = 1.0 + (4.0 * ode.akoh.powi(3) / 27.0 / ode.bkoh).sqrt();
        if ode.s_ratio > s_act {
            let bigr: f64 = 1e-3 / c::R0;
            let r = bigr.max(rprev);
            return r * r;
        }
        rprev * rprev
    }

    /// `g(z) / z * subdelt` evaluated at `z = rsqrd`.
    fn gfunc(&self, ode: &OdeConstants, subdelt: f64, rprev: f64, rsqrd: f64) -> f64 {
        let radius = rsqrd.sqrt();
        let alpha = ode.s_ratio - 1.0 - ode.akoh / radius + ode.bkoh / radius.powi(3);
        let beta = 2.0 * subdelt / (rsqrd * ode.ffactor);
        let gamma = (rprev / radius).powi(2);
        1.0 - gamma - alpha * beta
    }

    /// `dg(z)/dz * subdelt` evaluated at `z = rsqrd`.
    fn gfunc_derivative(&self, ode: &OdeConstants, subdelt: f64, rsqrd: f64) -> f64 {
        let radius = rsqrd.sqrt();
        let alpha = ode.akoh / radius - 3.0 * ode.bkoh / radius.powi(3);
        let beta = subdelt / (rsqrd * ode.ffactor);
        1.0 - alpha * beta
    }
}

/// The condensation process over one microphysics substep of (dimensionless)
/// length `delt`.
#[derive(Clone, Copy, Debug)]
pub struct Condensation {
    pub config: CondensationConfig,
}

impl Condensation {
    pub fn new(config: CondensationConfig) -> Self {
        Self { config }
    }

    /// Run condensation on every gridbox in parallel.
    pub fn run(
        &self,
        delt: f64,
        gridboxes: &mut [Gridbox],
        supers: &mut [Superdrop],
    ) -> Result<(), SdmError> {
        let spans = transport::disjoint_spans(&*gridboxes, supers)?;
        gridboxes
            .par_iter_mut()
            .zip(spans)
            .try_for_each(|(gbx, drops)| self.condensation_in_gridbox(delt, gbx, drops))
    }

    /// Grow/shrink every droplet of one gridbox, then commit the
    /// accumulated vapour and latent-heat changes to its state in one go.
    fn condensation_in_gridbox(
        &self,
        delt: f64,
        gbx: &mut Gridbox,
        drops: &mut [Superdrop],
    ) -> Result<(), SdmError> {
        let state = &gbx.state;
        let psat = thermo::saturation_pressure(state.temp);
        let s_ratio = thermo::supersaturation_ratio(state.press, state.qvap, psat);
        let (fkl, fdl) = thermo::diffusion_factors(state.press, state.temp, psat);
        let ffactor = c::RHO_L * (fkl + fdl);

        let volume_m3 = state.volume * c::VOL0;
        let mut tot_rho_condensed = 0.0; // cumulative liquid mass change per volume

        for drop in drops.iter_mut().filter(|d| !d.is_inert()) {
            let mass_condensed = self
                .superdrop_growth(delt, s_ratio, state.temp, ffactor, drop)
                .map_err(|msg| SdmError::Convergence {
                    gbx_index: gbx.index,
                    droplet_id: drop.id,
                    msg,
                })?;
            tot_rho_condensed += mass_condensed / volume_m3;
        }

        if self.config.do_alter_thermo {
            condensation_alters_state(&mut gbx.state, tot_rho_condensed);
        }
        Ok(())
    }

    /// Integrate one droplet's radius over `delt` using sub-steps of at
    /// most `subdelt_max`, halving a sub-step whenever the Newton-Raphson
    /// iteration fails to converge. Returns the (dimensional-volume scaled)
    /// condensed liquid mass.
    fn superdrop_growth(
        &self,
        delt: f64,
        s_ratio: f64,
        temp: f64,
        ffactor: f64,
        drop: &mut Superdrop,
    ) -> Result<f64, String> {
        let ode = OdeConstants {
            s_ratio,
            akoh: drop.akohler_factor(temp),
            bkoh: drop.bkohler_factor(),
            ffactor,
        };
        let euler = ImplicitEuler {
            niters: self.config.niters,
            rtol: self.config.rtol,
            atol: self.config.atol,
        };

        let r_old = drop.radius;
        let mut radius = r_old;
        let mut remaining = delt;
        while remaining > 0.0 {
            let mut subdelt = self.config.subdelt_max.min(remaining);
            radius = loop {
                match euler.solve(&ode, subdelt, radius) {
                    Some(r) => break r,
                    None => {
                        subdelt /= 2.0;
                        if subdelt < self.config.subdelt_min {
                            return Err(format!(
                                "no root converged upon within {} Newton-Raphson iterations \
                                 after halving the sub-timestep to {:.3e}",
                                self.config.niters, subdelt
                            ));
                        }
                    }
                }
            };
            remaining -= subdelt.min(remaining);
        }

        drop.change_radius(radius);

        // condensed liquid mass, exact in the radius-cubed difference
        let dm_const = 4.0 / 3.0 * PI * c::RHO_L * c::R0.powi(3);
        Ok(dm_const * (drop.radius.powi(3) - r_old.powi(3)) * drop.xi as f64)
    }
}

/// Apply the accumulated condensed-mass change to the gridbox state:
/// vapour is consumed, condensate grows and the released latent heat warms
/// the parcel.
fn condensation_alters_state(state: &mut State, tot_rho_condensed: f64) {
    let delta_qcond = tot_rho_condensed / c::RHO_DRY;
    let delta_temp =
        c::LATENT_V / thermo::moist_specific_heat(state.qvap, state.qcond) * delta_qcond;

    state.temp += delta_temp;
    state.qvap -= delta_qcond;
    state.qcond += delta_qcond;
}
