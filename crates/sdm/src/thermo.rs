//! Thermodynamic equations for moist air inside a gridbox.
//!
//! Everything here takes and returns dimensionless quantities (see
//! `constants`). Equation references [X.YY] are to "An Introduction To
//! Clouds From The Microscale to Climate", Lohmann, Luond and Mahrt.

use crate::constants as c;

/// Specific heat capacity of a moist air parcel.
pub fn moist_specific_heat(qvap: f64, qcond: f64) -> f64 {
    c::CP_DRY + c::CP_V * qvap + c::C_L * qcond
}

/// Supersaturation ratio `s = p_vapour / psat` (i.e. relative humidity),
/// given ambient pressure, vapour mass mixing ratio and saturation pressure.
pub fn supersaturation_ratio(press: f64, qvap: f64, psat: f64) -> f64 {
    (press * qvap) / ((c::MR_RATIO + qvap) * psat)
}

/// Equilibrium vapour pressure of water over liquid water (saturation
/// pressure), Tetens-form fit (Murray 1967).
///
/// Panics in debug builds if `temp` is not positive.
pub fn saturation_pressure(temp: f64) -> f64 {
    debug_assert!(temp > 0.0, "psat requires temperature > 0K");

    const A: f64 = 17.4146;
    const B: f64 = 33.639;
    const TREF: f64 = 273.16; // triple point temperature [K]
    const PREF: f64 = 611.655; // triple point pressure [Pa]

    let t = temp * c::TEMP0; // real T [K]

    (PREF * (A * (t - TREF) / (t - B)).exp()) / c::P0
}

/// Heat (`fkl`) and vapour (`fdl`) diffusion factors in the equation for
/// radial growth of a droplet, eqns [7.23]-[7.26].
pub fn diffusion_factors(press: f64, temp: f64, psat: f64) -> (f64, f64) {
    const A: f64 = 7.11756e-5; // coefficient for T^2 in T*[eq.7.24]
    const B: f64 = 4.38127686e-3; // coefficient for T in T*[eq.7.24]
    const D: f64 = 4.012182971e-5; // constant in [eq.7.26]
    const LATENT_RGAS_V: f64 = c::LATENT_V_JKG / c::RGAS_V_JKGK;

    let temp_k = temp * c::TEMP0;
    let press_pa = press * c::P0;
    let psat_pa = psat * c::P0;

    let thermk = A * temp_k * temp_k + temp_k * B; // K * TEMP from [eq.7.24]
    let diffuse_v = (D / press_pa * temp_k.powf(1.94)) / c::RGAS_V_JKGK; // 1/R_v * D_v from [eq.7.26]

    let fkl = (LATENT_RGAS_V / temp_k - 1.0) * c::LATENT_V_JKG / (thermk * c::F0);
    let fdl = temp_k / (diffuse_v * psat_pa) / c::F0;

    (fkl, fdl)
}
