//! Super-droplet motion: terminal velocity formulas, predictor-corrector
//! advection through the interpolated gridbox wind field, and the
//! gridbox-index update with boundary handling.
//!
//! The predictor-corrector scheme follows Grabowski et al. 2018: evaluate
//! the wind at the current coordinates, predict, re-evaluate at the
//! predicted coordinates, then advance by the mean of the two velocities.

use glam::DVec3;
use rayon::prelude::*;

use crate::constants as c;
use crate::errors::SdmError;
use crate::gridbox::{Gridbox, State};
use crate::maps::{BoundaryCondition, CartesianMaps, Direction};
use crate::superdrop::{Superdrop, OUTSIDE_DOMAIN};
use crate::transport;

/// Terminal fall speed formula for a droplet, selected at configuration
/// time. All formulas return dimensionless velocities.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminalVelocity {
    /// No sedimentation.
    Null,
    /// Rogers and Yau 1989, chapter 8: piecewise Stokes-based fits capped
    /// at the fall speed of a 2 mm drop (9 m/s).
    RogersYau,
    /// Simmel et al. 2002 table 2: mass power-law fits adapted from Gunn
    /// and Kinzer 1949 and Beard 1976.
    Simmel,
}

impl TerminalVelocity {
    pub fn velocity(&self, drop: &Superdrop) -> f64 {
        match self {
            TerminalVelocity::Null => 0.0,
            TerminalVelocity::RogersYau => rogers_yau_terminalv(drop),
            TerminalVelocity::Simmel => simmel_terminalv(drop),
        }
    }
}

fn rogers_yau_terminalv(drop: &Superdrop) -> f64 {
    const R1: f64 = 3e-5 / c::R0;
    const R2: f64 = 6e-4 / c::R0;
    const R3: f64 = 2e-3 / c::R0;

    const K1: f64 = 1.19e8 * c::R0 * c::R0 / c::W0; // eqn (8.5)
    const K2: f64 = 8000.0 * c::R0 / c::W0; // eqn (8.8)
    const K3: f64 = 201.0 / c::W0; // eqn (8.6)
    const K4: f64 = 9.0 / c::W0; // max fall speed

    let radius = drop.radius;
    if radius < R1 {
        K1 * radius * radius
    } else if radius < R2 {
        K2 * radius
    } else if radius < R3 {
        K3 * (radius * c::R0).sqrt()
    } else {
        K4
    }
}

fn simmel_terminalv(drop: &Superdrop) -> f64 {
    // radii thresholds and alpha constants of Simmel et al. 2002 table 2,
    // alphas converted from [cm/s g^-beta] into dimensionless velocity
    const R1: f64 = 6.7215e-5 / c::R0;
    const R2: f64 = 7.5582e-4 / c::R0;
    const R3: f64 = 1.73892e-3 / c::R0;

    const VELCONST: f64 = 100.0 * c::W0;
    const A1: f64 = 457950.0 / VELCONST;
    const A2: f64 = 4962.0 / VELCONST;
    const A3: f64 = 1732.0 / VELCONST;
    const A4: f64 = 917.0 / VELCONST;

    let mass_grams = drop.mass() * c::MASS0_GRAMS;
    let radius = drop.radius;
    if radius < R1 {
        A1 * mass_grams.powf(2.0 / 3.0)
    } else if radius < R2 {
        A2 * mass_grams.powf(1.0 / 3.0)
    } else if radius < R3 {
        A3 * mass_grams.powf(1.0 / 6.0)
    } else {
        A4
    }
}

/// Wind velocity `(w, u, v)` at the given coordinates, linearly
/// interpolated between the face values of the droplet's gridbox. The
/// interpolation extrapolates linearly for coordinates beyond the bounds,
/// which the corrector evaluation of a fast droplet may produce.
fn interpolate_winds(
    maps: &CartesianMaps,
    gbx_index: u32,
    state: &State,
    coord3: f64,
    coord1: f64,
    coord2: f64,
) -> DVec3 {
    let lerp = |faces: (f64, f64), bounds: (f64, f64), coord: f64| {
        let frac = (coord - bounds.0) / (bounds.1 - bounds.0);
        faces.0 + (faces.1 - faces.0) * frac
    };

    DVec3::new(
        lerp(state.wvel, maps.bounds(Direction::Coord3, gbx_index), coord3),
        lerp(state.uvel, maps.bounds(Direction::Coord1, gbx_index), coord1),
        lerp(state.vvel, maps.bounds(Direction::Coord2, gbx_index), coord2),
    )
}

/// Predictor-corrector motion of super-droplets with a terminal-velocity
/// contribution on the vertical coordinate.
#[derive(Clone, Copy, Debug)]
pub struct PredCorrMotion {
    pub terminalv: TerminalVelocity,
}

impl PredCorrMotion {
    pub fn new(terminalv: TerminalVelocity) -> Self {
        Self { terminalv }
    }

    /// Advance one droplet's coordinates by `delt`, returning a motion
    /// error if the displacement violates the CFL criterion for its
    /// gridbox.
    fn update_superdrop_coords(
        &self,
        maps: &CartesianMaps,
        gbx_index: u32,
        state: &State,
        drop: &mut Superdrop,
        delt: f64,
    ) -> Result<(), SdmError> {
        let terminal = self.terminalv.velocity(drop);

        // predictor velocities at current coords
        let mut vel = interpolate_winds(maps, gbx_index, state, drop.coord3, drop.coord1, drop.coord2);
        vel.x -= terminal;

        // corrector velocities at predicted coords
        let pred = DVec3::new(drop.coord3, drop.coord1, drop.coord2) + vel * delt;
        let mut corrvel = interpolate_winds(maps, gbx_index, state, pred.x, pred.y, pred.z);
        corrvel.x -= terminal;

        let delta = (vel + corrvel) * (delt / 2.0);

        cfl_criteria(maps, gbx_index, delta)?;

        drop.coord3 += delta.x;
        drop.coord1 += delta.y;
        drop.coord2 += delta.z;
        Ok(())
    }
}

/// CFL criterion: a displacement must not exceed the gridbox extent in its
/// direction.
fn cfl_criteria(maps: &CartesianMaps, gbx_index: u32, delta: DVec3) -> Result<(), SdmError> {
    for (dir, d) in Direction::ALL.into_iter().zip([delta.x, delta.y, delta.z]) {
        let (lo, up) = maps.bounds(dir, gbx_index);
        if d.abs() > up - lo {
            return Err(SdmError::Motion(format!(
                "CFL violated in gridbox {}: displacement {:.3e} exceeds gridbox extent {:.3e}; \
                 reduce the motion timestep",
                gbx_index,
                d.abs(),
                up - lo
            )));
        }
    }
    Ok(())
}

/// Update a droplet's gridbox index after its coordinates moved, checking
/// the directions in the order coord3, coord1, coord2 and applying the
/// domain boundary condition at edges (periodic wrap of the coordinate, or
/// the outside-domain sentinel for finite edges).
pub fn update_superdrop_gbxindex(
    maps: &CartesianMaps,
    drop: &mut Superdrop,
) -> Result<(), SdmError> {
    if drop.gbx_index == OUTSIDE_DOMAIN {
        return Ok(());
    }

    for dir in Direction::ALL {
        move_to_neighbour(maps, dir, drop);
        if drop.gbx_index == OUTSIDE_DOMAIN {
            return Ok(());
        }
    }

    if !maps.contains(drop.gbx_index, drop.coord3, drop.coord1, drop.coord2) {
        return Err(SdmError::Motion(format!(
            "droplet {} lost: coords ({:.4e}, {:.4e}, {:.4e}) not within gridbox {} \
             nor a neighbour; reduce the motion timestep to satisfy CFL criteria",
            drop.id, drop.coord3, drop.coord1, drop.coord2, drop.gbx_index
        )));
    }
    Ok(())
}

fn coord_of(drop: &Superdrop, dir: Direction) -> f64 {
    match dir {
        Direction::Coord3 => drop.coord3,
        Direction::Coord1 => drop.coord1,
        Direction::Coord2 => drop.coord2,
    }
}

fn coord_of_mut(drop: &mut Superdrop, dir: Direction) -> &mut f64 {
    match dir {
        Direction::Coord3 => &mut drop.coord3,
        Direction::Coord1 => &mut drop.coord1,
        Direction::Coord2 => &mut drop.coord2,
    }
}

/// One-direction gridbox-index step: if the coordinate left the bounds of
/// the droplet's gridbox, move to the backward/forward neighbour. Crossing
/// a periodic domain edge wraps the coordinate by exactly the domain
/// extent; crossing a finite edge marks the droplet outside the domain.
fn move_to_neighbour(maps: &CartesianMaps, dir: Direction, drop: &mut Superdrop) {
    let idx = drop.gbx_index;
    let (lo, up) = maps.bounds(dir, idx);
    let (domain_lo, domain_up) = maps.domain_bounds(dir);
    let coord = coord_of(drop, dir);
    let periodic = maps.boundary_condition(dir) == BoundaryCondition::Periodic;

    if coord < lo {
        let nbr = maps.neighbour_back(dir, idx);
        if nbr == OUTSIDE_DOMAIN {
            drop.gbx_index = OUTSIDE_DOMAIN;
            return;
        }
        if periodic && lo <= domain_lo {
            *coord_of_mut(drop, dir) += maps.domain_extent(dir);
        }
        drop.gbx_index = nbr;
    } else if coord >= up {
        let nbr = maps.neighbour_forward(dir, idx);
        if nbr == OUTSIDE_DOMAIN {
            drop.gbx_index = OUTSIDE_DOMAIN;
            return;
        }
        if periodic && up >= domain_up {
            *coord_of_mut(drop, dir) -= maps.domain_extent(dir);
        }
        drop.gbx_index = nbr;
    }
}

/// Move all super-droplets for one motion substep: update coordinates per
/// gridbox (in parallel across gridboxes), update gridbox indexes per
/// droplet, then restore the sort/span invariant of the global array.
pub fn move_superdrops(
    maps: &CartesianMaps,
    gridboxes: &mut [Gridbox],
    supers: &mut [Superdrop],
    motion: &PredCorrMotion,
    delt: f64,
) -> Result<(), SdmError> {
    // (1) coordinate updates, using each droplet's host gridbox state
    let spans = transport::disjoint_spans(gridboxes, supers)?;
    gridboxes
        .par_iter()
        .zip(spans)
        .try_for_each(|(gbx, drops)| -> Result<(), SdmError> {
            for drop in drops.iter_mut().filter(|d| !d.is_inert()) {
                motion.update_superdrop_coords(maps, gbx.index, &gbx.state, drop, delt)?;
            }
            Ok(())
        })?;

    // (2) gridbox-index updates
    supers
        .par_iter_mut()
        .filter(|d| !d.is_inert())
        .try_for_each(|drop| update_superdrop_gbxindex(maps, drop))?;

    // (3) restore sort order and per-gridbox spans
    transport::sort_supers(supers);
    transport::set_spans(gridboxes, supers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maps::BoundaryCondition;
    use crate::superdrop::SoluteProperties;

    fn drop_at(gbx: u32, coord3: f64, coord1: f64, coord2: f64) -> Superdrop {
        Superdrop::new(
            gbx,
            coord3,
            coord1,
            coord2,
            1,
            10.0,
            1e-9,
            SoluteProperties::default(),
            0,
        )
    }

    fn uniform_maps(bcond: BoundaryCondition) -> CartesianMaps {
        CartesianMaps::uniform([4, 1, 1], [1.0, 1.0, 1.0], [bcond; 3]).unwrap()
    }

    #[test]
    fn test_terminal_velocity_grows_with_radius() {
        let small = drop_at(0, 0.5, 0.5, 0.5);
        let mut big = drop_at(0, 0.5, 0.5, 0.5);
        big.radius = 1000.0; // 1 mm
        for tv in [TerminalVelocity::RogersYau, TerminalVelocity::Simmel] {
            assert!(tv.velocity(&big) > tv.velocity(&small), "{:?}", tv);
        }
        assert_eq!(TerminalVelocity::Null.velocity(&big), 0.0);
    }

    #[test]
    fn test_rogers_yau_capped() {
        let mut huge = drop_at(0, 0.5, 0.5, 0.5);
        huge.radius = 5e-3 / c::R0; // 5 mm
        let v = TerminalVelocity::RogersYau.velocity(&huge);
        assert!((v - 9.0 / c::W0).abs() < 1e-12, "v = {}", v);
    }

    #[test]
    fn test_wind_interpolation_linear() {
        let maps = uniform_maps(BoundaryCondition::Finite);
        let mut state = State::new(1.0, 1.0, 1.0, 0.0, 0.0);
        state.wvel = (1.0, 3.0);
        // halfway up gridbox 0 the w wind is the face mean
        let winds = interpolate_winds(&maps, 0, &state, 0.5, 0.5, 0.5);
        assert!((winds.x - 2.0).abs() < 1e-12);
        assert!(winds.y.abs() < 1e-12 && winds.z.abs() < 1e-12);
        // at the faces the face values are recovered
        assert!((interpolate_winds(&maps, 0, &state, 0.0, 0.5, 0.5).x - 1.0).abs() < 1e-12);
        assert!((interpolate_winds(&maps, 0, &state, 1.0, 0.5, 0.5).x - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_uniform_wind_advects_exactly() {
        let maps = uniform_maps(BoundaryCondition::Finite);
        let mut state = State::new(1.0, 1.0, 1.0, 0.0, 0.0);
        state.wvel = (0.5, 0.5);
        let mut drop = drop_at(1, 1.25, 0.5, 0.5);
        let motion = PredCorrMotion::new(TerminalVelocity::Null);
        motion
            .update_superdrop_coords(&maps, 1, &state, &mut drop, 1.0)
            .unwrap();
        assert!((drop.coord3 - 1.75).abs() < 1e-12, "coord3 = {}", drop.coord3);
    }

    #[test]
    fn test_cfl_violation_detected() {
        let maps = uniform_maps(BoundaryCondition::Finite);
        let mut state = State::new(1.0, 1.0, 1.0, 0.0, 0.0);
        state.wvel = (5.0, 5.0); // 5 gridbox widths per unit time
        let mut drop = drop_at(1, 1.5, 0.5, 0.5);
        let motion = PredCorrMotion::new(TerminalVelocity::Null);
        let err = motion
            .update_superdrop_coords(&maps, 1, &state, &mut drop, 1.0)
            .unwrap_err();
        assert!(matches!(err, SdmError::Motion(_)));
    }

    #[test]
    fn test_index_update_within_bounds_unchanged() {
        let maps = uniform_maps(BoundaryCondition::Finite);
        let mut drop = drop_at(2, 2.5, 0.5, 0.5);
        update_superdrop_gbxindex(&maps, &mut drop).unwrap();
        assert_eq!(drop.gbx_index, 2);
    }

    #[test]
    fn test_index_update_moves_to_neighbour() {
        let maps = uniform_maps(BoundaryCondition::Finite);
        let mut drop = drop_at(2, 1.75, 0.5, 0.5);
        update_superdrop_gbxindex(&maps, &mut drop).unwrap();
        assert_eq!(drop.gbx_index, 1);
    }

    #[test]
    fn test_outflow_marks_outside_domain() {
        let maps = uniform_maps(BoundaryCondition::Finite);
        let mut drop = drop_at(0, -0.25, 0.5, 0.5);
        update_superdrop_gbxindex(&maps, &mut drop).unwrap();
        assert_eq!(drop.gbx_index, OUTSIDE_DOMAIN);
    }

    #[test]
    fn test_periodic_wraps_coordinate_by_domain_extent() {
        let maps = uniform_maps(BoundaryCondition::Periodic);
        let mut drop = drop_at(0, -0.25, 0.5, 0.5);
        update_superdrop_gbxindex(&maps, &mut drop).unwrap();
        assert_eq!(drop.gbx_index, 3);
        assert!(
            (drop.coord3 - 3.75).abs() < 1e-12,
            "coord3 = {} should wrap by the domain extent",
            drop.coord3
        );
    }

    #[test]
    fn test_lost_droplet_is_motion_error() {
        let maps = uniform_maps(BoundaryCondition::Finite);
        // coords two gridboxes away cannot be reached by one neighbour hop
        let mut drop = drop_at(0, 2.5, 0.5, 0.5);
        drop.coord3 = 2.5;
        let err = update_superdrop_gbxindex(&maps, &mut drop).unwrap_err();
        assert!(matches!(err, SdmError::Motion(_)));
    }
}
