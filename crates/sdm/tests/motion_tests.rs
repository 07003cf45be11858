//! Motion and transport bookkeeping across a 3-D domain: advection under
//! prescribed winds, boundary policies at the domain edges, and the
//! sort/span invariant of the global super-droplet array after every step.

use sdm::gridbox::{Gridbox, State};
use sdm::maps::{BoundaryCondition, CartesianMaps};
use sdm::motion::{PredCorrMotion, TerminalVelocity};
use sdm::superdrop::{SoluteProperties, Superdrop, OUTSIDE_DOMAIN};
use sdm::{transport, Simulation, Timesteps};

fn grid_10x10x10(bconds: [BoundaryCondition; 3]) -> CartesianMaps {
    CartesianMaps::uniform([10, 10, 10], [0.1, 0.1, 0.1], bconds).unwrap()
}

/// Gridboxes for `maps` all carrying the same uniform wind (a trivially
/// divergence-free field).
fn windy_gridboxes(maps: &CartesianMaps, w: f64, u: f64, v: f64) -> Vec<Gridbox> {
    (0..maps.ngbxs() as u32)
        .map(|i| {
            let mut state = State::new(maps.volume(i), 1.0, 1.0, 0.0, 0.0);
            state.wvel = (w, w);
            state.uvel = (u, u);
            state.vvel = (v, v);
            Gridbox::new(i, state)
        })
        .collect()
}

fn scattered_superdrops(maps: &CartesianMaps, per_gbx: usize) -> Vec<Superdrop> {
    let solute = SoluteProperties::default();
    let mut supers = Vec::new();
    let mut id = 0;
    for gbx in 0..maps.ngbxs() as u32 {
        let (lo3, up3) = maps.bounds(sdm::maps::Direction::Coord3, gbx);
        let (lo1, up1) = maps.bounds(sdm::maps::Direction::Coord1, gbx);
        let (lo2, up2) = maps.bounds(sdm::maps::Direction::Coord2, gbx);
        for k in 0..per_gbx {
            let frac = (k as f64 + 0.5) / per_gbx as f64;
            supers.push(Superdrop::new(
                gbx,
                lo3 + frac * (up3 - lo3),
                lo1 + frac * (up1 - lo1),
                lo2 + frac * (up2 - lo2),
                1000,
                10.0,
                0.1,
                solute,
                id,
            ));
            id += 1;
        }
    }
    supers
}

fn motion_only_sim(bconds: [BoundaryCondition; 3], wind: (f64, f64, f64)) -> Simulation {
    let maps = grid_10x10x10(bconds);
    let gridboxes = windy_gridboxes(&maps, wind.0, wind.1, wind.2);
    let superdrops = scattered_superdrops(&maps, 4);
    // motion every 1 s for 100 s; everything else only at the end
    let timesteps = Timesteps::from_realtimes(100.0, 1.0, 100.0, 100.0, 100.0, 100.0).unwrap();
    let mut sim = Simulation::new(maps, gridboxes, superdrops, timesteps, 0).unwrap();
    sim.motion = Some(PredCorrMotion::new(TerminalVelocity::Null));
    sim
}

#[test]
fn test_zero_wind_motion_is_identity() {
    let mut sim = motion_only_sim([BoundaryCondition::Periodic; 3], (0.0, 0.0, 0.0));
    let coords_before: Vec<(f64, f64, f64)> = sim
        .superdrops
        .iter()
        .map(|d| (d.coord3, d.coord1, d.coord2))
        .collect();
    let spans_before: Vec<_> = sim.gridboxes.iter().map(|g| g.span.clone()).collect();

    sim.run().unwrap();

    let coords_after: Vec<(f64, f64, f64)> = sim
        .superdrops
        .iter()
        .map(|d| (d.coord3, d.coord1, d.coord2))
        .collect();
    let spans_after: Vec<_> = sim.gridboxes.iter().map(|g| g.span.clone()).collect();
    assert_eq!(coords_before, coords_after);
    assert_eq!(spans_before, spans_after);
}

#[test]
fn test_periodic_domain_retains_every_droplet() {
    // winds below the CFL limit (gridbox width 0.1 per 1 s step = 0.1
    // dimensionless per 1e-3 time units)
    let mut sim = motion_only_sim([BoundaryCondition::Periodic; 3], (20.0, 15.0, 10.0));
    let n = sim.superdrops.len();

    sim.run().unwrap();

    let live = sim.superdrops.iter().filter(|d| !d.is_inert()).count();
    assert_eq!(live, n, "periodic boundaries must not lose droplets");
    transport::check_spans(&sim.gridboxes, &sim.superdrops).unwrap();
    assert!(transport::is_sorted(&sim.superdrops));
    // every droplet still lies inside its gridbox
    for drop in &sim.superdrops {
        assert!(
            sim.maps
                .contains(drop.gbx_index, drop.coord3, drop.coord1, drop.coord2),
            "droplet {} drifted out of gridbox {}",
            drop.id,
            drop.gbx_index
        );
    }
}

#[test]
fn test_outflow_domain_loses_droplets_to_trailing_segment() {
    // steady updraught through finite (outflow) vertical boundaries
    let mut sim = motion_only_sim([BoundaryCondition::Finite; 3], (30.0, 0.0, 0.0));
    let n = sim.superdrops.len();

    sim.run().unwrap();

    let out = sim
        .superdrops
        .iter()
        .filter(|d| d.gbx_index == OUTSIDE_DOMAIN)
        .count();
    assert!(out > 0, "updraught through an open top should expel droplets");
    assert_eq!(sim.superdrops.len(), n, "expelled droplets are retained for reporting");
    // expelled droplets sort to the trailing segment beyond every span
    let last_span_end = sim.gridboxes.iter().map(|g| g.span.end).max().unwrap();
    assert_eq!(last_span_end, n - out);
    transport::check_spans(&sim.gridboxes, &sim.superdrops).unwrap();
}

#[test]
fn test_motion_deterministic_rerun() {
    let mut a = motion_only_sim([BoundaryCondition::Periodic; 3], (20.0, 15.0, 10.0));
    let mut b = motion_only_sim([BoundaryCondition::Periodic; 3], (20.0, 15.0, 10.0));
    a.run().unwrap();
    b.run().unwrap();
    for (da, db) in a.superdrops.iter().zip(&b.superdrops) {
        assert_eq!(da.id, db.id);
        assert_eq!(da.coord3.to_bits(), db.coord3.to_bits());
        assert_eq!(da.coord1.to_bits(), db.coord1.to_bits());
        assert_eq!(da.coord2.to_bits(), db.coord2.to_bits());
        assert_eq!(da.gbx_index, db.gbx_index);
    }
}

#[test]
fn test_single_droplet_crossing_lower_boundary_policies() {
    // a lone droplet in the bottom gridbox moving downwards
    let maps_of = |bcond| {
        CartesianMaps::uniform([4, 1, 1], [0.25, 1.0, 1.0], [bcond; 3]).unwrap()
    };

    for (bcond, expected_gbx) in [
        (BoundaryCondition::Finite, OUTSIDE_DOMAIN),
        (BoundaryCondition::Periodic, 3),
    ] {
        let maps = maps_of(bcond);
        let mut gridboxes = windy_gridboxes(&maps, -100.0, 0.0, 0.0);
        let mut supers = vec![Superdrop::new(
            0,
            0.05,
            0.5,
            0.5,
            1,
            10.0,
            0.1,
            SoluteProperties::default(),
            0,
        )];
        transport::sort_supers(&mut supers);
        transport::set_spans(&mut gridboxes, &supers).unwrap();

        let motion = PredCorrMotion::new(TerminalVelocity::Null);
        // 1 s step moves the droplet down by 0.1, through the lower edge
        sdm::motion::move_superdrops(&maps, &mut gridboxes, &mut supers, &motion, 1e-3)
            .unwrap();

        assert_eq!(
            supers[0].gbx_index, expected_gbx,
            "{:?} boundary sent the droplet to the wrong place",
            bcond
        );
        if bcond == BoundaryCondition::Periodic {
            // coordinate wrapped by exactly the domain extent (1.0)
            assert!(
                (supers[0].coord3 - 0.95).abs() < 1e-12,
                "wrapped coord3 = {}",
                supers[0].coord3
            );
        }
    }
}
