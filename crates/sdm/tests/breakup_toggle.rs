//! Breakup toggle: with coalescence-only collisions total multiplicity
//! never increases; with breakup enabled and collisions energetic enough
//! that no pair coalesces, total multiplicity grows by the configured
//! fragment accounting.

use sdm::collisions::{CollisionConfig, Collisions};
use sdm::gridbox::{Gridbox, State};
use sdm::kernels::CollisionKernel;
use sdm::motion::TerminalVelocity;
use sdm::superdrop::{SoluteProperties, Superdrop};
use sdm::transport;

/// Raindrop population energetic enough that the Low and List coalescence
/// efficiency vanishes: every enacted collision is a breakup.
fn raindrop_population() -> (Vec<Gridbox>, Vec<Superdrop>) {
    // 1 m^3 box, alternating 0.5 mm and 2 mm drops falling at different
    // speeds
    let gridboxes = vec![Gridbox::new(0, State::new(1e-9, 1.0, 1.0, 0.0, 0.0))];
    let solute = SoluteProperties::default();
    let supers: Vec<Superdrop> = (0..64)
        .map(|i| {
            let radius = if i % 2 == 0 { 500.0 } else { 2000.0 };
            Superdrop::new(0, 0.0005, 0.0005, 0.0005, 10_000, radius, 10.0, solute, i)
        })
        .collect();
    (gridboxes, supers)
}

fn lowlist_collisions(do_breakup: bool) -> Collisions {
    Collisions::new(CollisionConfig {
        kernel: CollisionKernel::LowList,
        terminalv: TerminalVelocity::Simmel,
        do_breakup,
        nfrags: 5.0,
    })
    .unwrap()
}

fn total_multiplicity(supers: &[Superdrop]) -> u64 {
    supers.iter().map(|d| d.xi).sum()
}

fn total_water_mass(supers: &[Superdrop]) -> f64 {
    supers
        .iter()
        .map(|d| d.xi as f64 * (d.vol() * sdm::constants::RHO_L + d.m_sol))
        .sum()
}

#[test]
fn test_breakup_disabled_multiplicity_non_increasing() {
    let (mut gridboxes, mut supers) = raindrop_population();
    transport::sort_supers(&mut supers);
    transport::set_spans(&mut gridboxes, &supers).unwrap();

    let colls = lowlist_collisions(false);
    let mut prev = total_multiplicity(&supers);
    for t in 0u64..50 {
        colls.run(t, 11, 1.0, &gridboxes, &mut supers).unwrap();
        let total = total_multiplicity(&supers);
        assert!(total <= prev, "multiplicity grew without breakup");
        prev = total;
    }
}

#[test]
fn test_breakup_enabled_multiplicity_grows() {
    let (mut gridboxes, mut supers) = raindrop_population();
    transport::sort_supers(&mut supers);
    transport::set_spans(&mut gridboxes, &supers).unwrap();

    let colls = lowlist_collisions(true);
    let before = total_multiplicity(&supers);
    let mass_before = total_water_mass(&supers);

    for t in 0u64..10 {
        colls.run(t, 11, 1.0, &gridboxes, &mut supers).unwrap();
    }

    let after = total_multiplicity(&supers);
    assert!(
        after > before,
        "energetic collisions with breakup enabled must multiply fragments: {} -> {}",
        before,
        after
    );

    let mass_after = total_water_mass(&supers);
    let rel = ((mass_after - mass_before) / mass_before).abs();
    assert!(rel <= 1e-12, "breakup must conserve water mass (rel {})", rel);
}

#[test]
fn test_forced_twin_breakup_fragment_accounting() {
    // two equal-multiplicity super-droplets of unequal size; multiplicity
    // high enough that the pair probability exceeds one, so gamma >= 1
    // with certainty and one twin breakup turns 2*xi real droplets into
    // round(nfrags*xi) fragments
    let mut gridboxes = vec![Gridbox::new(0, State::new(1e-9, 1.0, 1.0, 0.0, 0.0))];
    let solute = SoluteProperties::default();
    let mut supers = vec![
        Superdrop::new(0, 0.0005, 0.0005, 0.0005, 100_000, 500.0, 10.0, solute, 0),
        Superdrop::new(0, 0.0005, 0.0005, 0.0005, 100_000, 2000.0, 10.0, solute, 1),
    ];
    transport::sort_supers(&mut supers);
    transport::set_spans(&mut gridboxes, &supers).unwrap();

    let colls = lowlist_collisions(true);
    colls.run(0, 11, 1.0, &gridboxes, &mut supers).unwrap();

    let total = total_multiplicity(&supers);
    // round(nfrags * xi) fragments out of the 2 * xi colliding drops
    assert_eq!(
        total, 500_000,
        "twin breakup with nfrags = 5 should leave 5 * xi fragments"
    );
}
