//! Binary initial-condition readers: gridbox bounds and super-droplet
//! records.
//!
//! ## File formats (little-endian)
//!
//! *grid*: one record per gridbox in index order, three `(lower, upper)`
//! pairs of IEEE-754 doubles (coord3, coord1, coord2 bounds), 48 bytes per
//! gridbox.
//!
//! *initsupers*: one 52-byte record per super-droplet:
//! `gbx_index (u32), coord3, coord1, coord2, radius, m_sol (f64 each),
//! xi (u64)`.

use std::path::Path;

use bytemuck::{Pod, Zeroable};

use sdm::gridbox::{Gridbox, State};
use sdm::maps::{BoundaryCondition, CartesianMaps, GbxBounds};
use sdm::superdrop::{SoluteProperties, Superdrop};
use sdm::SdmError;

use crate::config::InitThermoConfig;
use sdm::constants as c;

const GRID_RECORD_BYTES: usize = 6 * 8;
const SUPER_RECORD_BYTES: usize = 4 + 5 * 8 + 8;

/// On-disk super-droplet record.
#[derive(Clone, Copy, Pod, Zeroable)]
#[repr(C, packed)]
struct SuperdropRecord {
    gbx_index: u32,
    coord3: f64,
    coord1: f64,
    coord2: f64,
    radius: f64,
    m_sol: f64,
    xi: u64,
}

/// Read the gridbox-bounds file and build the Cartesian maps.
pub fn read_gridfile(
    path: &Path,
    ndims: [usize; 3],
    bconds: [BoundaryCondition; 3],
) -> Result<CartesianMaps, SdmError> {
    let bytes = std::fs::read(path)?;
    let ngbxs: usize = ndims.iter().product();
    if bytes.len() != ngbxs * GRID_RECORD_BYTES {
        return Err(SdmError::Init(format!(
            "gridfile {} is {} bytes; {} gridboxes need {}",
            path.display(),
            bytes.len(),
            ngbxs,
            ngbxs * GRID_RECORD_BYTES
        )));
    }

    let bounds: Vec<GbxBounds> = bytes
        .chunks_exact(GRID_RECORD_BYTES)
        .map(|record| {
            let f = |i: usize| bytemuck::pod_read_unaligned::<f64>(&record[i * 8..(i + 1) * 8]);
            GbxBounds {
                bounds3: (f(0), f(1)),
                bounds1: (f(2), f(3)),
                bounds2: (f(4), f(5)),
            }
        })
        .collect();

    log::info!(
        "read {} gridbox bounds records from {}",
        bounds.len(),
        path.display()
    );
    CartesianMaps::from_bounds(ndims, bconds, bounds)
}

/// Read the super-droplet initial conditions, assigning sequential ids in
/// record order.
pub fn read_initsupers(
    path: &Path,
    totnsupers: usize,
    solute: SoluteProperties,
) -> Result<Vec<Superdrop>, SdmError> {
    let bytes = std::fs::read(path)?;
    if bytes.len() % SUPER_RECORD_BYTES != 0 {
        return Err(SdmError::Init(format!(
            "initsupers file {} is {} bytes, not a whole number of {}-byte records",
            path.display(),
            bytes.len(),
            SUPER_RECORD_BYTES
        )));
    }
    let nrecords = bytes.len() / SUPER_RECORD_BYTES;
    if nrecords != totnsupers {
        return Err(SdmError::Init(format!(
            "initsupers file {} holds {} super-droplets but the configuration expects {}",
            path.display(),
            nrecords,
            totnsupers
        )));
    }

    let supers = bytes
        .chunks_exact(SUPER_RECORD_BYTES)
        .enumerate()
        .map(|(id, chunk)| {
            let record = bytemuck::pod_read_unaligned::<SuperdropRecord>(chunk);
            let (gbx_index, xi) = (record.gbx_index, record.xi);
            Superdrop::new(
                gbx_index,
                record.coord3,
                record.coord1,
                record.coord2,
                xi,
                record.radius,
                record.m_sol,
                solute,
                id as u64,
            )
        })
        .collect();

    log::info!(
        "read {} super-droplet records from {}",
        nrecords,
        path.display()
    );
    Ok(supers)
}

/// Gridboxes with the uniform initial thermodynamic state, volumes from
/// the maps.
pub fn make_gridboxes(maps: &CartesianMaps, thermo: &InitThermoConfig) -> Vec<Gridbox> {
    (0..maps.ngbxs() as u32)
        .map(|index| {
            let state = State::new(
                maps.volume(index),
                thermo.press / c::P0,
                thermo.temp / c::TEMP0,
                thermo.qvap,
                thermo.qcond,
            );
            Gridbox::new(index, state)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("sdm-init-test-{}-{}", std::process::id(), name));
        path
    }

    fn write_gridfile(path: &Path, records: &[[f64; 6]]) {
        let mut file = std::fs::File::create(path).unwrap();
        for record in records {
            for value in record {
                file.write_all(&value.to_le_bytes()).unwrap();
            }
        }
    }

    #[test]
    fn test_read_gridfile_roundtrip() {
        let path = temp_path("grid");
        write_gridfile(
            &path,
            &[
                [0.0, 1.0, 0.0, 2.0, 0.0, 2.0],
                [1.0, 2.0, 0.0, 2.0, 0.0, 2.0],
            ],
        );

        let maps = read_gridfile(
            &path,
            [2, 1, 1],
            [BoundaryCondition::Finite; 3],
        )
        .unwrap();
        assert_eq!(maps.ngbxs(), 2);
        assert_eq!(maps.bounds(sdm::maps::Direction::Coord3, 1), (1.0, 2.0));
        assert!((maps.volume(0) - 4.0).abs() < 1e-12);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_gridfile_size_mismatch_is_init_error() {
        let path = temp_path("grid-short");
        write_gridfile(&path, &[[0.0, 1.0, 0.0, 1.0, 0.0, 1.0]]);
        let err = read_gridfile(&path, [2, 1, 1], [BoundaryCondition::Finite; 3]).unwrap_err();
        assert!(matches!(err, SdmError::Init(_)));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_read_initsupers_assigns_ids() {
        let path = temp_path("supers");
        let mut file = std::fs::File::create(&path).unwrap();
        for (gbx, radius) in [(0u32, 5.0f64), (1, 10.0)] {
            file.write_all(&gbx.to_le_bytes()).unwrap();
            for value in [0.5, 0.5, 0.5, radius, 0.1] {
                file.write_all(&f64::to_le_bytes(value)).unwrap();
            }
            file.write_all(&1000u64.to_le_bytes()).unwrap();
        }
        drop(file);

        let supers = read_initsupers(&path, 2, SoluteProperties::default()).unwrap();
        assert_eq!(supers.len(), 2);
        assert_eq!(supers[0].id, 0);
        assert_eq!(supers[1].id, 1);
        assert_eq!(supers[1].gbx_index, 1);
        assert_eq!(supers[1].radius, 10.0);
        assert_eq!(supers[0].xi, 1000);

        let err = read_initsupers(&path, 3, SoluteProperties::default()).unwrap_err();
        assert!(matches!(err, SdmError::Init(_)));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_make_gridboxes_dimensionless_state() {
        let maps = CartesianMaps::uniform(
            [2, 1, 1],
            [1.0, 1.0, 1.0],
            [BoundaryCondition::Finite; 3],
        )
        .unwrap();
        let thermo = InitThermoConfig::default();
        let gbxs = make_gridboxes(&maps, &thermo);
        assert_eq!(gbxs.len(), 2);
        assert!((gbxs[0].state.press - 1.0).abs() < 1e-12);
        assert!((gbxs[0].state.temp - 1.0).abs() < 1e-12);
        assert!((gbxs[0].state.volume - 1.0).abs() < 1e-12);
    }
}
