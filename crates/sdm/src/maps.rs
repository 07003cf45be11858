//! Cartesian gridbox maps: immutable lookup tables from a gridbox index to
//! its physical bounds, volume and neighbouring gridbox indexes.
//!
//! ## Index layout
//!
//! Gridboxes are numbered with coord3 (vertical) varying fastest, then
//! coord1, then coord2:
//!
//! `index = k3 + ndim3 * k1 + ndim3 * ndim1 * k2`
//!
//! so the neighbour increments per direction are `1`, `ndim3` and
//! `ndim3 * ndim1`. Domains with fewer than three active dimensions use
//! size-1 directions.

use crate::errors::SdmError;
use crate::superdrop::OUTSIDE_DOMAIN;

/// Spatial direction of the domain, in the order the gridbox-index update
/// processes them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Coord3,
    Coord1,
    Coord2,
}

impl Direction {
    pub const ALL: [Direction; 3] = [Direction::Coord3, Direction::Coord1, Direction::Coord2];

    fn axis(self) -> usize {
        match self {
            Direction::Coord3 => 0,
            Direction::Coord1 => 1,
            Direction::Coord2 => 2,
        }
    }
}

/// Treatment of a domain edge in one direction.
///
/// `Finite` edges have no neighbour: droplets crossing them leave the
/// domain (outflow). `Periodic` edges wrap to the opposite side of the
/// domain. Reflective walls are not supported by this domain configuration
/// and are rejected when the configuration is parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundaryCondition {
    Finite,
    Periodic,
}

/// Bounds of one gridbox: a `(lower, upper]` pair per direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GbxBounds {
    pub bounds3: (f64, f64),
    pub bounds1: (f64, f64),
    pub bounds2: (f64, f64),
}

/// Immutable table mapping gridbox indexes to bounds, volumes and
/// neighbours. Created once at initialisation.
#[derive(Clone, Debug)]
pub struct CartesianMaps {
    ndims: [usize; 3],
    bconds: [BoundaryCondition; 3],
    bounds: Vec<GbxBounds>,
    volumes: Vec<f64>,
    /// `{backward, forward}` neighbour per gridbox, per direction
    neighbours: [Vec<(u32, u32)>; 3],
    /// `(min lower, max upper)` of the whole domain, per direction
    domain_bounds: [(f64, f64); 3],
}

impl CartesianMaps {
    /// Build maps from per-gridbox bounds records (in gridbox-index order)
    /// and a boundary condition per direction.
    pub fn from_bounds(
        ndims: [usize; 3],
        bconds: [BoundaryCondition; 3],
        bounds: Vec<GbxBounds>,
    ) -> Result<Self, SdmError> {
        let ngbxs = ndims[0] * ndims[1] * ndims[2];
        if ngbxs == 0 {
            return Err(SdmError::Init("domain has zero gridboxes".into()));
        }
        if bounds.len() != ngbxs {
            return Err(SdmError::Init(format!(
                "gridfile has {} bounds records but domain has {} gridboxes",
                bounds.len(),
                ngbxs
            )));
        }

        let mut volumes = Vec::with_capacity(ngbxs);
        for (idx, b) in bounds.iter().enumerate() {
            for (lo, up) in [b.bounds3, b.bounds1, b.bounds2] {
                if !(up > lo) {
                    return Err(SdmError::Init(format!(
                        "gridbox {} has non-increasing bounds ({}, {})",
                        idx, lo, up
                    )));
                }
            }
            let vol = (b.bounds3.1 - b.bounds3.0)
                * (b.bounds1.1 - b.bounds1.0)
                * (b.bounds2.1 - b.bounds2.0);
            volumes.push(vol);
        }

        let increments = [1usize, ndims[0], ndims[0] * ndims[1]];
        let mut neighbours: [Vec<(u32, u32)>; 3] = [Vec::new(), Vec::new(), Vec::new()];
        for dir in 0..3 {
            let table = &mut neighbours[dir];
            table.reserve(ngbxs);
            for idx in 0..ngbxs {
                table.push(direction_neighbours(
                    idx,
                    increments[dir],
                    ndims[dir],
                    bconds[dir],
                ));
            }
        }

        let mut domain_bounds = [(f64::INFINITY, f64::NEG_INFINITY); 3];
        for b in &bounds {
            for (dir, (lo, up)) in [b.bounds3, b.bounds1, b.bounds2].into_iter().enumerate() {
                domain_bounds[dir].0 = domain_bounds[dir].0.min(lo);
                domain_bounds[dir].1 = domain_bounds[dir].1.max(up);
            }
        }

        Ok(Self {
            ndims,
            bconds,
            bounds,
            volumes,
            neighbours,
            domain_bounds,
        })
    }

    /// Build maps for a uniform grid with `ndims` gridboxes of size
    /// `spacing` per direction, lower corner at the origin.
    pub fn uniform(
        ndims: [usize; 3],
        spacing: [f64; 3],
        bconds: [BoundaryCondition; 3],
    ) -> Result<Self, SdmError> {
        let ngbxs = ndims[0] * ndims[1] * ndims[2];
        let mut bounds = Vec::with_capacity(ngbxs);
        for idx in 0..ngbxs {
            let k3 = idx % ndims[0];
            let k1 = (idx / ndims[0]) % ndims[1];
            let k2 = idx / (ndims[0] * ndims[1]);
            let pair = |k: usize, delta: f64| (k as f64 * delta, (k + 1) as f64 * delta);
            bounds.push(GbxBounds {
                bounds3: pair(k3, spacing[0]),
                bounds1: pair(k1, spacing[1]),
                bounds2: pair(k2, spacing[2]),
            });
        }
        Self::from_bounds(ndims, bconds, bounds)
    }

    /// Total number of gridboxes in the domain.
    pub fn ngbxs(&self) -> usize {
        self.volumes.len()
    }

    /// Number of gridboxes per direction `[ndim3, ndim1, ndim2]`.
    pub fn ndims(&self) -> [usize; 3] {
        self.ndims
    }

    /// `(lower, upper]` bounds of gridbox `idx` in the given direction.
    pub fn bounds(&self, dir: Direction, idx: u32) -> (f64, f64) {
        let b = &self.bounds[idx as usize];
        match dir {
            Direction::Coord3 => b.bounds3,
            Direction::Coord1 => b.bounds1,
            Direction::Coord2 => b.bounds2,
        }
    }

    /// Dimensionless volume of gridbox `idx`.
    pub fn volume(&self, idx: u32) -> f64 {
        self.volumes[idx as usize]
    }

    /// Backward (towards lower coordinate) neighbour of `idx`, or
    /// [`OUTSIDE_DOMAIN`] at a finite domain edge.
    pub fn neighbour_back(&self, dir: Direction, idx: u32) -> u32 {
        self.neighbours[dir.axis()][idx as usize].0
    }

    /// Forward (towards higher coordinate) neighbour of `idx`, or
    /// [`OUTSIDE_DOMAIN`] at a finite domain edge.
    pub fn neighbour_forward(&self, dir: Direction, idx: u32) -> u32 {
        self.neighbours[dir.axis()][idx as usize].1
    }

    /// Boundary condition applied at the domain edges of a direction.
    pub fn boundary_condition(&self, dir: Direction) -> BoundaryCondition {
        self.bconds[dir.axis()]
    }

    /// `(min lower, max upper)` bound of the whole domain in a direction.
    pub fn domain_bounds(&self, dir: Direction) -> (f64, f64) {
        self.domain_bounds[dir.axis()]
    }

    /// Domain extent in a direction, used for periodic coordinate wrapping.
    pub fn domain_extent(&self, dir: Direction) -> f64 {
        let (lo, up) = self.domain_bounds(dir);
        up - lo
    }

    /// True if the coordinates lie within gridbox `idx` in every direction.
    pub fn contains(&self, idx: u32, coord3: f64, coord1: f64, coord2: f64) -> bool {
        let b = &self.bounds[idx as usize];
        let inside = |(lo, up): (f64, f64), c: f64| c >= lo && c < up;
        inside(b.bounds3, coord3) && inside(b.bounds1, coord1) && inside(b.bounds2, coord2)
    }
}

/// `{backward, forward}` neighbour indexes of one gridbox in one direction.
///
/// With finite treatment no neighbour exists below the lowest / above the
/// highest gridbox; with periodic treatment the lowest and highest gridboxes
/// in the direction are each other's neighbours.
fn direction_neighbours(
    idx: usize,
    increment: usize,
    ndim: usize,
    bcond: BoundaryCondition,
) -> (u32, u32) {
    let at_lower_edge = (idx / increment) % ndim == 0;
    let at_upper_edge = ((idx + increment) / increment) % ndim == 0;

    let backward = if at_lower_edge {
        match bcond {
            BoundaryCondition::Finite => OUTSIDE_DOMAIN,
            BoundaryCondition::Periodic => (idx + (ndim - 1) * increment) as u32,
        }
    } else {
        (idx - increment) as u32
    };

    let forward = if at_upper_edge {
        match bcond {
            BoundaryCondition::Finite => OUTSIDE_DOMAIN,
            BoundaryCondition::Periodic => (idx - (ndim - 1) * increment) as u32,
        }
    } else {
        (idx + increment) as u32
    };

    (backward, forward)
}
