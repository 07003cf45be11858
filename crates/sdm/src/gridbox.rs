//! Gridboxes: thermodynamic state plus a view onto the resident
//! super-droplets in the sorted global array.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Thermodynamic state of the air inside one gridbox.
///
/// Scalars are defined at the volume centre; the velocity components are
/// defined on the faces of the volume:
/// - `wvel` (vertical) on the {lower, upper} coord3 faces
/// - `uvel` on the {lower, upper} coord1 faces
/// - `vvel` on the {lower, upper} coord2 faces
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Gridbox volume (dimensionless)
    pub volume: f64,
    pub press: f64,
    pub temp: f64,
    pub qvap: f64,
    pub qcond: f64,
    pub wvel: (f64, f64),
    pub uvel: (f64, f64),
    pub vvel: (f64, f64),
}

impl State {
    /// A motionless state with the given volume and centre values.
    pub fn new(volume: f64, press: f64, temp: f64, qvap: f64, qcond: f64) -> Self {
        Self {
            volume,
            press,
            temp,
            qvap,
            qcond,
            wvel: (0.0, 0.0),
            uvel: (0.0, 0.0),
            vvel: (0.0, 0.0),
        }
    }

    /// Vertical velocity at the volume centre.
    pub fn wvel_centre(&self) -> f64 {
        (self.wvel.0 + self.wvel.1) / 2.0
    }

    pub fn uvel_centre(&self) -> f64 {
        (self.uvel.0 + self.uvel.1) / 2.0
    }

    pub fn vvel_centre(&self) -> f64 {
        (self.vvel.0 + self.vvel.1) / 2.0
    }
}

/// One Eulerian cell of the domain: its index, thermodynamic state and the
/// half-open range ("span") of resident super-droplets in the global sorted
/// array.
///
/// Spans are index ranges, never pointers; they are rebuilt by the transport
/// bookkeeping after every motion step and are immutable during a phase.
#[derive(Clone, Debug)]
pub struct Gridbox {
    pub index: u32,
    pub state: State,
    pub span: Range<usize>,
}

impl Gridbox {
    pub fn new(index: u32, state: State) -> Self {
        Self {
            index,
            state,
            span: 0..0,
        }
    }

    /// Number of super-droplets currently resident.
    pub fn nsupers(&self) -> usize {
        self.span.len()
    }
}
