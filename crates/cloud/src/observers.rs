//! Observers writing the simulation record into a [`ZarrStore`]: the time
//! axis, per-gridbox thermodynamics, mass moments of the droplet
//! distribution, and the super-droplet attributes in contiguous-ragged
//! layout.

use sdm::constants as c;
use sdm::gridbox::Gridbox;
use sdm::observer::{mass_moments, Observer};
use sdm::superdrop::Superdrop;
use sdm::timesteps::step2realtime;
use sdm::SdmError;

use crate::zarr::{ZarrArray, ZarrStore};

/// Observation time axis in seconds.
pub struct TimeObserver {
    time: ZarrArray<f64>,
}

impl TimeObserver {
    pub fn new(store: &ZarrStore, maxchunk: usize) -> Result<Self, SdmError> {
        Ok(Self {
            time: ZarrArray::new_1d(store, "time", maxchunk, "time", "s", 1.0)?,
        })
    }
}

impl Observer for TimeObserver {
    fn at_step(
        &mut self,
        t: u64,
        _gridboxes: &[Gridbox],
        _superdrops: &[Superdrop],
    ) -> Result<(), SdmError> {
        self.time.push(step2realtime(t))
    }

    fn finalize(&mut self) -> Result<(), SdmError> {
        self.time.finalize()
    }
}

/// Rows per chunk for a 2-D array so a chunk stays within `maxchunk`
/// elements while keeping the trailing dimension whole.
fn good_2d_chunk(maxchunk: usize, ndim1: usize) -> usize {
    (maxchunk / ndim1).max(1)
}

/// Per-gridbox thermodynamic state, one row per observation step. Values
/// are stored dimensionless; `scale_factor` recovers SI units.
pub struct StateObserver {
    press: ZarrArray<f64>,
    temp: ZarrArray<f64>,
    qvap: ZarrArray<f64>,
    qcond: ZarrArray<f64>,
}

impl StateObserver {
    pub fn new(store: &ZarrStore, maxchunk: usize, ngbxs: usize) -> Result<Self, SdmError> {
        let rows = good_2d_chunk(maxchunk, ngbxs);
        let dims = ["time", "gbxindex"];
        Ok(Self {
            press: ZarrArray::new_2d(store, "press", rows, ngbxs, dims, "Pa", c::P0)?,
            temp: ZarrArray::new_2d(store, "temp", rows, ngbxs, dims, "K", c::TEMP0)?,
            qvap: ZarrArray::new_2d(store, "qvap", rows, ngbxs, dims, "Kg/Kg", 1.0)?,
            qcond: ZarrArray::new_2d(store, "qcond", rows, ngbxs, dims, "Kg/Kg", 1.0)?,
        })
    }
}

impl Observer for StateObserver {
    fn at_step(
        &mut self,
        _t: u64,
        gridboxes: &[Gridbox],
        _superdrops: &[Superdrop],
    ) -> Result<(), SdmError> {
        let row = |f: fn(&Gridbox) -> f64| -> Vec<f64> { gridboxes.iter().map(f).collect() };
        self.press.push_row(&row(|g| g.state.press))?;
        self.temp.push_row(&row(|g| g.state.temp))?;
        self.qvap.push_row(&row(|g| g.state.qvap))?;
        self.qcond.push_row(&row(|g| g.state.qcond))
    }

    fn finalize(&mut self) -> Result<(), SdmError> {
        self.press.finalize()?;
        self.temp.finalize()?;
        self.qvap.finalize()?;
        self.qcond.finalize()
    }
}

/// 0th, 1st and 2nd mass moments of the real-droplet distribution per
/// gridbox.
pub struct MassMomentsObserver {
    mom0: ZarrArray<f64>,
    mom1: ZarrArray<f64>,
    mom2: ZarrArray<f64>,
}

impl MassMomentsObserver {
    pub fn new(store: &ZarrStore, maxchunk: usize, ngbxs: usize) -> Result<Self, SdmError> {
        let rows = good_2d_chunk(maxchunk, ngbxs);
        let dims = ["time", "gbxindex"];
        let mass0 = c::MASS0_GRAMS;
        Ok(Self {
            mom0: ZarrArray::new_2d(store, "massmom0", rows, ngbxs, dims, "", 1.0)?,
            mom1: ZarrArray::new_2d(store, "massmom1", rows, ngbxs, dims, "g", mass0)?,
            mom2: ZarrArray::new_2d(store, "massmom2", rows, ngbxs, dims, "g^2", mass0 * mass0)?,
        })
    }
}

impl Observer for MassMomentsObserver {
    fn at_step(
        &mut self,
        _t: u64,
        gridboxes: &[Gridbox],
        superdrops: &[Superdrop],
    ) -> Result<(), SdmError> {
        let mut row0 = Vec::with_capacity(gridboxes.len());
        let mut row1 = Vec::with_capacity(gridboxes.len());
        let mut row2 = Vec::with_capacity(gridboxes.len());
        for gbx in gridboxes {
            let (mom0, mom1, mom2) = mass_moments(&superdrops[gbx.span.clone()]);
            row0.push(mom0);
            row1.push(mom1);
            row2.push(mom2);
        }
        self.mom0.push_row(&row0)?;
        self.mom1.push_row(&row1)?;
        self.mom2.push_row(&row2)
    }

    fn finalize(&mut self) -> Result<(), SdmError> {
        self.mom0.finalize()?;
        self.mom1.finalize()?;
        self.mom2.finalize()
    }
}

/// Super-droplet attributes in contiguous-ragged representation: flat
/// per-droplet arrays plus a `raggedcount` of droplets recorded per
/// observation step.
pub struct SuperdropObserver {
    sdindex: ZarrArray<u32>,
    xi: ZarrArray<u64>,
    radius: ZarrArray<f64>,
    msol: ZarrArray<f64>,
    coord3: ZarrArray<f64>,
    coord1: ZarrArray<f64>,
    coord2: ZarrArray<f64>,
    raggedcount: ZarrArray<u64>,
}

impl SuperdropObserver {
    pub fn new(store: &ZarrStore, maxchunk: usize) -> Result<Self, SdmError> {
        let dim = "raggedsd";
        Ok(Self {
            sdindex: ZarrArray::new_1d(store, "sdgbxindex", maxchunk, dim, "", 1.0)?,
            xi: ZarrArray::new_1d(store, "xi", maxchunk, dim, "", 1.0)?,
            radius: ZarrArray::new_1d(store, "radius", maxchunk, dim, "m", c::R0)?,
            msol: ZarrArray::new_1d(store, "msol", maxchunk, dim, "g", c::MASS0_GRAMS)?,
            coord3: ZarrArray::new_1d(store, "coord3", maxchunk, dim, "m", c::COORD0)?,
            coord1: ZarrArray::new_1d(store, "coord1", maxchunk, dim, "m", c::COORD0)?,
            coord2: ZarrArray::new_1d(store, "coord2", maxchunk, dim, "m", c::COORD0)?,
            raggedcount: ZarrArray::new_1d(store, "raggedcount", maxchunk, "time", "", 1.0)?,
        })
    }
}

impl Observer for SuperdropObserver {
    fn at_step(
        &mut self,
        _t: u64,
        _gridboxes: &[Gridbox],
        superdrops: &[Superdrop],
    ) -> Result<(), SdmError> {
        for drop in superdrops {
            self.sdindex.push(drop.gbx_index)?;
            self.xi.push(drop.xi)?;
            self.radius.push(drop.radius)?;
            self.msol.push(drop.m_sol)?;
            self.coord3.push(drop.coord3)?;
            self.coord1.push(drop.coord1)?;
            self.coord2.push(drop.coord2)?;
        }
        self.raggedcount.push(superdrops.len() as u64)
    }

    fn finalize(&mut self) -> Result<(), SdmError> {
        self.sdindex.finalize()?;
        self.xi.finalize()?;
        self.radius.finalize()?;
        self.msol.finalize()?;
        self.coord3.finalize()?;
        self.coord1.finalize()?;
        self.coord2.finalize()?;
        self.raggedcount.finalize()
    }
}
