//! Coupled-dynamics provider replaying thermodynamic profiles from a
//! binary file.
//!
//! The file holds one frame per coupling step; each frame is one record
//! per gridbox (in index order) of ten little-endian doubles, all
//! dimensionless: `press, temp, qvap, qcond, wvel lower, wvel upper,
//! uvel lower, uvel upper, vvel lower, vvel upper`. The final frame is
//! held once the file runs out.

use std::path::Path;

use sdm::coupling::{CoupledDynamics, DynamicsState};
use sdm::SdmError;

const VALUES_PER_GBX: usize = 10;

#[derive(Debug)]
pub struct FromFileDynamics {
    /// `frames[step][gbx_index]`
    frames: Vec<Vec<DynamicsState>>,
    current: usize,
    couplstep: u64,
}

impl FromFileDynamics {
    pub fn new(path: &Path, ngbxs: usize, couplstep: u64) -> Result<Self, SdmError> {
        let bytes = std::fs::read(path)?;
        let frame_bytes = ngbxs * VALUES_PER_GBX * 8;
        if bytes.is_empty() || bytes.len() % frame_bytes != 0 {
            return Err(SdmError::Init(format!(
                "thermodynamics file {} is {} bytes, not a positive whole number of \
                 {}-byte frames for {} gridboxes",
                path.display(),
                bytes.len(),
                frame_bytes,
                ngbxs
            )));
        }

        let frames: Vec<Vec<DynamicsState>> = bytes
            .chunks_exact(frame_bytes)
            .map(|frame| {
                frame
                    .chunks_exact(VALUES_PER_GBX * 8)
                    .map(|record| {
                        let f = |i: usize| {
                            bytemuck::pod_read_unaligned::<f64>(&record[i * 8..(i + 1) * 8])
                        };
                        DynamicsState {
                            press: f(0),
                            temp: f(1),
                            qvap: f(2),
                            qcond: f(3),
                            wvel: (f(4), f(5)),
                            uvel: (f(6), f(7)),
                            vvel: (f(8), f(9)),
                        }
                    })
                    .collect()
            })
            .collect();

        log::info!(
            "read {} thermodynamic frames for {} gridboxes from {}",
            frames.len(),
            ngbxs,
            path.display()
        );
        Ok(Self {
            frames,
            current: 0,
            couplstep,
        })
    }
}

impl CoupledDynamics for FromFileDynamics {
    fn run(&mut self, _t: u64, t_next: u64) -> Result<(), SdmError> {
        self.current = ((t_next / self.couplstep) as usize).min(self.frames.len() - 1);
        Ok(())
    }

    fn state(&self, gbx_index: u32) -> Option<DynamicsState> {
        self.frames[self.current].get(gbx_index as usize).copied()
    }
}
