//! Error kinds surfaced by the engine.

use thiserror::Error;

/// Engine-level failure. Any phase that fails aborts the step; no partial
/// phase output is committed before the error propagates.
#[derive(Debug, Error)]
pub enum SdmError {
    /// Invalid or missing configuration option.
    #[error("configuration error: {0}")]
    Config(String),

    /// File read/write failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Incompatible initial conditions, e.g. a super-droplet outside the
    /// domain or a malformed gridfile.
    #[error("initialisation error: {0}")]
    Init(String),

    /// Condensation sub-stepping exhausted without the Newton-Raphson
    /// iteration converging.
    #[error(
        "condensation failed to converge for droplet {droplet_id} in gridbox {gbx_index}: {msg}"
    )]
    Convergence {
        gbx_index: u32,
        droplet_id: u64,
        msg: String,
    },

    /// A super-droplet left its gridbox neighbourhood in one motion step
    /// (CFL violation) or ended up in a gridbox that does not contain it.
    #[error("motion error: {0}")]
    Motion(String),

    /// Span/sort invariant of the global super-droplet array broken;
    /// indicates an internal bug rather than bad input.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl SdmError {
    /// Process exit code for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            SdmError::Config(_) | SdmError::Io(_) => 1,
            SdmError::Init(_) => 2,
            SdmError::Convergence { .. } | SdmError::Motion(_) | SdmError::Invariant(_) => 3,
        }
    }
}
