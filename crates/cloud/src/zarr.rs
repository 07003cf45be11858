//! Chunked, self-describing array storage in the Zarr v2 layout: one
//! directory per array holding `.zarray`/`.zattrs` JSON metadata and
//! numbered binary chunk files.
//!
//! Arrays are append-only along their leading (time or ragged-sample)
//! dimension. Multi-dimensional arrays chunk only along the leading
//! dimension so every trailing dimension stays whole within a chunk. The
//! final partial chunk is padded with the fill value; the shape in
//! `.zarray` records the true extent.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::json;

use sdm::SdmError;

/// A dataset directory holding many arrays.
pub struct ZarrStore {
    basedir: PathBuf,
}

impl ZarrStore {
    /// Create (or reuse) the dataset directory and mark it as a group.
    pub fn create(basedir: &Path) -> Result<Self, SdmError> {
        std::fs::create_dir_all(basedir)?;
        let zgroup = json!({ "zarr_format": 2 });
        std::fs::write(
            basedir.join(".zgroup"),
            serde_json::to_string_pretty(&zgroup).expect("static json"),
        )?;
        log::info!("writing dataset to {}", basedir.display());
        Ok(Self {
            basedir: basedir.to_path_buf(),
        })
    }

    pub fn base(&self) -> &Path {
        &self.basedir
    }
}

/// Element types storable in an array.
pub trait ZarrValue: Copy {
    const DTYPE: &'static str;
    fn fill_value() -> serde_json::Value;
    fn fill() -> Self;
    fn append_le_bytes(&self, out: &mut Vec<u8>);
}

impl ZarrValue for f64 {
    const DTYPE: &'static str = "<f8";

    fn fill_value() -> serde_json::Value {
        json!("NaN")
    }

    fn fill() -> Self {
        f64::NAN
    }

    fn append_le_bytes(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl ZarrValue for u64 {
    const DTYPE: &'static str = "<u8";

    fn fill_value() -> serde_json::Value {
        json!(u64::MAX)
    }

    fn fill() -> Self {
        u64::MAX
    }

    fn append_le_bytes(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl ZarrValue for u32 {
    const DTYPE: &'static str = "<u4";

    fn fill_value() -> serde_json::Value {
        json!(u32::MAX)
    }

    fn fill() -> Self {
        u32::MAX
    }

    fn append_le_bytes(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

/// One append-only array of a store.
pub struct ZarrArray<T: ZarrValue> {
    dir: PathBuf,
    /// Leading-dimension rows per chunk
    chunk_rows: usize,
    /// Trailing extent for 2-D arrays; `None` for 1-D
    ndim1: Option<usize>,
    buffer: Vec<T>,
    chunks_written: usize,
    rows_total: usize,
    dims: Vec<String>,
    units: String,
    scale_factor: f64,
}

impl<T: ZarrValue> ZarrArray<T> {
    /// A 1-D array chunked every `chunk_rows` values.
    pub fn new_1d(
        store: &ZarrStore,
        name: &str,
        chunk_rows: usize,
        dim: &str,
        units: &str,
        scale_factor: f64,
    ) -> Result<Self, SdmError> {
        Self::new(store, name, chunk_rows, None, &[dim], units, scale_factor)
    }

    /// A 2-D array of rows of fixed length `ndim1`, chunked every
    /// `chunk_rows` rows with the trailing dimension whole.
    pub fn new_2d(
        store: &ZarrStore,
        name: &str,
        chunk_rows: usize,
        ndim1: usize,
        dims: [&str; 2],
        units: &str,
        scale_factor: f64,
    ) -> Result<Self, SdmError> {
        Self::new(
            store,
            name,
            chunk_rows,
            Some(ndim1),
            &[dims[0], dims[1]],
            units,
            scale_factor,
        )
    }

    fn new(
        store: &ZarrStore,
        name: &str,
        chunk_rows: usize,
        ndim1: Option<usize>,
        dims: &[&str],
        units: &str,
        scale_factor: f64,
    ) -> Result<Self, SdmError> {
        if chunk_rows == 0 || ndim1 == Some(0) {
            return Err(SdmError::Config(format!(
                "array '{}' must have strictly positive chunk shape",
                name
            )));
        }
        let dir = store.base().join(name);
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            chunk_rows,
            ndim1,
            buffer: Vec::new(),
            chunks_written: 0,
            rows_total: 0,
            dims: dims.iter().map(|d| d.to_string()).collect(),
            units: units.to_string(),
            scale_factor,
        })
    }

    fn row_len(&self) -> usize {
        self.ndim1.unwrap_or(1)
    }

    fn chunk_elems(&self) -> usize {
        self.chunk_rows * self.row_len()
    }

    /// Append one value to a 1-D array.
    pub fn push(&mut self, value: T) -> Result<(), SdmError> {
        self.push_row(&[value])
    }

    /// Append one leading-dimension row.
    pub fn push_row(&mut self, row: &[T]) -> Result<(), SdmError> {
        if row.len() != self.row_len() {
            return Err(SdmError::Invariant(format!(
                "array {} expects rows of {} values, got {}",
                self.dir.display(),
                self.row_len(),
                row.len()
            )));
        }
        self.buffer.extend_from_slice(row);
        self.rows_total += 1;
        while self.buffer.len() >= self.chunk_elems() {
            self.flush_chunk(false)?;
        }
        Ok(())
    }

    /// Write one chunk from the front of the buffer; with `pad` the
    /// remainder is filled up to a whole chunk.
    fn flush_chunk(&mut self, pad: bool) -> Result<(), SdmError> {
        let elems = self.chunk_elems();
        if pad {
            while self.buffer.len() % elems != 0 {
                self.buffer.push(T::fill());
            }
        }
        debug_assert!(self.buffer.len() >= elems);

        let mut bytes = Vec::with_capacity(elems * 8);
        for value in self.buffer.drain(..elems) {
            value.append_le_bytes(&mut bytes);
        }

        let name = match self.ndim1 {
            None => format!("{}", self.chunks_written),
            Some(_) => format!("{}.0", self.chunks_written),
        };
        let mut file = std::fs::File::create(self.dir.join(name))?;
        file.write_all(&bytes)?;
        self.chunks_written += 1;

        self.write_metadata()
    }

    /// Flush any buffered values (padding the final chunk) and write the
    /// array metadata.
    pub fn finalize(&mut self) -> Result<(), SdmError> {
        if !self.buffer.is_empty() {
            self.flush_chunk(true)?;
        }
        self.write_metadata()
    }

    fn write_metadata(&self) -> Result<(), SdmError> {
        let (shape, chunks) = match self.ndim1 {
            None => (json!([self.rows_total]), json!([self.chunk_rows])),
            Some(n) => (
                json!([self.rows_total, n]),
                json!([self.chunk_rows, n]),
            ),
        };
        let zarray = json!({
            "zarr_format": 2,
            "shape": shape,
            "chunks": chunks,
            "dtype": T::DTYPE,
            "compressor": null,
            "fill_value": T::fill_value(),
            "filters": null,
            "order": "C",
        });
        let zattrs = json!({
            "_ARRAY_DIMENSIONS": self.dims,
            "units": self.units,
            "scale_factor": self.scale_factor,
        });
        std::fs::write(
            self.dir.join(".zarray"),
            serde_json::to_string_pretty(&zarray).expect("valid json"),
        )?;
        std::fs::write(
            self.dir.join(".zattrs"),
            serde_json::to_string_pretty(&zattrs).expect("valid json"),
        )?;
        Ok(())
    }
}
