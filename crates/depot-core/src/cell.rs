//! Cell addressing and file splitting.
//!
//! A file is stored as a dense sequence of fixed-size cells with
//! zero-based addresses `0..n-1`. Every cell is exactly [`CELL_SIZE`]
//! bytes except the last, which may be shorter. Splitting and
//! reassembly both derive their geometry from [`CELL_SIZE`] and from
//! nothing else — the two sides must agree on it.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use bytes::Bytes;

/// Fixed cell size: 1 MiB.
pub const CELL_SIZE: usize = 1024 * 1024;

/// Number of cells a file of `total_size` bytes splits into.
pub fn cell_count(total_size: u64) -> u64 {
    total_size.div_ceil(CELL_SIZE as u64)
}

/// One contiguous slice of a file, tagged with its address.
#[derive(Debug, Clone)]
pub struct Cell {
    pub address: u64,
    pub payload: Bytes,
}

impl Cell {
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Errors produced while splitting a file into cells.
#[derive(Debug, thiserror::Error)]
pub enum CellError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to read cell {address}: {source}")]
    Read {
        address: u64,
        source: std::io::Error,
    },
}

/// Reads a file as a sequence of cells in strictly increasing address
/// order starting at 0.
///
/// Single pass: once a cell has been consumed the reader cannot be
/// rewound — splitting again requires opening a new reader.
#[derive(Debug)]
pub struct CellReader {
    file: File,
    file_size: u64,
    next_address: u64,
}

impl CellReader {
    /// Opens `path` for cell-by-cell reading.
    pub fn open(path: &Path) -> Result<Self, CellError> {
        let open_err = |source| CellError::Open {
            path: path.display().to_string(),
            source,
        };
        let file = File::open(path).map_err(open_err)?;
        let file_size = file.metadata().map_err(open_err)?.len();
        Ok(Self {
            file,
            file_size,
            next_address: 0,
        })
    }

    /// Total size of the underlying file in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Number of cells this reader produces in total.
    pub fn cell_count(&self) -> u64 {
        cell_count(self.file_size)
    }

    /// Reads the next cell. Returns `None` after the last one.
    pub fn next_cell(&mut self) -> Result<Option<Cell>, CellError> {
        if self.next_address >= self.cell_count() {
            return Ok(None);
        }
        let address = self.next_address;

        let mut buf = vec![0u8; CELL_SIZE];
        let mut filled = 0;
        while filled < buf.len() {
            let n = self
                .file
                .read(&mut buf[filled..])
                .map_err(|source| CellError::Read { address, source })?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf.truncate(filled);

        if filled == 0 {
            // File shrank underneath us; end the sequence.
            return Ok(None);
        }

        self.next_address += 1;
        Ok(Some(Cell {
            address,
            payload: Bytes::from(buf),
        }))
    }
}
