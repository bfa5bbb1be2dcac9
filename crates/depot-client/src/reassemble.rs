//! Deterministic reassembly of downloaded cells.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

/// Errors produced during reassembly.
#[derive(Debug, thiserror::Error)]
pub enum ReassembleError {
    /// The address set is not exactly `0..n-1`.
    #[error("cell set incomplete, missing addresses {missing:?}")]
    IncompleteSet { missing: Vec<u64> },

    #[error("failed to read cell {address}: {source}")]
    ReadCell { address: u64, source: io::Error },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Concatenates per-address cell sources into `dest`, strictly in
/// ascending address order regardless of the order the sources were
/// created.
///
/// `addresses` must be exactly `{0..n-1}` for `n = addresses.len()`;
/// the check runs before any byte is written, and a gap (or a
/// duplicate, which implies a gap) fails with
/// [`ReassembleError::IncompleteSet`]. Bytes accumulate in a scratch
/// file that is renamed to `dest` only after the last cell is folded
/// in, so a partial file is never visible under the final name. Each
/// source is deleted as soon as its bytes are copied, bounding extra
/// disk usage to one cell beyond the growing output. Returns the total
/// byte count written.
pub fn reassemble<F>(addresses: &[u64], locate: F, dest: &Path) -> Result<u64, ReassembleError>
where
    F: Fn(u64) -> PathBuf,
{
    let n = addresses.len() as u64;
    let present: HashSet<u64> = addresses.iter().copied().collect();
    let missing: Vec<u64> = (0..n).filter(|a| !present.contains(a)).collect();
    if !missing.is_empty() {
        return Err(ReassembleError::IncompleteSet { missing });
    }

    let scratch = scratch_path(dest);
    match append_cells(n, &locate, &scratch) {
        Ok(written) => {
            fs::rename(&scratch, dest).map_err(|source| ReassembleError::Write {
                path: dest.to_path_buf(),
                source,
            })?;
            Ok(written)
        }
        Err(err) => {
            let _ = fs::remove_file(&scratch);
            Err(err)
        }
    }
}

fn scratch_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "reassembly".into());
    name.push(".part");
    dest.with_file_name(name)
}

fn append_cells<F>(n: u64, locate: &F, scratch: &Path) -> Result<u64, ReassembleError>
where
    F: Fn(u64) -> PathBuf,
{
    let mut out = File::create(scratch).map_err(|source| ReassembleError::Write {
        path: scratch.to_path_buf(),
        source,
    })?;

    let mut written = 0u64;
    for address in 0..n {
        let cell_path = locate(address);
        let mut cell = File::open(&cell_path)
            .map_err(|source| ReassembleError::ReadCell { address, source })?;
        written += io::copy(&mut cell, &mut out).map_err(|source| ReassembleError::Write {
            path: scratch.to_path_buf(),
            source,
        })?;
        drop(cell);
        fs::remove_file(&cell_path)
            .map_err(|source| ReassembleError::ReadCell { address, source })?;
    }
    Ok(written)
}
