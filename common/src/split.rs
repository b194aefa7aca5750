//! Partitioning of job input into blocks.
//!
//! A file is cut into blocks of exactly `block_size` bytes for as long as
//! more than one and a half blocks remain. Whatever is left then becomes the
//! final block, so the last block is never shorter than half a block unless
//! the whole file is.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum SplitError {
    #[error("block size must be positive, got {0}")]
    InvalidBlockSize(i64),

    #[error("cannot read input {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A contiguous byte range of one input file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InputBlock {
    path: PathBuf,
    offset: u64,
    length: u64,
}

impl InputBlock {
    /// Absolute path of the file this block belongs to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    /// Offset one past the last byte of the block.
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}

/// Split a file, or every file directly inside a directory, into blocks.
///
/// Directory entries are visited in file-name order and are not descended
/// into. Nothing is returned unless the whole input could be split.
pub fn split(path: &Path, block_size: i64) -> Result<Vec<InputBlock>, SplitError> {
    let block_size = match u64::try_from(block_size) {
        Ok(size) if size > 0 => size,
        _ => return Err(SplitError::InvalidBlockSize(block_size)),
    };

    let root = fs::canonicalize(path).map_err(|source| unreadable(path, source))?;
    let meta = fs::metadata(&root).map_err(|source| unreadable(&root, source))?;

    if !meta.is_dir() {
        return Ok(split_file(root, meta.len(), block_size));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(&root).map_err(|source| unreadable(&root, source))? {
        let entry = entry.map_err(|source| unreadable(&root, source))?;
        let file_path = entry.path();
        let meta = fs::metadata(&file_path).map_err(|source| unreadable(&file_path, source))?;

        if meta.is_dir() {
            warn!(path = %file_path.display(), "Skipping nested directory in job input");
            continue;
        }
        files.push((file_path, meta.len()));
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let blocks: Vec<InputBlock> = files
        .into_iter()
        .flat_map(|(file_path, len)| split_file(file_path, len, block_size))
        .collect();

    debug!(input = %root.display(), blocks = blocks.len(), "Split job input");
    Ok(blocks)
}

fn split_file(path: PathBuf, len: u64, block_size: u64) -> Vec<InputBlock> {
    let threshold = block_size + block_size / 2;
    let mut blocks = Vec::new();
    let mut offset = 0;
    let mut remaining = len;

    while remaining > 0 {
        let length = if remaining > threshold {
            block_size
        } else {
            remaining
        };

        blocks.push(InputBlock {
            path: path.clone(),
            offset,
            length,
        });
        offset += length;
        remaining -= length;
    }

    blocks
}

fn unreadable(path: &Path, source: io::Error) -> SplitError {
    SplitError::Unreadable {
        path: path.to_path_buf(),
        source,
    }
}
