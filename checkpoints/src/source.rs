//! Where a checkpoint bundle comes from.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::{CheckpointError, CheckpointSet};

/// A readable checkpoint bundle.
pub trait CheckpointSource: Send + Sync {
    /// Short description for logs.
    fn describe(&self) -> String;

    fn open(&self) -> io::Result<Box<dyn BufRead + Send>>;
}

/// A bundle file on disk.
#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CheckpointSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&self) -> io::Result<Box<dyn BufRead + Send>> {
        Ok(Box::new(BufReader::new(File::open(&self.path)?)))
    }
}

/// A bundle held in memory, e.g. compiled into the binary.
#[derive(Clone, Debug)]
pub struct EmbeddedSource {
    bytes: Vec<u8>,
}

impl EmbeddedSource {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl CheckpointSource for EmbeddedSource {
    fn describe(&self) -> String {
        format!("embedded bundle ({} bytes)", self.bytes.len())
    }

    fn open(&self) -> io::Result<Box<dyn BufRead + Send>> {
        Ok(Box::new(Cursor::new(self.bytes.clone())))
    }
}

/// Open and parse a bundle, logging what was loaded.
pub fn load_from(source: &dyn CheckpointSource) -> Result<CheckpointSet, CheckpointError> {
    let started = Instant::now();
    let reader = source.open()?;
    let set = CheckpointSet::load(reader)?;

    tracing::info!(
        source = %source.describe(),
        count = set.len(),
        latest_height = set.latest().height,
        data_hash = %hex::encode(set.data_hash()),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "checkpoints loaded"
    );
    Ok(set)
}
