//! The checkpoint set and its text bundle format.
//!
//! ```text
//! TXT CHECKPOINTS 1
//! 0
//! <count>
//! <hex of a 96-byte compact stored header>   one line per checkpoint
//! ```
//!
//! The second line is the number of signature lines that follow it. Signed
//! bundles are rejected: the wallet only ships unsigned bundles and has no
//! keys to check signatures against.

use std::io::{BufRead, Write};

use sha2::{Digest, Sha256};

use chainload_types::{StoredHeader, Timestamp};

use crate::CheckpointError;

/// First line of every bundle.
pub const BUNDLE_MAGIC: &str = "TXT CHECKPOINTS 1";

/// Immutable checkpoints ordered by strictly increasing time and height.
#[derive(Clone, Debug)]
pub struct CheckpointSet {
    checkpoints: Vec<StoredHeader>,
    data_hash: [u8; 32],
}

impl CheckpointSet {
    /// Build a set from headers already in ascending order.
    pub fn from_headers(checkpoints: Vec<StoredHeader>) -> Result<Self, CheckpointError> {
        if checkpoints.is_empty() {
            return Err(CheckpointError::Empty);
        }
        for (i, pair) in checkpoints.windows(2).enumerate() {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.timestamp() <= prev.timestamp() || next.height <= prev.height {
                return Err(CheckpointError::NotMonotonic { index: i + 1 });
            }
        }

        let mut hasher = Sha256::new();
        for (i, checkpoint) in checkpoints.iter().enumerate() {
            let record = checkpoint
                .to_compact_bytes()
                .map_err(|e| CheckpointError::Format {
                    line: record_line(i),
                    reason: e.to_string(),
                })?;
            hasher.update(record);
        }

        Ok(Self {
            checkpoints,
            data_hash: hasher.finalize().into(),
        })
    }

    /// Parse a text bundle.
    pub fn load(reader: impl BufRead) -> Result<Self, CheckpointError> {
        let mut lines = Lines {
            inner: reader.lines(),
            number: 0,
        };

        let (line, magic) = lines.next_required("bundle header")?;
        if magic.trim() != BUNDLE_MAGIC {
            return Err(CheckpointError::Format {
                line,
                reason: format!("expected {BUNDLE_MAGIC:?}, found {:?}", magic.trim()),
            });
        }

        let signatures: u32 = lines.next_number("signature count")?;
        if signatures > 0 {
            return Err(CheckpointError::SignaturesUnsupported(signatures));
        }

        // The count is untrusted; records are collected as they are read.
        let count: usize = lines.next_number("checkpoint count")?;
        let mut checkpoints = Vec::new();
        for _ in 0..count {
            let (line, text) = lines.next_required("checkpoint record")?;
            let bytes = hex::decode(text.trim()).map_err(|e| CheckpointError::Format {
                line,
                reason: format!("invalid hex: {e}"),
            })?;
            let checkpoint =
                StoredHeader::from_compact_bytes(&bytes).map_err(|e| CheckpointError::Format {
                    line,
                    reason: e.to_string(),
                })?;
            checkpoints.push(checkpoint);
        }

        while let Some((line, text)) = lines.next_line()? {
            if !text.trim().is_empty() {
                return Err(CheckpointError::Format {
                    line,
                    reason: "data after the last checkpoint".to_string(),
                });
            }
        }

        Self::from_headers(checkpoints)
    }

    /// Write the set as an unsigned text bundle.
    pub fn write_text(&self, mut out: impl Write) -> Result<(), CheckpointError> {
        writeln!(out, "{BUNDLE_MAGIC}")?;
        writeln!(out, "0")?;
        writeln!(out, "{}", self.checkpoints.len())?;
        for (i, checkpoint) in self.checkpoints.iter().enumerate() {
            let record = checkpoint
                .to_compact_bytes()
                .map_err(|e| CheckpointError::Format {
                    line: record_line(i),
                    reason: e.to_string(),
                })?;
            writeln!(out, "{}", hex::encode(record))?;
        }
        out.flush()?;
        Ok(())
    }

    /// The latest checkpoint at or before `time`, or the earliest checkpoint
    /// when every checkpoint is later than `time`.
    pub fn checkpoint_before(&self, time: Timestamp) -> &StoredHeader {
        self.checkpoints
            .iter()
            .rev()
            .find(|c| c.timestamp() <= time)
            .unwrap_or_else(|| self.earliest())
    }

    /// SHA-256 over the compact records, in order.
    pub fn data_hash(&self) -> [u8; 32] {
        self.data_hash
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoredHeader> {
        self.checkpoints.iter()
    }

    pub fn earliest(&self) -> &StoredHeader {
        &self.checkpoints[0]
    }

    pub fn latest(&self) -> &StoredHeader {
        &self.checkpoints[self.checkpoints.len() - 1]
    }
}

/// 1-based line number of record `index` in the text form.
fn record_line(index: usize) -> usize {
    index + 4
}

struct Lines<R> {
    inner: std::io::Lines<R>,
    number: usize,
}

impl<R: BufRead> Lines<R> {
    fn next_line(&mut self) -> Result<Option<(usize, String)>, CheckpointError> {
        match self.inner.next() {
            Some(line) => {
                self.number += 1;
                Ok(Some((self.number, line?)))
            }
            None => Ok(None),
        }
    }

    fn next_required(&mut self, what: &str) -> Result<(usize, String), CheckpointError> {
        self.next_line()?.ok_or_else(|| CheckpointError::Format {
            line: self.number + 1,
            reason: format!("missing {what}"),
        })
    }

    fn next_number<T: std::str::FromStr>(&mut self, what: &str) -> Result<T, CheckpointError> {
        let (line, text) = self.next_required(what)?;
        text.trim().parse().map_err(|_| CheckpointError::Format {
            line,
            reason: format!("invalid {what}: {:?}", text.trim()),
        })
    }
}
