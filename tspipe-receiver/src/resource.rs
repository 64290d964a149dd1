//! Per-resource transfer state.
//!
//! Each transferred resource (data file or snapshot artifact) moves through
//! `AwaitingFirstPiece -> ReceivingPieces -> Sealed`. Pieces carry explicit
//! offsets, so a resend is detectable instead of silently corrupting: a
//! piece at or below the confirmed offset is rewritten in place, a piece
//! beyond it is refused with the offset to resume from. Sealing verifies
//! the accumulated length, records a checksum, and writes a JSON metadata
//! sidecar next to the staged file.

use crate::error::ReceiverError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Transfer state of one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    AwaitingFirstPiece,
    ReceivingPieces,
    Sealed,
}

/// Metadata recorded when a resource is sealed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedMeta {
    pub name: String,
    pub length: u64,
    pub crc32c: u32,
    pub sealed_at: DateTime<Utc>,
}

/// Writes incoming pieces of one resource to a staging file.
#[derive(Debug)]
pub struct ResourceWriter {
    name: String,
    path: PathBuf,
    file: File,
    state: ResourceState,
    /// Furthest contiguous byte written so far.
    confirmed_offset: u64,
}

impl ResourceWriter {
    /// Creates the staging file for a new resource.
    ///
    /// The name is wire input and must stay a plain file name: anything
    /// containing a path separator or naming a directory is refused, so a
    /// crafted name cannot escape the staging directory.
    pub fn create(dir: &Path, name: &str) -> Result<Self, ReceiverError> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(ReceiverError::InvalidResourceName(name.to_string()));
        }
        let path = dir.join(name);
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .read(true)
            .write(true)
            .open(&path)?;
        Ok(Self {
            name: name.to_string(),
            path,
            file,
            state: ResourceState::AwaitingFirstPiece,
            confirmed_offset: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }

    pub fn confirmed_offset(&self) -> u64 {
        self.confirmed_offset
    }

    /// Path of the staged resource file.
    pub fn staging_path(&self) -> &Path {
        &self.path
    }

    /// Writes one fragment at its declared offset.
    ///
    /// Returns the confirmed offset after the write. A fragment starting at
    /// or below the confirmed offset is an idempotent resend and is
    /// rewritten in place; a fragment starting beyond it leaves a gap and
    /// is refused.
    pub fn write_piece(&mut self, start_offset: u64, fragment: &[u8]) -> Result<u64, ReceiverError> {
        if self.state == ResourceState::Sealed {
            return Err(ReceiverError::AlreadySealed(self.name.clone()));
        }
        if start_offset > self.confirmed_offset {
            return Err(ReceiverError::OffsetGap {
                resource: self.name.clone(),
                expected: self.confirmed_offset,
                got: start_offset,
            });
        }

        self.file.seek(SeekFrom::Start(start_offset))?;
        self.file.write_all(fragment)?;

        let end = start_offset + fragment.len() as u64;
        self.confirmed_offset = self.confirmed_offset.max(end);
        self.state = ResourceState::ReceivingPieces;
        Ok(self.confirmed_offset)
    }

    /// Seals the resource: verifies the accumulated length against the
    /// sender's assertion, checksums the staged bytes, and writes the
    /// metadata sidecar.
    pub fn seal(&mut self, total_length: u64) -> Result<SealedMeta, ReceiverError> {
        if self.state == ResourceState::Sealed {
            return Err(ReceiverError::AlreadySealed(self.name.clone()));
        }
        self.file.flush()?;

        let actual = self.file.metadata()?.len();
        if actual != total_length || self.confirmed_offset != total_length {
            return Err(ReceiverError::LengthMismatch {
                resource: self.name.clone(),
                expected: total_length,
                actual: actual.max(self.confirmed_offset),
            });
        }

        let meta = SealedMeta {
            name: self.name.clone(),
            length: total_length,
            crc32c: self.checksum()?,
            sealed_at: Utc::now(),
        };
        let mut sidecar = self.path.clone().into_os_string();
        sidecar.push(".meta");
        let sidecar = PathBuf::from(sidecar);
        std::fs::write(&sidecar, serde_json::to_vec_pretty(&meta)?)?;

        self.state = ResourceState::Sealed;
        Ok(meta)
    }

    fn checksum(&mut self) -> Result<u32, ReceiverError> {
        self.file.seek(SeekFrom::Start(0))?;
        let mut crc = 0u32;
        let mut buf = [0u8; 8192];
        loop {
            let n = self.file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            crc = crc32c::crc32c_append(crc, &buf[..n]);
        }
        Ok(crc)
    }
}
