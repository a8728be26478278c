//! Copy verification.
//!
//! Sizes are compared from metadata first; only equal-size pairs are read
//! and digested in fixed-size chunks.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, BufReader};
use tracing::debug;

/// Digest algorithm used for content comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumType {
    #[default]
    Sha256,
    /// Faster, adequate for detecting copy corruption.
    Md5,
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Cannot read {path} for verification: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl VerifyError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        VerifyError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Compares a source file with its copy.
#[derive(Debug, Clone, Copy)]
pub struct Verifier {
    chunk_size: usize,
    checksum: ChecksumType,
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new(1024 * 1024, ChecksumType::default())
    }
}

impl Verifier {
    pub fn new(chunk_size: usize, checksum: ChecksumType) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            checksum,
        }
    }

    pub fn checksum_type(&self) -> ChecksumType {
        self.checksum
    }

    /// True when both files have the same size and digest.
    ///
    /// A size mismatch returns false without reading either file. Errors
    /// only on I/O failure.
    pub async fn verify(&self, source: &Path, destination: &Path) -> Result<bool, VerifyError> {
        let source_len = fs::metadata(source)
            .await
            .map_err(|e| VerifyError::io(source, e))?
            .len();
        let destination_meta = fs::metadata(destination)
            .await
            .map_err(|e| VerifyError::io(destination, e))?;

        if !destination_meta.is_file() || destination_meta.len() != source_len {
            debug!(
                source = %source.display(),
                destination = %destination.display(),
                "Size mismatch"
            );
            return Ok(false);
        }

        let (a, b) = tokio::try_join!(self.checksum(source), self.checksum(destination))?;
        Ok(a == b)
    }

    /// Hex digest of a file.
    pub async fn checksum(&self, path: &Path) -> Result<String, VerifyError> {
        let file = File::open(path).await.map_err(|e| VerifyError::io(path, e))?;
        let mut reader = BufReader::with_capacity(self.chunk_size, file);
        let mut buffer = vec![0u8; self.chunk_size];

        match self.checksum {
            ChecksumType::Sha256 => {
                let mut hasher = Sha256::new();
                loop {
                    let n = reader
                        .read(&mut buffer)
                        .await
                        .map_err(|e| VerifyError::io(path, e))?;
                    if n == 0 {
                        break;
                    }
                    hasher.update(&buffer[..n]);
                }
                Ok(format!("{:x}", hasher.finalize()))
            }
            ChecksumType::Md5 => {
                let mut context = md5::Context::new();
                loop {
                    let n = reader
                        .read(&mut buffer)
                        .await
                        .map_err(|e| VerifyError::io(path, e))?;
                    if n == 0 {
                        break;
                    }
                    context.consume(&buffer[..n]);
                }
                Ok(format!("{:x}", context.compute()))
            }
        }
    }
}
