//! # Snapshot Format
//!
//! Binary serialization for case snapshots. File and database I/O live in
//! the app layer.
//!
//! Format: Header (13 bytes) + postcard-serialized [`CaseWorkflowState`].
//! - 4 bytes: Magic ("LXFW")
//! - 1 byte: Version
//! - 8 bytes: FNV-1a checksum of the payload, little-endian
//!
//! Size, header and checksum are all validated before the payload is decoded.

use crate::workflow::CaseWorkflowState;
use crate::{LexflowError, primitives};

// =============================================================================
// LIMITS
// =============================================================================

/// Maximum accepted snapshot size.
///
/// A case holds tens of deadlines; 16 MB leaves room for long notification
/// logs while bounding allocation on corrupted input.
pub const MAX_SNAPSHOT_SIZE: usize = 16 * 1024 * 1024;

/// Header length in bytes.
pub const HEADER_LEN: usize = 13;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

// =============================================================================
// HEADER
// =============================================================================

/// The header preceding every snapshot payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u8,
    pub checksum: u64,
}

impl SnapshotHeader {
    /// Header for a payload in the current format version.
    #[must_use]
    pub fn for_payload(payload: &[u8]) -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
            checksum: fnv1a(payload),
        }
    }

    /// Validate magic bytes and version.
    pub fn validate(&self) -> Result<(), LexflowError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(LexflowError::SerializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(LexflowError::SerializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes[5..13].copy_from_slice(&self.checksum.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LexflowError> {
        let header = bytes.get(..HEADER_LEN).ok_or_else(|| {
            LexflowError::SerializationError("Header too short".to_string())
        })?;
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&header[0..4]);
        let mut checksum = [0u8; 8];
        checksum.copy_from_slice(&header[5..13]);
        Ok(Self {
            magic,
            version: header[4],
            checksum: u64::from_le_bytes(checksum),
        })
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a case to snapshot bytes.
pub fn case_to_bytes(state: &CaseWorkflowState) -> Result<Vec<u8>, LexflowError> {
    let payload = postcard::to_stdvec(state)
        .map_err(|e| LexflowError::SerializationError(e.to_string()))?;
    let header = SnapshotHeader::for_payload(&payload);

    let mut result = Vec::with_capacity(HEADER_LEN + payload.len());
    result.extend_from_slice(&header.to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

/// Deserialize a case from snapshot bytes.
pub fn case_from_bytes(bytes: &[u8]) -> Result<CaseWorkflowState, LexflowError> {
    if bytes.len() > MAX_SNAPSHOT_SIZE {
        return Err(LexflowError::SerializationError(format!(
            "Snapshot size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_SNAPSHOT_SIZE
        )));
    }

    let header = SnapshotHeader::from_bytes(bytes)?;
    header.validate()?;

    let payload = &bytes[HEADER_LEN..];
    let actual = fnv1a(payload);
    if actual != header.checksum {
        return Err(LexflowError::SerializationError(format!(
            "Checksum mismatch: header {:016x}, payload {:016x}",
            header.checksum, actual
        )));
    }

    postcard::from_bytes(payload).map_err(|e| {
        LexflowError::SerializationError(format!("Failed to deserialize case snapshot: {}", e))
    })
}

/// Deterministic, non-cryptographic checksum of a case's snapshot payload.
///
/// Detects accidental corruption only; use [`snapshot_crypto_hash`] where
/// tampering matters.
pub fn snapshot_checksum(state: &CaseWorkflowState) -> Result<u64, LexflowError> {
    let payload = postcard::to_stdvec(state)
        .map_err(|e| LexflowError::SerializationError(e.to_string()))?;
    Ok(fnv1a(&payload))
}

/// BLAKE3 hash of a case's full snapshot bytes, as 64 hex characters.
#[cfg(feature = "crypto-hash")]
pub fn snapshot_crypto_hash(state: &CaseWorkflowState) -> Result<String, LexflowError> {
    let bytes = case_to_bytes(state)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

fn fnv1a(data: &[u8]) -> u64 {
    data.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

// =============================================================================
// TESTS
// =============================================================================
