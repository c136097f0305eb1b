//! Binary trajectory archives (`.ntj`).
//!
//! # File Format
//!
//! 1. **Magic bytes**: `NTJ1` (4 bytes)
//! 2. **Version**: `u32` little-endian (4 bytes), currently 1
//! 3. **Flags**: `u32` little-endian (4 bytes), reserved, always 0
//! 4. **Payload**: bincode-encoded [`TrajectoryRecord`]
//!
//! Loading re-runs the flat-buffer builder on the decoded record, so an
//! archive that decodes but describes an inconsistent trajectory is still
//! rejected.
//!
//! # Example
//!
//! ```no_run
//! use named_trajectory::{archive, NamedTrajectory};
//! use nalgebra::DMatrix;
//!
//! let traj = NamedTrajectory::builder()
//!     .block("x", DMatrix::zeros(2, 10))
//!     .block("u", DMatrix::zeros(1, 10))
//!     .controls(["u"])
//!     .timestep(0.05)
//!     .build()
//!     .expect("valid trajectory");
//!
//! archive::save(&traj, "swing_up.ntj").expect("should save");
//! let loaded = archive::load("swing_up.ntj").expect("should load");
//! assert_eq!(loaded, traj);
//! ```

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use tracing::{info, warn};

use crate::error::{Result, TrajectoryError};
use crate::record::TrajectoryRecord;
use crate::trajectory::NamedTrajectory;

/// Required file extension.
pub const ARCHIVE_EXTENSION: &str = "ntj";

/// Magic bytes identifying an archive.
pub const ARCHIVE_MAGIC: [u8; 4] = *b"NTJ1";

/// Current archive format version.
pub const ARCHIVE_VERSION: u32 = 1;

/// Header size in bytes (magic + version + flags).
pub const ARCHIVE_HEADER_SIZE: usize = 12;

/// Flag bits understood by this version (none).
const KNOWN_FLAGS: u32 = 0;

fn encode_header() -> [u8; ARCHIVE_HEADER_SIZE] {
    let mut header = [0u8; ARCHIVE_HEADER_SIZE];
    header[..4].copy_from_slice(&ARCHIVE_MAGIC);
    header[4..8].copy_from_slice(&ARCHIVE_VERSION.to_le_bytes());
    header[8..].copy_from_slice(&KNOWN_FLAGS.to_le_bytes());
    header
}

fn decode_header(header: &[u8; ARCHIVE_HEADER_SIZE]) -> Result<()> {
    let word =
        |at: usize| u32::from_le_bytes([header[at], header[at + 1], header[at + 2], header[at + 3]]);

    let magic = [header[0], header[1], header[2], header[3]];
    if magic != ARCHIVE_MAGIC {
        return Err(TrajectoryError::InvalidMagic(magic));
    }
    let version = word(4);
    if version != ARCHIVE_VERSION {
        return Err(TrajectoryError::UnsupportedVersion(version));
    }
    let flags = word(8);
    if flags & !KNOWN_FLAGS != 0 {
        return Err(TrajectoryError::UnsupportedFlags(flags));
    }
    Ok(())
}

fn check_extension(path: &Path) -> Result<()> {
    if path.extension().and_then(|ext| ext.to_str()) == Some(ARCHIVE_EXTENSION) {
        Ok(())
    } else {
        Err(TrajectoryError::InvalidExtension {
            path: path.to_path_buf(),
            expected: ARCHIVE_EXTENSION,
        })
    }
}

/// Saves a trajectory to an `.ntj` file, replacing any existing file.
///
/// # Errors
///
/// [`TrajectoryError::InvalidExtension`] before any I/O if `path` does not
/// end in `.ntj`; otherwise I/O or serialization errors.
pub fn save(traj: &NamedTrajectory, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    check_extension(path)?;
    let bytes = save_bytes(traj)?;
    fs::write(path, &bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "saved trajectory archive");
    Ok(())
}

/// Writes a trajectory archive to any writer.
///
/// # Errors
///
/// Returns [`TrajectoryError::Serialize`] if writing or encoding fails.
pub fn save_writer<W: Write>(traj: &NamedTrajectory, writer: &mut W) -> Result<()> {
    writer
        .write_all(&encode_header())
        .map_err(|e| TrajectoryError::Serialize(e.to_string()))?;
    let record = TrajectoryRecord::from(traj);
    bincode::serialize_into(writer, &record).map_err(|e| TrajectoryError::Serialize(e.to_string()))
}

/// Encodes a trajectory archive into memory.
///
/// # Errors
///
/// Returns [`TrajectoryError::Serialize`] if encoding fails.
pub fn save_bytes(traj: &NamedTrajectory) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    save_writer(traj, &mut buffer)?;
    Ok(buffer)
}

/// Loads a trajectory from an `.ntj` file.
///
/// # Errors
///
/// [`TrajectoryError::InvalidExtension`] before any I/O if `path` does not
/// end in `.ntj`; otherwise I/O, header, decoding or validation errors.
pub fn load(path: impl AsRef<Path>) -> Result<NamedTrajectory> {
    let path = path.as_ref();
    check_extension(path)?;
    let bytes = fs::read(path)?;
    let traj = load_bytes(&bytes)?;
    info!(
        path = %path.display(),
        bytes = bytes.len(),
        dim = traj.dim(),
        timesteps = traj.len(),
        "loaded trajectory archive"
    );
    Ok(traj)
}

/// Reads a trajectory archive from any reader.
///
/// # Errors
///
/// - [`TrajectoryError::InvalidMagic`], [`TrajectoryError::UnsupportedVersion`]
///   or [`TrajectoryError::UnsupportedFlags`] for a foreign or newer header
/// - [`TrajectoryError::Deserialize`] if the payload cannot be decoded
/// - any construction error if the decoded record is inconsistent
pub fn load_reader<R: Read>(reader: &mut R) -> Result<NamedTrajectory> {
    let mut header = [0u8; ARCHIVE_HEADER_SIZE];
    reader
        .read_exact(&mut header)
        .map_err(|e| TrajectoryError::Deserialize(format!("failed to read header: {e}")))?;
    decode_header(&header)?;

    let record: TrajectoryRecord = bincode::deserialize_from(reader)
        .map_err(|e| TrajectoryError::Deserialize(e.to_string()))?;
    let traj = NamedTrajectory::try_from(record)?;
    warn_non_positive_timesteps(&traj);
    Ok(traj)
}

/// Decodes a trajectory archive from memory.
///
/// # Errors
///
/// Same as [`load_reader`].
pub fn load_bytes(bytes: &[u8]) -> Result<NamedTrajectory> {
    let mut reader = Cursor::new(bytes);
    load_reader(&mut reader)
}

/// Returns `true` if `bytes` start with the archive magic.
#[must_use]
pub fn is_archive_bytes(bytes: &[u8]) -> bool {
    bytes.len() >= ARCHIVE_MAGIC.len() && bytes[..ARCHIVE_MAGIC.len()] == ARCHIVE_MAGIC
}

fn warn_non_positive_timesteps(traj: &NamedTrajectory) {
    let Some(name) = traj.timestep().block_name() else {
        return;
    };
    let count = traj
        .timesteps()
        .iter()
        .filter(|dt| !(dt.is_finite() && **dt > 0.0))
        .count();
    if count > 0 {
        warn!(block = name, count, "archive has non-positive timesteps");
    }
}
