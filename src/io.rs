// File-level workflows.
//
// Each helper reads its inputs fully into memory, runs the in-memory
// operation and writes the result through a `BufWriter`. Outputs are never
// overwritten unless `force` is set. When the `hash` feature is enabled,
// SHA-1 fingerprints of inputs and outputs are logged and returned in the
// stats.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::ips::{ApplyStats, PatchBuffer, PatchError, apply_patch};
use crate::rom::{self, MapLayout, RomError};

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Per-patch result of `patch_file()`.
#[derive(Debug, Clone)]
pub struct PatchFileStats {
    pub path: PathBuf,
    /// Patch file size in bytes.
    pub size: u64,
    pub apply: ApplyStats,
    /// SHA-1 of the patch file (if `hash` feature is enabled).
    pub sha1: Option<String>,
}

/// Statistics returned by `patch_file()`.
#[derive(Debug, Clone)]
pub struct PatchStats {
    pub rom_size: u64,
    pub output_size: u64,
    pub patches: Vec<PatchFileStats>,
    pub rom_sha1: Option<String>,
    pub output_sha1: Option<String>,
}

/// Statistics returned by `strip_header_file()`.
#[derive(Debug, Clone)]
pub struct StripStats {
    pub input_size: u64,
    pub output_size: u64,
    pub input_sha1: Option<String>,
    pub output_sha1: Option<String>,
}

/// Statistics returned by `fix_checksum_file()`.
#[derive(Debug, Clone)]
pub struct FixStats {
    pub layout: MapLayout,
    /// The input carried a copier header, kept as-is in the output.
    pub copier_header: bool,
    pub old_checksum: u16,
    pub new_checksum: u16,
    pub output_sha1: Option<String>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file workflows.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Open, read or write failure on `path`.
    #[error("{}: {source}", path.display())]
    File { path: PathBuf, source: io::Error },
    #[error("output file exists, use -f to overwrite: {}", .0.display())]
    OutputExists(PathBuf),
    /// Patch `path` could not be applied.
    #[error("{}: {source}", path.display())]
    Patch { path: PathBuf, source: PatchError },
    #[error(transparent)]
    Rom(#[from] RomError),
}

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

/// Read a whole file into memory.
pub fn read_input(path: &Path) -> Result<Vec<u8>, IoError> {
    std::fs::read(path).map_err(|source| IoError::File {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `data` to `path`, refusing to clobber an existing file unless
/// `force` is set.
pub fn write_output(path: &Path, data: &[u8], force: bool) -> Result<(), IoError> {
    ensure_writable(path, force)?;
    let file_err = |source| IoError::File {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(file_err)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(data).map_err(file_err)?;
    writer.flush().map_err(file_err)
}

/// `input` with `suffix` appended to its file name, e.g. `game.sfc-patched`.
pub fn default_output_path(input: &Path, suffix: &str) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(feature = "hash")]
fn fingerprint(data: &[u8]) -> Option<String> {
    Some(crate::hash::sha1_hex(data))
}

#[cfg(not(feature = "hash"))]
fn fingerprint(_data: &[u8]) -> Option<String> {
    None
}

fn display_fingerprint(sha1: &Option<String>) -> &str {
    sha1.as_deref().unwrap_or("-")
}

fn ensure_writable(path: &Path, force: bool) -> Result<(), IoError> {
    if path.exists() && !force {
        return Err(IoError::OutputExists(path.to_path_buf()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// patch_file
// ---------------------------------------------------------------------------

/// Apply `patch_paths` in order to the ROM at `rom_path` and write the
/// result to `output_path`.
///
/// The first patch that fails aborts the run; nothing is written.
pub fn patch_file(
    rom_path: &Path,
    patch_paths: &[PathBuf],
    output_path: &Path,
    force: bool,
) -> Result<PatchStats, IoError> {
    ensure_writable(output_path, force)?;

    let rom = read_input(rom_path)?;
    let rom_size = rom.len() as u64;
    let rom_sha1 = fingerprint(&rom);
    log::info!(
        "Patching ROM: {} ({})",
        rom_path.display(),
        display_fingerprint(&rom_sha1)
    );

    let mut buffer = PatchBuffer::from(rom);
    let mut patches = Vec::with_capacity(patch_paths.len());

    for path in patch_paths {
        let patch = read_input(path)?;
        let sha1 = fingerprint(&patch);
        log::info!(
            "Applying patch: {} ({})",
            path.display(),
            display_fingerprint(&sha1)
        );
        let apply = apply_patch(&mut buffer, &patch[..]).map_err(|source| IoError::Patch {
            path: path.clone(),
            source,
        })?;
        patches.push(PatchFileStats {
            path: path.clone(),
            size: patch.len() as u64,
            apply,
            sha1,
        });
    }

    let result = buffer.into_inner();
    let output_sha1 = fingerprint(&result);
    log::info!(
        "Writing result file: {} ({})",
        output_path.display(),
        display_fingerprint(&output_sha1)
    );
    write_output(output_path, &result, force)?;

    Ok(PatchStats {
        rom_size,
        output_size: result.len() as u64,
        patches,
        rom_sha1,
        output_sha1,
    })
}

// ---------------------------------------------------------------------------
// strip_header_file
// ---------------------------------------------------------------------------

/// Write the ROM at `rom_path` minus its 512-byte copier header.
pub fn strip_header_file(
    rom_path: &Path,
    output_path: &Path,
    force: bool,
) -> Result<StripStats, IoError> {
    ensure_writable(output_path, force)?;

    let data = read_input(rom_path)?;
    let input_sha1 = fingerprint(&data);
    log::info!(
        "Deleting header: {} ({})",
        rom_path.display(),
        display_fingerprint(&input_sha1)
    );
    if !rom::has_copier_header(&data) {
        log::warn!(
            "{}: size {} does not look like it carries a copier header",
            rom_path.display(),
            data.len()
        );
    }

    let stripped = rom::strip_copier_header(&data)?;
    let output_sha1 = fingerprint(stripped);
    log::info!(
        "Writing result file: {} ({})",
        output_path.display(),
        display_fingerprint(&output_sha1)
    );
    write_output(output_path, stripped, force)?;

    Ok(StripStats {
        input_size: data.len() as u64,
        output_size: stripped.len() as u64,
        input_sha1,
        output_sha1,
    })
}

// ---------------------------------------------------------------------------
// fix_checksum_file
// ---------------------------------------------------------------------------

/// Recompute the checksum pair of the ROM at `rom_path` and write the
/// repaired image to `output_path`.
///
/// A copier header is left in place and excluded from the checksum.
pub fn fix_checksum_file(
    rom_path: &Path,
    output_path: &Path,
    layout: Option<MapLayout>,
    force: bool,
) -> Result<FixStats, IoError> {
    ensure_writable(output_path, force)?;

    let mut data = read_input(rom_path)?;
    let skip = rom::image_offset(&data);
    if skip > 0 {
        log::info!("Skipping copier header: {skip} bytes");
    }
    let image = &mut data[skip..];
    let layout = match layout {
        Some(layout) => layout,
        None => rom::locate_header(image)?.layout,
    };
    let (old_checksum, new_checksum) = rom::fix_checksum(image, Some(layout))?;
    log::info!("Checksum ({layout}): {old_checksum:04x} -> {new_checksum:04x}");

    let output_sha1 = fingerprint(&data);
    log::info!(
        "Writing result file: {} ({})",
        output_path.display(),
        display_fingerprint(&output_sha1)
    );
    write_output(output_path, &data, force)?;

    Ok(FixStats {
        layout,
        copier_header: skip > 0,
        old_checksum,
        new_checksum,
        output_sha1,
    })
}

// ---------------------------------------------------------------------------
// hash_file
// ---------------------------------------------------------------------------

/// Hex digest of the file at `path`.
#[cfg(feature = "hash")]
pub fn hash_file(path: &Path, algorithm: crate::hash::HashAlgorithm) -> Result<String, IoError> {
    let data = read_input(path)?;
    Ok(crate::hash::digest_hex(algorithm, &data))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
