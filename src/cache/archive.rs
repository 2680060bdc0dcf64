//! Gzip-compressed tar archives of install directories
//!
//! Entries are stored relative to the archived directory and appended in
//! file-name order. Symlinks are kept as links, never followed.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Archive `source` into `writer`.
///
/// Returns `Ok(false)` without writing anything when `source` does not exist.
pub fn compress_dir<W: Write>(source: &Path, writer: W) -> io::Result<bool> {
    if !source.is_dir() {
        debug!("Nothing to archive at {}", source.display());
        return Ok(false);
    }

    let mut builder = tar::Builder::new(GzEncoder::new(writer, Compression::default()));
    builder.follow_symlinks(false);

    let mut count = 0usize;
    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::other(format!("path outside archive root: {e}")))?;
        builder.append_path_with_name(entry.path(), relative)?;
        count += 1;
    }

    let mut writer = builder.into_inner()?.finish()?;
    writer.flush()?;
    debug!("Archived {} entries from {}", count, source.display());
    Ok(true)
}

/// Restore an archive into `destination`.
///
/// Whatever exists at `destination` is removed first, so the result is
/// exactly the archived tree.
pub fn decompress_into<R: Read>(reader: R, destination: &Path) -> io::Result<()> {
    remove_existing(destination)?;
    fs::create_dir_all(destination)?;

    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    archive.set_preserve_permissions(true);
    archive.set_unpack_xattrs(false);
    archive.unpack(destination)
}

/// Restore the archive file at `archive_path` into `destination`
pub fn decompress_file(archive_path: &Path, destination: &Path) -> io::Result<()> {
    let file = File::open(archive_path)?;
    decompress_into(BufReader::new(file), destination)
}

fn remove_existing(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
