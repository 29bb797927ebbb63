//! Companion source archives.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::contract::Archiver;
use crate::error::ArchiveError;

/// Suffix of a companion archive, appended to the primary artifact's base name.
pub const COMPANION_SUFFIX: &str = "_src.zip";

/// Subfolder whose presence triggers a companion archive.
pub const COMPANION_DIR: &str = "src";

/// `<base_name>_src.zip`
pub fn companion_archive_name(base_name: &str) -> String {
    format!("{base_name}{COMPANION_SUFFIX}")
}

/// Deflate-compressed zip writer.
///
/// Entries are named relative to the archived directory with `/`
/// separators and added in sorted order.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipArchiver;

impl Archiver for ZipArchiver {
    fn archive_dir(&self, source_dir: &Path, destination: &Path) -> Result<(), ArchiveError> {
        let dest_dir = match destination.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let staging = tempfile::Builder::new()
            .prefix(".docpress-")
            .suffix(".zip")
            .tempfile_in(dest_dir)?;

        let mut writer = ZipWriter::new(staging.reopen()?);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut files = 0usize;

        for entry in WalkDir::new(source_dir).sort_by_file_name() {
            let entry = entry?;
            let rel = entry
                .path()
                .strip_prefix(source_dir)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            if rel.as_os_str().is_empty() {
                continue;
            }
            let name = entry_name(rel);
            if entry.file_type().is_dir() {
                writer.add_directory(format!("{name}/"), options)?;
            } else if entry.file_type().is_file() {
                writer.start_file(name, options)?;
                io::copy(&mut File::open(entry.path())?, &mut writer)?;
                files += 1;
            }
        }
        writer.finish()?;

        staging
            .persist(destination)
            .map_err(|e| ArchiveError::Io(e.error))?;
        info!(
            source = %source_dir.display(),
            archive = %destination.display(),
            files,
            "Wrote companion archive"
        );
        Ok(())
    }
}

fn entry_name(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Archives `<folder>/src` into `<output_dir>/<base_name>_src.zip` when that
/// subfolder exists. Returns the archive path, or `None` when there was
/// nothing to archive.
pub fn zip_companion(
    archiver: &dyn Archiver,
    folder: &Path,
    output_dir: &Path,
    base_name: &str,
) -> Result<Option<PathBuf>, ArchiveError> {
    let src = folder.join(COMPANION_DIR);
    if !src.is_dir() {
        debug!(folder = %folder.display(), "No src folder, skipping companion archive");
        return Ok(None);
    }
    let destination = output_dir.join(companion_archive_name(base_name));
    archiver.archive_dir(&src, &destination)?;
    Ok(Some(destination))
}
