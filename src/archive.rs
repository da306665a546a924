use std::{
    fs::File,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;
use zip::ZipArchive;

#[derive(thiserror::Error, Debug)]
pub enum ArchiveError {
    #[error("zip error: {0}")]
    ZipError(#[from] zip::result::ZipError),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("walk error: {0}")]
    WalkError(#[from] walkdir::Error),
}

/// Unpack every entry of the zip at `archive_path` below `destination`.
/// Entries whose names would escape `destination` are skipped.
pub fn extract_zip(archive_path: &Path, destination: &Path) -> Result<usize, ArchiveError> {
    let mut archive = ZipArchive::new(File::open(archive_path)?)?;
    std::fs::create_dir_all(destination)?;

    let mut extracted = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let outpath = match entry.enclosed_name() {
            Some(path) => destination.join(path),
            None => {
                warn!("skipping unsafe zip entry {}", entry.name());
                continue;
            }
        };

        if entry.is_dir() {
            std::fs::create_dir_all(&outpath)?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut outfile = File::create(&outpath)?;
        std::io::copy(&mut entry, &mut outfile)?;
        extracted += 1;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode))?;
            }
        }
    }

    debug!("extracted {} files from {}", extracted, archive_path.display());
    Ok(extracted)
}

/// First directory below `root`, in name order, that holds every one of
/// `executables`.
pub fn find_executable_dir(
    root: &Path,
    executables: &[String],
) -> Result<Option<PathBuf>, ArchiveError> {
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }

        let dir = entry.path();
        if executables.iter().all(|exe| dir.join(exe).is_file()) {
            return Ok(Some(dir.to_path_buf()));
        }
    }

    Ok(None)
}
