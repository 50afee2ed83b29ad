//! Zip packing and extraction for Lambda artifacts.

mod exclude;

pub use exclude::ExclusionRules;

use std::cell::Cell;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::consts::APP_NAME;

#[derive(Debug, Error)]
pub enum ArchiveError {
  #[error("I/O error on '{path}': {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("zip error: {0}")]
  Zip(#[from] ZipError),

  #[error("failed to walk directory: {0}")]
  Walk(#[from] walkdir::Error),

  #[error("invalid zip entry name: {0}")]
  InvalidEntry(String),
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> ArchiveError + '_ {
  move |source| ArchiveError::Io {
    path: path.to_path_buf(),
    source,
  }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct PackStats {
  pub files: usize,
  pub dirs: usize,
  pub excluded: usize,
  /// Size of the finished archive on disk.
  pub archive_bytes: u64,
}

/// Zip the contents of `src` into `dest`, skipping paths matched by `rules`.
///
/// Entry names are relative to `src` with `/` separators and appear in sorted
/// walk order. An existing `dest` is replaced; its parent is created if needed.
///
/// The archive is written to a hidden temporary file next to `dest` and only
/// renamed into place once complete, so a failed pack leaves no `dest`.
pub fn pack_directory(src: &Path, dest: &Path, rules: &ExclusionRules) -> Result<PackStats, ArchiveError> {
  if dest.exists() {
    debug!(path = %dest.display(), "removing previous artifact");
    fs::remove_file(dest).map_err(io_err(dest))?;
  }
  let parent = match dest.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent,
    _ => Path::new("."),
  };
  fs::create_dir_all(parent).map_err(io_err(parent))?;

  let staging = tempfile::Builder::new()
    .prefix(&format!(".{APP_NAME}-"))
    .suffix(".zip.partial")
    .tempfile_in(parent)
    .map_err(io_err(parent))?;
  let mut zip = ZipWriter::new(staging);
  let base_options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

  let excluded = Cell::new(0usize);
  let walker = WalkDir::new(src)
    .min_depth(1)
    .follow_links(true)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|entry| {
      let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
      let skip = rules.excludes(relative, entry.file_type().is_dir());
      if skip {
        excluded.set(excluded.get() + 1);
      }
      !skip
    });

  let mut stats = PackStats::default();
  for entry in walker {
    let entry = entry?;
    let path = entry.path();
    let relative = path.strip_prefix(src).unwrap_or(path);
    let name = entry_name(relative)?;
    let options = with_mode(base_options, path)?;

    if entry.file_type().is_dir() {
      zip.add_directory(name, options)?;
      stats.dirs += 1;
    } else {
      zip.start_file(name, options)?;
      let mut input = File::open(path).map_err(io_err(path))?;
      io::copy(&mut input, &mut zip).map_err(io_err(path))?;
      stats.files += 1;
    }
  }

  let staging = zip.finish()?;
  staging.persist(dest).map_err(|e| ArchiveError::Io {
    path: dest.to_path_buf(),
    source: e.error,
  })?;
  stats.excluded = excluded.get();
  stats.archive_bytes = fs::metadata(dest).map_err(io_err(dest))?.len();

  info!(
    path = %dest.display(),
    files = stats.files,
    excluded = stats.excluded,
    bytes = stats.archive_bytes,
    "artifact written"
  );
  Ok(stats)
}

/// Extract every entry of `archive_path` into `dest`.
///
/// Entry names are sanitized with `enclosed_name`, so nothing escapes `dest`.
pub fn unpack_archive(archive_path: &Path, dest: &Path) -> Result<usize, ArchiveError> {
  let file = File::open(archive_path).map_err(io_err(archive_path))?;
  let mut archive = ZipArchive::new(BufReader::new(file))?;
  fs::create_dir_all(dest).map_err(io_err(dest))?;

  for i in 0..archive.len() {
    let mut file = archive.by_index(i)?;
    let relative = file
      .enclosed_name()
      .ok_or_else(|| ArchiveError::InvalidEntry(file.name().to_string()))?;
    let dest_path = dest.join(relative);

    if file.is_dir() {
      fs::create_dir_all(&dest_path).map_err(io_err(&dest_path))?;
      continue;
    }

    if let Some(parent) = dest_path.parent() {
      fs::create_dir_all(parent).map_err(io_err(parent))?;
    }
    let mut outfile = File::create(&dest_path).map_err(io_err(&dest_path))?;
    io::copy(&mut file, &mut outfile).map_err(io_err(&dest_path))?;

    #[cfg(unix)]
    {
      use std::os::unix::fs::PermissionsExt;
      if let Some(mode) = file.unix_mode() {
        fs::set_permissions(&dest_path, fs::Permissions::from_mode(mode)).map_err(io_err(&dest_path))?;
      }
    }
  }

  debug!(archive = %archive_path.display(), entries = archive.len(), "unpacked archive");
  Ok(archive.len())
}

fn entry_name(relative: &Path) -> Result<String, ArchiveError> {
  let parts: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
  parts
    .map(|p| p.join("/"))
    .ok_or_else(|| ArchiveError::InvalidEntry(relative.display().to_string()))
}

#[cfg(unix)]
fn with_mode(options: SimpleFileOptions, path: &Path) -> Result<SimpleFileOptions, ArchiveError> {
  use std::os::unix::fs::PermissionsExt;
  let mode = fs::metadata(path).map_err(io_err(path))?.permissions().mode();
  Ok(options.unix_permissions(mode))
}

#[cfg(not(unix))]
fn with_mode(options: SimpleFileOptions, _path: &Path) -> Result<SimpleFileOptions, ArchiveError> {
  Ok(options)
}
