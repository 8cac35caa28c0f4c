//! Zip assembly for a finished staging area.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const ARCHIVE_SUFFIX: &str = "_images.zip";

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("Failed to read/write {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("Failed to write zip {path}: {source}")]
    Zip {
        path: PathBuf,
        source: zip::result::ZipError,
    },
}

/// A finished archive on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    pub path: PathBuf,
    /// Entry names in the order they were written
    pub entries: Vec<String>,
}

impl Archive {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// File name for a query's archive: each whitespace character and each
/// character that is not safe in file names becomes `_`, then
/// `_images.zip` is appended.
pub fn archive_file_name(query: &str) -> String {
    let mut name = String::with_capacity(query.len() + ARCHIVE_SUFFIX.len());

    for c in query.trim().chars() {
        match c {
            c if c.is_whitespace() => name.push('_'),
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => name.push('_'),
            c if c.is_control() => name.push('_'),
            c => name.push(c),
        }
    }

    name.push_str(ARCHIVE_SUFFIX);
    name
}

/// Where the archive for `query` lands inside `output_dir`.
pub fn archive_path(output_dir: &Path, query: &str) -> PathBuf {
    output_dir.join(archive_file_name(query))
}

pub struct Archiver;

impl Archiver {
    /// Zip every regular file under `staging_root` into `archive_path`.
    ///
    /// Entry names are relative to `staging_root`, `/`-separated and
    /// written in sorted order. An existing file at `archive_path` is
    /// overwritten. On error a partially written archive is left in place.
    pub fn build(staging_root: &Path, archive_path: &Path) -> Result<Archive, ArchiveError> {
        let files = Self::collect_files(staging_root)?;

        if let Some(parent) = archive_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| ArchiveError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        info!("Creating zip file at '{}'...", archive_path.display());

        let file = File::create(archive_path).map_err(|source| ArchiveError::Io {
            path: archive_path.to_path_buf(),
            source,
        })?;

        let mut zip = ZipWriter::new(BufWriter::new(file));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        let zip_err = |source| ArchiveError::Zip {
            path: archive_path.to_path_buf(),
            source,
        };

        let mut entries = Vec::with_capacity(files.len());
        for (name, path) in files {
            let mut staged = File::open(&path).map_err(|source| ArchiveError::Io {
                path: path.clone(),
                source,
            })?;

            zip.start_file(name.as_str(), options).map_err(zip_err)?;
            io::copy(&mut staged, &mut zip).map_err(|source| ArchiveError::Io {
                path: path.clone(),
                source,
            })?;
            entries.push(name);
        }

        let mut writer = zip.finish().map_err(zip_err)?;
        writer.flush().map_err(|source| ArchiveError::Io {
            path: archive_path.to_path_buf(),
            source,
        })?;

        Ok(Archive {
            path: archive_path.to_path_buf(),
            entries,
        })
    }

    /// Regular files under `root` as `(entry name, absolute path)`, sorted
    /// by entry name.
    fn collect_files(root: &Path) -> Result<Vec<(String, PathBuf)>, ArchiveError> {
        let mut files = Vec::new();

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(|source| ArchiveError::Walk {
                path: root.to_path_buf(),
                source,
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            files.push((name, entry.path().to_path_buf()));
        }

        files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(files)
    }
}
