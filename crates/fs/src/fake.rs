// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory [`FilesystemStore`] for engine and daemon tests, so test
//! suites never touch the real disk.

use crate::{FSError, FilesystemStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct FakeFilesystemStore {
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
    dirs: Mutex<std::collections::BTreeSet<PathBuf>>,
}

impl FakeFilesystemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_file(&self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.files.lock().insert(path.into(), bytes.into());
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.files.lock().contains_key(path.as_ref())
    }
}

#[async_trait]
impl FilesystemStore for FakeFilesystemStore {
    async fn mkdir_all(&self, path: &Path) -> Result<(), FSError> {
        let mut dirs = self.dirs.lock();
        let mut cur = PathBuf::new();
        for part in path.iter() {
            cur.push(part);
            dirs.insert(cur.clone());
        }
        Ok(())
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, FSError> {
        self.files.lock().get(path).cloned().ok_or_else(|| FSError::Read {
            path: path.to_path_buf(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })
    }

    async fn read_file_text(&self, path: &Path) -> Result<String, FSError> {
        let bytes = self.read_file(path).await?;
        std::str::from_utf8(&bytes).map(str::to_owned).map_err(|source| FSError::ReadUtf8 {
            path: path.to_path_buf(),
            source,
        })
    }

    async fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<(), FSError> {
        self.files.lock().insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    async fn append_text(&self, path: &Path, text: &str) -> Result<(), FSError> {
        let mut files = self.files.lock();
        let entry = files.entry(path.to_path_buf()).or_default();
        entry.extend_from_slice(text.as_bytes());
        Ok(())
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<String>, FSError> {
        let files = self.files.lock();
        let names: Vec<String> = files
            .keys()
            .filter_map(|p| {
                let parent = p.parent()?;
                if parent == path {
                    p.file_name().map(|n| n.to_string_lossy().into_owned())
                } else {
                    None
                }
            })
            .collect();
        if names.is_empty() && !self.dirs.lock().contains(path) {
            return Err(FSError::ReadDir {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        Ok(names)
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<(), FSError> {
        let mut files = self.files.lock();
        let bytes = files.remove(from).ok_or_else(|| FSError::Rename {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })?;
        files.insert(to.to_path_buf(), bytes);
        Ok(())
    }

    async fn unlink(&self, path: &Path) -> Result<(), FSError> {
        self.files.lock().remove(path).map(|_| ()).ok_or_else(|| FSError::Unlink {
            path: path.to_path_buf(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })
    }
}
