// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! osmdbt-fs: the filesystem staging-area collaborator (component C1).
//!
//! No component above this one may call OS file APIs directly — every
//! disk touch the job engine needs goes through [`FilesystemStore`] so
//! tests can substitute an in-memory fake.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Every failure surfaces this single tagged kind — no partial results
/// are ever returned to the caller.
#[derive(Debug, Error)]
pub enum FSError {
    #[error("mkdir -p {path}: {source}")]
    Mkdir { path: PathBuf, source: std::io::Error },

    #[error("read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("read {path} as utf-8: {source}")]
    ReadUtf8 { path: PathBuf, source: std::str::Utf8Error },

    #[error("write {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },

    #[error("read dir {path}: {source}")]
    ReadDir { path: PathBuf, source: std::io::Error },

    #[error("rename {from} -> {to}: {source}")]
    Rename { from: PathBuf, to: PathBuf, source: std::io::Error },

    #[error("unlink {path}: {source}")]
    Unlink { path: PathBuf, source: std::io::Error },
}

/// Uniform filesystem access for the staging tree.
///
/// `mkdir_all` is idempotent. `read_dir` returns names only, unsorted —
/// callers must not rely on order.
#[async_trait]
pub trait FilesystemStore: Send + Sync + 'static {
    async fn mkdir_all(&self, path: &Path) -> Result<(), FSError>;
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, FSError>;
    async fn read_file_text(&self, path: &Path) -> Result<String, FSError>;
    async fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<(), FSError>;
    async fn append_text(&self, path: &Path, text: &str) -> Result<(), FSError>;
    async fn read_dir(&self, path: &Path) -> Result<Vec<String>, FSError>;
    async fn rename(&self, from: &Path, to: &Path) -> Result<(), FSError>;
    async fn unlink(&self, path: &Path) -> Result<(), FSError>;
}

/// Production implementation backed by `tokio::fs`.
#[derive(Debug, Clone, Default)]
pub struct LocalFilesystemStore;

#[async_trait]
impl FilesystemStore for LocalFilesystemStore {
    async fn mkdir_all(&self, path: &Path) -> Result<(), FSError> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|source| FSError::Mkdir { path: path.to_path_buf(), source })
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, FSError> {
        tokio::fs::read(path).await.map_err(|source| FSError::Read { path: path.to_path_buf(), source })
    }

    async fn read_file_text(&self, path: &Path) -> Result<String, FSError> {
        let bytes = self.read_file(path).await?;
        std::str::from_utf8(&bytes)
            .map(str::to_owned)
            .map_err(|source| FSError::ReadUtf8 { path: path.to_path_buf(), source })
    }

    async fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<(), FSError> {
        tokio::fs::write(path, bytes)
            .await
            .map_err(|source| FSError::Write { path: path.to_path_buf(), source })
    }

    async fn append_text(&self, path: &Path, text: &str) -> Result<(), FSError> {
        use tokio::io::AsyncWriteExt;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|source| FSError::Write { path: path.to_path_buf(), source })?;
        file.write_all(text.as_bytes())
            .await
            .map_err(|source| FSError::Write { path: path.to_path_buf(), source })
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<String>, FSError> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(path)
            .await
            .map_err(|source| FSError::ReadDir { path: path.to_path_buf(), source })?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| FSError::ReadDir { path: path.to_path_buf(), source })?
        {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<(), FSError> {
        tokio::fs::rename(from, to)
            .await
            .map_err(|source| FSError::Rename { from: from.to_path_buf(), to: to.to_path_buf(), source })
    }

    async fn unlink(&self, path: &Path) -> Result<(), FSError> {
        tokio::fs::remove_file(path)
            .await
            .map_err(|source| FSError::Unlink { path: path.to_path_buf(), source })
    }
}

/// The staging tree's standard sub-roots, relative to a job's working
/// directory.
#[derive(Debug, Clone)]
pub struct StagingTree {
    pub root: PathBuf,
}

impl StagingTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn changes(&self) -> PathBuf {
        self.root.join("changes")
    }

    pub fn logs(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn run(&self) -> PathBuf {
        self.root.join("run")
    }

    pub fn backup(&self) -> PathBuf {
        self.changes().join("backup")
    }

    pub fn state_file(&self) -> PathBuf {
        self.changes().join("state.txt")
    }

    pub fn backup_state_file(&self) -> PathBuf {
        self.backup().join("state.txt")
    }

    /// The four directories created idempotently at job start (phase 2).
    pub fn dirs_to_create(&self) -> Vec<PathBuf> {
        vec![self.logs(), self.changes(), self.run(), self.backup()]
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
