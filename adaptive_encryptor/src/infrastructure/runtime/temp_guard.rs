// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Temp File Guard
//!
//! RAII guard for the temp-then-rename discipline. Every engine writes to
//! `<destination>.tmp` and renames on success; the guard unlinks the temp on
//! every exit path that does not commit, so cancelled or failed runs never
//! leave partial output and never touch the destination.

use std::path::{Path, PathBuf};

/// Unlinks a temp file on drop unless `commit` was called.
pub struct TempFileGuard {
    path: PathBuf,
    committed: bool,
}

impl TempFileGuard {
    /// Guards the given temp path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    /// The guarded temp path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Marks the temp as committed (renamed away); drop becomes a no-op.
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Temp path for a destination: `<destination>.tmp`.
pub fn temp_path_for(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}
