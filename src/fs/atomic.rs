//! Atomic file replacement for lock records and configuration.
//!
//! Content is written to a temporary sibling file, synced, then renamed over
//! the target. A reader therefore sees either the previous record or the new
//! one, never a torn write.
//!
//! Source and destination must be on the same filesystem for the rename to be
//! atomic; the temporary file always lives next to the target for that reason.

use crate::error::{Result, RoadlockError};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Atomically write bytes to a file, creating parent directories as needed.
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            RoadlockError::StoreError(format!(
                "failed to create directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let temp_path = temp_path_for(path)?;
    write_and_sync(&temp_path, content)?;
    replace(&temp_path, path)
}

/// Atomically write a string to a file.
pub fn atomic_write_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

/// `.{filename}.{pid}.tmp` in the target's directory.
fn temp_path_for(target: &Path) -> Result<PathBuf> {
    let parent = target.parent().unwrap_or(Path::new("."));
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            RoadlockError::StoreError(format!("invalid file path '{}'", target.display()))
        })?;

    Ok(parent.join(format!(".{}.{}.tmp", filename, std::process::id())))
}

fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| {
        RoadlockError::StoreError(format!(
            "failed to create temporary file '{}': {}",
            path.display(),
            e
        ))
    })?;

    let written = file.write_all(content).and_then(|_| file.sync_all());
    if let Err(e) = written {
        let _ = fs::remove_file(path);
        return Err(RoadlockError::StoreError(format!(
            "failed to write temporary file '{}': {}",
            path.display(),
            e
        )));
    }

    Ok(())
}

fn replace(source: &Path, target: &Path) -> Result<()> {
    fs::rename(source, target).map_err(|e| {
        let _ = fs::remove_file(source);
        RoadlockError::StoreError(format!(
            "failed to atomically replace '{}': {}",
            target.display(),
            e
        ))
    })?;

    sync_parent_dir(target);
    Ok(())
}

/// Persist the directory entry of a freshly renamed file.
#[cfg(unix)]
fn sync_parent_dir(target: &Path) {
    if let Some(parent) = target.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_target: &Path) {}
