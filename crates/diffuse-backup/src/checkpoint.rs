//! Atomic on-disk backups and periodic checkpoints.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use diffuse_core::Simulation;
use diffuse_engine::{IterationObserver, IterationProgress};

use crate::error::BackupError;
use crate::reader::BackupReader;
use crate::types::Header;
use crate::writer::write_simulation;

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write `simulation` to `path` so that a reader sees either the previous
/// file or the complete new one.
///
/// The backup goes to `<path>.tmp` first, is flushed and synced, then
/// renamed over `path`.
pub fn write_simulation_atomic(
    path: &Path,
    header: &Header,
    simulation: &Simulation,
) -> Result<(), BackupError> {
    let tmp = temp_path(path);
    let file = File::create(&tmp)?;
    let writer = write_simulation(BufWriter::new(file), header, simulation)?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    fs::rename(&tmp, path)?;
    tracing::debug!(
        path = %path.display(),
        iterations = simulation.len(),
        "backup written"
    );
    Ok(())
}

/// Read a backup file back into a header and a verified log.
pub fn read_simulation_file(path: &Path) -> Result<(Header, Simulation), BackupError> {
    let reader = BackupReader::open(BufReader::new(File::open(path)?))?;
    let header = *reader.header();
    Ok((header, reader.read_simulation()?))
}

/// Writes an atomic backup every `every` iterations of a run.
///
/// Plug into [`Simulator::run_observed`](diffuse_engine::Simulator::run_observed).
#[derive(Clone, Debug)]
pub struct Checkpointer {
    path: PathBuf,
    header: Header,
    every: u32,
    written: usize,
}

impl Checkpointer {
    /// Checkpoint to `path` every `every` iterations (at least 1).
    pub fn new(path: impl Into<PathBuf>, header: Header, every: u32) -> Self {
        Self {
            path: path.into(),
            header,
            every: every.max(1),
            written: 0,
        }
    }

    /// Target file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of checkpoints written.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Write a checkpoint now.
    pub fn checkpoint(&mut self, simulation: &Simulation) -> Result<(), BackupError> {
        write_simulation_atomic(&self.path, &self.header, simulation)?;
        self.written += 1;
        Ok(())
    }
}

impl IterationObserver for Checkpointer {
    fn on_iteration(
        &mut self,
        simulation: &Simulation,
        progress: &IterationProgress,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if progress.number % self.every == 0 {
            self.checkpoint(simulation)?;
        }
        Ok(())
    }
}
