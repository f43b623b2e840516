//! Backup recording writer.
//!
//! [`BackupWriter`] streams iterations to any `Write` sink. The header and
//! the initial state are written on construction; every frame carries the
//! hash of the state it produces, which the writer tracks by replaying
//! each iteration onto its own copy under the header's update rule.

use std::io::Write;

use diffuse_core::{Iteration, Simulation, SimulationState, UpdateMechanism};

use crate::codec::{encode_frame, encode_header, encode_state};
use crate::error::BackupError;
use crate::hash::state_hash;
use crate::types::{Frame, Header};

/// Writes a simulation backup to a byte stream.
///
/// Generic over `W: Write` so tests can use `Vec<u8>` and production
/// code can use `BufWriter<File>`.
pub struct BackupWriter<W: Write> {
    writer: W,
    state: SimulationState,
    update: Box<dyn UpdateMechanism>,
    frames_written: u64,
}

impl<W: Write> BackupWriter<W> {
    /// Create a writer, immediately writing the header and `initial`.
    pub fn new(mut writer: W, header: &Header, initial: &SimulationState) -> Result<Self, BackupError> {
        if initial.user_count() != header.user_count as usize {
            return Err(BackupError::DataMismatch {
                what: "users",
                recorded: header.user_count,
                current: initial.user_count() as u32,
            });
        }
        encode_header(&mut writer, header)?;
        encode_state(&mut writer, initial)?;
        Ok(Self {
            writer,
            state: initial.clone(),
            update: header.update.build(),
            frames_written: 0,
        })
    }

    /// Append the iteration following the last one written.
    pub fn write_iteration(&mut self, iteration: &Iteration) -> Result<(), BackupError> {
        let previous = self.state.iteration();
        if iteration.number != previous + 1 {
            return Err(BackupError::OutOfOrder {
                previous,
                found: iteration.number,
            });
        }
        let mut next = self.state.clone();
        next.apply_with(iteration, self.update.as_ref())?;
        let frame = Frame {
            iteration: iteration.clone(),
            state_hash: state_hash(&next),
        };
        encode_frame(&mut self.writer, &frame)?;
        self.state = next;
        self.frames_written += 1;
        Ok(())
    }

    /// Append every iteration of `simulation` past the last one written.
    ///
    /// Lets a long-lived writer follow a growing log.
    pub fn write_new_iterations(&mut self, simulation: &Simulation) -> Result<(), BackupError> {
        let done = self.state.iteration();
        for it in simulation.iterations().iter().filter(|it| it.number > done) {
            self.write_iteration(it)?;
        }
        Ok(())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<(), BackupError> {
        self.writer.flush()?;
        Ok(())
    }

    /// State after the last written iteration.
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Number of frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Consume the writer and return the underlying `Write` sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Write a whole simulation log to `writer`.
///
/// # Examples
///
/// ```
/// use diffuse_backup::{write_simulation, BackupReader, Header};
/// use diffuse_core::{Simulation, SimulationState, UserState, UserId};
///
/// let initial = SimulationState::from_users(vec![UserState::new(UserId(0))], 0, None);
/// let sim = Simulation::new(initial);
/// let header = Header { user_count: 1, ..Header::default() };
///
/// let buf = write_simulation(Vec::new(), &header, &sim).unwrap();
/// let back = BackupReader::open(buf.as_slice()).unwrap().read_simulation().unwrap();
/// assert_eq!(back.initial(), sim.initial());
/// ```
pub fn write_simulation<W: Write>(
    writer: W,
    header: &Header,
    simulation: &Simulation,
) -> Result<W, BackupError> {
    let mut w = BackupWriter::new(writer, header, simulation.initial())?;
    for it in simulation.iterations() {
        w.write_iteration(it)?;
    }
    w.flush()?;
    Ok(w.into_inner())
}
