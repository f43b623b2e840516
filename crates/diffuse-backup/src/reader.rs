//! Backup playback reader.
//!
//! [`BackupReader`] reads the header and initial state on construction,
//! then replays frames one by one under the recorded update rule,
//! verifying each recorded state hash.

use std::io::Read;

use diffuse_core::{DiffusionData, Simulation, SimulationState, UpdateMechanism};
use diffuse_engine::SimulationConfig;

use crate::codec::{decode_frame, decode_header, decode_state};
use crate::error::BackupError;
use crate::hash::{config_hash, state_hash};
use crate::types::{Frame, Header};

/// Reads a simulation backup from a byte stream.
pub struct BackupReader<R: Read> {
    reader: R,
    header: Header,
    initial: SimulationState,
    state: SimulationState,
    update: Box<dyn UpdateMechanism>,
    frames_read: u64,
}

impl<R: Read> BackupReader<R> {
    /// Open a backup stream, reading and validating the header and the
    /// initial state.
    pub fn open(mut reader: R) -> Result<Self, BackupError> {
        let header = decode_header(&mut reader)?;
        let initial = decode_state(&mut reader)?;
        if initial.user_count() != header.user_count as usize {
            return Err(BackupError::malformed(format!(
                "header declares {} users but the initial state holds {}",
                header.user_count,
                initial.user_count()
            )));
        }
        Ok(Self {
            reader,
            update: header.update.build(),
            header,
            state: initial.clone(),
            initial,
            frames_read: 0,
        })
    }

    /// Header of the backup.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// State the recorded run started from.
    pub fn initial(&self) -> &SimulationState {
        &self.initial
    }

    /// State after the frames read so far.
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Number of frames read so far.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Check that the backup was recorded on data of the same shape.
    pub fn check_data(&self, data: &dyn DiffusionData) -> Result<(), BackupError> {
        let checks = [
            ("users", self.header.user_count, data.user_count()),
            ("pieces", self.header.piece_count, data.piece_count()),
        ];
        for (what, recorded, current) in checks {
            if recorded as usize != current {
                return Err(BackupError::DataMismatch {
                    what,
                    recorded,
                    current: current as u32,
                });
            }
        }
        Ok(())
    }

    /// Check that the backup was recorded with `config`.
    pub fn check_config(&self, config: &SimulationConfig) -> Result<(), BackupError> {
        let current = config_hash(config);
        if current != self.header.config_hash {
            return Err(BackupError::ConfigMismatch {
                recorded: self.header.config_hash,
                current,
            });
        }
        Ok(())
    }

    /// Read, replay and verify the next frame, or `None` at the end of
    /// the stream.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, BackupError> {
        let Some(frame) = decode_frame(&mut self.reader)? else {
            return Ok(None);
        };
        let expected = self.state.iteration() + 1;
        if frame.iteration.number != expected {
            return Err(BackupError::OutOfOrder {
                previous: self.state.iteration(),
                found: frame.iteration.number,
            });
        }
        let mut next = self.state.clone();
        next.apply_with(&frame.iteration, self.update.as_ref())?;
        let replayed = state_hash(&next);
        if replayed != frame.state_hash {
            return Err(BackupError::StateMismatch {
                iteration: frame.iteration.number,
                recorded: frame.state_hash,
                replayed,
            });
        }
        self.state = next;
        self.frames_read += 1;
        Ok(Some(frame))
    }

    /// Rebuild the whole log.
    pub fn read_simulation(self) -> Result<Simulation, BackupError> {
        self.read_at_most(usize::MAX)
    }

    /// Rebuild the first `k` iterations of the log.
    ///
    /// # Errors
    ///
    /// [`BackupError::Truncated`] if the backup holds fewer than `k`
    /// iterations.
    pub fn read_prefix(self, k: usize) -> Result<Simulation, BackupError> {
        let sim = self.read_at_most(k)?;
        if sim.len() < k {
            return Err(BackupError::Truncated {
                requested: k,
                available: sim.len(),
            });
        }
        Ok(sim)
    }

    fn read_at_most(mut self, k: usize) -> Result<Simulation, BackupError> {
        let mut sim = Simulation::new(self.initial.clone());
        while sim.len() < k {
            match self.next_frame()? {
                Some(frame) => sim.push(frame.iteration)?,
                None => break,
            }
        }
        tracing::debug!(
            iterations = sim.len(),
            users = self.header.user_count,
            "backup read"
        );
        Ok(sim)
    }

    /// Convert into a frame iterator.
    pub fn frames(self) -> FrameIter<R> {
        FrameIter {
            inner: self,
            done: false,
        }
    }
}

/// Iterator adapter over verified backup frames.
pub struct FrameIter<R: Read> {
    inner: BackupReader<R>,
    done: bool,
}

impl<R: Read> FrameIter<R> {
    /// State after the frames yielded so far.
    pub fn state(&self) -> &SimulationState {
        self.inner.state()
    }
}

impl<R: Read> Iterator for FrameIter<R> {
    type Item = Result<Frame, BackupError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.inner.next_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_frame;
    use crate::writer::{write_simulation, BackupWriter};
    use diffuse_core::{Iteration, PieceId, Reception, UserDelta, UserId};
    use diffuse_engine::UpdateSpec;
    use diffuse_test_utils::chain;

    /// Two iterations on a 3-chain: the piece moves one hop each time.
    fn two_hops() -> (Header, Simulation) {
        let data = chain(3);
        let initial = SimulationState::initialize(&data).unwrap();
        let mut sim = Simulation::new(initial);
        for k in 0..2u32 {
            let mut it = Iteration::new(k + 1, None);
            it.deltas.insert(
                UserId(k),
                UserDelta {
                    propagated: vec![PieceId(0)],
                    ..UserDelta::default()
                },
            );
            it.deltas.insert(
                UserId(k + 1),
                UserDelta {
                    received: vec![Reception {
                        piece: PieceId(0),
                        sender: UserId(k),
                    }],
                    seen: vec![PieceId(0)],
                    ..UserDelta::default()
                },
            );
            sim.push(it).unwrap();
        }
        let header = Header::for_data(&data, 7, 0);
        (header, sim)
    }

    #[test]
    fn roundtrip_write_read() {
        let (header, sim) = two_hops();
        let buf = write_simulation(Vec::new(), &header, &sim).unwrap();
        let reader = BackupReader::open(buf.as_slice()).unwrap();
        assert_eq!(reader.header(), &header);
        assert_eq!(reader.initial(), sim.initial());
        let back = reader.read_simulation().unwrap();
        assert_eq!(back.iterations(), sim.iterations());
        assert_eq!(back.final_state().unwrap(), sim.final_state().unwrap());
    }

    #[test]
    fn replay_follows_the_recorded_update_rule() {
        let (header, mut sim) = two_hops();
        // User 1 gets the piece again, from user 2, while it is still seen.
        sim = sim.prefix(1).unwrap();
        let mut again = Iteration::new(2, None);
        again.deltas.insert(
            UserId(1),
            UserDelta {
                received: vec![Reception {
                    piece: PieceId(0),
                    sender: UserId(2),
                }],
                ..UserDelta::default()
            },
        );
        sim.push(again).unwrap();
        let header = header.with_update(UpdateSpec::Newest);
        let newest = diffuse_core::NewestUpdate;

        let mut buf = write_simulation(Vec::new(), &header, &sim).unwrap();
        let reader = BackupReader::open(buf.as_slice()).unwrap();
        assert_eq!(reader.header().update, UpdateSpec::Newest);
        let back = reader.read_simulation().unwrap();
        assert_eq!(
            back.final_state_with(&newest).unwrap(),
            sim.final_state_with(&newest).unwrap()
        );
        assert_ne!(
            sim.final_state_with(&newest).unwrap(),
            sim.final_state().unwrap()
        );

        // The rule tag is the last header byte, right before the state.
        buf[4 + 1 + 4 + 4 + 8 + 8] = 0;
        let err = BackupReader::open(buf.as_slice())
            .unwrap()
            .read_simulation()
            .unwrap_err();
        assert!(matches!(err, BackupError::StateMismatch { iteration: 2, .. }));
    }

    #[test]
    fn frame_iterator_tracks_state() {
        let (header, sim) = two_hops();
        let buf = write_simulation(Vec::new(), &header, &sim).unwrap();
        let mut frames = BackupReader::open(buf.as_slice()).unwrap().frames();
        let first = frames.next().unwrap().unwrap();
        assert_eq!(first.iteration.number, 1);
        assert_eq!(*frames.state(), sim.state_at(1).unwrap());
        assert_eq!(frames.by_ref().count(), 1);
        assert!(frames.next().is_none());
    }

    #[test]
    fn truncated_stream_errors() {
        let (header, sim) = two_hops();
        let mut buf = write_simulation(Vec::new(), &header, &sim).unwrap();
        buf.truncate(buf.len() - 4);
        let mut reader = BackupReader::open(buf.as_slice()).unwrap();
        assert!(reader.next_frame().unwrap().is_some());
        assert!(matches!(
            reader.next_frame(),
            Err(BackupError::MalformedFrame { .. })
        ));
    }

    #[test]
    fn tampered_hash_is_detected() {
        let (header, sim) = two_hops();
        let mut buf = Vec::new();
        {
            let mut w = BackupWriter::new(&mut buf, &header, sim.initial()).unwrap();
            w.write_iteration(&sim.iterations()[0]).unwrap();
        }
        encode_frame(
            &mut buf,
            &Frame {
                iteration: sim.iterations()[1].clone(),
                state_hash: 0xDEAD,
            },
        )
        .unwrap();
        let err = BackupReader::open(buf.as_slice())
            .unwrap()
            .read_simulation()
            .unwrap_err();
        assert!(matches!(
            err,
            BackupError::StateMismatch {
                iteration: 2,
                recorded: 0xDEAD,
                ..
            }
        ));
    }

    #[test]
    fn writer_refuses_gaps() {
        let (header, sim) = two_hops();
        let mut w = BackupWriter::new(Vec::new(), &header, sim.initial()).unwrap();
        let err = w.write_iteration(&sim.iterations()[1]).unwrap_err();
        assert!(matches!(
            err,
            BackupError::OutOfOrder {
                previous: 0,
                found: 2
            }
        ));
        assert_eq!(w.frames_written(), 0);
    }

    #[test]
    fn prefix_longer_than_backup_is_truncated() {
        let (header, sim) = two_hops();
        let buf = write_simulation(Vec::new(), &header, &sim).unwrap();
        let err = BackupReader::open(buf.as_slice())
            .unwrap()
            .read_prefix(3)
            .unwrap_err();
        assert!(matches!(
            err,
            BackupError::Truncated {
                requested: 3,
                available: 2
            }
        ));
    }

    #[test]
    fn data_shape_is_checked() {
        let (header, sim) = two_hops();
        let buf = write_simulation(Vec::new(), &header, &sim).unwrap();
        let reader = BackupReader::open(buf.as_slice()).unwrap();
        assert!(reader.check_data(&chain(3)).is_ok());
        assert!(matches!(
            reader.check_data(&chain(4)),
            Err(BackupError::DataMismatch { what: "users", .. })
        ));
    }

    #[test]
    fn bad_magic_on_open() {
        let data = b"DIFX\x01rest of data";
        let result = BackupReader::open(data.as_slice());
        assert!(matches!(result, Err(BackupError::InvalidMagic)));
    }
}
