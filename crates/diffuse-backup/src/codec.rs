//! Binary encode/decode for the backup format.
//!
//! All integers are little-endian. Lists are prefixed with a `u32` count.
//! Optional values carry a one-byte presence flag. No compression, no
//! alignment padding, no self-describing schema.

use std::io::{Read, Write};

use diffuse_core::{
    Arrival, InfoSet, Iteration, PieceId, PropagatedInformation, Reception, SimulationState,
    UserDelta, UserId, UserState,
};
use diffuse_engine::UpdateSpec;
use indexmap::IndexMap;

use crate::error::BackupError;
use crate::types::{Frame, Header};
use crate::{FORMAT_VERSION, MAGIC};

// ── Primitive writers ───────────────────────────────────────────

/// Write a single byte.
pub fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), BackupError> {
    w.write_all(&[v])?;
    Ok(())
}

/// Write a little-endian u32.
pub fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), BackupError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian u64.
pub fn write_u64_le(w: &mut dyn Write, v: u64) -> Result<(), BackupError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian i64.
pub fn write_i64_le(w: &mut dyn Write, v: i64) -> Result<(), BackupError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write an optional timestamp (presence flag + i64).
pub fn write_timestamp(w: &mut dyn Write, ts: Option<i64>) -> Result<(), BackupError> {
    match ts {
        Some(t) => {
            write_u8(w, 1)?;
            write_i64_le(w, t)
        }
        None => write_u8(w, 0),
    }
}

fn write_len(w: &mut dyn Write, len: usize) -> Result<(), BackupError> {
    let len = u32::try_from(len)
        .map_err(|_| BackupError::malformed(format!("list of {len} entries exceeds u32::MAX")))?;
    write_u32_le(w, len)
}

fn write_pieces(w: &mut dyn Write, pieces: &[PieceId]) -> Result<(), BackupError> {
    write_len(w, pieces.len())?;
    for p in pieces {
        write_u32_le(w, p.0)?;
    }
    Ok(())
}

fn write_info(w: &mut dyn Write, info: &PropagatedInformation) -> Result<(), BackupError> {
    write_u32_le(w, info.piece.0)?;
    write_u32_le(w, info.iteration)?;
    write_u32_le(w, info.origin.0)
}

fn write_info_set(w: &mut dyn Write, set: &InfoSet) -> Result<(), BackupError> {
    write_len(w, set.len())?;
    for info in set.iter() {
        write_info(w, info)?;
    }
    Ok(())
}

// ── Primitive readers ───────────────────────────────────────────

/// Read a single byte.
pub fn read_u8(r: &mut dyn Read) -> Result<u8, BackupError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Read a little-endian u32.
pub fn read_u32_le(r: &mut dyn Read) -> Result<u32, BackupError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Read a little-endian u64.
pub fn read_u64_le(r: &mut dyn Read) -> Result<u64, BackupError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Read a little-endian i64.
pub fn read_i64_le(r: &mut dyn Read) -> Result<i64, BackupError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

/// Read an optional timestamp.
pub fn read_timestamp(r: &mut dyn Read) -> Result<Option<i64>, BackupError> {
    match read_u8(r)? {
        0 => Ok(None),
        1 => Ok(Some(read_i64_le(r)?)),
        flag => Err(BackupError::malformed(format!(
            "invalid timestamp presence flag: {flag}"
        ))),
    }
}

fn read_pieces(r: &mut dyn Read) -> Result<Vec<PieceId>, BackupError> {
    let len = read_u32_le(r)? as usize;
    let mut out = Vec::with_capacity(len.min(4096));
    for _ in 0..len {
        out.push(PieceId(read_u32_le(r)?));
    }
    Ok(out)
}

fn read_info(r: &mut dyn Read) -> Result<PropagatedInformation, BackupError> {
    let piece = PieceId(read_u32_le(r)?);
    let iteration = read_u32_le(r)?;
    let origin = UserId(read_u32_le(r)?);
    Ok(PropagatedInformation::new(piece, iteration, origin))
}

fn read_info_set(r: &mut dyn Read) -> Result<InfoSet, BackupError> {
    let len = read_u32_le(r)? as usize;
    let mut set = InfoSet::new();
    for _ in 0..len {
        let info = read_info(r)?;
        if !set.insert(info) {
            return Err(BackupError::malformed(format!(
                "piece {} listed twice in one pool",
                info.piece
            )));
        }
    }
    Ok(set)
}

// ── Header encode/decode ────────────────────────────────────────

/// Encode the file header (magic, version, run parameters).
pub fn encode_header(w: &mut dyn Write, header: &Header) -> Result<(), BackupError> {
    w.write_all(&MAGIC)?;
    write_u8(w, FORMAT_VERSION)?;
    write_u32_le(w, header.user_count)?;
    write_u32_le(w, header.piece_count)?;
    write_u64_le(w, header.seed)?;
    write_u64_le(w, header.config_hash)?;
    write_u8(w, update_tag(header.update))?;
    Ok(())
}

/// Decode and validate the file header.
pub fn decode_header(r: &mut dyn Read) -> Result<Header, BackupError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(BackupError::InvalidMagic);
    }
    let version = read_u8(r)?;
    if version != FORMAT_VERSION {
        return Err(BackupError::UnsupportedVersion { found: version });
    }
    Ok(Header {
        user_count: read_u32_le(r)?,
        piece_count: read_u32_le(r)?,
        seed: read_u64_le(r)?,
        config_hash: read_u64_le(r)?,
        update: update_from_tag(read_u8(r)?)?,
    })
}

fn update_tag(update: UpdateSpec) -> u8 {
    match update {
        UpdateSpec::Older => 0,
        UpdateSpec::Newest => 1,
        UpdateSpec::NoReentry => 2,
    }
}

fn update_from_tag(tag: u8) -> Result<UpdateSpec, BackupError> {
    match tag {
        0 => Ok(UpdateSpec::Older),
        1 => Ok(UpdateSpec::Newest),
        2 => Ok(UpdateSpec::NoReentry),
        other => Err(BackupError::malformed(format!("unknown update rule tag {other}"))),
    }
}

// ── State encode/decode ─────────────────────────────────────────

/// Encode a full boundary state.
///
/// Per user: own, inbox (first provenance + senders), seen, propagated,
/// discarded, first-arrival stamps. Users are written in index order.
pub fn encode_state(w: &mut dyn Write, state: &SimulationState) -> Result<(), BackupError> {
    write_u32_le(w, state.iteration())?;
    write_timestamp(w, state.timestamp())?;
    write_len(w, state.user_count())?;
    for user in state.users() {
        write_info_set(w, user.own())?;
        write_len(w, user.inbox().len())?;
        for arrival in user.inbox().values() {
            write_info(w, &arrival.info)?;
            write_len(w, arrival.senders.len())?;
            for s in &arrival.senders {
                write_u32_le(w, s.0)?;
            }
        }
        write_info_set(w, user.seen())?;
        write_info_set(w, user.propagated())?;
        write_info_set(w, user.discarded())?;
        write_len(w, user.first_received_map().len())?;
        for (piece, iteration) in user.first_received_map() {
            write_u32_le(w, piece.0)?;
            write_u32_le(w, *iteration)?;
        }
    }
    Ok(())
}

/// Decode a full boundary state.
pub fn decode_state(r: &mut dyn Read) -> Result<SimulationState, BackupError> {
    let iteration = read_u32_le(r)?;
    let timestamp = read_timestamp(r)?;
    let user_count = read_u32_le(r)? as usize;
    let mut users = Vec::with_capacity(user_count.min(1 << 16));
    for idx in 0..user_count {
        let user = UserId(idx as u32);
        let own = read_info_set(r)?;

        let inbox_len = read_u32_le(r)? as usize;
        let mut inbox = IndexMap::with_capacity(inbox_len.min(4096));
        for _ in 0..inbox_len {
            let info = read_info(r)?;
            let sender_count = read_u32_le(r)? as usize;
            if sender_count == 0 {
                return Err(BackupError::malformed(format!(
                    "user {user}: inbox entry {} has no sender",
                    info.piece
                )));
            }
            let senders = (0..sender_count)
                .map(|_| read_u32_le(r).map(UserId))
                .collect::<Result<_, _>>()?;
            inbox.insert(info.piece, Arrival { info, senders });
        }

        let seen = read_info_set(r)?;
        let propagated = read_info_set(r)?;
        let discarded = read_info_set(r)?;

        let stamps = read_u32_le(r)? as usize;
        let mut first_received = IndexMap::with_capacity(stamps.min(4096));
        for _ in 0..stamps {
            let piece = PieceId(read_u32_le(r)?);
            first_received.insert(piece, read_u32_le(r)?);
        }

        users.push(UserState::from_parts(
            user,
            own,
            inbox,
            seen,
            propagated,
            discarded,
            first_received,
        ));
    }
    Ok(SimulationState::from_users(users, iteration, timestamp))
}

// ── Frame encode/decode ─────────────────────────────────────────

/// Encode a single iteration frame.
pub fn encode_frame(w: &mut dyn Write, frame: &Frame) -> Result<(), BackupError> {
    let it = &frame.iteration;
    write_u32_le(w, it.number)?;
    write_timestamp(w, it.timestamp)?;
    write_len(w, it.deltas.len())?;
    for (user, delta) in &it.deltas {
        write_u32_le(w, user.0)?;
        write_len(w, delta.received.len())?;
        for rec in &delta.received {
            write_u32_le(w, rec.piece.0)?;
            write_u32_le(w, rec.sender.0)?;
        }
        write_pieces(w, &delta.rereceived)?;
        write_pieces(w, &delta.seen)?;
        write_pieces(w, &delta.discarded)?;
        write_pieces(w, &delta.propagated)?;
    }
    write_u64_le(w, frame.state_hash)?;
    Ok(())
}

/// Decode a single iteration frame.
///
/// Returns `Ok(None)` on clean EOF (no bytes available), `Ok(Some(frame))`
/// on success, or an error on truncated/corrupt data.
pub fn decode_frame(r: &mut dyn Read) -> Result<Option<Frame>, BackupError> {
    // Byte-by-byte so that zero bytes (clean EOF) and 1-3 bytes
    // (truncation) can be told apart.
    let mut number_buf = [0u8; 4];
    let mut filled = 0;
    while filled < 4 {
        match r.read(&mut number_buf[filled..]) {
            Ok(0) => {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(BackupError::malformed(format!(
                    "truncated frame header: got {filled} of 4 bytes for the iteration number"
                )));
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(BackupError::Io(e)),
        }
    }
    let number = u32::from_le_bytes(number_buf);

    match decode_frame_body(r, number) {
        Ok(frame) => Ok(Some(frame)),
        Err(BackupError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(
            BackupError::malformed(format!("iteration {number}: truncated frame body")),
        ),
        Err(e) => Err(e),
    }
}

fn decode_frame_body(r: &mut dyn Read, number: u32) -> Result<Frame, BackupError> {
    let timestamp = read_timestamp(r)?;
    let delta_count = read_u32_le(r)? as usize;
    let mut iteration = Iteration::new(number, timestamp);
    let mut previous: Option<UserId> = None;
    for _ in 0..delta_count {
        let user = UserId(read_u32_le(r)?);
        if previous.is_some_and(|p| p >= user) {
            return Err(BackupError::malformed(format!(
                "iteration {number}: deltas out of user order at {user}"
            )));
        }
        previous = Some(user);
        let received_count = read_u32_le(r)? as usize;
        let mut received = Vec::with_capacity(received_count.min(4096));
        for _ in 0..received_count {
            let piece = PieceId(read_u32_le(r)?);
            let sender = UserId(read_u32_le(r)?);
            received.push(Reception { piece, sender });
        }
        let delta = UserDelta {
            received,
            rereceived: read_pieces(r)?,
            seen: read_pieces(r)?,
            discarded: read_pieces(r)?,
            propagated: read_pieces(r)?,
        };
        iteration.deltas.insert(user, delta);
    }
    let state_hash = read_u64_le(r)?;
    Ok(Frame {
        iteration,
        state_hash,
    })
}
