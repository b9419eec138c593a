use rmp_serde::{decode, encode};
use thiserror::Error;

use crate::{Command, LogEntry, Snapshot};

#[derive(Debug, Error)]
pub enum WireError {
    #[error("encode error: {0}")]
    Encode(#[from] encode::Error),
    #[error("decode error: {0}")]
    Decode(#[from] decode::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn serialize_command(cmd: &Command) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec(cmd)?)
}

pub fn deserialize_command(bytes: &[u8]) -> Result<Command, WireError> {
    Ok(decode::from_slice(bytes)?)
}

pub fn serialize_snapshot(snapshot: &Snapshot) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec(snapshot)?)
}

pub fn deserialize_snapshot(bytes: &[u8]) -> Result<Snapshot, WireError> {
    Ok(decode::from_slice(bytes)?)
}

pub fn serialize_logs(logs: &[LogEntry]) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec(logs)?)
}

pub fn deserialize_logs(bytes: &[u8]) -> Result<Vec<LogEntry>, WireError> {
    Ok(decode::from_slice(bytes)?)
}

/// Deterministic snapshot hash for desync detection.
///
/// Hashes the MessagePack-serialized snapshot using FNV-1a 64-bit.
pub fn snapshot_hash(snapshot: &Snapshot) -> Result<u64, WireError> {
    let bytes = serialize_snapshot(snapshot)?;
    Ok(hash_bytes_fnv1a64(&bytes))
}

/// Deterministic, stable 64-bit hash for raw bytes (FNV-1a).
pub fn hash_bytes_fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    let mut hash = OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

pub fn serialize_command_json(cmd: &Command) -> Result<String, WireError> {
    Ok(serde_json::to_string(cmd)?)
}

pub fn deserialize_command_json(json: &str) -> Result<Command, WireError> {
    Ok(serde_json::from_str(json)?)
}

pub fn serialize_snapshot_json(snapshot: &Snapshot) -> Result<String, WireError> {
    Ok(serde_json::to_string(snapshot)?)
}

pub fn deserialize_snapshot_json(json: &str) -> Result<Snapshot, WireError> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Coord, GridSnapshot, Phase, PlayerId};

    fn empty_snapshot() -> Snapshot {
        Snapshot {
            grid: GridSnapshot {
                size: 15,
                cells: vec![Default::default(); 15 * 15],
            },
            players: Vec::new(),
            current_idx: 0,
            turn: 1,
            phase: Phase::Setup,
            logs: Vec::new(),
            pending: None,
            rng_state: [0; 32],
            result: None,
        }
    }

    #[test]
    fn command_roundtrip() {
        let cmd = Command::PlaceCapital {
            at: Coord::new(7, 7),
        };
        let bytes = serialize_command(&cmd).unwrap();
        assert_eq!(deserialize_command(&bytes).unwrap(), cmd);

        let json = serialize_command_json(&cmd).unwrap();
        assert_eq!(deserialize_command_json(&json).unwrap(), cmd);
    }

    #[test]
    fn snapshot_roundtrip() {
        let snap = empty_snapshot();
        let bytes = serialize_snapshot(&snap).unwrap();
        assert_eq!(deserialize_snapshot(&bytes).unwrap(), snap);
    }

    #[test]
    fn snapshot_hash_is_stable() {
        let snap = empty_snapshot();
        let h1 = snapshot_hash(&snap).unwrap();
        let h2 = snapshot_hash(&snap).unwrap();
        assert_eq!(h1, h2);

        let mut changed = snap;
        changed.turn = 2;
        assert_ne!(h1, snapshot_hash(&changed).unwrap());
    }

    #[test]
    fn fnv1a_known_values() {
        // FNV-1a reference vectors.
        assert_eq!(hash_bytes_fnv1a64(b""), 0xcbf29ce484222325);
        assert_eq!(hash_bytes_fnv1a64(b"a"), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn hash_detects_player_change() {
        let mut snap = empty_snapshot();
        let base = snapshot_hash(&snap).unwrap();
        snap.players.push(crate::CivSnapshot {
            id: PlayerId(0),
            name: "Alice".into(),
            color: "#e74c3c".into(),
            capital: None,
            capital_level: 1,
            capital_upgrade: None,
            colonies: Vec::new(),
            territory: Vec::new(),
            original_territories: Vec::new(),
            war_with: Vec::new(),
            truce_with: Vec::new(),
            truce_turns: Vec::new(),
            truce_proposals: Vec::new(),
            eliminated: false,
        });
        assert_ne!(base, snapshot_hash(&snap).unwrap());
    }
}
