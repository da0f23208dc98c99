//! JSON snapshot file for a file-backed [`InMemoryLedger`](super::InMemoryLedger).
//!
//! Values are opaque bytes and are stored base64-encoded. The file is rewritten in full after
//! every committed block, via a temporary file and a rename so a crash never leaves a torn file.

use super::{LedgerState, Version, VersionedValue, WorldState};
use crate::constants::SNAPSHOT_FORMAT_VERSION as SNAPSHOT_FORMAT;
use crate::store::{StoreError, StoreResult};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    format: u32,
    height: u64,
    namespaces: BTreeMap<String, BTreeMap<String, SnapshotEntry>>,
}

#[derive(Serialize, Deserialize)]
struct SnapshotEntry {
    value: String,
    block_num: u64,
    tx_num: u32,
}

pub(super) fn read(path: &Path) -> StoreResult<LedgerState> {
    let raw = fs::read(path).map_err(StoreError::SnapshotRead)?;
    let file: SnapshotFile =
        serde_json::from_slice(&raw).map_err(|e| StoreError::SnapshotFormat(e.to_string()))?;

    if file.format != SNAPSHOT_FORMAT {
        return Err(StoreError::SnapshotFormat(format!(
            "unsupported snapshot format {} (expected {SNAPSHOT_FORMAT})",
            file.format
        )));
    }

    let mut world = WorldState::default();
    for (namespace, entries) in file.namespaces {
        for (key, entry) in entries {
            let value = STANDARD.decode(&entry.value).map_err(|e| {
                StoreError::SnapshotFormat(format!("value of {namespace}/{key}: {e}"))
            })?;
            world.insert(
                &namespace,
                key,
                VersionedValue {
                    value,
                    version: Version {
                        block_num: entry.block_num,
                        tx_num: entry.tx_num,
                    },
                },
            );
        }
    }

    Ok(LedgerState {
        world: Arc::new(world),
        height: file.height,
    })
}

pub(super) fn write(path: &Path, state: &LedgerState) -> StoreResult<()> {
    let namespaces = state
        .world
        .iter()
        .map(|(namespace, entries)| {
            let entries = entries
                .iter()
                .map(|(key, entry)| {
                    (
                        key.clone(),
                        SnapshotEntry {
                            value: STANDARD.encode(&entry.value),
                            block_num: entry.version.block_num,
                            tx_num: entry.version.tx_num,
                        },
                    )
                })
                .collect();
            (namespace.clone(), entries)
        })
        .collect();

    let file = SnapshotFile {
        format: SNAPSHOT_FORMAT,
        height: state.height,
        namespaces,
    };
    let raw =
        serde_json::to_vec_pretty(&file).map_err(|e| StoreError::SnapshotFormat(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(StoreError::SnapshotWrite)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, raw).map_err(StoreError::SnapshotWrite)?;
    fs::rename(&tmp, path).map_err(StoreError::SnapshotWrite)?;

    Ok(())
}
