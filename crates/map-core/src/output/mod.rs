//! Output Generation
//!
//! Periodic scene snapshots and the static world dump, written as JSON.

use std::fs;
use std::path::{Path, PathBuf};

use map_events::{SceneSnapshot, WorldData};

/// Decides when snapshots are due and hands out their sequence numbers.
#[derive(Debug, Clone)]
pub struct SnapshotGenerator {
    next_sequence: u64,
    snapshot_interval: u64,
}

impl SnapshotGenerator {
    pub fn new(snapshot_interval: u64) -> Self {
        Self {
            next_sequence: 1,
            snapshot_interval,
        }
    }

    /// Tick 0 always snapshots; an interval of 0 disables the periodic ones.
    pub fn should_snapshot(&self, current_tick: u64) -> bool {
        current_tick == 0
            || (self.snapshot_interval > 0 && current_tick % self.snapshot_interval == 0)
    }

    pub fn next_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    pub fn snapshot_count(&self) -> u64 {
        self.next_sequence - 1
    }
}

pub fn write_snapshot(snapshot: &SceneSnapshot, path: impl AsRef<Path>) -> std::io::Result<()> {
    let json = snapshot.to_json().map_err(std::io::Error::other)?;
    fs::write(path, json)
}

/// Writes `<dir>/snapshots/<snapshot_id>.json` and returns the path.
pub fn write_snapshot_to_dir(
    snapshot: &SceneSnapshot,
    dir: impl AsRef<Path>,
) -> std::io::Result<PathBuf> {
    let snapshots = dir.as_ref().join("snapshots");
    fs::create_dir_all(&snapshots)?;
    let path = snapshots.join(format!("{}.json", snapshot.snapshot_id));
    write_snapshot(snapshot, &path)?;
    Ok(path)
}

/// Writes `<dir>/world.json`.
pub fn write_world(world: &WorldData, dir: impl AsRef<Path>) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir.as_ref())?;
    let path = dir.as_ref().join("world.json");
    let json = world.to_json().map_err(std::io::Error::other)?;
    fs::write(&path, json)?;
    Ok(path)
}
