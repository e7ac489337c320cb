//! Submap records and `.map` file emission.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::coords::SUBMAP_SIZE;
use crate::save::{self, SaveError, SAVE_VERSION};
use crate::terrain::TerrainRun;

/// Tiles in one submap.
pub const TILES_PER_SUBMAP: usize = (SUBMAP_SIZE * SUBMAP_SIZE) as usize;

/// Submap-index slots of a map file, in the order records are persisted.
/// The file is a plain array with no index tagging, so this order is part
/// of the format.
pub const SUBMAP_SLOTS: [[i32; 2]; 4] = [[0, 0], [0, 1], [1, 0], [1, 1]];

/// One persisted submap record. Field order matches the key order the game
/// writes, so serialized output diffs cleanly against game-written files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submap {
    pub version: u32,
    /// Submap coordinate (map-file units doubled plus the slot index) and
    /// a fixed 0 vertical level.
    pub coordinates: [i32; 3],
    pub turn_last_touched: u64,
    pub temperature: i32,
    pub terrain: Vec<TerrainRun>,
    /// Flat run-length pairs; a fresh submap is all zero.
    pub radiation: Vec<u32>,
    pub furniture: Vec<serde_json::Value>,
    pub items: Vec<serde_json::Value>,
    pub traps: Vec<serde_json::Value>,
    pub fields: Vec<serde_json::Value>,
    pub cosmetics: Vec<serde_json::Value>,
    pub spawns: Vec<serde_json::Value>,
    pub vehicles: Vec<serde_json::Value>,
    pub partial_constructions: Vec<serde_json::Value>,
}

impl Submap {
    /// Fresh record for the submap at `submap_idx` of `map_file` holding
    /// already-encoded terrain. Every call builds an independent value;
    /// records are never shared or mutated after construction.
    pub fn new(map_file: [i32; 2], submap_idx: [i32; 2], terrain: Vec<TerrainRun>) -> Self {
        Self {
            version: SAVE_VERSION,
            coordinates: [
                map_file[0] * 2 + submap_idx[0],
                map_file[1] * 2 + submap_idx[1],
                0,
            ],
            turn_last_touched: 1,
            temperature: 0,
            terrain,
            radiation: vec![0, TILES_PER_SUBMAP as u32],
            furniture: Vec::new(),
            items: Vec::new(),
            traps: Vec::new(),
            fields: Vec::new(),
            cosmetics: Vec::new(),
            spawns: Vec::new(),
            vehicles: Vec::new(),
            partial_constructions: Vec::new(),
        }
    }
}

/// Directory name for a segment, e.g. `4.0.0`.
pub fn segment_dir_name(segment: [i32; 2]) -> String {
    format!("{}.{}.0", segment[0], segment[1])
}

/// File name for a map file, e.g. `128.24.0.map`.
pub fn map_file_name(map_file: [i32; 2]) -> String {
    format!("{}.{}.0.map", map_file[0], map_file[1])
}

/// Write the 4-record array for `map_file` into `segment_dir`. Map files
/// carry no version header.
pub fn write_map_file(
    segment_dir: &Path,
    map_file: [i32; 2],
    submaps: &[Submap; 4],
) -> Result<(), SaveError> {
    save::write_json_file(&segment_dir.join(map_file_name(map_file)), submaps, None)
}
