//! Reader/writer for the Cataclysm: DDA save map tree.
//!
//! Terrain lives in four nested units:
//!
//! - submap: 12x12 tiles, the smallest persisted block
//! - map file: 2x2 submaps (24x24 tiles), one `.map` file on disk
//! - segment: 32x32 map files (768x768 tiles), one directory on disk
//! - world: unbounded grid of segments, negative coordinates allowed
//!
//! On-disk layout inside a save directory:
//!
//! ```text
//! save/<name>/
//!   <id>.sav            main save, "# version 33" header + JSON
//!   <id>.seen.0.0       per-overmap seen state, header + JSON
//!   <id>.mm             map memory, JSON only
//!   o.0.0               overmap layers, header + JSON
//!   maps/
//!     <sx>.<sy>.0/              one directory per segment
//!       <fx>.<fy>.0.map         JSON array of exactly 4 submap records,
//!                               submap index order (0,0) (0,1) (1,0) (1,1),
//!                               no header line
//! ```
//!
//! Map-file coordinates `<fx>.<fy>` are absolute map-file units (tile
//! position divided by 24 under floor semantics), not segment-relative.
//! Submap terrain is stored run-length encoded: a bare label for a single
//! tile, `[label, count]` for a run of two or more.

pub mod coords;
pub mod save;
pub mod submap;
pub mod terrain;

pub use coords::{
    coords_of, pos_of, GenExtent, TileCoords, TilePos, MAP_FILES_PER_SEGMENT, MAP_FILE_SIZE,
    SEGMENT_SIZE, SUBMAP_SIZE,
};
pub use save::{MainSave, SaveError, SAVE_VERSION};
pub use submap::{
    map_file_name, segment_dir_name, write_map_file, Submap, SUBMAP_SLOTS, TILES_PER_SUBMAP,
};
pub use terrain::{decode_terrain, encode_terrain, TerrainRun, TERRAIN_DEFAULT, TERRAIN_ROAD};
