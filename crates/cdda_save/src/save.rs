//! Save-folder layout: version header, save-id resolution, and the
//! sanitized session state written around a regenerated map tree.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::coords::{TilePos, SUBMAP_SIZE};

/// Save format version written into headers and submap records.
pub const SAVE_VERSION: u32 = 33;

/// Directory with all savegames, under the game directory.
pub const SAVE_DIR: &str = "save";

/// Directory with segment subdirectories, under a savegame.
pub const MAPS_DIR: &str = "maps";

/// Extension of the main save file; its stem is the save id.
pub const MAIN_SAVE_EXT: &str = ".sav";

/// Suffix of the seen-overmap file, appended to the save id.
pub const SEEN_FILE_SUFFIX: &str = ".seen.0.0";

/// Suffix of the map-memory file, appended to the save id.
pub const MAP_MEMORY_SUFFIX: &str = ".mm";

/// Overmap file for the origin overmap.
pub const OVERMAP_FILE: &str = "o.0.0";

/// Overmap tiles per z-level, the run length used by the empty templates.
const OVERMAP_TILES_PER_LAYER: u32 = 32_400;

/// Z-levels tracked by the seen-overmap file.
const SEEN_LAYER_COUNT: usize = 21;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("expected exactly one .sav file in {}, found {found}", .dir.display())]
    AmbiguousOrMissingSave { dir: PathBuf, found: usize },

    #[error("main save file is missing or mistyped at key '{0}'")]
    MalformedSave(&'static str),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// The one-line header carried by whole-save files (`.sav`, `.seen.0.0`,
/// `o.0.0`). Map files and map memory carry none.
pub fn version_header() -> String {
    format!("# version {SAVE_VERSION}\n")
}

/// The save id is the stem of the single `.sav` file in the save
/// directory. Zero or several candidates make the save unusable.
pub fn resolve_save_id(save_dir: &Path) -> Result<String, SaveError> {
    let mut candidates = Vec::new();
    for entry in fs::read_dir(save_dir)? {
        let name = entry?.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(stem) = name.strip_suffix(MAIN_SAVE_EXT) {
            candidates.push(stem.to_owned());
        }
    }

    match candidates.as_slice() {
        [id] => Ok(id.clone()),
        other => Err(SaveError::AmbiguousOrMissingSave {
            dir: save_dir.to_path_buf(),
            found: other.len(),
        }),
    }
}

/// Write `value` as compact JSON, preceded by `header` when given.
pub fn write_json_file<T: Serialize>(
    path: &Path,
    value: &T,
    header: Option<&str>,
) -> Result<(), SaveError> {
    let mut writer = BufWriter::new(File::create(path)?);
    if let Some(header) = header {
        writer.write_all(header.as_bytes())?;
    }
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// Parse a JSON file after skipping `header_lines` leading lines.
pub fn read_json_skip_header(path: &Path, header_lines: usize) -> Result<Value, SaveError> {
    let text = fs::read_to_string(path)?;
    let mut rest = text.as_str();
    for _ in 0..header_lines {
        rest = rest.split_once('\n').map(|(_, tail)| tail).unwrap_or("");
    }
    Ok(serde_json::from_str(rest)?)
}

/// Delete and recreate the `maps/` tree. Returns the fresh directory.
pub fn reset_maps_dir(save_dir: &Path) -> Result<PathBuf, SaveError> {
    let maps_dir = save_dir.join(MAPS_DIR);
    if maps_dir.exists() {
        fs::remove_dir_all(&maps_dir)?;
    }
    fs::create_dir(&maps_dir)?;
    Ok(maps_dir)
}

/// Seen-overmap record with nothing visible or explored. Built fresh on
/// every call; layers are independent values, not shared references.
pub fn empty_seen() -> Value {
    let hidden = vec![json!([[false, OVERMAP_TILES_PER_LAYER]]); SEEN_LAYER_COUNT];
    let empty = vec![json!([]); SEEN_LAYER_COUNT];
    json!({
        "visible": hidden.clone(),
        "explored": hidden,
        "notes": empty.clone(),
        "extras": empty
    })
}

/// Overmap record with the default layer stack: solid rock below ground,
/// one field layer at the surface, open air above.
pub fn empty_overmap() -> Value {
    let layer = |label: &str| json!([[label, OVERMAP_TILES_PER_LAYER]]);
    let mut layers = vec![layer("empty_rock"); 10];
    layers.push(layer("field"));
    layers.extend(std::iter::repeat_with(|| layer("open_air")).take(10));
    json!({
        "layers": layers,
        "region_id": "default",
        "monster_groups": [],
        "cities": [],
        "connections_out": {},
        "radios": [],
        "monster_map": [],
        "tracked_vehicles": [],
        "scent_traces": [],
        "npcs": [],
        "camps": [],
        "overmap_special_placements": []
    })
}

/// Map-memory record with both halves empty.
pub fn empty_map_memory() -> Value {
    json!([[], []])
}

/// Main save file (`<id>.sav`), kept as loose JSON so every field the game
/// wrote survives a rewrite untouched except the ones reset here.
#[derive(Debug)]
pub struct MainSave {
    data: Value,
}

impl MainSave {
    pub fn read(save_dir: &Path, save_id: &str) -> Result<Self, SaveError> {
        let path = save_dir.join(format!("{save_id}{MAIN_SAVE_EXT}"));
        Ok(Self {
            data: read_json_skip_header(&path, 1)?,
        })
    }

    pub fn write(&self, save_dir: &Path, save_id: &str) -> Result<(), SaveError> {
        let path = save_dir.join(format!("{save_id}{MAIN_SAVE_EXT}"));
        write_json_file(&path, &self.data, Some(&version_header()))
    }

    /// Drop all active and stair-lurking monsters, so nothing refers to
    /// the regenerated terrain.
    pub fn clear_monsters(&mut self) -> Result<(), SaveError> {
        let root = self
            .data
            .as_object_mut()
            .ok_or(SaveError::MalformedSave("<root object>"))?;
        root.insert("active_monsters".to_owned(), json!([]));
        root.insert("stair_monsters".to_owned(), json!([]));
        Ok(())
    }

    fn int_field(value: &Value, key: &'static str) -> Result<i32, SaveError> {
        value
            .get(key)
            .and_then(Value::as_i64)
            .map(|v| v as i32)
            .ok_or(SaveError::MalformedSave(key))
    }

    /// Player tile position: the submap the player occupies, scaled to
    /// tiles, plus the in-submap offset.
    pub fn player_abspos(&self) -> Result<TilePos, SaveError> {
        let levx = Self::int_field(&self.data, "levx")?;
        let levy = Self::int_field(&self.data, "levy")?;
        let player = self
            .data
            .get("player")
            .ok_or(SaveError::MalformedSave("player"))?;
        let posx = Self::int_field(player, "posx")?;
        let posy = Self::int_field(player, "posy")?;

        Ok(TilePos::new(
            levx * SUBMAP_SIZE + posx,
            levy * SUBMAP_SIZE + posy,
        ))
    }
}

/// Reset the session state around a regenerated map tree: wipe `maps/`,
/// write empty seen/overmap/map-memory records, and clear monsters out of
/// the main save. Returns the sanitized main save for position lookups.
pub fn sanitize_session(save_dir: &Path, save_id: &str) -> Result<MainSave, SaveError> {
    reset_maps_dir(save_dir)?;

    let header = version_header();
    write_json_file(
        &save_dir.join(format!("{save_id}{SEEN_FILE_SUFFIX}")),
        &empty_seen(),
        Some(&header),
    )?;
    write_json_file(&save_dir.join(OVERMAP_FILE), &empty_overmap(), Some(&header))?;
    write_json_file(
        &save_dir.join(format!("{save_id}{MAP_MEMORY_SUFFIX}")),
        &empty_map_memory(),
        None,
    )?;

    let mut main_save = MainSave::read(save_dir, save_id)?;
    main_save.clear_monsters()?;
    main_save.write(save_dir, save_id)?;
    Ok(main_save)
}
