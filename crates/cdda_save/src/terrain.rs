//! Run-length encoded terrain labels, as stored in `.map` files.

use serde::{Deserialize, Serialize};

/// Label painted where the road raster is set.
pub const TERRAIN_ROAD: &str = "t_pavement";

/// Label for everything else, including tiles outside the raster.
pub const TERRAIN_DEFAULT: &str = "t_grass";

/// One run of equal terrain labels.
///
/// Serializes as a bare string for a single tile and as a
/// `[label, count]` array for two or more, which is exactly the shape the
/// game expects in a submap's `terrain` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TerrainRun {
    Single(String),
    Run(String, u32),
}

impl TerrainRun {
    fn from_parts(label: &str, count: u32) -> Self {
        if count == 1 {
            TerrainRun::Single(label.to_owned())
        } else {
            TerrainRun::Run(label.to_owned(), count)
        }
    }

    pub fn label(&self) -> &str {
        match self {
            TerrainRun::Single(label) => label,
            TerrainRun::Run(label, _) => label,
        }
    }

    pub fn count(&self) -> u32 {
        match self {
            TerrainRun::Single(_) => 1,
            TerrainRun::Run(_, count) => *count,
        }
    }
}

/// Merge consecutive equal labels left to right. Runs never have length
/// zero, and a singleton run is emitted as the bare label, never as a
/// `[label, 1]` pair.
pub fn encode_terrain<S: AsRef<str>>(tiles: &[S]) -> Vec<TerrainRun> {
    let mut runs = Vec::new();
    let mut iter = tiles.iter();

    let Some(first) = iter.next() else {
        return runs;
    };
    let mut label = first.as_ref();
    let mut count = 1u32;

    for tile in iter {
        if tile.as_ref() == label {
            count += 1;
        } else {
            runs.push(TerrainRun::from_parts(label, count));
            label = tile.as_ref();
            count = 1;
        }
    }

    // Flush the trailing run, singletons included.
    runs.push(TerrainRun::from_parts(label, count));
    runs
}

/// Expand runs back into one label per tile.
pub fn decode_terrain(runs: &[TerrainRun]) -> Vec<String> {
    let mut tiles = Vec::new();
    for run in runs {
        for _ in 0..run.count() {
            tiles.push(run.label().to_owned());
        }
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merges_runs_and_keeps_singletons_bare() {
        let runs = encode_terrain(&["a", "a", "a", "b", "c", "c"]);
        assert_eq!(
            runs,
            vec![
                TerrainRun::Run("a".into(), 3),
                TerrainRun::Single("b".into()),
                TerrainRun::Run("c".into(), 2),
            ]
        );
        assert_eq!(decode_terrain(&runs), vec!["a", "a", "a", "b", "c", "c"]);
    }

    #[test]
    fn flushes_trailing_singleton() {
        let runs = encode_terrain(&["a", "a", "b"]);
        assert_eq!(
            runs,
            vec![TerrainRun::Run("a".into(), 2), TerrainRun::Single("b".into())]
        );
    }

    #[test]
    fn uniform_submap_is_one_run() {
        let tiles = vec![TERRAIN_DEFAULT; 144];
        let runs = encode_terrain(&tiles);
        assert_eq!(runs, vec![TerrainRun::Run(TERRAIN_DEFAULT.into(), 144)]);
    }

    #[test]
    fn empty_sequence_encodes_empty() {
        let runs = encode_terrain::<&str>(&[]);
        assert!(runs.is_empty());
        assert!(decode_terrain(&runs).is_empty());
    }

    #[test]
    fn round_trips_arbitrary_sequences() {
        let tiles: Vec<&str> = ["x", "x", "y", "x", "z", "z", "z", "z", "y"].to_vec();
        assert_eq!(decode_terrain(&encode_terrain(&tiles)), tiles);
    }

    #[test]
    fn serializes_to_game_shape() {
        let runs = encode_terrain(&[TERRAIN_ROAD, TERRAIN_DEFAULT, TERRAIN_DEFAULT]);
        assert_eq!(
            serde_json::to_value(&runs).unwrap(),
            json!(["t_pavement", ["t_grass", 2]])
        );

        let back: Vec<TerrainRun> =
            serde_json::from_value(json!(["t_pavement", ["t_grass", 2]])).unwrap();
        assert_eq!(back, runs);
    }
}
