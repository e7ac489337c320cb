//! Walk the generation extent and emit segment directories and map files.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, warn};

use cdda_save::{
    encode_terrain, pos_of, segment_dir_name, write_map_file, GenExtent, Submap, TilePos,
    SUBMAP_SIZE, SUBMAP_SLOTS, TERRAIN_DEFAULT, TERRAIN_ROAD, TILES_PER_SUBMAP,
};

use crate::raster::RoadRaster;

#[derive(Debug, Default, Clone, Copy)]
pub struct GenStats {
    pub segments: usize,
    pub map_files: usize,
}

/// Generate the map tree for `raster` centered on `center`, one tile per
/// pixel, into `maps_dir`.
///
/// Writes are not transactional: aborting mid-run leaves the segments
/// written so far in place, exactly as an interrupted game write would.
pub fn generate_maps(maps_dir: &Path, raster: &RoadRaster, center: TilePos) -> Result<GenStats> {
    if raster.width() == 0 || raster.height() == 0 {
        warn!("road raster is empty, generating nothing");
        return Ok(GenStats::default());
    }

    let extent = GenExtent::centered(center, raster.width(), raster.height());
    debug!(
        "extent {:?} .. {:?} for {}x{} px",
        extent.top_left(),
        extent.bottom_right(),
        raster.width(),
        raster.height()
    );

    let mut stats = GenStats::default();
    for segment_x in extent.segment_range(0) {
        for segment_y in extent.segment_range(1) {
            stats.map_files +=
                generate_segment(maps_dir, raster, &extent, [segment_x, segment_y])?;
            stats.segments += 1;
        }
    }
    Ok(stats)
}

fn generate_segment(
    maps_dir: &Path,
    raster: &RoadRaster,
    extent: &GenExtent,
    segment: [i32; 2],
) -> Result<usize> {
    let segment_dir = maps_dir.join(segment_dir_name(segment));
    fs::create_dir(&segment_dir)
        .with_context(|| format!("creating segment directory {}", segment_dir.display()))?;

    let mut written = 0;
    for file_x in extent.map_file_range(0, segment[0]) {
        for file_y in extent.map_file_range(1, segment[1]) {
            let map_file = [file_x, file_y];
            let submaps = SUBMAP_SLOTS.map(|idx| {
                let tiles = sample_submap(raster, extent.top_left(), map_file, idx);
                Submap::new(map_file, idx, encode_terrain(&tiles))
            });
            write_map_file(&segment_dir, map_file, &submaps)?;
            written += 1;
        }
    }

    debug!("segment {}: {written} map files", segment_dir_name(segment));
    Ok(written)
}

/// Sample the 144 tiles of one submap in persisted scan order: rows of the
/// stored sequence advance the world y axis, columns the x axis.
fn sample_submap(
    raster: &RoadRaster,
    top_left: TilePos,
    map_file: [i32; 2],
    submap_idx: [i32; 2],
) -> Vec<&'static str> {
    let mut tiles = Vec::with_capacity(TILES_PER_SUBMAP);
    for row in 0..SUBMAP_SIZE {
        for col in 0..SUBMAP_SIZE {
            let pos = pos_of(map_file, submap_idx, [col, row]);
            let road = raster.is_road(pos.x - top_left.x, pos.y - top_left.y);
            tiles.push(if road { TERRAIN_ROAD } else { TERRAIN_DEFAULT });
        }
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdda_save::{decode_terrain, map_file_name, TerrainRun};
    use image::{Rgb, RgbImage};
    use serde_json::Value;

    fn read_map_file(path: &Path) -> Vec<Submap> {
        let text = fs::read_to_string(path).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn all_clear_raster_yields_single_grass_runs() {
        let dir = tempfile::tempdir().unwrap();
        let raster = RoadRaster::from_image(RgbImage::from_pixel(24, 24, Rgb([255, 255, 255])));

        let stats = generate_maps(dir.path(), &raster, TilePos::new(12, 12)).unwrap();
        assert_eq!(stats.segments, 1);
        assert_eq!(stats.map_files, 1);

        let path = dir.path().join("0.0.0").join(map_file_name([0, 0]));
        let records = read_map_file(&path);
        assert_eq!(records.len(), 4);
        for submap in &records {
            assert_eq!(
                submap.terrain,
                vec![TerrainRun::Run(TERRAIN_DEFAULT.into(), 144)]
            );
        }
    }

    #[test]
    fn road_pixels_land_on_transposed_indices() {
        let dir = tempfile::tempdir().unwrap();
        let mut img = RgbImage::from_pixel(24, 24, Rgb([255, 255, 255]));
        // Tile (5, 7) relative to the top-left corner.
        img.put_pixel(5, 7, Rgb([0, 0, 0]));
        let raster = RoadRaster::from_image(img);

        generate_maps(dir.path(), &raster, TilePos::new(12, 12)).unwrap();

        let records = read_map_file(&dir.path().join("0.0.0").join("0.0.0.map"));
        let tiles = decode_terrain(&records[0].terrain);
        assert_eq!(tiles.len(), 144);
        // The stored sequence scans y as its outer axis, so tile (x=5, y=7)
        // sits at index 7 * 12 + 5.
        for (i, tile) in tiles.iter().enumerate() {
            let expected = if i == 7 * 12 + 5 { TERRAIN_ROAD } else { TERRAIN_DEFAULT };
            assert_eq!(tile, expected, "index {i}");
        }
        // The other three submaps stay grass.
        for submap in &records[1..] {
            assert_eq!(
                submap.terrain,
                vec![TerrainRun::Run(TERRAIN_DEFAULT.into(), 144)]
            );
        }
    }

    #[test]
    fn region_spanning_segments_clamps_boundary_files() {
        let dir = tempfile::tempdir().unwrap();
        // 48x24 rectangle centered on the segment boundary at x = 768.
        let raster = RoadRaster::from_image(RgbImage::from_pixel(48, 24, Rgb([255, 255, 255])));

        let stats = generate_maps(dir.path(), &raster, TilePos::new(768, 12)).unwrap();
        assert_eq!(stats.segments, 2);
        assert_eq!(stats.map_files, 2);

        // Top-left (744, 0) -> file 31 of segment 0; bottom-right (792, 24)
        // -> file 33 exclusive, so file 32 of segment 1.
        assert!(dir.path().join("0.0.0").join("31.0.0.map").is_file());
        assert!(dir.path().join("1.0.0").join("32.0.0.map").is_file());

        let coords: Vec<Value> = read_map_file(&dir.path().join("1.0.0/32.0.0.map"))
            .iter()
            .map(|s| serde_json::to_value(s.coordinates).unwrap())
            .collect();
        assert_eq!(coords[0], serde_json::json!([64, 0, 0]));
    }

    #[test]
    fn empty_raster_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let raster = RoadRaster::from_image(RgbImage::new(0, 0));

        let stats = generate_maps(dir.path(), &raster, TilePos::new(3078, 583)).unwrap();
        assert_eq!(stats.segments, 0);
        assert_eq!(stats.map_files, 0);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
