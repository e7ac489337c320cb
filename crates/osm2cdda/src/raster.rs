//! The road bitmap: loaded from disk, or rasterized from an OSM extract.
//!
//! One pixel is one map tile. Roads are stroked black onto a white
//! background at per-category widths; a pixel whose first channel is zero
//! is sampled as road by the generator. Building footprints are drawn
//! with a light fill and a blue outline, so their outlines (zero red
//! channel) pave over into the generated terrain as well.

use std::path::Path;

use anyhow::{bail, Context, Result};
use hashbrown::HashMap;
use image::{Rgb, RgbImage};
use log::{debug, info, warn};
use nohash_hasher::BuildNoHashHasher;
use osmpbf::{Element, ElementReader};

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const ROAD_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const BUILDING_FILL: Rgb<u8> = Rgb([238, 238, 255]);
const BUILDING_OUTLINE: Rgb<u8> = Rgb([0, 0, 255]);

/// Length in meters of one degree of latitude.
const METERS_PER_LAT_DEG: f64 = 111_319.0;

/// Stroke width in meters per highway category.
const ROAD_WIDTHS_M: [(&str, f64); 19] = [
    ("motorway", 12.0),
    ("motorway_link", 10.0),
    ("trunk", 10.0),
    ("trunk_link", 8.0),
    ("primary", 9.0),
    ("secondary", 8.0),
    ("tertiary", 8.0),
    ("tertiary_link", 6.0),
    ("unclassified", 8.0),
    ("residential", 8.0),
    ("living_street", 8.0),
    ("service", 6.0),
    ("construction", 6.0),
    ("track", 5.0),
    ("pedestrian", 4.0),
    ("cycleway", 4.0),
    ("path", 4.0),
    ("footway", 4.0),
    ("steps", 3.0),
];

const DEFAULT_ROAD_WIDTH_M: f64 = 8.0;

/// Road raster backing the terrain sampler.
pub struct RoadRaster {
    img: RgbImage,
}

impl RoadRaster {
    pub fn open(path: &Path) -> Result<Self> {
        let img = image::open(path)
            .with_context(|| format!("opening road raster {}", path.display()))?
            .to_rgb8();
        Ok(Self { img })
    }

    pub fn from_image(img: RgbImage) -> Self {
        Self { img }
    }

    pub fn width(&self) -> u32 {
        self.img.width()
    }

    pub fn height(&self) -> u32 {
        self.img.height()
    }

    /// Whether the tile at raster position (x, y) is road. Positions
    /// outside the raster never are; sampling past the edges is normal
    /// for boundary map files.
    pub fn is_road(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.img.width() as i32 || y >= self.img.height() as i32 {
            return false;
        }
        self.img.get_pixel(x as u32, y as u32)[0] == 0
    }
}

/// Stroke width in pixels for a highway category. An unknown category is
/// reported and falls back to the default width; it never aborts the run.
fn road_width_px(kind: &str, pixels_per_meter: f64) -> f64 {
    match ROAD_WIDTHS_M.iter().find(|(k, _)| *k == kind) {
        Some((_, width_m)) => width_m * pixels_per_meter,
        None => {
            warn!("unknown highway type '{kind}', using default width");
            DEFAULT_ROAD_WIDTH_M * pixels_per_meter
        }
    }
}

struct RoadLine {
    pts: Vec<(f64, f64)>,
    width_px: f64,
}

/// Rasterize an OSM extract into a road bitmap, one pixel per map tile at
/// `pixels_per_meter` resolution. Two passes over the extract: nodes
/// first (id -> lon/lat plus the geographic bounds), then ways.
pub fn rasterize_extract(pbf_path: &Path, pixels_per_meter: f64) -> Result<RgbImage> {
    let mut nodes: HashMap<i64, (f64, f64), BuildNoHashHasher<i64>> =
        HashMap::with_hasher(BuildNoHashHasher::default());
    let (mut lon_min, mut lon_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut lat_min, mut lat_max) = (f64::INFINITY, f64::NEG_INFINITY);

    ElementReader::from_path(pbf_path)
        .with_context(|| format!("opening {}", pbf_path.display()))?
        .for_each(|elem| {
            let (id, lon, lat) = match elem {
                Element::Node(node) => (node.id(), node.lon(), node.lat()),
                Element::DenseNode(dn) => (dn.id(), dn.lon(), dn.lat()),
                _ => return,
            };
            lon_min = lon_min.min(lon);
            lon_max = lon_max.max(lon);
            lat_min = lat_min.min(lat);
            lat_max = lat_max.max(lat);
            nodes.insert(id, (lon, lat));
        })?;

    if nodes.is_empty() {
        bail!("no nodes in {}", pbf_path.display());
    }

    // One degree of longitude shrinks with latitude: 40075 km * cos(lat) / 360.
    let avg_lat = 0.5 * (lat_min + lat_max);
    let meters_per_lon_deg = 40_075_000.0 * avg_lat.to_radians().cos() / 360.0;
    let px_per_lon_deg = meters_per_lon_deg * pixels_per_meter;
    let px_per_lat_deg = METERS_PER_LAT_DEG * pixels_per_meter;

    let width = (((lon_max - lon_min) * px_per_lon_deg) as u32).max(1);
    let height = (((lat_max - lat_min) * px_per_lat_deg) as u32).max(1);
    debug!(
        "extract bounds lon [{lon_min:.5}, {lon_max:.5}] lat [{lat_min:.5}, {lat_max:.5}], \
         {} nodes -> {width}x{height} px",
        nodes.len()
    );

    // North up: x grows with longitude, y grows southward.
    let to_px = |lon: f64, lat: f64| -> (f64, f64) {
        ((lon - lon_min) * px_per_lon_deg, (lat_max - lat) * px_per_lat_deg)
    };

    let mut roads = Vec::<RoadLine>::new();
    let mut buildings = Vec::<Vec<(f64, f64)>>::new();

    ElementReader::from_path(pbf_path)?.for_each(|elem| {
        let Element::Way(way) = elem else { return };

        let tags: Vec<(&str, &str)> = way.tags().collect();
        let get = |key: &str| tags.iter().find_map(|(k, v)| (*k == key).then_some(*v));

        let pts: Vec<(f64, f64)> = way
            .refs()
            .filter_map(|id| nodes.get(&id).map(|&(lon, lat)| to_px(lon, lat)))
            .collect();

        if get("building") == Some("yes") && pts.len() >= 3 {
            buildings.push(pts.clone());
        }

        if let Some(kind) = get("highway") {
            if pts.len() >= 2 {
                roads.push(RoadLine {
                    pts,
                    width_px: road_width_px(kind, pixels_per_meter),
                });
            }
        }
    })?;

    let mut img = RgbImage::from_pixel(width, height, BACKGROUND);

    // Buildings first so roads stroke over their footprints.
    for ring in &buildings {
        paint_polygon(&mut img, ring, BUILDING_FILL);
        let mut outline = ring.clone();
        outline.push(ring[0]);
        paint_polyline(&mut img, &outline, 0.5, BUILDING_OUTLINE);
    }
    for road in &roads {
        paint_polyline(&mut img, &road.pts, road.width_px * 0.5, ROAD_COLOR);
    }

    info!(
        "rasterized {} roads and {} buildings onto {width}x{height} px",
        roads.len(),
        buildings.len()
    );
    Ok(img)
}

fn clamp_px(v: f64, hi: u32) -> i64 {
    (v as i64).clamp(0, hi as i64 - 1)
}

/// Stroke a polyline by painting every pixel whose center lies within
/// `radius_px` of any segment. Radius is floored at half a pixel so thin
/// strokes stay visible.
fn paint_polyline(img: &mut RgbImage, line: &[(f64, f64)], radius_px: f64, color: Rgb<u8>) {
    if line.len() < 2 {
        return;
    }

    let radius = radius_px.max(0.5);
    let radius_sq = radius * radius;

    for segment in line.windows(2) {
        let (x0, y0) = segment[0];
        let (x1, y1) = segment[1];

        let min_x = clamp_px(x0.min(x1) - radius, img.width());
        let max_x = clamp_px(x0.max(x1) + radius, img.width());
        let min_y = clamp_px(y0.min(y1) - radius, img.height());
        let max_y = clamp_px(y0.max(y1) + radius, img.height());

        let dx = x1 - x0;
        let dy = y1 - y0;
        let denom = dx * dx + dy * dy + 1e-12;

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f64 + 0.5;
                let py = y as f64 + 0.5;

                // Closest point on the segment to the pixel center.
                let t = (((px - x0) * dx + (py - y0) * dy) / denom).clamp(0.0, 1.0);
                let cx = x0 + t * dx;
                let cy = y0 + t * dy;

                let dist_sq = (px - cx) * (px - cx) + (py - cy) * (py - cy);
                if dist_sq <= radius_sq {
                    img.put_pixel(x as u32, y as u32, color);
                }
            }
        }
    }
}

/// Fill a polygon with the even-odd rule over its clamped bounding box.
fn paint_polygon(img: &mut RgbImage, ring: &[(f64, f64)], color: Rgb<u8>) {
    if ring.len() < 3 {
        return;
    }

    let min_x = clamp_px(ring.iter().map(|p| p.0).fold(f64::INFINITY, f64::min), img.width());
    let max_x = clamp_px(ring.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max), img.width());
    let min_y = clamp_px(ring.iter().map(|p| p.1).fold(f64::INFINITY, f64::min), img.height());
    let max_y = clamp_px(ring.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max), img.height());

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let px = x as f64 + 0.5;
            let py = y as f64 + 0.5;

            let mut inside = false;
            let mut j = ring.len() - 1;
            for i in 0..ring.len() {
                let (xi, yi) = ring[i];
                let (xj, yj) = ring[j];
                if (yi > py) != (yj > py) {
                    let x_inter = (xj - xi) * (py - yi) / (yj - yi) + xi;
                    if px < x_inter {
                        inside = !inside;
                    }
                }
                j = i;
            }

            if inside {
                img.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_widths_scale_with_resolution() {
        assert_eq!(road_width_px("motorway", 1.0), 12.0);
        assert_eq!(road_width_px("steps", 2.0), 6.0);
    }

    #[test]
    fn unknown_highway_kind_falls_back_to_default() {
        assert_eq!(road_width_px("hoverlane", 1.0), DEFAULT_ROAD_WIDTH_M);
    }

    #[test]
    fn out_of_bounds_is_never_road() {
        let raster = RoadRaster::from_image(RgbImage::from_pixel(4, 4, Rgb([0, 0, 0])));
        assert!(raster.is_road(0, 0));
        assert!(!raster.is_road(-1, 0));
        assert!(!raster.is_road(0, -1));
        assert!(!raster.is_road(4, 0));
        assert!(!raster.is_road(0, 4));
    }

    #[test]
    fn polyline_paints_a_stroked_band() {
        let mut img = RgbImage::from_pixel(10, 10, BACKGROUND);
        paint_polyline(&mut img, &[(1.0, 5.0), (9.0, 5.0)], 1.0, ROAD_COLOR);

        assert_eq!(*img.get_pixel(4, 5), ROAD_COLOR);
        assert_eq!(*img.get_pixel(4, 4), ROAD_COLOR);
        assert_eq!(*img.get_pixel(4, 1), BACKGROUND);
        assert_eq!(*img.get_pixel(0, 0), BACKGROUND);
    }

    #[test]
    fn polygon_fills_interior_only() {
        let mut img = RgbImage::from_pixel(12, 12, BACKGROUND);
        let ring = [(2.0, 2.0), (9.0, 2.0), (9.0, 9.0), (2.0, 9.0)];
        paint_polygon(&mut img, &ring, BUILDING_FILL);

        assert_eq!(*img.get_pixel(5, 5), BUILDING_FILL);
        assert_eq!(*img.get_pixel(11, 11), BACKGROUND);
        assert_eq!(*img.get_pixel(0, 5), BACKGROUND);
    }
}
