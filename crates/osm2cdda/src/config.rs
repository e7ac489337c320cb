use clap::Parser;
use std::path::PathBuf;

/// `osm2cdda` - Overwrite a Cataclysm: DDA savegame's map tree with
/// terrain generated from a rasterized OpenStreetMap road grid.
///
/// The road bitmap is sampled one pixel per map tile, centered on the
/// player. Session state that refers to the old terrain (seen overmaps,
/// map memory, active monsters) is reset so the game re-explores the
/// generated area.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// The Cataclysm: DDA directory containing the `save/` folder.
    #[arg(long, env = "CDDA_DIR")]
    pub cdda_dir: PathBuf,

    /// Savegame name under `save/`.
    #[arg(long)]
    pub savegame: String,

    /// Road bitmap path; one pixel per map tile, road pixels have a zero
    /// first channel.
    #[arg(long, default_value = "roads.png")]
    pub raster: PathBuf,

    /// Optional OSM extract (`.osm.pbf`). When given, it is rasterized
    /// into `--raster` before generation.
    #[arg(long)]
    pub osm_pbf: Option<PathBuf>,

    /// Pixels (map tiles) per meter when rasterizing the extract.
    #[arg(long, default_value_t = 1.0)]
    pub pixels_per_meter: f64,
}
