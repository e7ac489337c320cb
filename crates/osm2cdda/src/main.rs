use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use cdda_save::save;

mod config;
mod generate;
mod raster;

use config::Config;
use raster::RoadRaster;

fn main() -> Result<()> {
    env_logger::init();
    let config = Config::parse();

    if let Some(pbf_path) = &config.osm_pbf {
        let img = raster::rasterize_extract(pbf_path, config.pixels_per_meter)?;
        img.save(&config.raster)
            .with_context(|| format!("writing road raster {}", config.raster.display()))?;
        info!(
            "rasterized {} -> {}",
            pbf_path.display(),
            config.raster.display()
        );
    }

    let save_dir = config
        .cdda_dir
        .join(save::SAVE_DIR)
        .join(&config.savegame);
    let save_id = save::resolve_save_id(&save_dir)?;
    info!("savegame '{}', save id '{save_id}'", config.savegame);

    let main_save = save::sanitize_session(&save_dir, &save_id)?;
    let center = main_save.player_abspos()?;
    info!("player at tile ({}, {})", center.x, center.y);

    let roads = RoadRaster::open(&config.raster)?;
    info!("road raster {}x{} px", roads.width(), roads.height());

    let maps_dir = save_dir.join(save::MAPS_DIR);
    let stats = generate::generate_maps(&maps_dir, &roads, center)?;
    info!(
        "wrote {} map files across {} segments under {}",
        stats.map_files,
        stats.segments,
        maps_dir.display()
    );
    Ok(())
}
