/// DEM inspection tool: prints GeoTIFF georeferencing, elevation range and
/// whether the resolution is fine enough for compliance review.
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use hazard_core::assessor::load_dem;
use hazard_core::source::validate_resolution;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "dem_info", about = "Summarise a DEM used for parcel assessment")]
struct Args {
    /// GeoTIFF or serialised RasterWindow JSON.
    dem: PathBuf,

    /// Coarsest pixel size (metres) treated as high resolution.
    #[arg(long, default_value = "5.0")]
    max_resolution: f64,
}

#[derive(Serialize)]
struct DemSummary {
    path: String,
    width: usize,
    height: usize,
    transform: [f64; 6],
    bounds: [f64; 4],
    nodata: Option<f32>,
    valid_cells: usize,
    min_elevation: Option<f32>,
    max_elevation: Option<f32>,
    resolution: String,
    high_resolution: bool,
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let args = Args::parse();

    let raster = load_dem(&args.dem)?;
    let valid_cells = raster.valid_count();
    if valid_cells == 0 {
        log::warn!("{} holds no valid elevation cells", args.dem.display());
    }

    let (ok, resolution) = validate_resolution(&raster, args.max_resolution);
    let (min_x, min_y, max_x, max_y) = raster.bounds();
    let summary = DemSummary {
        path: args.dem.display().to_string(),
        width: raster.width,
        height: raster.height,
        transform: raster.transform.to_gdal(),
        bounds: [min_x, min_y, max_x, max_y],
        nodata: raster.nodata,
        valid_cells,
        min_elevation: raster.valid_values().reduce(f32::min),
        max_elevation: raster.valid_values().reduce(f32::max),
        resolution,
        high_resolution: ok,
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
