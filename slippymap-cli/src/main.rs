//! slippymap CLI - headless tile tools
//!
//! `locate` resolves a geographic coordinate to its tile id; `prefetch`
//! warms the on-disk tile cache around a coordinate using the same
//! registry/pipeline/worker-pool path the viewer uses.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use slippymap::coord;
use slippymap::{
    LoadState, LoaderConfig, NullUploader, ReqwestClient, Tile, TileLoader, TileRegistry,
};

#[derive(Parser)]
#[command(name = "slippymap", version, about = "Slippy-map tile tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a coordinate to its slippy-map tile.
    Locate {
        /// Latitude in degrees.
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in degrees.
        #[arg(allow_negative_numbers = true)]
        lon: f64,
        /// Zoom level.
        #[arg(long, default_value_t = 16)]
        zoom: u8,
    },
    /// Download the tile neighborhood around a coordinate into the cache.
    Prefetch {
        /// Latitude in degrees.
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in degrees.
        #[arg(allow_negative_numbers = true)]
        lon: f64,
        /// Zoom level.
        #[arg(long, default_value_t = 16)]
        zoom: u8,
        /// Neighborhood radius in tiles (radius 6 warms a 12×12 grid).
        #[arg(long, default_value_t = 6)]
        radius: i32,
        /// Tile cache directory (defaults to the platform cache dir).
        #[arg(long)]
        cache_dir: Option<PathBuf>,
        /// Remote tile source base URL.
        #[arg(long)]
        url: Option<String>,
        /// Number of download workers.
        #[arg(long, default_value_t = slippymap::DEFAULT_WORKERS)]
        workers: usize,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Locate { lat, lon, zoom } => locate(lat, lon, zoom),
        Command::Prefetch {
            lat,
            lon,
            zoom,
            radius,
            cache_dir,
            url,
            workers,
        } => prefetch(lat, lon, zoom, radius, cache_dir, url, workers),
    }
}

fn locate(lat: f64, lon: f64, zoom: u8) {
    let id = match coord::to_tile_id(lat, lon, zoom) {
        Ok(id) => id,
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(1);
        }
    };
    println!("tile:      {id}");
    println!("cache key: {}", id.cache_key());
    println!(
        "NW corner: {:.6}, {:.6}",
        coord::tile_y_to_lat(id.y, zoom),
        coord::tile_x_to_lon(id.x, zoom)
    );
    println!(
        "extent:    {:.6}° lon × {:.6}° lat",
        coord::lon_extent_per_tile(zoom),
        coord::lat_extent_per_tile(lat, zoom)
    );
}

fn prefetch(
    lat: f64,
    lon: f64,
    zoom: u8,
    radius: i32,
    cache_dir: Option<PathBuf>,
    url: Option<String>,
    workers: usize,
) {
    let mut config = LoaderConfig::default();
    if let Some(dir) = cache_dir {
        config.cache_dir = dir;
    }
    if let Some(url) = url {
        config.remote_base_url = url;
    }
    config.workers = workers;

    let client = match ReqwestClient::new() {
        Ok(client) => Arc::new(client),
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(1);
        }
    };

    let loader = Arc::new(TileLoader::new(config.clone(), client));
    let registry = TileRegistry::new(loader.clone());

    let center = match registry.get_or_create_by_coordinate(zoom, lat, lon) {
        Ok(tile) => tile,
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(1);
        }
    };
    info!(tile = %center.id(), "prefetching {0}×{0} neighborhood", 2 * radius);

    let mut tiles: Vec<Arc<Tile>> = Vec::new();
    for dy in -radius..radius {
        for dx in -radius..radius {
            tiles.push(center.neighbor(&registry, dx, dy));
        }
    }

    // Wait out every queued download, then decode to verify the images.
    loader.shutdown();

    let mut uploader = NullUploader::new();
    let mut ready = 0usize;
    let mut failed = 0usize;
    for tile in &tiles {
        loader.ensure_loaded(tile, &mut uploader);
        match tile.state() {
            LoadState::Ready => ready += 1,
            _ => failed += 1,
        }
    }

    println!(
        "prefetched {} tiles into {} ({} ok, {} failed)",
        tiles.len(),
        config.cache_dir.display(),
        ready,
        failed
    );
    if failed > 0 {
        process::exit(2);
    }
}
