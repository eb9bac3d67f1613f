use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use transects::RoutingConfig;
use transects::environment::{EnvironmentIndex, EnvironmentKind, EnvironmentLayer};
use transects::geometry::Frame;
use transects::ingest::{read_features, read_geometries};
use transects::pipeline::{search_layer, stitch_layers};
use transects::routes::{RouteCollection, RouteRecord};
use transects::stitching::SegmentKind;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find the shortest path at least --threshold long in each input layer
    Search {
        /// Line layers (GeoJSON). Each one is searched on its own graph.
        #[arg(long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,
        #[arg(long)]
        output: PathBuf,
        #[command(flatten)]
        routing: RoutingArgs,
    },
    /// Join transects into one walk along a road network
    Stitch {
        #[arg(long)]
        transects: PathBuf,
        #[arg(long)]
        roads: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Environment layers; giving one turns its preference and --prefer-score on.
        #[arg(long)]
        forest: Option<PathBuf>,
        #[arg(long)]
        water: Option<PathBuf>,
        #[arg(long)]
        cave: Option<PathBuf>,
        #[arg(long)]
        abandoned: Option<PathBuf>,
        #[command(flatten)]
        routing: RoutingArgs,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FrameArg {
    Geographic,
    Projected,
}

#[derive(clap::Args, Debug)]
struct RoutingArgs {
    /// JSON routing config; flags below override it.
    #[arg(long, env = "YARROW_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "YARROW_THRESHOLD_METERS")]
    threshold: Option<f64>,
    #[arg(long)]
    max_hops: Option<usize>,
    #[arg(long)]
    prefer_score: bool,
    #[arg(long, env = "YARROW_SNAP_DISTANCE_METERS")]
    snap_distance: Option<f64>,
    #[arg(long, value_enum)]
    frame: Option<FrameArg>,
    #[arg(long)]
    max_paths: Option<u64>,
    #[arg(long)]
    time_limit_secs: Option<u64>,
    /// Road classes to leave out (comma-separated), e.g. motorway,primary
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<String>,
    #[arg(long)]
    env_max_distance: Option<f64>,
}

impl RoutingArgs {
    fn resolve(&self) -> Result<RoutingConfig> {
        let mut config = match &self.config {
            Some(path) => RoutingConfig::from_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => RoutingConfig::default(),
        };

        if let Some(t) = self.threshold {
            config.threshold_meters = t;
        }
        if let Some(h) = self.max_hops {
            config.max_hops = h;
        }
        if self.prefer_score {
            config.prefer_score = true;
        }
        if let Some(d) = self.snap_distance {
            config.snap_distance_meters = d;
        }
        if let Some(frame) = self.frame {
            config.frame = match frame {
                FrameArg::Geographic => Frame::Geographic,
                FrameArg::Projected => Frame::Projected,
            };
        }
        if self.max_paths.is_some() {
            config.max_enumerated_paths = self.max_paths;
        }
        if self.time_limit_secs.is_some() {
            config.time_limit_secs = self.time_limit_secs;
        }
        config.excluded_road_classes.extend(self.exclude.iter().cloned());
        if let Some(d) = self.env_max_distance {
            config.environment.max_distance_meters = d;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    match args.cmd {
        Command::Search {
            input,
            output,
            routing,
        } => run_search(&routing.resolve()?, &input, &output),
        Command::Stitch {
            transects,
            roads,
            output,
            forest,
            water,
            cave,
            abandoned,
            routing,
        } => {
            let mut config = routing.resolve()?;
            let env_files = [
                (EnvironmentKind::Forest, forest),
                (EnvironmentKind::Water, water),
                (EnvironmentKind::Cave, cave),
                (EnvironmentKind::Abandoned, abandoned),
            ];
            let mut layers = Vec::new();
            for (kind, path) in env_files {
                let Some(path) = path else { continue };
                config.enable_environment(kind);
                let geometries = read_geometries(&path)
                    .with_context(|| format!("reading {:?} layer {}", kind, path.display()))?;
                layers.push(EnvironmentLayer { kind, geometries });
            }
            run_stitch(&config, &transects, &roads, layers, &output)
        }
    }
}

fn run_search(config: &RoutingConfig, inputs: &[PathBuf], output: &Path) -> Result<()> {
    let never = || false;

    let outcomes: Vec<Result<Option<RouteRecord>>> = inputs
        .par_iter()
        .map(|path| {
            let features = read_features(path, &config.excluded_road_classes)
                .with_context(|| format!("reading {}", path.display()))?;
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let search = search_layer(&features, config, &name, &never)
                .with_context(|| format!("searching {}", path.display()))?;
            if search.report.truncated {
                warn!("{}: search budget exhausted, result may not be optimal", name);
            }
            if search.route.is_none() {
                warn!(
                    "{}: no path of at least {} m",
                    name, config.threshold_meters
                );
            }
            Ok(search.route)
        })
        .collect();

    let mut routes = RouteCollection::new();
    for outcome in outcomes {
        if let Some(route) = outcome? {
            println!("{}: found route of {:.0} m", route.source, route.length_m);
            routes.push(route);
        }
    }

    routes
        .write_geojson(output)
        .with_context(|| format!("writing {}", output.display()))?;
    info!("Wrote {} routes to {}", routes.len(), output.display());
    Ok(())
}

fn run_stitch(
    config: &RoutingConfig,
    transects_path: &Path,
    roads_path: &Path,
    layers: Vec<EnvironmentLayer>,
    output: &Path,
) -> Result<()> {
    let transects = read_features(transects_path, &[])
        .with_context(|| format!("reading {}", transects_path.display()))?;
    let roads = read_features(roads_path, &config.excluded_road_classes)
        .with_context(|| format!("reading {}", roads_path.display()))?;

    let environment = if config.environment.any_enabled() && !layers.is_empty() {
        Some(EnvironmentIndex::new(layers, &config.environment, config.frame))
    } else {
        None
    };

    let (route, stitched) = stitch_layers(&transects, roads, environment.as_ref(), config)
        .context("stitching transects")?;

    println!(
        "Stitched {} transects: {:.0} m",
        stitched.visit_order.len(),
        route.length_m
    );

    let mut routes = RouteCollection::new();
    routes.push(route);
    for segment in stitched.segments {
        let source = match segment.kind {
            SegmentKind::Feature(id) => format!("transect {}", id),
            SegmentKind::SnapLink => "snap".to_string(),
            SegmentKind::Connector { from, to } => format!("connector {} -> {}", from, to),
        };
        routes.push(RouteRecord {
            geometry: segment.geometry,
            length_m: segment.length,
            source,
        });
    }

    routes
        .write_geojson(output)
        .with_context(|| format!("writing {}", output.display()))?;
    Ok(())
}
