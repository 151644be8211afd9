//! Grid clustering tool
//!
//! Reads points from a CSV file, clusters the ones inside a viewport, optionally
//! replays a sequence of pans, and writes the clusters added and removed by
//! every step as CSV.

use clap::Parser;
use csv::{ReaderBuilder, WriterBuilder};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use rust_gridcluster::{
    Cluster, ClusteringConfig, ClusteringResult, GridClusteringAlgorithm, MapRect, MapSize, Point,
    PointIndex, PointList,
};


#[derive(Parser, Debug)]
#[command(name = "rust_gridcluster")]
#[command(about = "Incremental grid clustering of map points", long_about = None)]
struct Args {
    /// Input CSV file with x,y columns
    #[arg(short, long, default_value = "points.csv")]
    input: PathBuf,

    /// Output CSV file with cluster events (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Viewport as x,y,width,height (default: bounds of all points)
    #[arg(short, long, value_parser = parse_rect)]
    viewport: Option<MapRect>,

    /// Cell size as width,height or a single side length
    #[arg(short = 's', long, value_parser = parse_size)]
    cell_size: Option<MapSize>,

    /// Absolute merge distance, at most half of the shorter cell side
    #[arg(short, long)]
    merge_distance: Option<f64>,

    /// Pan the viewport by dx,dy after the first pass; may be repeated
    #[arg(short, long, value_parser = parse_pair, allow_hyphen_values = true)]
    pan: Vec<(f64, f64)>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let config = load_config(args)?;

    let points = read_points(&args.input)?;
    if points.is_empty() {
        return Err("No points found in CSV file".into());
    }
    info!("Read {} points from {:?}", points.len(), args.input);

    let index = PointIndex::build(points);
    debug!("Built point index of height {}", index.height());

    let viewport = match args.viewport {
        Some(rect) => rect,
        None => default_viewport(&index, &config.cell_size()),
    };

    let mut session = GridClusteringAlgorithm::new(config);
    let mut events = Vec::new();

    let result = session.cluster(&index, &viewport, false)?;
    collect_events(0, &result, &mut events);

    let mut rect = viewport;
    for (step, &(dx, dy)) in args.pan.iter().enumerate() {
        rect = MapRect::new(rect.min_x() + dx, rect.min_y() + dy, rect.width(), rect.height());
        let result = session.cluster(&index, &rect, true)?;
        collect_events(step + 1, &result, &mut events);
    }

    let displayed: usize = session.clusters().map(Cluster::count).sum();
    info!(
        "{} clusters hold {} points after {} steps",
        session.clusters().count(),
        displayed,
        args.pan.len() + 1
    );

    match &args.output {
        None => write_events(std::io::stdout().lock(), &events)?,
        Some(path) => {
            write_events(File::create(path)?, &events)?;
            info!("Cluster events written to {:?}", path);
        }
    }
    Ok(())
}

/// Configuration file values overridden by command-line flags
fn load_config(args: &Args) -> Result<ClusteringConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => ClusteringConfig::from_file(path)?,
        None => ClusteringConfig::default(),
    };
    if let Some(cell) = args.cell_size {
        config = config.with_cell_size(cell.width, cell.height);
    }
    if let Some(distance) = args.merge_distance {
        config = config.with_merge_distance(distance);
    }
    config.validate()?;
    Ok(config)
}

/// Bounds of all indexed points, at least one cell wide and high
///
/// Grid cells exclude their far edges, so the far corner is moved just past
/// the outermost points to keep them inside the grid.
fn default_viewport(index: &PointIndex, cell: &MapSize) -> MapRect {
    let bounds = index.bounds().unwrap_or_default();
    let far = Point::new(
        bounds.max_x().next_up().max(bounds.min_x() + cell.width),
        bounds.max_y().next_up().max(bounds.min_y() + cell.height),
    );
    MapRect::from_corners(bounds.min(), far)
}

/// Reads points from a CSV file
///
/// Expected format: `x,y` (header row is optional, extra columns are ignored).
/// The position of a point in the returned list is its identifier.
fn read_points(filename: &PathBuf) -> Result<PointList, Box<dyn Error>> {
    let file = File::open(filename)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut points = PointList::new();
    let mut skipped = 0;

    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let x = record.get(0).map(|s| s.trim().parse::<f64>());
        let y = record.get(1).map(|s| s.trim().parse::<f64>());
        match (x, y) {
            (Some(Ok(x)), Some(Ok(y))) if x.is_finite() && y.is_finite() => {
                points.push(Point::new(x, y))
            }
            // Header row
            (Some(Err(_)), _) if i == 0 => {}
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("Skipped {} rows without a valid x,y pair", skipped);
    }
    Ok(points)
}

/// One added or removed cluster
#[derive(Debug, Clone, PartialEq)]
struct Event {
    step: usize,
    added: bool,
    cluster: Cluster,
}

fn collect_events(step: usize, result: &ClusteringResult, events: &mut Vec<Event>) {
    events.extend(result.old_clusters.iter().map(|c| Event {
        step,
        added: false,
        cluster: c.clone(),
    }));
    events.extend(result.new_clusters.iter().map(|c| Event {
        step,
        added: true,
        cluster: c.clone(),
    }));
}

/// Writes events as `step,event,slot,generation,x,y,count` rows
fn write_events<W: Write>(out: W, events: &[Event]) -> Result<(), Box<dyn Error>> {
    let mut writer = WriterBuilder::new().from_writer(out);
    writer.write_record(["step", "event", "slot", "generation", "x", "y", "count"])?;

    for event in events {
        let id = event.cluster.id();
        let p = event.cluster.coordinate();
        writer.write_record([
            event.step.to_string(),
            if event.added { "add" } else { "remove" }.to_string(),
            id.slot().to_string(),
            id.generation().to_string(),
            p.x().to_string(),
            p.y().to_string(),
            event.cluster.count().to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn parse_numbers(s: &str, expected: &[usize]) -> Result<Vec<f64>, String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("{:?}: {}", v, e)))
        .collect::<Result<Vec<_>, _>>()?;
    if !expected.contains(&values.len()) {
        return Err(format!(
            "expected {:?} comma-separated numbers, got {}",
            expected,
            values.len()
        ));
    }
    Ok(values)
}

fn parse_pair(s: &str) -> Result<(f64, f64), String> {
    let v = parse_numbers(s, &[2])?;
    Ok((v[0], v[1]))
}

fn parse_size(s: &str) -> Result<MapSize, String> {
    let v = parse_numbers(s, &[1, 2])?;
    let size = MapSize::new(v[0], *v.get(1).unwrap_or(&v[0]));
    size.validate_cell().map_err(|e| e.to_string())?;
    Ok(size)
}

fn parse_rect(s: &str) -> Result<MapRect, String> {
    let v = parse_numbers(s, &[4])?;
    let rect = MapRect::new(v[0], v[1], v[2], v[3]);
    rect.validate().map_err(|e| e.to_string())?;
    Ok(rect)
}
