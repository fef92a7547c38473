use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use flexi_logger::{Logger, LoggerHandle};
use image::{GrayImage, Rgb, RgbImage};
use log::info;
use serde::Serialize;
use tc_core::{BACKGROUND, Grid, Label, MAX_DIM, Shape};
use tc_relabel::{
    CarveConfig, CarveOutcome, DistanceOrder, LabelSet, PriorityPolicy, RelabelConfig,
    RelabelStats, Relabeler, carve_inside, carve_outside,
};
use tc_topology::{ConnectivitySpec, TopologySummary};

#[derive(Parser, Debug)]
#[command(name = "tc_gallery")]
#[command(about = "Run topology-control algorithms on PNG label fixtures")]
struct Cli {
    /// Log filter, e.g. `info` or `tc_relabel=trace`.
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(name = "relabel")]
    Relabel(RelabelArgs),
    #[command(name = "carve_inside")]
    CarveInside(CarveArgs),
    #[command(name = "carve_outside")]
    CarveOutside(CarveArgs),
}

#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// 8-bit grayscale PNG; gray values are labels, 0 is background.
    #[arg(long, required = true)]
    input: PathBuf,
    #[arg(long, default_value = "docs/fig/raw")]
    out: PathBuf,
    /// Foreground adjacency (4 or 8); the background takes the other one.
    #[arg(long, default_value_t = 8)]
    connectivity: usize,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum PriorityArg {
    Farthest,
    Nearest,
    Lexicographic,
}

#[derive(Args, Debug, Clone)]
struct RelabelArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Target label PNG of the same size as the input.
    #[arg(long, required = true)]
    target: PathBuf,
    #[arg(long, value_enum, default_value_t = PriorityArg::Farthest)]
    priority: PriorityArg,
    #[arg(long, default_value_t = false)]
    parallel: bool,
    #[arg(long)]
    max_flips: Option<usize>,
}

#[derive(Args, Debug, Clone)]
struct CarveArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(long, default_value_t = 1)]
    inside: Label,
    #[arg(long, default_value_t = 1)]
    radius: usize,
    /// Optional binary PNG replacing the ball erosion/dilation.
    #[arg(long)]
    mask: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
struct StatsDto {
    seeded: usize,
    flips: usize,
    rejected: usize,
    stale_discarded: usize,
    contested: usize,
    residual_mismatches: usize,
    budget_exhausted: bool,
    introduced_labels: Vec<Label>,
}

impl From<&RelabelStats> for StatsDto {
    fn from(s: &RelabelStats) -> Self {
        Self {
            seeded: s.seeded,
            flips: s.flips,
            rejected: s.rejected,
            stale_discarded: s.stale_discarded,
            contested: s.contested,
            residual_mismatches: s.residual_mismatches,
            budget_exhausted: s.budget_exhausted,
            introduced_labels: s.introduced_labels.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct SummaryDto {
    label: Label,
    components: usize,
    background_components: usize,
    holes: usize,
    euler: i64,
}

impl SummaryDto {
    fn of(grid: &Grid<Label>, label: Label, spec: &ConnectivitySpec) -> Self {
        let s = TopologySummary::of(grid, label, spec);
        Self {
            label,
            components: s.components,
            background_components: s.background_components,
            holes: s.cavities,
            euler: s.euler,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct MetaRelabel {
    width: usize,
    height: usize,
    connectivity: [usize; 2],
    priority: &'static str,
    parallel: bool,
    max_flips: Option<usize>,
    stats: StatsDto,
    topology_before: Vec<SummaryDto>,
    topology_after: Vec<SummaryDto>,
    topology_target: Vec<SummaryDto>,
}

#[derive(Debug, Clone, Serialize)]
struct MetaCarve {
    operation: &'static str,
    width: usize,
    height: usize,
    connectivity: [usize; 2],
    inside: Label,
    radius: usize,
    mask: bool,
    stats: StatsDto,
    topology_before: SummaryDto,
    topology_after: SummaryDto,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _logger = setup_logging(&cli.log_level)?;

    match cli.cmd {
        Command::Relabel(args) => run_relabel(args),
        Command::CarveInside(args) => run_carve(args, "carve_inside"),
        Command::CarveOutside(args) => run_carve(args, "carve_outside"),
    }
}

fn setup_logging(level: &str) -> Result<LoggerHandle> {
    Logger::try_with_str(level)
        .with_context(|| format!("parsing log level '{level}'"))?
        .log_to_stderr()
        .start()
        .context("starting logger")
}

fn run_relabel(args: RelabelArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "relabel")?;
    let spec = connectivity_spec(args.common.connectivity)?;
    let mut grid = load_labels(&args.common.input)?;
    let target = load_labels(&args.target)?;
    if grid.shape() != target.shape() {
        bail!(
            "target size {} does not match input size {}.",
            target.shape(),
            grid.shape()
        );
    }

    let (priority, priority_name) = match args.priority {
        PriorityArg::Lexicographic => (PriorityPolicy::Lexicographic, "lexicographic"),
        PriorityArg::Farthest => (PriorityPolicy::default(), "target_distance_farthest"),
        PriorityArg::Nearest => (
            PriorityPolicy::TargetDistance {
                spacing: [1.0; MAX_DIM],
                order: DistanceOrder::Nearest,
            },
            "target_distance_nearest",
        ),
    };

    let mut labels = LabelSet::of(&grid);
    labels.extend_from(&target);
    let summarize = |g: &Grid<Label>| -> Vec<SummaryDto> {
        labels.iter().map(|l| SummaryDto::of(g, l, &spec)).collect()
    };
    let topology_before = summarize(&grid);
    let topology_target = summarize(&target);

    let relabeler = Relabeler::new(RelabelConfig {
        parallel: args.parallel,
        max_flips: args.max_flips,
        ..RelabelConfig::default()
    });
    let stats = relabeler
        .run(&mut grid, &target, &spec, &priority)
        .context("running relabel")?;
    info!(
        "relabel: {} flips, {} rejected, {} cells left off target",
        stats.flips, stats.rejected, stats.residual_mismatches
    );

    save_labels(case_dir.join("output.png"), &grid)?;
    save_rgb(
        case_dir.join("residual.png"),
        &render_residual(&grid, &target),
    )?;

    let (width, height) = plane_size(&grid)?;
    write_json(
        case_dir.join("meta.json"),
        &MetaRelabel {
            width,
            height,
            connectivity: connectivity_counts(&spec),
            priority: priority_name,
            parallel: args.parallel,
            max_flips: args.max_flips,
            stats: StatsDto::from(&stats),
            topology_after: summarize(&grid),
            topology_before,
            topology_target,
        },
    )?;

    Ok(())
}

fn run_carve(args: CarveArgs, operation: &'static str) -> Result<()> {
    let case_dir = prepare_case(&args.common, operation)?;
    let spec = connectivity_spec(args.common.connectivity)?;
    let input = load_labels(&args.common.input)?;
    let mask = match &args.mask {
        Some(path) => Some(load_labels(path)?.map(|&l| u8::from(l != BACKGROUND))),
        None => None,
    };

    let cfg = CarveConfig {
        inside: args.inside,
        radius: args.radius,
        connectivity: Some(spec.clone()),
        ..CarveConfig::default()
    };
    let CarveOutcome { output, stats } = if operation == "carve_inside" {
        carve_inside(&input, &cfg, mask.as_ref())
    } else {
        carve_outside(&input, &cfg, mask.as_ref())
    }
    .with_context(|| format!("running {operation}"))?;
    info!(
        "{operation}: {} flips, {} rejected",
        stats.flips, stats.rejected
    );

    save_labels(case_dir.join("output.png"), &output)?;

    let (width, height) = plane_size(&input)?;
    write_json(
        case_dir.join("meta.json"),
        &MetaCarve {
            operation,
            width,
            height,
            connectivity: connectivity_counts(&spec),
            inside: args.inside,
            radius: args.radius,
            mask: args.mask.is_some(),
            stats: StatsDto::from(&stats),
            topology_before: SummaryDto::of(&input, args.inside, &spec),
            topology_after: SummaryDto::of(&output, args.inside, &spec),
        },
    )?;

    Ok(())
}

fn connectivity_spec(foreground: usize) -> Result<ConnectivitySpec> {
    let background = match foreground {
        8 => 4,
        4 => 8,
        other => bail!("connectivity must be 4 or 8, got {other}."),
    };
    ConnectivitySpec::from_counts(2, foreground, background).context("building connectivity pair")
}

fn connectivity_counts(spec: &ConnectivitySpec) -> [usize; 2] {
    [
        spec.foreground().neighbor_count(),
        spec.background().neighbor_count(),
    ]
}

fn prepare_case(common: &CommonArgs, case_name: &str) -> Result<PathBuf> {
    ensure_file_exists(&common.input, "input")?;

    let case_dir = common.out.join(case_name);
    fs::create_dir_all(&case_dir)
        .with_context(|| format!("creating output directory {}", case_dir.display()))?;

    fs::copy(&common.input, case_dir.join("input.png")).with_context(|| {
        format!(
            "copying input {} -> {}",
            common.input.display(),
            case_dir.join("input.png").display()
        )
    })?;

    Ok(case_dir)
}

fn load_labels(path: &Path) -> Result<Grid<Label>> {
    ensure_file_exists(path, "label")?;
    let dyn_img =
        image::open(path).with_context(|| format!("opening label image {}", path.display()))?;
    let luma = dyn_img.to_luma8();
    let (w, h) = luma.dimensions();
    let data = luma.into_raw().into_iter().map(Label::from).collect();

    Grid::from_vec(Shape::plane(w as usize, h as usize), data)
        .with_context(|| format!("constructing label grid from {}", path.display()))
}

fn plane_size(grid: &Grid<Label>) -> Result<(usize, usize)> {
    let shape = grid.shape();
    if shape.ndim() != 2 {
        bail!("expected a 2D grid, got {shape}.");
    }
    Ok((shape.extent(0), shape.extent(1)))
}

fn save_labels(path: PathBuf, grid: &Grid<Label>) -> Result<()> {
    let (width, height) = plane_size(grid)?;
    let data = grid
        .data()
        .iter()
        .map(|&l| u8::try_from(l).context("label does not fit in 8 bits"))
        .collect::<Result<Vec<u8>>>()?;
    let gray = GrayImage::from_raw(width as u32, height as u32, data)
        .context("constructing GrayImage from raw bytes")?;
    gray.save(&path)
        .with_context(|| format!("saving image {}", path.display()))
}

fn save_rgb(path: PathBuf, img: &RgbImage) -> Result<()> {
    img.save(&path)
        .with_context(|| format!("saving image {}", path.display()))
}

/// Gray label image with cells that missed their target painted red.
fn render_residual(grid: &Grid<Label>, target: &Grid<Label>) -> RgbImage {
    let shape = grid.shape();
    let (width, height) = (shape.extent(0), shape.extent(1));
    let max_label = grid.data().iter().copied().max().unwrap_or(0).max(1);

    let mut rgb = RgbImage::new(width as u32, height as u32);
    for (idx, (&l, &t)) in grid.data().iter().zip(target.data()).enumerate() {
        let x = (idx % width) as u32;
        let y = (idx / width) as u32;
        let color = if l != t {
            Rgb([255, 64, 64])
        } else {
            let v = (l as f32 / max_label as f32 * 200.0).round() as u8;
            Rgb([v, v, v])
        };
        rgb.put_pixel(x, y, color);
    }
    rgb
}

fn write_json(path: PathBuf, value: &impl Serialize) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).context("serializing json")?;
    fs::write(&path, bytes).with_context(|| format!("writing json {}", path.display()))
}

fn ensure_file_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        bail!("{} file does not exist: {}", what, path.display());
    }
    if !path.is_file() {
        bail!("{} path is not a file: {}", what, path.display());
    }
    Ok(())
}
