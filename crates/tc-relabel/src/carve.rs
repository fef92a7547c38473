//! Topology repair of binary masks by carving.
//!
//! [`carve_inside`] starts from the mask eroded by a ball and grows it back
//! into the original shape, so handles and bridges thinner than the ball
//! never reappear. [`carve_outside`] starts from the mask dilated by a ball
//! and peels it back, so holes and tunnels narrower than the ball stay
//! closed. Both move cells in order of decreasing distance to the target
//! boundary.

use log::debug;
use tc_core::{BACKGROUND, BorderMode, Error, Grid, Label, MAX_DIM};
use tc_morph::{dilate_ball, erode_ball};
use tc_topology::ConnectivitySpec;

use crate::engine::{RelabelConfig, RelabelStats, Relabeler};
use crate::queue::{DistanceOrder, PriorityPolicy};

#[derive(Debug, Clone, PartialEq)]
pub struct CarveConfig {
    /// Label of the object; every other label is outside.
    pub inside: Label,
    /// Ball radius in cells.
    pub radius: usize,
    /// Physical cell size per axis, used for the visiting order.
    pub spacing: [f32; MAX_DIM],
    /// Connectivity pair; the default pair of the grid's dimensionality
    /// when `None`.
    pub connectivity: Option<ConnectivitySpec>,
    pub border: BorderMode<Label>,
}

impl Default for CarveConfig {
    fn default() -> Self {
        Self {
            inside: 1,
            radius: 1,
            spacing: [1.0; MAX_DIM],
            connectivity: None,
            border: BorderMode::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CarveOutcome {
    pub output: Grid<Label>,
    pub stats: RelabelStats,
}

/// Removes thin parts of the `cfg.inside` object.
///
/// The seed is `mask` restricted to the object, or the object eroded by a
/// ball of `cfg.radius` when no mask is given. The output holds `cfg.inside`
/// where the seed grew back and background elsewhere.
pub fn carve_inside(
    input: &Grid<Label>,
    cfg: &CarveConfig,
    mask: Option<&Grid<u8>>,
) -> Result<CarveOutcome, Error> {
    let object = input.map(|&l| u8::from(l == cfg.inside));
    let seed = match mask {
        Some(m) => {
            check_mask(input, m)?;
            let data = m
                .data()
                .iter()
                .zip(object.data())
                .map(|(&m, &o)| u8::from(m != 0 && o != 0))
                .collect();
            Grid::from_vec(input.shape(), data)?
        }
        None => erode_ball(&object, cfg.radius),
    };

    let mut grid = binary_labels(&seed, cfg.inside);
    let target = binary_labels(&object, cfg.inside);
    let stats = carve(&mut grid, &target, cfg)?;
    debug!("carve inside: {} cells regrown, {} refused", stats.flips, stats.rejected);

    Ok(CarveOutcome {
        output: grid,
        stats,
    })
}

/// Closes narrow holes and tunnels of the `cfg.inside` object.
///
/// The start is `mask` united with the object, or the object dilated by a
/// ball of `cfg.radius` when no mask is given. Cells of the start that could
/// not be peeled off carry `cfg.inside` in the output; every other cell keeps
/// its input label.
pub fn carve_outside(
    input: &Grid<Label>,
    cfg: &CarveConfig,
    mask: Option<&Grid<u8>>,
) -> Result<CarveOutcome, Error> {
    let object = input.map(|&l| u8::from(l == cfg.inside));
    let shell = match mask {
        Some(m) => {
            check_mask(input, m)?;
            let data = m
                .data()
                .iter()
                .zip(object.data())
                .map(|(&m, &o)| u8::from(m != 0 || o != 0))
                .collect();
            Grid::from_vec(input.shape(), data)?
        }
        None => dilate_ball(&object, cfg.radius),
    };

    let mut grid = binary_labels(&shell, cfg.inside);
    let target = binary_labels(&object, cfg.inside);
    let stats = carve(&mut grid, &target, cfg)?;
    debug!("carve outside: {} cells peeled, {} kept", stats.flips, stats.residual_mismatches);

    let data = grid
        .data()
        .iter()
        .zip(input.data())
        .map(|(&g, &orig)| if g == cfg.inside { cfg.inside } else { orig })
        .collect();
    Ok(CarveOutcome {
        output: Grid::from_vec(input.shape(), data)?,
        stats,
    })
}

fn carve(
    grid: &mut Grid<Label>,
    target: &Grid<Label>,
    cfg: &CarveConfig,
) -> Result<RelabelStats, Error> {
    let spec = match &cfg.connectivity {
        Some(spec) => spec.clone(),
        None => ConnectivitySpec::for_dim(grid.ndim())?,
    };
    let priority = PriorityPolicy::TargetDistance {
        spacing: cfg.spacing,
        order: DistanceOrder::Farthest,
    };
    Relabeler::new(RelabelConfig {
        border: cfg.border.clone(),
        ..RelabelConfig::default()
    })
    .run(grid, target, &spec, &priority)
}

fn check_mask(input: &Grid<Label>, mask: &Grid<u8>) -> Result<(), Error> {
    if input.shape() != mask.shape() {
        return Err(Error::ShapeMismatch {
            expected: input.shape(),
            actual: mask.shape(),
        });
    }
    Ok(())
}

fn binary_labels(mask: &Grid<u8>, inside: Label) -> Grid<Label> {
    mask.map(|&v| if v != 0 { inside } else { BACKGROUND })
}
