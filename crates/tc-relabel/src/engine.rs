use log::{debug, trace, warn};
use rayon::prelude::*;
use tc_core::{BorderMode, Error, Grid, Label, MAX_DIM};
use tc_topology::{ConnectivitySpec, Neighborhood, validate_border};

use crate::conflict::{Resolution, resolve};
use crate::labels::LabelSet;
use crate::partition::partition_mismatches;
use crate::queue::{PriorityKeys, PriorityPolicy, Scheduler};
use crate::store::{LabelStore, Overlay};

/// Options for [`Relabeler`].
#[derive(Debug, Clone, PartialEq)]
pub struct RelabelConfig {
    /// Labels read outside the grid.
    pub border: BorderMode<Label>,
    /// Process independent mismatch regions on the rayon pool.
    pub parallel: bool,
    /// Stop after this many accepted changes.
    pub max_flips: Option<usize>,
}

impl Default for RelabelConfig {
    fn default() -> Self {
        Self {
            border: BorderMode::default(),
            parallel: false,
            max_flips: None,
        }
    }
}

/// Counters of one relabeling run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelabelStats {
    /// Candidates queued at initialization.
    pub seeded: usize,
    /// Accepted label changes.
    pub flips: usize,
    /// Changes refused because they would alter some label's topology.
    pub rejected: usize,
    /// Queue entries dropped because the cell was re-queued or settled.
    pub stale_discarded: usize,
    /// Decisions taken where three or more labels met.
    pub contested: usize,
    /// Cells still differing from the target after the run.
    pub residual_mismatches: usize,
    /// The run stopped at `max_flips` with work left.
    pub budget_exhausted: bool,
    /// Target labels absent from the initial grid. Such labels can never be
    /// introduced, since a new component is never simple.
    pub introduced_labels: Vec<Label>,
}

impl RelabelStats {
    fn absorb(&mut self, other: &RelabelStats) {
        self.seeded += other.seeded;
        self.flips += other.flips;
        self.rejected += other.rejected;
        self.stale_discarded += other.stale_discarded;
        self.contested += other.contested;
        self.budget_exhausted |= other.budget_exhausted;
    }
}

/// Moves a label grid toward a target field through topology-preserving
/// single-cell changes.
#[derive(Debug, Clone, Default)]
pub struct Relabeler {
    cfg: RelabelConfig,
}

impl Relabeler {
    pub fn new(cfg: RelabelConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &RelabelConfig {
        &self.cfg
    }

    /// Relabels `grid` in place.
    ///
    /// Every accepted change is simple for both the old and the new label of
    /// the cell, so the components, cavities and tunnels of every label are
    /// those of the input grid. Cells whose target cannot be reached keep
    /// their label and are reported in [`RelabelStats::residual_mismatches`].
    /// All validation happens before the grid is touched.
    pub fn run(
        &self,
        grid: &mut Grid<Label>,
        target: &Grid<Label>,
        spec: &ConnectivitySpec,
        priority: &PriorityPolicy,
    ) -> Result<RelabelStats, Error> {
        validate(grid, target, spec, &self.cfg.border)?;
        priority.validate(grid.ndim())?;

        let introduced = LabelSet::of(target).missing_from(&LabelSet::of(grid));
        if !introduced.is_empty() {
            warn!("target labels {introduced:?} are absent from the grid and cannot be introduced");
        }

        let keys = priority.keys(grid, target, &self.cfg.border);
        let run = LoopParams {
            target,
            spec,
            border: &self.cfg.border,
            keys: &keys,
            offsets: spec.neighborhood_offsets(),
        };

        // a flip budget is global, so it forces a single queue
        let mut stats = if self.cfg.parallel && self.cfg.max_flips.is_none() {
            run_partitioned(grid, &run)
        } else {
            let mut sched = Scheduler::dense(grid.len());
            run.drive(grid, 0..target.len(), &mut sched, self.cfg.max_flips)
        };

        stats.residual_mismatches = grid
            .data()
            .iter()
            .zip(target.data())
            .filter(|(c, t)| c != t)
            .count();
        stats.introduced_labels = introduced;

        debug!(
            "relabel {} ({} border): seeded {}, flips {}, rejected {}, stale {}, contested {}, \
             residual {}",
            grid.shape(),
            self.cfg.border.name(),
            stats.seeded,
            stats.flips,
            stats.rejected,
            stats.stale_discarded,
            stats.contested,
            stats.residual_mismatches
        );
        Ok(stats)
    }
}

/// Relabels `grid` toward `target` with the default configuration.
pub fn relabel(
    grid: &mut Grid<Label>,
    target: &Grid<Label>,
    spec: &ConnectivitySpec,
    priority: &PriorityPolicy,
) -> Result<RelabelStats, Error> {
    Relabeler::default().run(grid, target, spec, priority)
}

fn validate(
    grid: &Grid<Label>,
    target: &Grid<Label>,
    spec: &ConnectivitySpec,
    border: &BorderMode<Label>,
) -> Result<(), Error> {
    if grid.ndim() != spec.dim() {
        return Err(Error::DimensionMismatch {
            expected: spec.dim(),
            actual: grid.ndim(),
        });
    }
    if grid.shape() != target.shape() {
        return Err(Error::ShapeMismatch {
            expected: grid.shape(),
            actual: target.shape(),
        });
    }
    validate_border(grid.shape(), border)
}

fn run_partitioned(grid: &mut Grid<Label>, run: &LoopParams<'_>) -> RelabelStats {
    let parts = partition_mismatches(grid, run.target);
    debug!("relabel: {} independent regions", parts.len());

    let shared: &Grid<Label> = grid;
    let results: Vec<(Vec<(usize, Label)>, RelabelStats)> = parts
        .par_iter()
        .map(|part| {
            let mut overlay = Overlay::new(shared);
            let mut sched = Scheduler::sparse();
            let stats = run.drive(&mut overlay, part.iter().copied(), &mut sched, None);
            (overlay.into_writes(), stats)
        })
        .collect();

    let mut stats = RelabelStats::default();
    for (writes, part_stats) in results {
        for (idx, label) in writes {
            grid.data_mut()[idx] = label;
        }
        stats.absorb(&part_stats);
    }
    stats
}

struct LoopParams<'a> {
    target: &'a Grid<Label>,
    spec: &'a ConnectivitySpec,
    border: &'a BorderMode<Label>,
    keys: &'a PriorityKeys,
    offsets: Vec<[isize; MAX_DIM]>,
}

impl LoopParams<'_> {
    /// Seeds boundary mismatches among `candidates` and drains the queue.
    fn drive<S: LabelStore>(
        &self,
        store: &mut S,
        candidates: impl IntoIterator<Item = usize>,
        sched: &mut Scheduler,
        max_flips: Option<usize>,
    ) -> RelabelStats {
        let shape = self.target.shape();
        let goal = self.target.data();
        let mut stats = RelabelStats::default();

        for idx in candidates {
            let current = store.label(idx);
            if current == goal[idx] {
                continue;
            }
            let nbhd = Neighborhood::gather(&*store, shape.coord_of(idx), self.border);
            if self.offsets.iter().any(|&d| nbhd.at(d) != current) {
                sched.push(idx, self.keys.key(idx));
                stats.seeded += 1;
            }
        }

        while let Some(entry) = sched.pop() {
            if max_flips.is_some_and(|max| stats.flips >= max) {
                stats.budget_exhausted = true;
                break;
            }

            let idx = entry.index;
            let current = store.label(idx);
            let wanted = goal[idx];
            if current == wanted {
                continue;
            }

            let coord = shape.coord_of(idx);
            let nbhd = Neighborhood::gather(&*store, coord, self.border);
            let decision = resolve(&nbhd, self.spec, current, wanted);
            if decision.contested {
                stats.contested += 1;
            }

            match decision.resolution {
                Resolution::Claim(label) => {
                    store.set(idx, label);
                    stats.flips += 1;
                    sched.invalidate(idx);
                    for &d in &self.offsets {
                        let Some(n) = shape.offset(coord, d) else {
                            continue;
                        };
                        let ni = shape.index_of(n);
                        if store.label(ni) != goal[ni] {
                            sched.push(ni, self.keys.key(ni));
                        } else {
                            sched.invalidate(ni);
                        }
                    }
                }
                Resolution::Keep { label, blocked_by } => {
                    stats.rejected += 1;
                    trace!(
                        "keep {label} at {coord:?}: {wanted} would change topology of {blocked_by}"
                    );
                }
            }
        }

        stats.stale_discarded = sched.stale_discarded();
        stats
    }
}
