//! Priority scheduling of candidate cells.
//!
//! Entries carry a generation stamp. Re-queueing or invalidating a cell bumps
//! its generation, so older heap entries for it are discarded on pop instead
//! of being searched for and removed.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;
use tc_core::{BorderMode, Error, Grid, Label, MAX_DIM};
use tc_morph::{euclidean_distance, euclidean_distance_framed};

/// Which end of the distance range is processed first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DistanceOrder {
    /// Cells deep inside their target region first; the change grows from
    /// the core toward the region boundary.
    #[default]
    Farthest,
    /// Cells close to a target boundary first.
    Nearest,
}

/// Visiting order of candidate cells.
///
/// Ties are always broken by ascending linear index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriorityPolicy {
    /// Ascending linear index (x fastest, then y, then z).
    Lexicographic,
    /// Euclidean distance, within the target field, from the cell to the
    /// nearest cell whose target label differs. Under a constant border the
    /// outside counts as carrying the border label.
    TargetDistance {
        spacing: [f32; MAX_DIM],
        order: DistanceOrder,
    },
}

impl Default for PriorityPolicy {
    fn default() -> Self {
        Self::TargetDistance {
            spacing: [1.0; MAX_DIM],
            order: DistanceOrder::Farthest,
        }
    }
}

impl PriorityPolicy {
    /// Rejects spacings that are not finite and positive on the real axes.
    pub fn validate(&self, ndim: usize) -> Result<(), Error> {
        if let PriorityPolicy::TargetDistance { spacing, .. } = self
            && let Some(axis) = (0..ndim.min(MAX_DIM))
                .find(|&a| !(spacing[a].is_finite() && spacing[a] > 0.0))
        {
            return Err(Error::InvalidSpacing { axis });
        }
        Ok(())
    }

    /// Precomputes the key of every cell whose label differs between `grid`
    /// and `target`. Larger keys pop first.
    pub fn keys(
        &self,
        grid: &Grid<Label>,
        target: &Grid<Label>,
        border: &BorderMode<Label>,
    ) -> PriorityKeys {
        match *self {
            PriorityPolicy::Lexicographic => PriorityKeys::Uniform,
            PriorityPolicy::TargetDistance { spacing, order } => {
                let shape = target.shape();
                let goal = target.data();
                let mut wanted: Vec<Label> = grid
                    .data()
                    .iter()
                    .zip(goal)
                    .filter(|(c, t)| c != t)
                    .map(|(_, &t)| t)
                    .collect();
                wanted.sort_unstable();
                wanted.dedup();

                let mut keys = vec![0.0f32; shape.len()];
                for &label in &wanted {
                    let is_feature = |i: usize| goal[i] != label;
                    let dist = match border {
                        BorderMode::Constant(outside) if *outside != label => {
                            euclidean_distance_framed(shape, spacing, is_feature)
                        }
                        _ => euclidean_distance(shape, spacing, is_feature),
                    };
                    for (i, (&t, &d)) in goal.iter().zip(dist.data()).enumerate() {
                        if t == label {
                            keys[i] = match order {
                                DistanceOrder::Farthest => d,
                                DistanceOrder::Nearest => -d,
                            };
                        }
                    }
                }
                PriorityKeys::Table(keys)
            }
        }
    }
}

/// Per-cell priority keys.
#[derive(Debug, Clone, PartialEq)]
pub enum PriorityKeys {
    Uniform,
    Table(Vec<f32>),
}

impl PriorityKeys {
    pub fn key(&self, index: usize) -> f32 {
        match self {
            PriorityKeys::Uniform => 0.0,
            PriorityKeys::Table(keys) => keys[index],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct QueueEntry {
    pub key: f32,
    pub index: usize,
    pub generation: u32,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    // max-heap: larger key first, then smaller index
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .total_cmp(&other.key)
            .then_with(|| other.index.cmp(&self.index))
            .then_with(|| self.generation.cmp(&other.generation))
    }
}

#[derive(Debug, Clone)]
enum Generations {
    Dense(Vec<u32>),
    Sparse(FxHashMap<usize, u32>),
}

impl Generations {
    fn get(&self, index: usize) -> u32 {
        match self {
            Generations::Dense(v) => v[index],
            Generations::Sparse(m) => m.get(&index).copied().unwrap_or(0),
        }
    }

    fn bump(&mut self, index: usize) -> u32 {
        let slot = match self {
            Generations::Dense(v) => &mut v[index],
            Generations::Sparse(m) => m.entry(index).or_insert(0),
        };
        *slot = slot.wrapping_add(1);
        *slot
    }
}

/// Max-priority queue of cells with lazy invalidation.
#[derive(Debug, Clone)]
pub struct Scheduler {
    heap: BinaryHeap<QueueEntry>,
    generations: Generations,
    stale: usize,
}

impl Scheduler {
    /// Scheduler with a generation slot per cell of a grid of `len` cells.
    pub fn dense(len: usize) -> Self {
        Self {
            heap: BinaryHeap::new(),
            generations: Generations::Dense(vec![0; len]),
            stale: 0,
        }
    }

    /// Scheduler that tracks generations only for cells it has seen.
    pub fn sparse() -> Self {
        Self {
            heap: BinaryHeap::new(),
            generations: Generations::Sparse(FxHashMap::default()),
            stale: 0,
        }
    }

    /// Queues `index`, superseding any earlier entry for it.
    pub fn push(&mut self, index: usize, key: f32) {
        let generation = self.generations.bump(index);
        self.heap.push(QueueEntry {
            key,
            index,
            generation,
        });
    }

    /// Drops any queued entry for `index`.
    pub fn invalidate(&mut self, index: usize) {
        self.generations.bump(index);
    }

    pub fn is_current(&self, entry: &QueueEntry) -> bool {
        self.generations.get(entry.index) == entry.generation
    }

    /// Highest-priority current entry; stale entries are discarded on the way.
    pub fn pop(&mut self) -> Option<QueueEntry> {
        while let Some(entry) = self.heap.pop() {
            if self.is_current(&entry) {
                return Some(entry);
            }
            self.stale += 1;
        }
        None
    }

    /// Heap size, including entries that will turn out stale.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn stale_discarded(&self) -> usize {
        self.stale
    }
}

#[cfg(test)]
mod tests {
    use tc_core::{BorderMode, Error, Grid, Label, Shape};

    use super::{DistanceOrder, PriorityKeys, PriorityPolicy, Scheduler};

    #[test]
    fn pops_by_key_then_index() {
        let mut q = Scheduler::dense(8);
        q.push(5, 1.0);
        q.push(2, 1.0);
        q.push(7, 3.0);
        q.push(0, -1.0);

        let order: Vec<usize> = std::iter::from_fn(|| q.pop()).map(|e| e.index).collect();
        assert_eq!(order, vec![7, 2, 5, 0]);
    }

    #[test]
    fn requeue_discards_stale_entry() {
        for mut q in [Scheduler::dense(4), Scheduler::sparse()] {
            q.push(1, 5.0);
            q.push(1, 0.5);
            q.push(2, 1.0);
            q.push(3, 2.0);
            q.invalidate(3);

            let first = q.pop().expect("entry");
            assert_eq!(first.index, 2);
            let second = q.pop().expect("entry");
            assert_eq!((second.index, second.key), (1, 0.5));
            assert!(q.pop().is_none());
            assert_eq!(q.stale_discarded(), 2);
        }
    }

    #[test]
    fn infinite_keys_order_totally() {
        let mut q = Scheduler::sparse();
        q.push(4, f32::NEG_INFINITY);
        q.push(3, f32::INFINITY);
        q.push(9, 0.0);

        let order: Vec<usize> = std::iter::from_fn(|| q.pop()).map(|e| e.index).collect();
        assert_eq!(order, vec![3, 9, 4]);
    }

    #[test]
    fn target_distance_keys_cover_mismatched_labels() {
        // target: left column 0, the rest 1; grid all 0. The outside carries
        // label 1 too, so only the left column is a feature.
        let shape = Shape::plane(4, 1);
        let grid: Grid<Label> = Grid::new_fill(shape, 0);
        let target: Grid<Label> = Grid::from_vec(shape, vec![0, 1, 1, 1]).expect("valid grid");
        let border = BorderMode::Constant(1);

        let far = PriorityPolicy::default().keys(&grid, &target, &border);
        let PriorityKeys::Table(keys) = far else {
            panic!("expected a key table");
        };
        assert_eq!(&keys[1..], &[1.0, 2.0, 3.0]);

        let near = PriorityPolicy::TargetDistance {
            spacing: [2.0, 1.0, 1.0],
            order: DistanceOrder::Nearest,
        }
        .keys(&grid, &target, &border);
        assert_eq!(near.key(1), -2.0);
        assert_eq!(near.key(3), -6.0);

        assert_eq!(
            PriorityPolicy::Lexicographic.keys(&grid, &target, &border),
            PriorityKeys::Uniform
        );
    }

    #[test]
    fn background_outside_bounds_target_depth() {
        // a 7x7 object of label 1 touching the left, top and bottom edges
        let shape = Shape::plane(7, 7);
        let grid: Grid<Label> = Grid::new_fill(shape, 0);
        let data = (0..shape.len()).map(|i| Label::from(shape.coord_of(i)[0] < 6)).collect();
        let target = Grid::from_vec(shape, data).expect("valid grid");

        let keys = PriorityPolicy::default().keys(&grid, &target, &BorderMode::default());
        let row: Vec<f32> = (0..6).map(|x| keys.key(shape.index_of([x, 3, 0]))).collect();
        assert_eq!(row, vec![1.0, 2.0, 3.0, 3.0, 2.0, 1.0]);

        // a reflected border has no outside, so depth only counts label 0
        let reflected = PriorityPolicy::default().keys(&grid, &target, &BorderMode::Reflect101);
        assert_eq!(reflected.key(shape.index_of([0, 3, 0])), 6.0);
    }

    #[test]
    fn uniform_target_gets_finite_keys() {
        let shape = Shape::plane(5, 5);
        let grid: Grid<Label> = Grid::new_fill(shape, 0);
        let target: Grid<Label> = Grid::new_fill(shape, 1);

        let keys = PriorityPolicy::default().keys(&grid, &target, &BorderMode::default());
        assert_eq!(keys.key(shape.index_of([0, 0, 0])), 1.0);
        assert_eq!(keys.key(shape.index_of([2, 2, 0])), 3.0);
    }

    #[test]
    fn spacing_must_be_finite_and_positive() {
        assert!(PriorityPolicy::default().validate(3).is_ok());
        assert!(PriorityPolicy::Lexicographic.validate(3).is_ok());

        for (spacing, axis) in [
            ([0.0, 1.0, 1.0], 0),
            ([1.0, -2.0, 1.0], 1),
            ([1.0, 1.0, f32::NAN], 2),
            ([1.0, f32::INFINITY, 1.0], 1),
        ] {
            let policy = PriorityPolicy::TargetDistance {
                spacing,
                order: DistanceOrder::Farthest,
            };
            assert_eq!(policy.validate(3), Err(Error::InvalidSpacing { axis }));
        }

        // axes past the grid dimensionality are never read
        let planar = PriorityPolicy::TargetDistance {
            spacing: [1.0, 1.0, 0.0],
            order: DistanceOrder::Nearest,
        };
        assert!(planar.validate(2).is_ok());
    }
}
