//! Topology-preserving relabeling of label grids.
//!
//! Given a current label grid and a target field (for example the output of a
//! resampler), [`Relabeler`] moves every cell toward its target label, but
//! only through changes that are simple for every label involved. Cells are
//! visited in a deterministic priority order ([`PriorityPolicy`]); a change
//! re-queues the neighborhood, and stale queue entries are dropped by
//! generation stamp. Rejected changes are counted, never reported as errors.
//!
//! Determinism: the result depends only on the inputs, the connectivity pair,
//! the border mode and the priority policy. Parallel runs split the work into
//! mismatch regions that cannot see each other and produce the same grid as
//! the sequential run.
//!
//! [`carve_inside`] and [`carve_outside`] build on the engine to remove thin
//! handles or close narrow holes of a binary mask while keeping the topology
//! of an eroded core or a dilated envelope.

pub mod carve;
pub mod conflict;
pub mod engine;
pub mod labels;
pub mod partition;
pub mod queue;
pub mod store;

pub use carve::{CarveConfig, CarveOutcome, carve_inside, carve_outside};
pub use conflict::{Decision, Resolution, is_contested, resolve};
pub use engine::{RelabelConfig, RelabelStats, Relabeler, relabel};
pub use labels::LabelSet;
pub use partition::partition_mismatches;
pub use queue::{DistanceOrder, PriorityKeys, PriorityPolicy, QueueEntry, Scheduler};
pub use store::{LabelStore, Overlay};
