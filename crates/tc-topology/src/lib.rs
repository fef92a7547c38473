//! Local and global digital topology of label grids.
//!
//! - [`ConnectivitySpec`] fixes a complementary adjacency pair: (8, 4) or
//!   (4, 8) in 2D, (26, 6) or (6, 26) in 3D. Foreground labels use the first
//!   adjacency, the background label uses the second.
//! - [`Neighborhood`] is the 3x3(x3) block around a cell, read through a
//!   [`tc_core::BorderMode`].
//! - [`classify`] counts components touching the center before and after a
//!   hypothetical label change; [`is_admissible`] turns that into the
//!   multi-label simple-point test.
//! - [`TopologySummary`] counts components, cavities, tunnels and the Euler
//!   characteristic of a whole label by global traversal. It is independent of
//!   the local machinery and is what tests use to check invariance.

mod connectivity;
mod neighborhood;
mod simple;
mod summary;

pub use connectivity::{AdjacencyTable, Connectivity, ConnectivitySpec};
pub use neighborhood::{
    CENTER, CUBE_CELLS, LabelSource, Neighborhood, cube_index, validate_border,
};
pub use simple::{
    Classification, ComponentCounts, classify, first_violation, is_admissible, is_simple,
};
pub use summary::TopologySummary;
