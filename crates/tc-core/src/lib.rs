//! Foundational primitives for topology-preserving label grids.
//!
//! ## Grids and Indexing
//! A [`Grid`] is an owned, dense 1D/2D/3D array. The x axis varies fastest:
//! `index = x + y * nx + z * nx * ny`, which matches the NIfTI/ITK memory
//! layout. Unused trailing axes have extent 1, so a 2D grid is addressed with
//! `[x, y, 0]`.
//!
//! ## Labels
//! Label grids store [`Label`] values. [`BACKGROUND`] (`0`) is the background;
//! every other value is a foreground label.
//!
//! ## Border Modes
//! Neighborhood reads past the grid edge go through [`BorderMode`]: constant
//! fill (default: background), clamp, or reflect-101. Reflect-101 mirrors
//! around edge cells without repeating edge elements.

mod border;
mod error;
mod grid;

pub use border::{BorderMode, map_index};
pub use error::Error;
pub use grid::{BACKGROUND, Coord, Grid, Label, MAX_DIM, Shape};
