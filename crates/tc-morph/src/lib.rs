//! Binary ball morphology and distance maps.
//!
//! Cells are treated as binary with threshold `> 0`.
//! Outputs are `0` or `1` in `u8`.
//!
//! Border rule: cells outside the grid are background. Erosion therefore eats
//! foreground touching the grid edge; dilation simply ignores the outside.

pub mod distance;

use tc_core::{Grid, MAX_DIM};

pub use distance::{euclidean_distance, euclidean_distance_framed};

/// Offsets of a digital ball: every `d` with `|d|^2 <= radius^2` on the
/// grid's real axes.
pub fn ball_offsets(radius: usize, ndim: usize) -> Vec<[isize; MAX_DIM]> {
    let r = radius as isize;
    let r2 = r * r;
    let span = |axis: usize| if axis < ndim { -r..=r } else { 0..=0 };

    let mut out = Vec::new();
    for dz in span(2) {
        for dy in span(1) {
            for dx in span(0) {
                if dx * dx + dy * dy + dz * dz <= r2 {
                    out.push([dx, dy, dz]);
                }
            }
        }
    }
    out
}

pub fn erode_ball(src: &Grid<u8>, radius: usize) -> Grid<u8> {
    let shape = src.shape();
    let ball = ball_offsets(radius, shape.ndim());
    let mut out = Grid::new_fill(shape, 0u8);

    for idx in 0..src.len() {
        if src.data()[idx] == 0 {
            continue;
        }
        let c = shape.coord_of(idx);
        let all_set = ball.iter().all(|&d| match shape.offset(c, d) {
            Some(n) => src.data()[shape.index_of(n)] != 0,
            None => false,
        });
        if all_set {
            out.data_mut()[idx] = 1;
        }
    }

    out
}

pub fn dilate_ball(src: &Grid<u8>, radius: usize) -> Grid<u8> {
    let shape = src.shape();
    let ball = ball_offsets(radius, shape.ndim());
    let mut out = Grid::new_fill(shape, 0u8);

    for idx in 0..src.len() {
        if src.data()[idx] == 0 {
            continue;
        }
        let c = shape.coord_of(idx);
        for &d in &ball {
            if let Some(n) = shape.offset(c, d) {
                out.data_mut()[shape.index_of(n)] = 1;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use tc_core::{Grid, Shape};

    use crate::{ball_offsets, dilate_ball, erode_ball};

    #[test]
    fn ball_sizes_match_digital_spheres() {
        assert_eq!(ball_offsets(0, 3).len(), 1);
        assert_eq!(ball_offsets(1, 2).len(), 5);
        assert_eq!(ball_offsets(1, 3).len(), 7);
        assert_eq!(ball_offsets(2, 2).len(), 13);
    }

    #[test]
    fn erode_removes_single_voxel_speck() {
        let mut grid = Grid::new_fill(Shape::volume(5, 5, 5), 0u8);
        *grid.get_mut([2, 2, 2]).expect("in bounds") = 1;

        let out = erode_ball(&grid, 1);
        assert!(out.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn erode_treats_outside_as_background() {
        let grid = Grid::new_fill(Shape::plane(5, 5), 9u8);
        let out = erode_ball(&grid, 1);

        assert_eq!(out.get([0, 2, 0]), Some(&0));
        assert_eq!(out.get([2, 2, 0]), Some(&1));
        assert_eq!(out.data().iter().filter(|&&v| v == 1).count(), 9);
    }

    #[test]
    fn dilate_grows_cross_in_plane() {
        let mut grid = Grid::new_fill(Shape::plane(5, 5), 0u8);
        *grid.get_mut([2, 2, 0]).expect("in bounds") = 255;

        let out = dilate_ball(&grid, 1);
        assert_eq!(out.data().iter().filter(|&&v| v == 1).count(), 5);
        assert_eq!(out.get([1, 1, 0]), Some(&0));
        assert_eq!(out.get([2, 1, 0]), Some(&1));
    }

    #[test]
    fn radius_zero_is_identity_on_binary() {
        let mut grid = Grid::new_fill(Shape::plane(3, 3), 0u8);
        *grid.get_mut([0, 1, 0]).expect("in bounds") = 1;

        assert_eq!(erode_ball(&grid, 0), grid);
        assert_eq!(dilate_ball(&grid, 0), grid);
    }
}
