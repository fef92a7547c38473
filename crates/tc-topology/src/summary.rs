use std::collections::VecDeque;

use tc_core::{BACKGROUND, Grid, Label, MAX_DIM, Shape};

use crate::connectivity::{Connectivity, ConnectivitySpec};

/// Global topology of one label, counted by traversal of the whole grid.
///
/// The grid is padded with one layer of background, matching the default
/// border policy. For the background label the padding belongs to the set,
/// so every component of its complement is enclosed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopologySummary {
    pub components: usize,
    pub background_components: usize,
    /// Enclosed complement components (holes in 2D, cavities in 3D).
    pub cavities: usize,
    /// Independent tunnels/handles; always 0 in 2D.
    pub tunnels: usize,
    pub euler: i64,
}

impl TopologySummary {
    pub fn of(grid: &Grid<Label>, label: Label, spec: &ConnectivitySpec) -> Self {
        let padded = Padded::new(grid, label);
        let own = spec.connectivity_for(label);
        let other = spec.connectivity_for(if label == BACKGROUND { 1 } else { BACKGROUND });

        let components = padded.count_components(true, own);
        let background_components = padded.count_components(false, other);
        let euler = padded.euler(own);

        let outer = usize::from(label != BACKGROUND);
        let cavities = background_components.saturating_sub(outer);
        let tunnels = if padded.shape.ndim() == 3 {
            (components as i64 + cavities as i64 - euler).max(0) as usize
        } else {
            0
        };

        Self {
            components,
            background_components,
            cavities,
            tunnels,
            euler,
        }
    }
}

struct Padded {
    shape: Shape,
    inside: Vec<bool>,
}

impl Padded {
    fn new(grid: &Grid<Label>, label: Label) -> Self {
        let src = grid.shape();
        let ndim = src.ndim();
        let mut dims = [1usize; MAX_DIM];
        for (axis, d) in dims.iter_mut().enumerate().take(ndim) {
            *d = src.extent(axis) + 2;
        }
        let shape = match ndim {
            3 => Shape::volume(dims[0], dims[1], dims[2]),
            2 => Shape::plane(dims[0], dims[1]),
            _ => Shape::plane(dims[0], 1),
        };

        let mut inside = vec![label == BACKGROUND; shape.len()];
        for (idx, &l) in grid.data().iter().enumerate() {
            let c = src.coord_of(idx);
            let p = [
                c[0] + 1,
                if ndim >= 2 { c[1] + 1 } else { 0 },
                if ndim == 3 { c[2] + 1 } else { 0 },
            ];
            inside[shape.index_of(p)] = l == label;
        }

        Self { shape, inside }
    }

    fn count_components(&self, value: bool, connectivity: Connectivity) -> usize {
        let offsets = connectivity.offsets();
        let mut seen = vec![false; self.inside.len()];
        let mut queue = VecDeque::new();
        let mut count = 0;

        for start in 0..self.inside.len() {
            if seen[start] || self.inside[start] != value {
                continue;
            }
            count += 1;
            seen[start] = true;
            queue.push_back(start);

            while let Some(idx) = queue.pop_front() {
                let c = self.shape.coord_of(idx);
                for &d in &offsets {
                    let Some(n) = self.shape.offset(c, d) else {
                        continue;
                    };
                    let ni = self.shape.index_of(n);
                    if !seen[ni] && self.inside[ni] == value {
                        seen[ni] = true;
                        queue.push_back(ni);
                    }
                }
            }
        }

        count
    }

    fn at(&self, c: [isize; MAX_DIM]) -> bool {
        if c.iter().any(|&v| v < 0) {
            return false;
        }
        let c = [c[0] as usize, c[1] as usize, c[2] as usize];
        self.shape.contains(c) && self.inside[self.shape.index_of(c)]
    }

    /// Euler characteristic of the set as a cubical complex.
    ///
    /// Maximal adjacency (8/26) treats cells as closed unit squares/cubes:
    /// a lattice k-cell is present if any incident cell is set. Minimal
    /// adjacency (4/6) uses the dual complex on cell centers: a block of
    /// `2^k` cells is present if all of them are set.
    fn euler(&self, connectivity: Connectivity) -> i64 {
        let ndim = self.shape.ndim();
        let closed = matches!(connectivity, Connectivity::C8 | Connectivity::C26);
        let mut chi = 0i64;

        for kind in 0..(1usize << ndim) {
            let spans: Vec<bool> = (0..MAX_DIM).map(|a| a < ndim && kind & (1 << a) != 0).collect();
            let k = spans.iter().filter(|&&s| s).count();
            let sign = if k % 2 == 0 { 1 } else { -1 };

            // cells sharing the lattice cell: along a spanned axis the single
            // cell at `p`, along an unspanned one the pair at `p - 1`, `p` (closed)
            // or along a spanned axis the pair `p`, `p + 1` (dual)
            let mut block: Vec<[isize; MAX_DIM]> = vec![[0; MAX_DIM]];
            for axis in 0..ndim {
                let choices: &[isize] = match (closed, spans[axis]) {
                    (true, true) | (false, false) => &[0],
                    (true, false) => &[-1, 0],
                    (false, true) => &[0, 1],
                };
                block = block
                    .iter()
                    .flat_map(|b| {
                        choices.iter().map(move |&o| {
                            let mut nb = *b;
                            nb[axis] = o;
                            nb
                        })
                    })
                    .collect();
            }

            let extra = isize::from(closed);
            let range = |axis: usize| -> isize {
                if axis >= ndim {
                    1
                } else {
                    self.shape.extent(axis) as isize + if spans[axis] { 0 } else { extra }
                }
            };

            let mut present = 0i64;
            for z in 0..range(2) {
                for y in 0..range(1) {
                    for x in 0..range(0) {
                        let hit = |c: &[isize; MAX_DIM]| self.at([x + c[0], y + c[1], z + c[2]]);
                        let on = if closed {
                            block.iter().any(hit)
                        } else {
                            block.iter().all(hit)
                        };
                        if on {
                            present += 1;
                        }
                    }
                }
            }
            chi += sign * present;
        }

        chi
    }
}

#[cfg(test)]
mod tests {
    use tc_core::{BACKGROUND, Grid, Label, Shape};

    use super::TopologySummary;
    use crate::ConnectivitySpec;

    fn volume_with(boxes: &[([usize; 3], [usize; 3])], holes: &[[usize; 3]]) -> Grid<Label> {
        let mut grid = Grid::new_fill(Shape::volume(7, 7, 7), BACKGROUND);
        for &(lo, hi) in boxes {
            grid.fill_box(lo, hi, 1);
        }
        for &h in holes {
            *grid.get_mut(h).expect("in bounds") = BACKGROUND;
        }
        grid
    }

    #[test]
    fn solid_cube_is_a_ball() {
        let grid = volume_with(&[([1, 1, 1], [4, 4, 4])], &[]);
        for spec in [ConnectivitySpec::volumetric(), ConnectivitySpec::volumetric().dual()] {
            let s = TopologySummary::of(&grid, 1, &spec);
            assert_eq!(s.components, 1);
            assert_eq!(s.background_components, 1);
            assert_eq!(s.cavities, 0);
            assert_eq!(s.tunnels, 0);
            assert_eq!(s.euler, 1);
        }
    }

    #[test]
    fn hollow_cube_has_one_cavity() {
        let grid = volume_with(&[([1, 1, 1], [4, 4, 4])], &[[2, 2, 2]]);
        let s = TopologySummary::of(&grid, 1, &ConnectivitySpec::volumetric());
        assert_eq!(s.components, 1);
        assert_eq!(s.cavities, 1);
        assert_eq!(s.tunnels, 0);
        assert_eq!(s.euler, 2);

        let bg = TopologySummary::of(&grid, BACKGROUND, &ConnectivitySpec::volumetric());
        assert_eq!(bg.components, 2);
        assert_eq!(bg.cavities, 1);
        assert_eq!(bg.tunnels, 0);
        assert_eq!(bg.euler, 3);
    }

    #[test]
    fn drilled_cube_has_one_tunnel() {
        let holes: Vec<[usize; 3]> = (1..4).map(|z| [2, 2, z]).collect();
        let grid = volume_with(&[([1, 1, 1], [4, 4, 4])], &holes);
        for spec in [ConnectivitySpec::volumetric(), ConnectivitySpec::volumetric().dual()] {
            let s = TopologySummary::of(&grid, 1, &spec);
            assert_eq!(s.components, 1);
            assert_eq!(s.cavities, 0);
            assert_eq!(s.tunnels, 1);
            assert_eq!(s.euler, 0);
        }
    }

    #[test]
    fn diagonal_voxels_depend_on_connectivity() {
        let grid = volume_with(&[([1, 1, 1], [2, 2, 2]), ([2, 2, 2], [3, 3, 3])], &[]);
        let s26 = TopologySummary::of(&grid, 1, &ConnectivitySpec::volumetric());
        let s6 = TopologySummary::of(&grid, 1, &ConnectivitySpec::volumetric().dual());
        assert_eq!(s26.components, 1);
        assert_eq!(s26.euler, 1);
        assert_eq!(s6.components, 2);
        assert_eq!(s6.euler, 2);
    }

    #[test]
    fn planar_ring_has_one_hole() {
        let mut grid = Grid::new_fill(Shape::plane(5, 5), BACKGROUND);
        grid.fill_box([1, 1, 0], [4, 4, 1], 1);
        *grid.get_mut([2, 2, 0]).expect("in bounds") = BACKGROUND;

        for spec in [ConnectivitySpec::planar(), ConnectivitySpec::planar().dual()] {
            let s = TopologySummary::of(&grid, 1, &spec);
            assert_eq!(s.components, 1);
            assert_eq!(s.background_components, 2);
            assert_eq!(s.cavities, 1);
            assert_eq!(s.tunnels, 0);
            assert_eq!(s.euler, 0);
        }
    }
}
