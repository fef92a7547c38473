use tc_core::{BACKGROUND, BorderMode, Coord, Error, Grid, Label, MAX_DIM, Shape, map_index};

/// Number of cells in the 3x3x3 unit cube.
pub const CUBE_CELLS: usize = 27;

/// Cube index of the center cell.
pub const CENTER: usize = 13;

/// Cube index of the offset `d` (each component in `-1..=1`).
pub fn cube_index(d: [isize; MAX_DIM]) -> usize {
    ((d[0] + 1) + 3 * (d[1] + 1) + 9 * (d[2] + 1)) as usize
}

pub(crate) fn cube_offset(cell: usize) -> [isize; MAX_DIM] {
    let c = cell as isize;
    [c % 3 - 1, (c / 3) % 3 - 1, c / 9 - 1]
}

/// Read access to a label map by linear index.
pub trait LabelSource {
    fn shape(&self) -> Shape;
    fn label(&self, index: usize) -> Label;
}

impl LabelSource for Grid<Label> {
    fn shape(&self) -> Shape {
        Grid::shape(self)
    }

    fn label(&self, index: usize) -> Label {
        self.data()[index]
    }
}

/// Checks that `border` never maps an outside cell back onto the cell whose
/// neighborhood is being read.
pub fn validate_border(shape: Shape, border: &BorderMode<Label>) -> Result<(), Error> {
    match border {
        BorderMode::Constant(_) => Ok(()),
        BorderMode::Clamp => Err(Error::InvalidBorder(
            "clamp maps outside cells onto the center cell",
        )),
        BorderMode::Reflect101 => {
            if shape.dims().iter().any(|&d| d < 2) {
                Err(Error::InvalidBorder(
                    "reflect101 needs every axis extent >= 2",
                ))
            } else {
                Ok(())
            }
        }
    }
}

/// Labels of the 3x3x3 block centered on one cell.
///
/// 2D grids fill only the `dz == 0` slice; the other cells read as
/// background and are never consulted by 2D connectivities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighborhood {
    labels: [Label; CUBE_CELLS],
}

impl Neighborhood {
    pub fn from_labels(labels: [Label; CUBE_CELLS]) -> Self {
        Self { labels }
    }

    pub fn gather<S: LabelSource + ?Sized>(
        source: &S,
        coord: Coord,
        border: &BorderMode<Label>,
    ) -> Self {
        let shape = source.shape();
        let fill = match border {
            BorderMode::Constant(v) => *v,
            _ => BACKGROUND,
        };

        let mut labels = [BACKGROUND; CUBE_CELLS];
        let z_span: &[isize] = if shape.ndim() >= 3 { &[-1, 0, 1] } else { &[0] };
        let y_span: &[isize] = if shape.ndim() >= 2 { &[-1, 0, 1] } else { &[0] };

        for &dz in z_span {
            for &dy in y_span {
                for dx in -1isize..=1 {
                    let d = [dx, dy, dz];
                    let mut mapped = [0usize; MAX_DIM];
                    let mut inside = true;
                    for axis in 0..MAX_DIM {
                        let i = coord[axis] as isize + d[axis];
                        match map_index(i, shape.extent(axis), border) {
                            Some(v) => mapped[axis] = v,
                            None => {
                                inside = false;
                                break;
                            }
                        }
                    }
                    labels[cube_index(d)] = if inside {
                        source.label(shape.index_of(mapped))
                    } else {
                        fill
                    };
                }
            }
        }

        Self { labels }
    }

    pub fn center(&self) -> Label {
        self.labels[CENTER]
    }

    pub fn at(&self, d: [isize; MAX_DIM]) -> Label {
        self.labels[cube_index(d)]
    }

    pub fn labels(&self) -> &[Label; CUBE_CELLS] {
        &self.labels
    }

    /// Bitmask of cube cells carrying `label`.
    pub fn mask_of(&self, label: Label) -> u32 {
        self.labels
            .iter()
            .enumerate()
            .filter(|&(_, &l)| l == label)
            .fold(0u32, |acc, (i, _)| acc | (1 << i))
    }
}

#[cfg(test)]
mod tests {
    use tc_core::{BorderMode, Error, Grid, Label, Shape};

    use super::{CENTER, Neighborhood, cube_index, cube_offset, validate_border};

    #[test]
    fn cube_index_round_trips() {
        for cell in 0..27 {
            assert_eq!(cube_index(cube_offset(cell)), cell);
        }
        assert_eq!(cube_offset(CENTER), [0, 0, 0]);
    }

    fn ramp(shape: Shape) -> Grid<Label> {
        let data = (0..shape.len() as Label).map(|v| v + 1).collect();
        Grid::from_vec(shape, data).expect("valid grid")
    }

    #[test]
    fn gather_reads_interior_cells() {
        let grid = ramp(Shape::plane(4, 4));
        let nbhd = Neighborhood::gather(&grid, [1, 1, 0], &BorderMode::default());

        assert_eq!(nbhd.center(), 6);
        assert_eq!(nbhd.at([-1, -1, 0]), 1);
        assert_eq!(nbhd.at([1, 1, 0]), 11);
        assert_eq!(nbhd.at([0, 0, 1]), 0);
    }

    #[test]
    fn constant_border_fills_outside() {
        let grid = ramp(Shape::volume(3, 3, 3));
        let nbhd = Neighborhood::gather(&grid, [0, 0, 0], &BorderMode::Constant(99));

        assert_eq!(nbhd.center(), 1);
        assert_eq!(nbhd.at([-1, 0, 0]), 99);
        assert_eq!(nbhd.at([0, 0, -1]), 99);
        assert_eq!(nbhd.at([1, 1, 1]), 14);
    }

    #[test]
    fn reflect_border_mirrors_without_repeating_edge() {
        let grid = ramp(Shape::plane(3, 3));
        let nbhd = Neighborhood::gather(&grid, [0, 0, 0], &BorderMode::Reflect101);

        assert_eq!(nbhd.at([-1, 0, 0]), nbhd.at([1, 0, 0]));
        assert_eq!(nbhd.at([-1, -1, 0]), nbhd.at([1, 1, 0]));
        assert_ne!(nbhd.at([-1, 0, 0]), nbhd.center());
    }

    #[test]
    fn border_validation() {
        let thin = Shape::volume(4, 4, 1);
        assert!(validate_border(thin, &BorderMode::default()).is_ok());
        assert!(matches!(
            validate_border(thin, &BorderMode::Reflect101),
            Err(Error::InvalidBorder(_))
        ));
        assert!(validate_border(Shape::plane(2, 5), &BorderMode::Reflect101).is_ok());
        assert!(validate_border(Shape::plane(2, 5), &BorderMode::Clamp).is_err());
    }

    #[test]
    fn mask_of_selects_matching_cells() {
        let mut grid = Grid::new_fill(Shape::plane(3, 3), 0 as Label);
        *grid.get_mut([0, 0, 0]).expect("in bounds") = 2;
        *grid.get_mut([2, 1, 0]).expect("in bounds") = 5;
        let nbhd = Neighborhood::gather(&grid, [1, 1, 0], &BorderMode::default());

        assert_eq!(nbhd.mask_of(2), 1 << cube_index([-1, -1, 0]));
        assert_eq!(nbhd.mask_of(5), 1 << cube_index([1, 0, 0]));
        assert_eq!(nbhd.mask_of(7), 0);
    }
}
