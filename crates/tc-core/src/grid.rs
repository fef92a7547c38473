use core::fmt;

use crate::Error;

/// Highest grid dimensionality supported by the workspace.
pub const MAX_DIM: usize = 3;

pub type Label = u32;

pub const BACKGROUND: Label = 0;

/// Cell coordinate; axes beyond the grid dimensionality are always `0`.
pub type Coord = [usize; MAX_DIM];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    ndim: usize,
    dims: [usize; MAX_DIM],
}

impl Shape {
    pub fn new(dims: &[usize]) -> Result<Self, Error> {
        if dims.is_empty() || dims.len() > MAX_DIM {
            return Err(Error::UnsupportedDimension(dims.len()));
        }

        let mut padded = [1usize; MAX_DIM];
        padded[..dims.len()].copy_from_slice(dims);

        let shape = Self {
            ndim: dims.len(),
            dims: padded,
        };
        shape.checked_len().ok_or(Error::SizeOverflow)?;
        Ok(shape)
    }

    /// # Panics
    ///
    /// If `width * height` overflows `usize`; use [`Shape::new`] for a
    /// fallible constructor.
    pub fn plane(width: usize, height: usize) -> Self {
        let shape = Self {
            ndim: 2,
            dims: [width, height, 1],
        };
        assert!(shape.checked_len().is_some(), "{width}x{height} cells overflow usize");
        shape
    }

    /// # Panics
    ///
    /// If `nx * ny * nz` overflows `usize`.
    pub fn volume(nx: usize, ny: usize, nz: usize) -> Self {
        let shape = Self {
            ndim: 3,
            dims: [nx, ny, nz],
        };
        assert!(shape.checked_len().is_some(), "{nx}x{ny}x{nz} cells overflow usize");
        shape
    }

    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Extents of the real axes, `ndim` entries long.
    pub fn dims(&self) -> &[usize] {
        &self.dims[..self.ndim]
    }

    /// Extent along `axis`; `1` for axes past `ndim`.
    pub fn extent(&self, axis: usize) -> usize {
        self.dims[axis]
    }

    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn checked_len(&self) -> Option<usize> {
        self.dims
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    pub fn index_of(&self, coord: Coord) -> usize {
        coord[0] + self.dims[0] * (coord[1] + self.dims[1] * coord[2])
    }

    pub fn coord_of(&self, index: usize) -> Coord {
        let nx = self.dims[0];
        let ny = self.dims[1];
        [index % nx, (index / nx) % ny, index / (nx * ny)]
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.iter().zip(self.dims.iter()).all(|(&c, &d)| c < d)
    }

    /// Moves `coord` by `delta`, returning `None` when the result leaves the grid.
    pub fn offset(&self, coord: Coord, delta: [isize; MAX_DIM]) -> Option<Coord> {
        let mut out = [0usize; MAX_DIM];
        for axis in 0..MAX_DIM {
            let v = coord[axis] as isize + delta[axis];
            if v < 0 || v as usize >= self.dims[axis] {
                return None;
            }
            out[axis] = v as usize;
        }
        Some(out)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (axis, d) in self.dims().iter().enumerate() {
            if axis > 0 {
                write!(f, "x")?;
            }
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    shape: Shape,
    data: Vec<T>,
}

impl<T> Grid<T> {
    pub fn from_vec(shape: Shape, data: Vec<T>) -> Result<Self, Error> {
        let expected = shape.len();
        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn get(&self, coord: Coord) -> Option<&T> {
        if !self.shape.contains(coord) {
            return None;
        }
        self.data.get(self.shape.index_of(coord))
    }

    pub fn get_mut(&mut self, coord: Coord) -> Option<&mut T> {
        if !self.shape.contains(coord) {
            return None;
        }
        let idx = self.shape.index_of(coord);
        self.data.get_mut(idx)
    }

    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            shape: self.shape,
            data: self.data.iter().map(f).collect(),
        }
    }
}

impl<T: Clone> Grid<T> {
    pub fn new_fill(shape: Shape, value: T) -> Self {
        Self {
            shape,
            data: vec![value; shape.len()],
        }
    }

    /// Copies `value` into every cell of the axis-aligned box `[lo, hi)`.
    ///
    /// The box is clipped to the grid.
    pub fn fill_box(&mut self, lo: Coord, hi: Coord, value: T) {
        let hi = [
            hi[0].min(self.shape.extent(0)),
            hi[1].min(self.shape.extent(1)),
            hi[2].min(self.shape.extent(2)),
        ];
        for z in lo[2]..hi[2] {
            for y in lo[1]..hi[1] {
                for x in lo[0]..hi[0] {
                    let idx = self.shape.index_of([x, y, z]);
                    self.data[idx] = value.clone();
                }
            }
        }
    }
}
