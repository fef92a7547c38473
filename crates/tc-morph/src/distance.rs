//! Exact Euclidean distance maps.
//!
//! Separable lower-envelope transform (Felzenszwalb & Huttenlocher): one 1D
//! squared-distance pass per axis, with per-axis physical spacing. Cells with
//! no reachable feature get `f32::INFINITY`.
//!
//! [`euclidean_distance_framed`] adds a one-cell layer of features around the
//! grid, so cells at the edge are one step from the outside.

use tc_core::{Grid, MAX_DIM, Shape};

/// Distance from every cell to the nearest cell where `is_feature` holds.
pub fn euclidean_distance(
    shape: Shape,
    spacing: [f32; MAX_DIM],
    is_feature: impl Fn(usize) -> bool,
) -> Grid<f32> {
    distance_map(shape, spacing, is_feature, false)
}

/// Like [`euclidean_distance`], with every cell just outside the grid on the
/// real axes counted as a feature.
pub fn euclidean_distance_framed(
    shape: Shape,
    spacing: [f32; MAX_DIM],
    is_feature: impl Fn(usize) -> bool,
) -> Grid<f32> {
    distance_map(shape, spacing, is_feature, true)
}

fn distance_map(
    shape: Shape,
    spacing: [f32; MAX_DIM],
    is_feature: impl Fn(usize) -> bool,
    framed: bool,
) -> Grid<f32> {
    let n = shape.len();
    let mut sq: Vec<f64> = (0..n)
        .map(|i| if is_feature(i) { 0.0 } else { f64::INFINITY })
        .collect();

    // the frame sits at positions 0 and len + 1 of a padded line
    let pad = usize::from(framed);
    let max_len = (0..MAX_DIM).map(|a| shape.extent(a)).max().unwrap_or(0) + 2 * pad;
    let mut line = vec![0.0f64; max_len];
    let mut out = vec![0.0f64; max_len];
    let mut scratch = Envelope::with_capacity(max_len);

    for axis in 0..shape.ndim() {
        let len = shape.extent(axis);
        if len == 0 || (len == 1 && !framed) {
            continue;
        }
        let stride = axis_stride(shape, axis);
        let step = f64::from(spacing[axis]);
        let padded = len + 2 * pad;

        for start in line_starts(shape, axis) {
            line[0] = 0.0;
            line[padded - 1] = 0.0;
            for i in 0..len {
                line[pad + i] = sq[start + i * stride];
            }
            scratch.transform(&line[..padded], step, &mut out[..padded]);
            for i in 0..len {
                sq[start + i * stride] = out[pad + i];
            }
        }
    }

    let data = sq.into_iter().map(|d| d.sqrt() as f32).collect();
    Grid::from_vec(shape, data).unwrap_or_else(|_| Grid::new_fill(shape, f32::INFINITY))
}

fn axis_stride(shape: Shape, axis: usize) -> usize {
    (0..axis).map(|a| shape.extent(a)).product()
}

/// Linear index of the first cell of every line along `axis`.
fn line_starts(shape: Shape, axis: usize) -> Vec<usize> {
    let mut starts = Vec::with_capacity(shape.len() / shape.extent(axis).max(1));
    let [nx, ny, nz] = [shape.extent(0), shape.extent(1), shape.extent(2)];
    let (rx, ry, rz) = match axis {
        0 => (1, ny, nz),
        1 => (nx, 1, nz),
        _ => (nx, ny, 1),
    };
    for z in 0..rz {
        for y in 0..ry {
            for x in 0..rx {
                starts.push(shape.index_of([x, y, z]));
            }
        }
    }
    starts
}

struct Envelope {
    v: Vec<usize>,
    z: Vec<f64>,
}

impl Envelope {
    fn with_capacity(n: usize) -> Self {
        Self {
            v: Vec::with_capacity(n),
            z: Vec::with_capacity(n + 1),
        }
    }

    fn transform(&mut self, f: &[f64], step: f64, d: &mut [f64]) {
        self.v.clear();
        self.z.clear();

        let pos = |q: usize| q as f64 * step;
        for q in 0..f.len() {
            if !f[q].is_finite() {
                continue;
            }
            loop {
                let Some(&top) = self.v.last() else {
                    break;
                };
                let s = ((f[q] + pos(q) * pos(q)) - (f[top] + pos(top) * pos(top)))
                    / (2.0 * (pos(q) - pos(top)));
                let k = self.v.len() - 1;
                if s <= self.z[k] {
                    self.v.pop();
                    self.z.pop();
                    continue;
                }
                self.v.push(q);
                self.z.push(s);
                break;
            }
            if self.v.is_empty() {
                self.v.push(q);
                self.z.push(f64::NEG_INFINITY);
            }
        }

        if self.v.is_empty() {
            d.fill(f64::INFINITY);
            return;
        }

        let mut k = 0;
        for (q, out) in d.iter_mut().enumerate() {
            while k + 1 < self.v.len() && self.z[k + 1] < pos(q) {
                k += 1;
            }
            let dv = pos(q) - pos(self.v[k]);
            *out = dv * dv + f[self.v[k]];
        }
    }
}
