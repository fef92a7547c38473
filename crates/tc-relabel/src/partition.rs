use std::collections::VecDeque;

use tc_core::{Grid, Label, MAX_DIM};

/// Groups the cells where `grid` and `target` disagree into components that
/// touch through any face, edge or corner.
///
/// Cells outside a component never change during a run and every label test
/// reads only the unit cube around a cell, so components can be relabeled
/// independently. Components are ordered by their smallest index and list
/// their cells in ascending order.
pub fn partition_mismatches(grid: &Grid<Label>, target: &Grid<Label>) -> Vec<Vec<usize>> {
    let shape = grid.shape();
    let offsets = cube_offsets(shape.ndim());
    let mismatch: Vec<bool> = grid
        .data()
        .iter()
        .zip(target.data())
        .map(|(c, t)| c != t)
        .collect();

    let mut seen = vec![false; mismatch.len()];
    let mut parts = Vec::new();
    let mut queue = VecDeque::new();

    for start in 0..mismatch.len() {
        if seen[start] || !mismatch[start] {
            continue;
        }
        seen[start] = true;
        queue.push_back(start);
        let mut part = Vec::new();

        while let Some(idx) = queue.pop_front() {
            part.push(idx);
            let c = shape.coord_of(idx);
            for &d in &offsets {
                let Some(n) = shape.offset(c, d) else {
                    continue;
                };
                let ni = shape.index_of(n);
                if mismatch[ni] && !seen[ni] {
                    seen[ni] = true;
                    queue.push_back(ni);
                }
            }
        }

        part.sort_unstable();
        parts.push(part);
    }

    parts
}

fn cube_offsets(ndim: usize) -> Vec<[isize; MAX_DIM]> {
    let span = |axis: usize| if axis < ndim { -1..=1 } else { 0..=0 };
    let mut out = Vec::new();
    for dz in span(2) {
        for dy in span(1) {
            for dx in span(0) {
                if (dx, dy, dz) != (0, 0, 0) {
                    out.push([dx, dy, dz]);
                }
            }
        }
    }
    out
}
