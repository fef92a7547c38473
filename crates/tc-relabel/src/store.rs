use rustc_hash::FxHashMap;
use tc_core::{Grid, Label, Shape};
use tc_topology::LabelSource;

/// Writable label storage addressed by linear index.
pub trait LabelStore: LabelSource {
    fn set(&mut self, index: usize, label: Label);
}

impl LabelStore for Grid<Label> {
    fn set(&mut self, index: usize, label: Label) {
        self.data_mut()[index] = label;
    }
}

/// Private copy-on-write view of a shared grid.
///
/// Reads fall through to `base` unless the cell was written locally.
#[derive(Debug)]
pub struct Overlay<'a> {
    base: &'a Grid<Label>,
    writes: FxHashMap<usize, Label>,
}

impl<'a> Overlay<'a> {
    pub fn new(base: &'a Grid<Label>) -> Self {
        Self {
            base,
            writes: FxHashMap::default(),
        }
    }

    pub fn num_writes(&self) -> usize {
        self.writes.len()
    }

    /// Local writes sorted by index.
    pub fn into_writes(self) -> Vec<(usize, Label)> {
        let mut out: Vec<_> = self.writes.into_iter().collect();
        out.sort_unstable_by_key(|&(idx, _)| idx);
        out
    }
}

impl LabelSource for Overlay<'_> {
    fn shape(&self) -> Shape {
        self.base.shape()
    }

    fn label(&self, index: usize) -> Label {
        match self.writes.get(&index) {
            Some(&l) => l,
            None => self.base.data()[index],
        }
    }
}

impl LabelStore for Overlay<'_> {
    fn set(&mut self, index: usize, label: Label) {
        if self.base.data()[index] == label {
            self.writes.remove(&index);
        } else {
            self.writes.insert(index, label);
        }
    }
}
