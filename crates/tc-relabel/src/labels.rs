use tc_core::{BACKGROUND, Grid, Label};

/// Sorted set of labels present in a grid, always including background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<Label>,
}

impl Default for LabelSet {
    fn default() -> Self {
        Self {
            labels: vec![BACKGROUND],
        }
    }
}

impl LabelSet {
    pub fn of(grid: &Grid<Label>) -> Self {
        let mut set = Self::default();
        set.extend_from(grid);
        set
    }

    pub fn extend_from(&mut self, grid: &Grid<Label>) {
        let mut last = None;
        for &l in grid.data() {
            if last == Some(l) {
                continue;
            }
            last = Some(l);
            if let Err(pos) = self.labels.binary_search(&l) {
                self.labels.insert(pos, l);
            }
        }
    }

    pub fn contains(&self, label: Label) -> bool {
        self.labels.binary_search(&label).is_ok()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Label> + '_ {
        self.labels.iter().copied()
    }

    /// Labels of `self` that `other` lacks.
    pub fn missing_from(&self, other: &LabelSet) -> Vec<Label> {
        self.iter().filter(|&l| !other.contains(l)).collect()
    }
}

#[cfg(test)]
mod tests {
    use tc_core::{Grid, Label, Shape};

    use super::LabelSet;

    #[test]
    fn collects_sorted_labels_with_background() {
        let grid: Grid<Label> =
            Grid::from_vec(Shape::plane(3, 2), vec![5, 5, 2, 9, 2, 2]).expect("valid grid");
        let set = LabelSet::of(&grid);

        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 2, 5, 9]);
        assert!(set.contains(0));
        assert!(!set.contains(3));
    }

    #[test]
    fn missing_labels() {
        let a: Grid<Label> = Grid::from_vec(Shape::plane(2, 1), vec![1, 4]).expect("valid grid");
        let b: Grid<Label> = Grid::from_vec(Shape::plane(2, 1), vec![1, 1]).expect("valid grid");

        assert_eq!(LabelSet::of(&a).missing_from(&LabelSet::of(&b)), vec![4]);
        assert!(LabelSet::of(&b).missing_from(&LabelSet::of(&a)).is_empty());
    }
}
