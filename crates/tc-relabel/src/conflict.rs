use tc_core::Label;
use tc_topology::{ConnectivitySpec, Neighborhood, first_violation};

/// Outcome of a proposed label change at one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The cell takes `label`.
    Claim(Label),
    /// The cell keeps `label`; the change would alter the topology of
    /// `blocked_by`.
    Keep { label: Label, blocked_by: Label },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub resolution: Resolution,
    /// Three or more labels meet around the cell, counting the proposed one.
    pub contested: bool,
}

impl Decision {
    pub fn label(&self) -> Label {
        match self.resolution {
            Resolution::Claim(l) | Resolution::Keep { label: l, .. } => l,
        }
    }

    pub fn is_claim(&self) -> bool {
        matches!(self.resolution, Resolution::Claim(_))
    }
}

/// Decides whether the center of `nbhd` may move from `current` to
/// `proposed`.
///
/// The change is granted only when it is simple for every label involved;
/// otherwise the cell keeps `current`. Where several labels compete for the
/// same cell this is the conservative choice: no label can gain the cell
/// at the cost of another label's topology.
pub fn resolve(
    nbhd: &Neighborhood,
    spec: &ConnectivitySpec,
    current: Label,
    proposed: Label,
) -> Decision {
    let contested = is_contested(nbhd, spec, proposed);
    let resolution = match first_violation(nbhd, spec, current, proposed) {
        None => Resolution::Claim(proposed),
        Some(c) => Resolution::Keep {
            label: current,
            blocked_by: c.label,
        },
    };
    Decision {
        resolution,
        contested,
    }
}

/// Whether three or more labels, counting `proposed`, meet around the center.
pub fn is_contested(nbhd: &Neighborhood, spec: &ConnectivitySpec, proposed: Label) -> bool {
    let block = spec.block_mask();
    let mut seen = [proposed; 2];
    let mut distinct = 1;
    for (cell, &label) in nbhd.labels().iter().enumerate() {
        if block & (1 << cell) == 0 || seen[..distinct].contains(&label) {
            continue;
        }
        if distinct == 2 {
            return true;
        }
        seen[distinct] = label;
        distinct += 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use tc_core::{BACKGROUND, BorderMode, Grid, Label, Shape};
    use tc_topology::{ConnectivitySpec, Neighborhood};

    use super::{Resolution, is_contested, resolve};

    fn plane(rows: &[&str]) -> Grid<Label> {
        let h = rows.len();
        let w = rows[0].len();
        let data = rows
            .iter()
            .flat_map(|r| r.bytes().map(|b| if b == b'.' { 0 } else { (b - b'0') as Label }))
            .collect();
        Grid::from_vec(Shape::plane(w, h), data).expect("valid grid")
    }

    #[test]
    fn simple_change_is_claimed() {
        let grid = plane(&["11.", "...", "..."]);
        let nbhd = Neighborhood::gather(&grid, [1, 1, 0], &BorderMode::default());
        let d = resolve(&nbhd, &ConnectivitySpec::planar(), BACKGROUND, 1);

        assert_eq!(d.resolution, Resolution::Claim(1));
        assert!(d.is_claim());
        assert!(!d.contested);
    }

    #[test]
    fn competing_labels_keep_current() {
        // label 2 wants the center, which bridges the two halves of label 1
        let grid = plane(&[".22", "111", "..."]);
        let nbhd = Neighborhood::gather(&grid, [1, 1, 0], &BorderMode::default());
        let d = resolve(&nbhd, &ConnectivitySpec::planar(), 1, 2);

        assert_eq!(
            d.resolution,
            Resolution::Keep {
                label: 1,
                blocked_by: 1
            }
        );
        assert_eq!(d.label(), 1);
        assert!(d.contested);
    }

    #[test]
    fn proposed_label_counts_toward_contention() {
        let grid = plane(&["11.", "...", "..."]);
        let nbhd = Neighborhood::gather(&grid, [1, 1, 0], &BorderMode::default());
        let d = resolve(&nbhd, &ConnectivitySpec::planar(), BACKGROUND, 3);

        // 3 would appear as an isolated new component
        assert!(!d.is_claim());
        assert!(d.contested);
    }

    #[test]
    fn planar_contention_ignores_cells_off_the_plane() {
        // only labels 1 and 2 meet; the unused z slices must not add a third
        let grid = plane(&["111", "122", "222"]);
        let nbhd = Neighborhood::gather(&grid, [1, 1, 0], &BorderMode::default());
        let spec = ConnectivitySpec::planar();

        assert!(!is_contested(&nbhd, &spec, 2));
        assert!(is_contested(&nbhd, &spec, 3));
    }
}
