//! Simple-point test for single-label and multi-label transitions.
//!
//! For a label `L`, a cell inside `L` touches exactly one component of `L`
//! (its own) and `T(complement)` components of the complement; a cell outside
//! `L` touches `T(L)` components of `L` and one of the complement, where `T`
//! is the topological number of [`AdjacencyTable::count_touching`]. Moving the
//! center across `L` preserves topology iff both counts are unchanged, which
//! is the classical criterion `T(L) == 1 && T(complement) == 1`.
//!
//! [`AdjacencyTable::count_touching`]: crate::AdjacencyTable::count_touching

use tc_core::Label;

use crate::connectivity::ConnectivitySpec;
use crate::neighborhood::Neighborhood;

const ALL_CELLS: u32 = (1 << 27) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentCounts {
    pub before: u8,
    pub after: u8,
}

impl ComponentCounts {
    pub fn unchanged(&self) -> bool {
        self.before == self.after
    }
}

/// Local component counts of one label around a cell, before and after a
/// hypothetical label change of that cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub label: Label,
    /// Components of `label` touching the center.
    pub foreground: ComponentCounts,
    /// Components of the complement of `label` touching the center.
    pub background: ComponentCounts,
}

impl Classification {
    pub fn preserves_topology(&self) -> bool {
        self.foreground.unchanged() && self.background.unchanged()
    }
}

pub fn classify(
    nbhd: &Neighborhood,
    spec: &ConnectivitySpec,
    label: Label,
    from: Label,
    to: Label,
) -> Classification {
    let (own, other) = spec.tables_for(label);
    let set = nbhd.mask_of(label);
    let t_own = own.count_touching(set);
    let t_other = other.count_touching(!set & ALL_CELLS);

    let counts = |inside: bool| if inside { (1, t_other) } else { (t_own, 1) };
    let (fg_before, bg_before) = counts(from == label);
    let (fg_after, bg_after) = counts(to == label);

    Classification {
        label,
        foreground: ComponentCounts {
            before: fg_before,
            after: fg_after,
        },
        background: ComponentCounts {
            before: bg_before,
            after: bg_after,
        },
    }
}

/// Binary simple-point test: can the center enter or leave `label` without
/// changing the topology of `label` or of its complement?
pub fn is_simple(nbhd: &Neighborhood, spec: &ConnectivitySpec, label: Label) -> bool {
    let (own, other) = spec.tables_for(label);
    let set = nbhd.mask_of(label);
    own.count_touching(set) == 1 && other.count_touching(!set & ALL_CELLS) == 1
}

/// First label whose local topology the change `from -> to` would alter.
///
/// `to` is examined first, then `from`. Any other label keeps its cells and
/// stays outside the center, so both of its counts are unchanged and it
/// never needs classifying.
pub fn first_violation(
    nbhd: &Neighborhood,
    spec: &ConnectivitySpec,
    from: Label,
    to: Label,
) -> Option<Classification> {
    if from == to {
        return None;
    }

    [to, from]
        .into_iter()
        .map(|l| classify(nbhd, spec, l, from, to))
        .find(|c| !c.preserves_topology())
}

/// Multi-label simple-point test for changing the center from `from` to `to`.
pub fn is_admissible(nbhd: &Neighborhood, spec: &ConnectivitySpec, from: Label, to: Label) -> bool {
    first_violation(nbhd, spec, from, to).is_none()
}
