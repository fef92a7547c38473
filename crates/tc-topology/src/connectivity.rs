use tc_core::{BACKGROUND, Error, Label, MAX_DIM};

use crate::neighborhood::{CENTER, CUBE_CELLS, cube_offset};

/// Adjacency between grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connectivity {
    /// 2D, edge neighbors only.
    C4,
    /// 2D, edge and corner neighbors.
    C8,
    /// 3D, face neighbors only.
    C6,
    /// 3D, face, edge and corner neighbors.
    C26,
}

impl Connectivity {
    pub fn from_count(neighbors: usize) -> Option<Self> {
        match neighbors {
            4 => Some(Self::C4),
            8 => Some(Self::C8),
            6 => Some(Self::C6),
            26 => Some(Self::C26),
            _ => None,
        }
    }

    pub fn dim(self) -> usize {
        match self {
            Self::C4 | Self::C8 => 2,
            Self::C6 | Self::C26 => 3,
        }
    }

    pub fn neighbor_count(self) -> usize {
        match self {
            Self::C4 => 4,
            Self::C8 => 8,
            Self::C6 => 6,
            Self::C26 => 26,
        }
    }

    /// Whether two cells `d` apart are adjacent. `d` must be a unit-cube step.
    pub fn is_adjacent(self, d: [isize; MAX_DIM]) -> bool {
        let l1: isize = d.iter().map(|v| v.abs()).sum();
        if l1 == 0 {
            return false;
        }
        match self {
            Self::C4 => d[2] == 0 && l1 == 1,
            Self::C8 => d[2] == 0,
            Self::C6 => l1 == 1,
            Self::C26 => true,
        }
    }

    pub fn offsets(self) -> Vec<[isize; MAX_DIM]> {
        let mut out = Vec::with_capacity(self.neighbor_count());
        for cell in 0..CUBE_CELLS {
            let d = cube_offset(cell);
            if self.is_adjacent(d) {
                out.push(d);
            }
        }
        out
    }

    /// Cells of the punctured unit cube in which topological numbers are
    /// counted: N8* in 2D, N18* for 6-adjacency and N26* for 26-adjacency.
    fn counting_region(self, d: [isize; MAX_DIM]) -> bool {
        let l1: isize = d.iter().map(|v| v.abs()).sum();
        if l1 == 0 {
            return false;
        }
        match self {
            Self::C4 | Self::C8 => d[2] == 0,
            Self::C6 => l1 <= 2,
            Self::C26 => true,
        }
    }
}

/// Precomputed bitmask adjacency inside the 27-cell unit cube.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjacencyTable {
    connectivity: Connectivity,
    adj: [u32; CUBE_CELLS],
    region: u32,
    touches_center: u32,
}

impl AdjacencyTable {
    pub fn new(connectivity: Connectivity) -> Self {
        let mut adj = [0u32; CUBE_CELLS];
        let mut region = 0u32;
        let mut touches_center = 0u32;

        for a in 0..CUBE_CELLS {
            let da = cube_offset(a);
            if connectivity.counting_region(da) {
                region |= 1 << a;
            }
            if connectivity.is_adjacent(da) {
                touches_center |= 1 << a;
            }
            for b in 0..CUBE_CELLS {
                let db = cube_offset(b);
                let step = [db[0] - da[0], db[1] - da[1], db[2] - da[2]];
                if step.iter().all(|v| v.abs() <= 1) && connectivity.is_adjacent(step) {
                    adj[a] |= 1 << b;
                }
            }
        }

        for mask in adj.iter_mut() {
            *mask &= region;
        }

        Self {
            connectivity,
            adj,
            region,
            touches_center,
        }
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    /// Topological number of `set` at the cube center: the number of
    /// components of `set` inside the counting region that are adjacent to
    /// the center. The center bit of `set` is ignored.
    pub fn count_touching(&self, set: u32) -> u8 {
        let mut remaining = set & self.region;
        let mut count = 0u8;

        while remaining != 0 {
            let seed = remaining.trailing_zeros();
            let mut component = 1u32 << seed;
            let mut frontier = component;

            while frontier != 0 {
                let cell = frontier.trailing_zeros() as usize;
                frontier &= frontier - 1;
                let grow = self.adj[cell] & remaining & !component;
                component |= grow;
                frontier |= grow;
            }

            remaining &= !component;
            if component & self.touches_center != 0 {
                count += 1;
            }
        }

        debug_assert_eq!(self.region & (1 << CENTER), 0);
        count
    }
}

/// A validated complementary pair of foreground/background adjacencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivitySpec {
    dim: usize,
    foreground: AdjacencyTable,
    background: AdjacencyTable,
    block: u32,
}

impl ConnectivitySpec {
    pub fn new(
        dim: usize,
        foreground: Connectivity,
        background: Connectivity,
    ) -> Result<Self, Error> {
        if dim != 2 && dim != 3 {
            return Err(Error::UnsupportedDimension(dim));
        }

        use Connectivity::*;
        let valid = matches!(
            (dim, foreground, background),
            (2, C8, C4) | (2, C4, C8) | (3, C26, C6) | (3, C6, C26)
        );
        if !valid {
            return Err(Error::InvalidConnectivity {
                dim,
                foreground: foreground.neighbor_count(),
                background: background.neighbor_count(),
            });
        }

        Ok(Self::from_tables(
            dim,
            AdjacencyTable::new(foreground),
            AdjacencyTable::new(background),
        ))
    }

    fn from_tables(dim: usize, foreground: AdjacencyTable, background: AdjacencyTable) -> Self {
        let block = (0..CUBE_CELLS)
            .filter(|&cell| dim == 3 || cube_offset(cell)[2] == 0)
            .fold(0u32, |acc, cell| acc | (1 << cell));
        Self {
            dim,
            foreground,
            background,
            block,
        }
    }

    /// Builds a pair from neighbor counts such as `(26, 6)`.
    pub fn from_counts(dim: usize, foreground: usize, background: usize) -> Result<Self, Error> {
        let invalid = Error::InvalidConnectivity {
            dim,
            foreground,
            background,
        };
        let fg = Connectivity::from_count(foreground).ok_or(invalid.clone())?;
        let bg = Connectivity::from_count(background).ok_or(invalid)?;
        Self::new(dim, fg, bg)
    }

    /// 8-connected foreground, 4-connected background.
    pub fn planar() -> Self {
        Self::from_tables(
            2,
            AdjacencyTable::new(Connectivity::C8),
            AdjacencyTable::new(Connectivity::C4),
        )
    }

    /// 26-connected foreground, 6-connected background.
    pub fn volumetric() -> Self {
        Self::from_tables(
            3,
            AdjacencyTable::new(Connectivity::C26),
            AdjacencyTable::new(Connectivity::C6),
        )
    }

    /// Default pair for a dimensionality.
    pub fn for_dim(dim: usize) -> Result<Self, Error> {
        match dim {
            2 => Ok(Self::planar()),
            3 => Ok(Self::volumetric()),
            _ => Err(Error::UnsupportedDimension(dim)),
        }
    }

    /// The same pair with foreground and background swapped.
    pub fn dual(&self) -> Self {
        Self {
            dim: self.dim,
            foreground: self.background.clone(),
            background: self.foreground.clone(),
            block: self.block,
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn foreground(&self) -> Connectivity {
        self.foreground.connectivity()
    }

    pub fn background(&self) -> Connectivity {
        self.background.connectivity()
    }

    pub fn foreground_offsets(&self) -> Vec<[isize; MAX_DIM]> {
        self.foreground().offsets()
    }

    pub fn background_offsets(&self) -> Vec<[isize; MAX_DIM]> {
        self.background().offsets()
    }

    /// Every offset of the punctured unit cube (8 in 2D, 26 in 3D). A label
    /// change can alter the local topology of any cell within this range.
    pub fn neighborhood_offsets(&self) -> Vec<[isize; MAX_DIM]> {
        let full = if self.dim == 2 {
            Connectivity::C8
        } else {
            Connectivity::C26
        };
        full.offsets()
    }

    /// Bitmask of the 3x3 (2D) or 3x3x3 (3D) block around the center,
    /// center included.
    pub fn block_mask(&self) -> u32 {
        self.block
    }

    /// Tables for a label's own cells and for its complement. The background
    /// label is connected with the background adjacency; every other label
    /// with the foreground adjacency.
    pub fn tables_for(&self, label: Label) -> (&AdjacencyTable, &AdjacencyTable) {
        if label == BACKGROUND {
            (&self.background, &self.foreground)
        } else {
            (&self.foreground, &self.background)
        }
    }

    /// Adjacency of a label's own cells (see [`Self::tables_for`]).
    pub fn connectivity_for(&self, label: Label) -> Connectivity {
        self.tables_for(label).0.connectivity()
    }
}

#[cfg(test)]
mod tests {
    use tc_core::{BACKGROUND, Error};

    use super::{AdjacencyTable, Connectivity, ConnectivitySpec};
    use crate::neighborhood::{CENTER, cube_index};

    #[test]
    fn offset_sets_have_expected_sizes() {
        assert_eq!(Connectivity::C4.offsets().len(), 4);
        assert_eq!(Connectivity::C8.offsets().len(), 8);
        assert_eq!(Connectivity::C6.offsets().len(), 6);
        assert_eq!(Connectivity::C26.offsets().len(), 26);
        assert!(Connectivity::C8.offsets().iter().all(|d| d[2] == 0));
    }

    #[test]
    fn accepts_only_complementary_pairs() {
        use Connectivity::*;

        assert!(ConnectivitySpec::new(2, C8, C4).is_ok());
        assert!(ConnectivitySpec::new(2, C4, C8).is_ok());
        assert!(ConnectivitySpec::new(3, C26, C6).is_ok());
        assert!(ConnectivitySpec::new(3, C6, C26).is_ok());

        assert_eq!(
            ConnectivitySpec::new(3, C6, C6),
            Err(Error::InvalidConnectivity {
                dim: 3,
                foreground: 6,
                background: 6
            })
        );
        assert!(ConnectivitySpec::new(2, C8, C8).is_err());
        assert!(ConnectivitySpec::new(3, C8, C4).is_err());
        assert_eq!(
            ConnectivitySpec::new(4, C26, C6),
            Err(Error::UnsupportedDimension(4))
        );
    }

    #[test]
    fn from_counts_rejects_18() {
        let err = ConnectivitySpec::from_counts(3, 6, 18).unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(
            ConnectivitySpec::from_counts(3, 26, 6).expect("valid pair"),
            ConnectivitySpec::volumetric()
        );
    }

    #[test]
    fn dual_swaps_roles() {
        let spec = ConnectivitySpec::planar();
        let dual = spec.dual();
        assert_eq!(dual.foreground(), Connectivity::C4);
        assert_eq!(dual.background(), Connectivity::C8);
        assert_eq!(dual.foreground_offsets(), spec.background_offsets());
        assert_eq!(dual.background_offsets().len(), 8);
        assert_eq!(dual.dual(), spec);
    }

    #[test]
    fn block_mask_covers_the_real_axes() {
        let planar = ConnectivitySpec::planar();
        assert_eq!(planar.block_mask().count_ones(), 9);
        assert_ne!(planar.block_mask() & (1 << CENTER), 0);
        assert_eq!(planar.block_mask() & (1 << cube_index([0, 0, 1])), 0);
        assert_eq!(planar.dual().block_mask(), planar.block_mask());

        assert_eq!(ConnectivitySpec::volumetric().block_mask(), (1 << 27) - 1);
    }

    #[test]
    fn background_label_uses_background_adjacency() {
        let spec = ConnectivitySpec::volumetric();
        assert_eq!(spec.connectivity_for(BACKGROUND), Connectivity::C6);
        assert_eq!(spec.connectivity_for(3), Connectivity::C26);
    }

    #[test]
    fn count_touching_separates_opposite_faces() {
        let table = AdjacencyTable::new(Connectivity::C6);
        let left = 1u32 << cube_index([-1, 0, 0]);
        let right = 1u32 << cube_index([1, 0, 0]);
        assert_eq!(table.count_touching(left | right), 2);

        // a corner cell is outside N18 and cannot bridge them
        let corner = 1u32 << cube_index([1, 1, 1]);
        assert_eq!(table.count_touching(left | right | corner), 2);

        // an edge ring joins them through N18
        let ring = [[-1, 1, 0], [0, 1, 0], [1, 1, 0]]
            .iter()
            .fold(0u32, |acc, &d| acc | (1 << cube_index(d)));
        assert_eq!(table.count_touching(left | right | ring), 1);
    }

    #[test]
    fn count_touching_ignores_components_away_from_center() {
        let table = AdjacencyTable::new(Connectivity::C4);
        let corner_only = 1u32 << cube_index([1, 1, 0]);
        assert_eq!(table.count_touching(corner_only), 0);

        let eight = AdjacencyTable::new(Connectivity::C8);
        assert_eq!(eight.count_touching(corner_only), 1);
    }
}
