/// Policy for reading cells outside the grid.
#[derive(Debug, Clone, PartialEq)]
pub enum BorderMode<T> {
    Clamp,
    Constant(T),
    Reflect101,
}

impl<T: Default> Default for BorderMode<T> {
    /// Out-of-bounds cells read as `T::default()`, i.e. background for labels.
    fn default() -> Self {
        Self::Constant(T::default())
    }
}

impl<T> BorderMode<T> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Clamp => "clamp",
            Self::Constant(_) => "constant",
            Self::Reflect101 => "reflect101",
        }
    }
}

/// Maps a possibly out-of-range index onto `0..len`.
///
/// Returns `None` when the cell must be taken from [`BorderMode::Constant`]
/// or when `len == 0`.
pub fn map_index<T>(i: isize, len: usize, mode: &BorderMode<T>) -> Option<usize> {
    if i >= 0 && (i as usize) < len {
        return Some(i as usize);
    }

    match mode {
        BorderMode::Constant(_) => None,
        BorderMode::Clamp => {
            if len == 0 {
                return None;
            }
            if i < 0 {
                Some(0)
            } else {
                let idx = i as usize;
                Some(idx.min(len - 1))
            }
        }
        BorderMode::Reflect101 => {
            if len == 0 {
                return None;
            }
            if len == 1 {
                return Some(0);
            }

            let period = (2 * len - 2) as isize;
            let r = i.rem_euclid(period) as usize;
            if r < len {
                Some(r)
            } else {
                Some((2 * len - 2) - r)
            }
        }
    }
}
