use core::fmt;

use crate::Shape;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    SizeMismatch { expected: usize, actual: usize },
    ShapeMismatch { expected: Shape, actual: Shape },
    DimensionMismatch { expected: usize, actual: usize },
    UnsupportedDimension(usize),
    InvalidConnectivity {
        dim: usize,
        foreground: usize,
        background: usize,
    },
    InvalidBorder(&'static str),
    InvalidSpacing { axis: usize },
    /// The cell count of the requested extents does not fit in `usize`.
    SizeOverflow,
    OutOfBounds,
}

impl Error {
    /// Errors caused by the requested configuration rather than by the data.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::DimensionMismatch { .. }
                | Self::UnsupportedDimension(_)
                | Self::InvalidConnectivity { .. }
                | Self::InvalidBorder(_)
                | Self::InvalidSpacing { .. }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch { expected, actual } => {
                write!(f, "size mismatch: expected {expected}, got {actual}")
            }
            Self::ShapeMismatch { expected, actual } => {
                write!(f, "shape mismatch: expected {expected}, got {actual}")
            }
            Self::DimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "dimension mismatch: connectivity is {expected}D, grid is {actual}D"
                )
            }
            Self::UnsupportedDimension(dim) => write!(f, "unsupported dimensionality {dim}"),
            Self::InvalidConnectivity {
                dim,
                foreground,
                background,
            } => write!(
                f,
                "invalid connectivity pair ({foreground}, {background}) in {dim}D"
            ),
            Self::InvalidBorder(reason) => write!(f, "invalid border mode: {reason}"),
            Self::InvalidSpacing { axis } => {
                write!(f, "spacing along axis {axis} must be finite and positive")
            }
            Self::SizeOverflow => write!(f, "cell count overflows usize"),
            Self::OutOfBounds => write!(f, "out of bounds"),
        }
    }
}

impl std::error::Error for Error {}
