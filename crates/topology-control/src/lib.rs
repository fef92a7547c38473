//! Umbrella crate for the `topology-control` workspace.
//!
//! Re-exports the grid model, the digital-topology primitives, ball
//! morphology and the relabeling engine.

pub use tc_core::*;
pub use tc_morph::{
    ball_offsets, dilate_ball, erode_ball, euclidean_distance, euclidean_distance_framed,
};
pub use tc_relabel::*;
pub use tc_topology::*;
